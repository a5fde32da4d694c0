//! Error types for the session domain.
//!
//! [`SessionError`] is what callers of [`crate::Session`] see. Port-level
//! failures are expressed as [`TransportError`] (bootstrap HTTP fetch) and
//! [`RpcError`] (service calls); the session maps them onto the stage in which
//! they happened, so a caller can tell a rejected login from an unreachable
//! server without inspecting messages.
//!
//! ## Propagation rules
//!
//! - Bootstrap, login and version failures abort [`crate::Session::open`];
//!   no partially initialised session is ever returned.
//! - Lazy resolvers (type field setup, current user profile) fail on first
//!   access only. The session stays usable and the accessor may be retried.
//! - Strict-metadata violations are per-call errors, never session faults.

use thiserror::Error;

use crate::{FieldLevel, FieldName, ServiceName, TypeName};

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// Broad classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Name resolution or TCP connect failed.
    Connect,
    /// The connect or read phase exceeded the configured timeout.
    Timeout,
    /// TLS handshake or certificate validation failed.
    Tls,
    /// The server answered with a non-success HTTP status.
    Status(u16),
    /// The response body could not be read.
    Body,
    /// The HTTP client could not be constructed or the request was malformed.
    Other,
}

/// A network-level failure while talking to the server.
#[derive(Debug, Clone, Error)]
#[error("Transport failure ({kind:?}) for {uri}: {message}")]
pub struct TransportError {
    /// What went wrong.
    pub kind: TransportErrorKind,
    /// Target of the failed request.
    pub uri: String,
    /// Human-readable detail from the underlying client.
    pub message: String,
}

impl TransportError {
    /// Creates a [`TransportError`].
    pub fn new(kind: TransportErrorKind, uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
            message: message.into(),
        }
    }
}

/// Failure of one remote procedure call.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// The call never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a fault (rejected credentials, expired token,
    /// invalid arguments).
    #[error("Server fault '{code}': {message}")]
    Fault {
        /// Fault code reported by the server.
        code: String,
        /// Fault description reported by the server.
        message: String,
    },

    /// The response did not have the documented shape.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What was missing or unreadable.
        message: String,
    },
}

impl RpcError {
    /// Creates a [`RpcError::MalformedResponse`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

/// An XML document received from the server could not be read.
#[derive(Debug, Clone, Error)]
#[error("Invalid {document} document: {message}")]
pub struct DocumentError {
    /// Which document was being parsed.
    pub document: &'static str,
    /// Parser detail.
    pub message: String,
}

impl DocumentError {
    pub(crate) fn new(document: &'static str, message: impl std::fmt::Display) -> Self {
        Self {
            document,
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session-level errors
// ---------------------------------------------------------------------------

/// Stage of the type field setup resolver that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    /// Retrieving or parsing the dynamic field setup from the server.
    DynamicLoad,
    /// Parsing the bundled static snapshot.
    StaticFallback,
    /// Retrieving or merging the extension configuration overlay.
    OverlayMerge,
}

impl std::fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            Self::DynamicLoad => "dynamic load",
            Self::StaticFallback => "static fallback",
            Self::OverlayMerge => "overlay merge",
        };
        f.write_str(stage)
    }
}

/// Errors surfaced by [`crate::Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The caller-supplied configuration is unusable (e.g. the base URL does
    /// not parse or is not absolute).
    ///
    /// Produced at [`crate::Session::open`] before any network activity.
    #[error("Invalid session configuration: {message}")]
    InvalidConfiguration {
        /// Description of the configuration problem.
        message: String,
    },

    /// Network, TLS or timeout failure while fetching the bootstrap document.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The bootstrap document was fetched but is missing required content or
    /// is not well-formed.
    #[error("Connection configuration unavailable at {uri}: {reason}")]
    ConfigUnavailable {
        /// Bootstrap document URI.
        uri: String,
        /// Why the document was rejected.
        reason: String,
    },

    /// The login call rejected the credentials or failed.
    #[error("Authentication failed for user '{user}': {source}")]
    AuthenticationFailed {
        /// Account that attempted to log in.
        user: String,
        /// Underlying call failure.
        #[source]
        source: RpcError,
    },

    /// The version call failed or returned an unparsable version.
    #[error("Server version could not be resolved: {reason}")]
    VersionUnresolvable {
        /// Underlying failure.
        reason: String,
    },

    /// Building the type field setup failed; the session remains usable and
    /// the resolution may be retried.
    #[error("Type field setup resolution failed during {stage}: {reason}")]
    FieldSetupResolutionFailed {
        /// Stage that failed.
        stage: ResolutionStage,
        /// Underlying failure.
        reason: String,
        /// Failed remote call, when the stage failed on one rather than on
        /// document content.
        #[source]
        source: Option<RpcError>,
    },

    /// Strict metadata handling rejected a field unknown to the field setup.
    #[error("Field '{field}' at level '{level}' is not defined for type '{object_type}'")]
    UnknownFieldPolicyViolation {
        /// Object type the field was requested for.
        object_type: TypeName,
        /// Offending field.
        field: FieldName,
        /// Requested level.
        level: FieldLevel,
    },

    /// A profile field of the current user could not be retrieved.
    #[error("User metadata field '{field}' unavailable: {reason}")]
    UserMetadataUnavailable {
        /// Requested profile field.
        field: &'static str,
        /// Underlying failure.
        reason: String,
    },

    /// A client for a remote service could not be constructed.
    #[error("Service '{service}' unavailable: {source}")]
    ServiceUnavailable {
        /// Logical service name.
        service: ServiceName,
        /// Underlying failure.
        #[source]
        source: RpcError,
    },

    /// An authenticated call failed after the session was established.
    #[error("Call to service '{service}' failed: {source}")]
    CallFailed {
        /// Logical service name.
        service: ServiceName,
        /// Underlying failure.
        #[source]
        source: RpcError,
    },

    /// The session was closed; no further remote calls are possible.
    #[error("Session is closed")]
    Closed,
}
