//! Remote session core for a content-management web service.
//!
//! This crate owns the session lifecycle: discovering the service through its
//! bootstrap document, authenticating, resolving the server version, lazily
//! building the type field setup, and handing out per-service clients that
//! share one authentication context. Infrastructure crates implement the port
//! traits defined here; they never add session rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no network I/O.
//! It defines *what* is needed; the `soap` crate defines *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`SessionId`, `ServiceName`, `TypeName`, etc.) |
//! | [`types`] | Shared value types (`Version`, `AuthToken`, `TrustPolicy`, `FieldLevel`, etc.) |
//! | [`errors`] | Error taxonomy |
//! | [`config`] | `SessionConfig` and `SessionOptions` |
//! | [`connection`] | Bootstrap document discovery |
//! | [`metadata`] | Metadata request and object list documents |
//! | [`field_setup`] | Type field setup model, static snapshot, overlay merge |
//! | [`ports`] | Traits implemented by the transport layer |
//! | [`token`] | Serialized access to the authentication token |
//! | [`registry`] | Per-session cache of service clients |
//! | [`session`] | The `Session` state machine |

pub mod config;
pub mod connection;
pub mod errors;
pub mod field_setup;
pub mod identifiers;
pub mod metadata;
pub mod ports;
pub mod registry;
pub mod session;
pub mod token;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{SessionConfig, SessionOptions};
pub use connection::ConnectionConfiguration;
pub use errors::{
    DocumentError, ResolutionStage, RpcError, SessionError, TransportError, TransportErrorKind,
};
pub use field_setup::{
    FieldDataType, FieldDefinition, FieldSetupSource, ResolvedFieldSetup, TypeFieldSetup,
};
pub use identifiers::{ApplicationName, FieldName, ServiceName, SessionId, TypeName, UserName};
pub use ports::{
    ApplicationService, Authenticated, BootstrapTransport, ChannelSettings, LoginRequest,
    LoginResponse, ServiceEndpoint, ServiceFactory, SettingsService, UserService,
};
pub use session::Session;
pub use types::{
    AuthToken, ClientVersion, FieldLevel, ObjectWrappingPreference, Password,
    RequestedMetadataGroup, ServerVersion, StrictMetadataPreference, Timestamp, TrustPolicy,
    Version, VersionParseError,
};
