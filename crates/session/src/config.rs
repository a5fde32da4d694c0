//! Caller-facing configuration.
//!
//! [`SessionConfig`] holds what is needed to establish a session and is
//! consumed by [`crate::Session::open`]. [`SessionOptions`] holds the tuning
//! knobs that downstream operations read and that may be changed on a live
//! session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ObjectWrappingPreference, Password, RequestedMetadataGroup, StrictMetadataPreference, TrustPolicy};

/// Default connect/read timeout. Name resolution alone may take up to 15 s on
/// some platforms.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default number of ids per metadata call. Stays below the 1000-element
/// `IN`-clause limit of common relational back ends.
pub const DEFAULT_METADATA_BATCH_SIZE: usize = 999;

/// Default number of ids per blob call.
pub const DEFAULT_BLOB_BATCH_SIZE: usize = 50;

/// Default chunk size for streamed binary retrieval (10 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the web services, e.g. `https://example.com/ISHWS/`.
    /// A missing trailing `/` is added.
    pub base_url: String,

    /// Account name. `None` logs in as the ambient operating system identity.
    pub user_name: Option<String>,

    /// Password for `user_name`. `None` requests ambient-identity
    /// authentication.
    pub password: Option<Password>,

    /// Connect and read timeout applied to every HTTP request of the session.
    pub timeout: Duration,

    /// Certificate validation policy for every HTTPS connection.
    pub trust_policy: TrustPolicy,

    /// Initial tuning options.
    pub options: SessionOptions,
}

impl SessionConfig {
    /// Creates a configuration with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_name: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
            trust_policy: TrustPolicy::default(),
            options: SessionOptions::default(),
        }
    }

    /// Sets user name and password.
    #[must_use]
    pub fn with_credentials(mut self, user_name: impl Into<String>, password: Option<Password>) -> Self {
        self.user_name = Some(user_name.into());
        self.password = password;
        self
    }

    /// Sets the connect/read timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the certificate trust policy.
    #[must_use]
    pub fn with_trust_policy(mut self, trust_policy: TrustPolicy) -> Self {
        self.trust_policy = trust_policy;
        self
    }

    /// Replaces the tuning options.
    #[must_use]
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }
}

// ---------------------------------------------------------------------------

/// Tuning options consulted by operations running on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OptionsDocument")]
pub struct SessionOptions {
    metadata_batch_size: usize,
    blob_batch_size: usize,
    chunk_size: usize,
    /// Handling of metadata fields unknown to the field setup.
    pub strict_metadata: StrictMetadataPreference,
    /// How retrieved objects are handed to consumers.
    pub object_wrapping: ObjectWrappingPreference,
    /// Breadth of metadata requested when the caller does not specify fields.
    pub default_requested_metadata: RequestedMetadataGroup,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            metadata_batch_size: DEFAULT_METADATA_BATCH_SIZE,
            blob_batch_size: DEFAULT_BLOB_BATCH_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            strict_metadata: StrictMetadataPreference::default(),
            object_wrapping: ObjectWrappingPreference::default(),
            default_requested_metadata: RequestedMetadataGroup::default(),
        }
    }
}

/// Serialized form of [`SessionOptions`]. Sizes pass through the setters so a
/// zero in a configuration file restores the default.
#[derive(Deserialize)]
#[serde(default)]
struct OptionsDocument {
    metadata_batch_size: usize,
    blob_batch_size: usize,
    chunk_size: usize,
    strict_metadata: StrictMetadataPreference,
    object_wrapping: ObjectWrappingPreference,
    default_requested_metadata: RequestedMetadataGroup,
}

impl Default for OptionsDocument {
    fn default() -> Self {
        let options = SessionOptions::default();
        Self {
            metadata_batch_size: options.metadata_batch_size,
            blob_batch_size: options.blob_batch_size,
            chunk_size: options.chunk_size,
            strict_metadata: options.strict_metadata,
            object_wrapping: options.object_wrapping,
            default_requested_metadata: options.default_requested_metadata,
        }
    }
}

impl From<OptionsDocument> for SessionOptions {
    fn from(document: OptionsDocument) -> Self {
        let mut options = Self {
            strict_metadata: document.strict_metadata,
            object_wrapping: document.object_wrapping,
            default_requested_metadata: document.default_requested_metadata,
            ..Self::default()
        };
        options.set_metadata_batch_size(document.metadata_batch_size);
        options.set_blob_batch_size(document.blob_batch_size);
        options.set_chunk_size(document.chunk_size);
        options
    }
}

impl SessionOptions {
    /// Ids per metadata call.
    pub fn metadata_batch_size(&self) -> usize {
        self.metadata_batch_size
    }

    /// Sets the ids per metadata call; `0` restores the default.
    pub fn set_metadata_batch_size(&mut self, size: usize) {
        self.metadata_batch_size = if size > 0 {
            size
        } else {
            DEFAULT_METADATA_BATCH_SIZE
        };
    }

    /// Ids per blob call.
    pub fn blob_batch_size(&self) -> usize {
        self.blob_batch_size
    }

    /// Sets the ids per blob call; `0` restores the default.
    pub fn set_blob_batch_size(&mut self, size: usize) {
        self.blob_batch_size = if size > 0 { size } else { DEFAULT_BLOB_BATCH_SIZE };
    }

    /// Bytes per chunk for streamed binary retrieval.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sets bytes per chunk; `0` restores the default.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = if size > 0 { size } else { DEFAULT_CHUNK_SIZE };
    }

    /// Splits `ids` into metadata-sized batches.
    pub fn metadata_batches<'a, T>(&self, ids: &'a [T]) -> std::slice::Chunks<'a, T> {
        ids.chunks(self.metadata_batch_size)
    }

    /// Splits `ids` into blob-sized batches.
    pub fn blob_batches<'a, T>(&self, ids: &'a [T]) -> std::slice::Chunks<'a, T> {
        ids.chunks(self.blob_batch_size)
    }
}
