//! Shared value types for the session domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (versions are totally ordered, tokens are
//! never printed) and participate in the session's branching decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// A `major.minor.revision` product version.
///
/// Ordering is lexicographic on the three components, which is what the
/// field setup resolver relies on to pick its construction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version, e.g. `14` for `14.0.4`.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Revision (service pack level), e.g. `4` for `14.0.4`.
    pub revision: u32,
}

/// Version reported by the server's `GetVersion` call.
pub type ServerVersion = Version;

/// Version of this client library.
pub type ClientVersion = Version;

/// A version string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid version string '{input}'")]
pub struct VersionParseError {
    /// The rejected input.
    pub input: String,
}

impl Version {
    /// Creates a new [`Version`].
    pub const fn new(major: u32, minor: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// Parses `"major[.minor[.revision[.build...]]]"`.
    ///
    /// Missing components default to `0`; components after the revision (build
    /// numbers) are ignored. Every present component must be numeric.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let err = || VersionParseError {
            input: input.to_owned(),
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(err());
        }

        let mut parts = [0u32; 3];
        for (index, part) in trimmed.split('.').enumerate() {
            let value: u32 = part.trim().parse().map_err(|_| err())?;
            if let Some(slot) = parts.get_mut(index) {
                *slot = value;
            }
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Version of the running client, taken from the crate manifest.
    pub fn client() -> ClientVersion {
        Self::parse(env!("CARGO_PKG_VERSION")).unwrap_or_default()
    }

    /// Returns `true` when dynamic field setup retrieval is available (13 and up).
    pub fn supports_dynamic_field_setup(self) -> bool {
        self.major >= 13
    }

    /// Returns `true` inside the extension-configuration overlay window
    /// `[13.0, 14.0.4)`.
    ///
    /// Servers in this window already carry an extension configuration that
    /// rebinds fields, but do not yet reflect it in their field setup.
    pub fn requires_extension_overlay(self) -> bool {
        self.major == 13 || (self.major == 14 && self.revision < 4)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

impl std::str::FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Opaque authentication context issued by the login call.
///
/// Refreshed by the server on most authenticated calls. Lives only in process
/// memory and is never written to logs; `Debug` prints a placeholder.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a token string returned by the server.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token for transmission.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no token has been issued yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            f.write_str("AuthToken(<empty>)")
        } else {
            f.write_str("AuthToken(<redacted>)")
        }
    }
}

/// A password supplied by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a password.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw password for transmission.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Policies and preferences
// ---------------------------------------------------------------------------

/// How server certificates are checked on every HTTPS connection of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustPolicy {
    /// Standard certificate chain and host name validation.
    #[default]
    ValidateCertificates,
    /// **Insecure.** Accepts any server certificate, including self-signed and
    /// expired ones, and skips revocation checks. Only for debugging proxies or
    /// test servers; must be opted into explicitly.
    AcceptAnyCertificate,
}

impl TrustPolicy {
    /// Returns `true` for [`TrustPolicy::AcceptAnyCertificate`].
    pub fn is_insecure(self) -> bool {
        matches!(self, Self::AcceptAnyCertificate)
    }
}

/// How metadata fields that are unknown to the resolved field setup are handled
/// before a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrictMetadataPreference {
    /// No filtering: unknown fields are passed through unchanged.
    #[default]
    Off,
    /// Unknown fields are silently removed.
    Continue,
    /// Unknown fields are removed and a warning is emitted for each.
    Warn,
    /// The request is rejected with
    /// [`crate::SessionError::UnknownFieldPolicyViolation`].
    Reject,
}

/// How retrieved objects are handed to downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectWrappingPreference {
    /// Objects are enriched with one flattened property per field.
    #[default]
    FieldProperties,
    /// Objects are returned as received.
    Off,
}

/// Breadth of metadata requested by default for an object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedMetadataGroup {
    /// Fields flagged as basic (includes descriptive fields).
    #[default]
    Basic,
    /// Only fields flagged as descriptive.
    Descriptive,
    /// Every field known for the type.
    All,
}

// ---------------------------------------------------------------------------
// Field levels
// ---------------------------------------------------------------------------

/// Level of an object at which a metadata field is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLevel {
    /// Object without levels (users, folders, settings).
    None,
    /// Logical object, shared by all versions.
    Logical,
    /// One version of a logical object.
    Version,
    /// One language of a version.
    Lng,
    /// Annotation on an object.
    Annotation,
    /// Detail record (events, background task steps).
    Detail,
    /// Task record.
    Task,
    /// History record.
    History,
    /// Progress record.
    Progress,
}

impl FieldLevel {
    /// Wire spelling of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Logical => "logical",
            Self::Version => "version",
            Self::Lng => "lng",
            Self::Annotation => "annotation",
            Self::Detail => "detail",
            Self::Task => "task",
            Self::History => "history",
            Self::Progress => "progress",
        }
    }

    /// Parses the wire spelling, case-insensitively. Empty means [`FieldLevel::None`].
    pub fn parse(value: &str) -> Option<Self> {
        let level = match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Self::None,
            "logical" => Self::Logical,
            "version" => Self::Version,
            "lng" | "language" => Self::Lng,
            "annotation" => Self::Annotation,
            "detail" => Self::Detail,
            "task" => Self::Task,
            "history" => Self::History,
            "progress" => Self::Progress,
            _ => return None,
        };
        Some(level)
    }
}

impl std::fmt::Display for FieldLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fills_missing_components_and_ignores_build() {
        assert_eq!(Version::parse("14").unwrap(), Version::new(14, 0, 0));
        assert_eq!(Version::parse("13.0.2.3210").unwrap(), Version::new(13, 0, 2));
        assert_eq!(Version::parse(" 15.1.0 ").unwrap(), Version::new(15, 1, 0));
    }

    #[test]
    fn parse_rejects_non_numeric_components() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("14.x.4").is_err());
        assert!(Version::parse("14..4").is_err());
    }

    #[test]
    fn ordering_is_lexicographic_and_transitive() {
        let chain = [
            Version::new(13, 0, 0),
            Version::new(14, 0, 0),
            Version::new(14, 0, 4),
            Version::new(15, 0, 0),
        ];
        for (i, a) in chain.iter().enumerate() {
            for b in &chain[i + 1..] {
                assert!(a < b, "{a} should sort before {b}");
            }
        }
        assert!(Version::new(12, 9, 9) < Version::new(13, 0, 0));
        assert!(Version::new(14, 1, 0) > Version::new(14, 0, 9));
    }

    #[test]
    fn overlay_window_is_half_open() {
        for minor in [0, 1, 5] {
            for revision in [0, 3, 4, 10] {
                assert!(Version::new(13, minor, revision).requires_extension_overlay());
            }
            for revision in 0..4 {
                assert!(Version::new(14, minor, revision).requires_extension_overlay());
            }
            for revision in [4, 5, 100] {
                assert!(!Version::new(14, minor, revision).requires_extension_overlay());
            }
            assert!(!Version::new(12, minor, 0).requires_extension_overlay());
            assert!(!Version::new(11, minor, 3).requires_extension_overlay());
            assert!(!Version::new(15, minor, 0).requires_extension_overlay());
        }
    }

    #[test]
    fn dynamic_field_setup_starts_at_thirteen() {
        assert!(!Version::new(12, 0, 1).supports_dynamic_field_setup());
        assert!(Version::new(13, 0, 0).supports_dynamic_field_setup());
        assert!(Version::new(16, 0, 0).supports_dynamic_field_setup());
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let token = AuthToken::new("abc123");
        let password = Password::new("hunter2");
        assert!(!format!("{token:?}").contains("abc123"));
        assert!(!format!("{password:?}").contains("hunter2"));
        assert_eq!(format!("{:?}", AuthToken::default()), "AuthToken(<empty>)");
    }

    #[test]
    fn field_level_round_trips_wire_spelling() {
        assert_eq!(FieldLevel::parse("LNG"), Some(FieldLevel::Lng));
        assert_eq!(FieldLevel::parse(""), Some(FieldLevel::None));
        assert_eq!(FieldLevel::parse("galaxy"), None);
        assert_eq!(FieldLevel::Logical.to_string(), "logical");
    }

    #[test]
    fn trust_policy_defaults_to_validation() {
        assert_eq!(TrustPolicy::default(), TrustPolicy::ValidateCertificates);
        assert!(!TrustPolicy::default().is_insecure());
        assert_eq!(
            serde_json::to_string(&TrustPolicy::AcceptAnyCertificate).unwrap(),
            "\"accept_any_certificate\""
        );
    }
}
