//! Newtype domain identifiers.
//!
//! Every named concept exchanged with the remote server is represented as a
//! distinct newtype wrapping a primitive. This prevents accidentally
//! interchanging, for example, a [`ServiceName`] with a [`FieldName`] even
//! though both are strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one open session within this process.
///
/// Generated fresh for every [`crate::Session::open`]; recorded on spans and
/// events so all activity of a single session can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random session identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (server names)
// ---------------------------------------------------------------------------

string_id! {
    /// Logical name of a remote service, e.g. `"Application25"`.
    ///
    /// The endpoint address is derived from it; see
    /// [`crate::ports::ServiceEndpoint::for_service`].
    ServiceName
}

impl ServiceName {
    /// Login and version service.
    pub const APPLICATION: &'static str = "Application25";
    /// Field setup and settings metadata service.
    pub const SETTINGS: &'static str = "Settings25";
    /// Current user and user metadata service.
    pub const USER: &'static str = "User25";
    /// Folder service.
    pub const FOLDER: &'static str = "Folder25";

    /// Returns the name of a well-known service constant.
    pub(crate) fn well_known(name: &'static str) -> Self {
        Self(name.to_owned())
    }
}

string_id! {
    /// Application name announced by the bootstrap document and passed to login.
    ApplicationName
}

string_id! {
    /// Account name used to authenticate against the server.
    UserName
}

string_id! {
    /// Object type name as known by the server, e.g. `"ISHModule"`.
    TypeName
}

string_id! {
    /// Metadata field name, e.g. `"FTITLE"`.
    FieldName
}

impl FieldName {
    pub(crate) fn well_known(name: &'static str) -> Self {
        Self(name.to_owned())
    }
}
