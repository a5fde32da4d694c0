//! Port traits through which the session reaches the remote server.
//!
//! The session crate defines *what* it needs from the network; the `soap`
//! crate supplies *how*. Test code substitutes in-memory fakes.
//!
//! Every authenticated operation takes the current [`AuthToken`] by value and
//! returns the (possibly refreshed) token next to its result in
//! [`Authenticated`]. The session adopts the returned token before the next
//! call is issued.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{
    ApplicationName, AuthToken, Password, RpcError, ServiceName, TransportError, TrustPolicy,
    TypeName, UserName,
};

// ---------------------------------------------------------------------------
// Bootstrap transport
// ---------------------------------------------------------------------------

/// Unauthenticated HTTP GET used for the bootstrap document.
///
/// Implementations apply the session's trust policy and timeout and perform no
/// retries.
#[async_trait]
pub trait BootstrapTransport: Send + Sync {
    /// Fetches `uri` and returns the response body.
    async fn fetch(&self, uri: &Url) -> Result<Vec<u8>, TransportError>;
}

// ---------------------------------------------------------------------------
// Service contracts
// ---------------------------------------------------------------------------

/// Result of an authenticated call together with the token to use next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated<T> {
    /// Token returned by the server; replaces the one that was sent.
    pub auth_token: AuthToken,
    /// Call result.
    pub value: T,
}

impl<T> Authenticated<T> {
    /// Pairs a value with the token that came back with it.
    pub fn new(auth_token: AuthToken, value: T) -> Self {
        Self { auth_token, value }
    }
}

/// Login call arguments.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Application name announced by the bootstrap document.
    pub application: ApplicationName,
    /// Account to log in as.
    pub user_name: UserName,
    /// `None` requests ambient-identity authentication.
    pub password: Option<Password>,
    /// Token slot; empty on first login.
    pub auth_token: AuthToken,
}

/// Login call result.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Newly issued authentication context.
    pub auth_token: AuthToken,
}

/// Login and version operations.
#[async_trait]
pub trait ApplicationService: Send + Sync {
    /// Exchanges credentials for an authentication context.
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, RpcError>;

    /// Returns the raw server version string.
    async fn get_version(&self) -> Result<String, RpcError>;
}

/// Field setup and settings metadata operations.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Returns the field setup document for `types`, or for every type when
    /// `None`.
    async fn retrieve_field_setup_by_type(
        &self,
        auth_token: AuthToken,
        types: Option<Vec<TypeName>>,
    ) -> Result<Authenticated<String>, RpcError>;

    /// Returns an objects document holding the requested settings fields.
    async fn get_metadata(
        &self,
        auth_token: AuthToken,
        requested_metadata: String,
    ) -> Result<Authenticated<String>, RpcError>;
}

/// Current-user operations.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Returns an objects document holding the requested fields of the
    /// authenticated user.
    async fn get_my_metadata(
        &self,
        auth_token: AuthToken,
        requested_metadata: String,
    ) -> Result<Authenticated<String>, RpcError>;
}

// ---------------------------------------------------------------------------
// Proxy construction
// ---------------------------------------------------------------------------

/// Address of one remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Logical service name.
    pub service: ServiceName,
    /// Absolute endpoint URL.
    pub url: Url,
}

impl ServiceEndpoint {
    /// Endpoint of `service` below `base_url`: `{base_url}{service lowercased}.asmx`.
    ///
    /// `base_url` must end in `/`, which [`crate::connection::normalize_base_url`]
    /// guarantees.
    pub fn for_service(base_url: &Url, service: &ServiceName) -> Result<Self, url::ParseError> {
        let url = base_url.join(&format!("{}.asmx", service.as_str().to_ascii_lowercase()))?;
        Ok(Self {
            service: service.clone(),
            url,
        })
    }
}

/// Transport settings shared by every service client of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Connect and read timeout.
    pub timeout: Duration,
    /// Certificate validation policy. With
    /// [`TrustPolicy::AcceptAnyCertificate`] the client skips chain and
    /// revocation checks for its own connections only.
    pub trust_policy: TrustPolicy,
    /// Upper bound on a response body; `None` means unbounded. Full document
    /// payloads can be very large.
    pub max_message_size: Option<usize>,
    /// Whether cookies set by the server are sent back on later calls.
    pub cookies: bool,
}

impl ChannelSettings {
    /// Settings used by [`crate::Session`]: unbounded messages, cookies on.
    pub fn new(timeout: Duration, trust_policy: TrustPolicy) -> Self {
        Self {
            timeout,
            trust_policy,
            max_message_size: None,
            cookies: true,
        }
    }
}

/// Builds one service client for an endpoint.
///
/// The returned handle implements every service contract; the session only
/// invokes the operations belonging to the endpoint it was built for.
pub trait ServiceFactory: Send + Sync {
    /// Client handle type.
    type Handle: ApplicationService + SettingsService + UserService + 'static;

    /// Constructs a client bound to `endpoint`.
    fn create(
        &self,
        endpoint: &ServiceEndpoint,
        settings: &ChannelSettings,
    ) -> Result<Self::Handle, RpcError>;
}
