//! The authenticated session.
//!
//! [`Session::open`] runs the handshake in a fixed order and fails fast:
//!
//! 1. fetch and parse the bootstrap document,
//! 2. log in,
//! 3. read the server version.
//!
//! Everything else is resolved lazily on first access and cached for the
//! lifetime of the session: the type field setup and the current user's
//! profile fields. A failed lazy resolution leaves its cache empty, so the
//! next access tries again.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};
use url::Url;

use crate::connection::{normalize_base_url, ConnectionConfiguration};
use crate::field_setup::{ResolvedFieldSetup, TypeFieldSetup};
use crate::metadata::{
    parse_objects, RequestedField, RequestedFields, EXTENSION_CONFIGURATION_FIELD, USER_LANGUAGE_FIELD,
    USER_NAME_FIELD,
};
use crate::ports::{
    ApplicationService, Authenticated, BootstrapTransport, ChannelSettings, LoginRequest, ServiceFactory,
    SettingsService, UserService,
};
use crate::registry::ServiceRegistry;
use crate::token::TokenCell;
use crate::{
    AuthToken, ClientVersion, FieldLevel, FieldName, ResolutionStage, RpcError, ServerVersion, ServiceName,
    SessionConfig, SessionError, SessionId, SessionOptions, StrictMetadataPreference, Timestamp, TrustPolicy,
    TypeName, UserName, Version,
};

/// Separator between values of a multi-value field.
pub const VALUE_SEPARATOR: &str = ", ";

/// Separator between the segments of a folder path.
pub const FOLDER_PATH_SEPARATOR: &str = "\\";

/// Environment variables consulted, in order, for the ambient account name.
const AMBIENT_USER_VARIABLES: [&str; 3] = ["USERNAME", "USER", "LOGNAME"];

/// An open, authenticated connection to one server.
///
/// Generic over the [`ServiceFactory`] that builds the service clients, so the
/// same state machine runs against the SOAP transport and against in-memory
/// fakes.
pub struct Session<F: ServiceFactory> {
    id: SessionId,
    opened_at: Timestamp,
    base_url: Url,
    connection: ConnectionConfiguration,
    user_name: UserName,
    timeout: Duration,
    trust_policy: TrustPolicy,
    options: SessionOptions,
    token: TokenCell,
    server_version: ServerVersion,
    server_version_text: String,
    client_version: ClientVersion,
    field_setup: OnceCell<ResolvedFieldSetup>,
    display_name: OnceCell<String>,
    language: OnceCell<String>,
    registry: ServiceRegistry<F>,
    closed: AtomicBool,
}

impl<F: ServiceFactory> Session<F> {
    /// Establishes a session.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidConfiguration`] if the base URL is unusable.
    /// - [`SessionError::Transport`] or [`SessionError::ConfigUnavailable`] if
    ///   the bootstrap document cannot be fetched or read.
    /// - [`SessionError::AuthenticationFailed`] if login is rejected.
    /// - [`SessionError::VersionUnresolvable`] if the version call fails or
    ///   returns something unparsable.
    #[instrument(skip_all, fields(base_url = %config.base_url, session_id = tracing::field::Empty))]
    pub async fn open(
        config: SessionConfig,
        transport: &dyn BootstrapTransport,
        factory: F,
    ) -> Result<Self, SessionError> {
        let id = SessionId::new_random();
        tracing::Span::current().record("session_id", tracing::field::display(id));

        let base_url = normalize_base_url(&config.base_url)?;
        let connection = ConnectionConfiguration::load(transport, &base_url).await?;

        let user_name = config
            .user_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(ambient_user_name);
        let user_name = UserName::new(user_name).ok_or_else(|| SessionError::InvalidConfiguration {
            message: "user name is empty".to_owned(),
        })?;

        let settings = ChannelSettings::new(config.timeout, config.trust_policy);
        if config.trust_policy.is_insecure() {
            info!("Certificate validation is disabled for this session");
        }
        let registry = ServiceRegistry::new(factory, base_url.clone(), settings);
        let application = registry
            .get(&ServiceName::well_known(ServiceName::APPLICATION))
            .await?;

        if config.password.is_none() {
            debug!(user = %user_name, "No password supplied; logging in with the ambient identity");
        }
        let login = application
            .login(LoginRequest {
                application: connection.application_name.clone(),
                user_name: user_name.clone(),
                password: config.password,
                auth_token: AuthToken::default(),
            })
            .await
            .map_err(|source| SessionError::AuthenticationFailed {
                user: user_name.to_string(),
                source,
            })?;
        debug!(user = %user_name, application = %connection.application_name, "Logged in");

        let server_version_text = application
            .get_version()
            .await
            .map_err(|e| SessionError::VersionUnresolvable { reason: e.to_string() })?;
        let server_version = Version::parse(&server_version_text)
            .map_err(|e| SessionError::VersionUnresolvable { reason: e.to_string() })?;
        debug!(version = %server_version, raw = %server_version_text, "Server version resolved");

        Ok(Self {
            id,
            opened_at: Timestamp::now(),
            base_url,
            connection,
            user_name,
            timeout: config.timeout,
            trust_policy: config.trust_policy,
            options: config.options,
            token: TokenCell::new(login.auth_token),
            server_version,
            server_version_text,
            client_version: Version::client(),
            field_setup: OnceCell::new(),
            display_name: OnceCell::new(),
            language: OnceCell::new(),
            registry,
            closed: AtomicBool::new(false),
        })
    }

    // -----------------------------------------------------------------------
    // Identity and handshake results
    // -----------------------------------------------------------------------

    /// Process-local identifier, recorded on every span of this session.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// When the handshake completed.
    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    /// Normalized base URL; every endpoint is derived from it.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Parsed bootstrap document.
    pub fn connection(&self) -> &ConnectionConfiguration {
        &self.connection
    }

    /// Account the session is authenticated as.
    pub fn user_name(&self) -> &UserName {
        &self.user_name
    }

    /// Connect and read timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Certificate trust policy.
    pub fn trust_policy(&self) -> TrustPolicy {
        self.trust_policy
    }

    /// Server version from `GetVersion`.
    pub fn server_version(&self) -> ServerVersion {
        self.server_version
    }

    /// Server version exactly as reported, including build numbers.
    pub fn server_version_text(&self) -> &str {
        &self.server_version_text
    }

    /// Version of this client library.
    pub fn client_version(&self) -> ClientVersion {
        self.client_version
    }

    /// Display name, `[base url][user name]`.
    pub fn name(&self) -> String {
        format!("[{}][{}]", self.base_url, self.user_name)
    }

    /// Separator between values of a multi-value field.
    pub fn separator(&self) -> &'static str {
        VALUE_SEPARATOR
    }

    /// Separator between folder path segments.
    pub fn folder_path_separator(&self) -> &'static str {
        FOLDER_PATH_SEPARATOR
    }

    // -----------------------------------------------------------------------
    // Options
    // -----------------------------------------------------------------------

    /// Current tuning options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Changes tuning options. A strictness change also reaches a resolved
    /// field setup, unless it is the static fallback.
    pub fn update_options(&mut self, update: impl FnOnce(&mut SessionOptions)) {
        update(&mut self.options);
        let preference = self.options.strict_metadata;
        if let Some(resolved) = self.field_setup.get_mut() {
            resolved.apply_preference(preference);
        }
    }

    /// Sets the handling of fields unknown to the field setup.
    pub fn set_strict_metadata_preference(&mut self, preference: StrictMetadataPreference) {
        self.update_options(|options| options.strict_metadata = preference);
    }

    // -----------------------------------------------------------------------
    // Type field setup
    // -----------------------------------------------------------------------

    /// The type field setup, resolved on first access.
    ///
    /// # Errors
    ///
    /// [`SessionError::FieldSetupResolutionFailed`] naming the failed stage.
    /// Nothing is cached on failure.
    pub async fn type_field_setup(&self) -> Result<&ResolvedFieldSetup, SessionError> {
        self.ensure_open()?;
        self.field_setup.get_or_try_init(|| self.resolve_field_setup()).await
    }

    /// Replaces the type field setup with a caller-supplied one. The current
    /// strictness preference applies to it.
    pub fn replace_type_field_setup(&mut self, setup: TypeFieldSetup) {
        let resolved = ResolvedFieldSetup::explicit(setup, self.options.strict_metadata);
        self.field_setup = OnceCell::new_with(Some(resolved));
    }

    /// Applies the strictness policy to `requested` for `object_type`.
    pub async fn filter_requested_fields(
        &self,
        object_type: &TypeName,
        requested: RequestedFields,
    ) -> Result<RequestedFields, SessionError> {
        self.type_field_setup().await?.filter_fields(object_type, requested)
    }

    /// Fields of `object_type` in the session's default metadata group.
    pub async fn default_requested_fields(&self, object_type: &TypeName) -> Result<RequestedFields, SessionError> {
        let group = self.options.default_requested_metadata;
        Ok(self.type_field_setup().await?.requested_fields(object_type, group))
    }

    #[instrument(skip(self), fields(session_id = %self.id, server_version = %self.server_version))]
    async fn resolve_field_setup(&self) -> Result<ResolvedFieldSetup, SessionError> {
        let mut resolved = if self.server_version.supports_dynamic_field_setup() {
            debug!("Retrieving field setup from the server");
            let settings = ServiceName::well_known(ServiceName::SETTINGS);
            let xml = self
                .invoke_authenticated(&settings, |client, token| async move {
                    client.retrieve_field_setup_by_type(token, None).await
                })
                .await
                .map_err(|e| call_failed(ResolutionStage::DynamicLoad, e))?;
            let setup = TypeFieldSetup::parse(&xml).map_err(|e| resolution_failed(ResolutionStage::DynamicLoad, e))?;
            ResolvedFieldSetup::dynamic(setup, self.options.strict_metadata)
        } else {
            debug!("Server predates dynamic field setup; using the bundled snapshot");
            let setup =
                TypeFieldSetup::legacy_snapshot().map_err(|e| resolution_failed(ResolutionStage::StaticFallback, e))?;
            ResolvedFieldSetup::static_fallback(setup)
        };

        if self.server_version.requires_extension_overlay() {
            let overlay = self.extension_configuration().await?;
            let summary = resolved
                .merge_overlay(&overlay)
                .map_err(|e| resolution_failed(ResolutionStage::OverlayMerge, e))?;
            debug!(
                added = summary.added,
                overridden = summary.overridden,
                rebound = summary.rebound,
                unmatched = summary.unmatched_bindings,
                "Extension configuration merged"
            );
        }

        debug!(
            source = ?resolved.source(),
            definitions = resolved.setup().len(),
            strictness = ?resolved.strictness(),
            "Type field setup ready"
        );
        Ok(resolved)
    }

    /// Reads the extension configuration value from the settings object.
    /// Missing or empty values yield an empty string.
    async fn extension_configuration(&self) -> Result<String, SessionError> {
        let request = RequestedFields::new()
            .with(RequestedField::value(
                FieldName::well_known(EXTENSION_CONFIGURATION_FIELD),
                FieldLevel::None,
            ))
            .to_xml();
        let settings = ServiceName::well_known(ServiceName::SETTINGS);
        let xml = self
            .invoke_authenticated(&settings, |client, token| async move {
                client.get_metadata(token, request).await
            })
            .await
            .map_err(|e| call_failed(ResolutionStage::OverlayMerge, e))?;
        let objects = parse_objects(&xml).map_err(|e| resolution_failed(ResolutionStage::OverlayMerge, e))?;
        Ok(objects
            .first()
            .and_then(|object| object.field_value(EXTENSION_CONFIGURATION_FIELD, FieldLevel::None))
            .unwrap_or_default()
            .to_owned())
    }

    // -----------------------------------------------------------------------
    // Current user
    // -----------------------------------------------------------------------

    /// Display name of the authenticated user, read once from the server.
    pub async fn current_user_display_name(&self) -> Result<&str, SessionError> {
        self.ensure_open()?;
        self.display_name
            .get_or_try_init(|| self.my_metadata_field(USER_NAME_FIELD))
            .await
            .map(String::as_str)
    }

    /// Working language of the authenticated user, read once from the server.
    pub async fn current_user_language(&self) -> Result<&str, SessionError> {
        self.ensure_open()?;
        self.language
            .get_or_try_init(|| self.my_metadata_field(USER_LANGUAGE_FIELD))
            .await
            .map(String::as_str)
    }

    async fn my_metadata_field(&self, field: &'static str) -> Result<String, SessionError> {
        let unavailable = |reason: String| SessionError::UserMetadataUnavailable { field, reason };

        let request = RequestedFields::new()
            .with(RequestedField::value(FieldName::well_known(field), FieldLevel::None))
            .to_xml();
        let user = ServiceName::well_known(ServiceName::USER);
        let xml = self
            .invoke_authenticated(&user, |client, token| async move {
                client.get_my_metadata(token, request).await
            })
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        let objects = parse_objects(&xml).map_err(|e| unavailable(e.to_string()))?;
        let value = objects
            .first()
            .and_then(|object| object.field_value(field, FieldLevel::None))
            .ok_or_else(|| unavailable("field not present in the response".to_owned()))?;
        debug!(field = field, "Current user metadata field resolved");
        Ok(value.to_owned())
    }

    // -----------------------------------------------------------------------
    // Services
    // -----------------------------------------------------------------------

    /// Client for `service`, shared across calls.
    pub async fn service(&self, service: &ServiceName) -> Result<Arc<F::Handle>, SessionError> {
        self.ensure_open()?;
        self.registry.get(service).await
    }

    /// Runs one authenticated operation against `service`.
    ///
    /// `op` receives the client and the current token, and returns the
    /// refreshed token next to its result. Calls on one session are
    /// serialized so that every call carries the most recent token.
    ///
    /// ```ignore
    /// let xml = session
    ///     .invoke_authenticated(&settings, |client, token| async move {
    ///         client.get_metadata(token, request).await
    ///     })
    ///     .await?;
    /// ```
    pub async fn invoke_authenticated<T, Op, Fut>(&self, service: &ServiceName, op: Op) -> Result<T, SessionError>
    where
        Op: FnOnce(Arc<F::Handle>, AuthToken) -> Fut,
        Fut: Future<Output = Result<Authenticated<T>, RpcError>>,
    {
        self.ensure_open()?;
        let client = self.registry.get(service).await?;
        self.token
            .exchange(|token| op(client, token))
            .await
            .map_err(|source| SessionError::CallFailed {
                service: service.clone(),
                source,
            })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Releases every service client. Later calls fail with
    /// [`SessionError::Closed`]; closing twice is harmless.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.registry.clear().await;
        self.token.replace(AuthToken::default()).await;
        debug!(session_id = %self.id, "Session closed");
    }

    /// Returns `true` once [`Session::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }
}

fn resolution_failed(stage: ResolutionStage, error: impl std::fmt::Display) -> SessionError {
    SessionError::FieldSetupResolutionFailed {
        stage,
        reason: error.to_string(),
        source: None,
    }
}

/// Like [`resolution_failed`], keeping the remote call failure as the source.
fn call_failed(stage: ResolutionStage, error: SessionError) -> SessionError {
    let reason = error.to_string();
    let source = match error {
        SessionError::CallFailed { source, .. } | SessionError::ServiceUnavailable { source, .. } => Some(source),
        _ => None,
    };
    SessionError::FieldSetupResolutionFailed { stage, reason, source }
}

/// Account name of the operating system user running the process.
fn ambient_user_name() -> String {
    AMBIENT_USER_VARIABLES
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}
