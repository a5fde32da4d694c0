//! One SOAP service client per endpoint, implementing the session's service
//! ports.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use session::{
    ApplicationService, AuthToken, Authenticated, ChannelSettings, LoginRequest, LoginResponse, RpcError,
    ServiceEndpoint, ServiceFactory, SettingsService, TransportError, TransportErrorKind, TypeName,
    UserService,
};
use tracing::{debug, instrument};

use crate::envelope::{build_request, parse_response, service_namespace, soap_action, Param, Response};
use crate::transport::{build_client, check_size, classify};

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Service client bound to one endpoint.
#[derive(Clone)]
pub struct SoapChannel {
    client: Client,
    endpoint: ServiceEndpoint,
    namespace: String,
    max_message_size: Option<usize>,
}

impl SoapChannel {
    /// Creates a channel for `endpoint` using `settings`.
    pub fn new(endpoint: ServiceEndpoint, settings: &ChannelSettings) -> Result<Self, RpcError> {
        let client = build_client(settings.timeout, settings.trust_policy, settings.cookies)?;
        Ok(Self {
            namespace: service_namespace(endpoint.service.as_str()),
            client,
            endpoint,
            max_message_size: settings.max_message_size,
        })
    }

    /// Endpoint this channel talks to.
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    #[instrument(skip(self, params), fields(service = %self.endpoint.service))]
    async fn invoke(&self, operation: &str, params: &[(&str, Param<'_>)]) -> Result<Response, RpcError> {
        let uri = self.endpoint.url.as_str();
        let request = build_request(&self.namespace, operation, params);

        let response = self
            .client
            .post(self.endpoint.url.clone())
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", soap_action(&self.namespace, operation))
            .body(request)
            .send()
            .await
            .map_err(|e| classify(&e, uri))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify(&e, uri))?;
        check_size(body.len(), self.max_message_size, uri)?;
        debug!(status = status.as_u16(), bytes = body.len(), "Response received");

        match parse_response(&body, operation) {
            // SOAP 1.1 reports faults with status 500.
            Err(fault @ RpcError::Fault { .. }) => Err(fault),
            _ if !status.is_success() => Err(TransportError::new(
                TransportErrorKind::Status(status.as_u16()),
                uri,
                format!("server answered {status}"),
            )
            .into()),
            parsed => parsed,
        }
    }

    /// Token to adopt after a call: the returned one, or the one sent when the
    /// server returned none.
    fn refreshed(response: &mut Response, sent: AuthToken) -> AuthToken {
        response
            .take_optional("psAuthContext")
            .map(AuthToken::new)
            .unwrap_or(sent)
    }
}

#[async_trait]
impl ApplicationService for SoapChannel {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, RpcError> {
        let password = request
            .password
            .as_ref()
            .map_or(Param::Absent, |password| Param::Text(password.expose()));
        let mut response = self
            .invoke(
                "Login",
                &[
                    ("psApplication", Param::Text(request.application.as_str())),
                    ("psUserName", Param::Text(request.user_name.as_str())),
                    ("psPassword", password),
                    ("psOutAuthContext", Param::Text(request.auth_token.expose())),
                ],
            )
            .await?;
        let auth_token = response
            .take_optional("psOutAuthContext")
            .map(AuthToken::new)
            .ok_or_else(|| RpcError::malformed("login returned no authentication context"))?;
        Ok(LoginResponse { auth_token })
    }

    async fn get_version(&self) -> Result<String, RpcError> {
        self.invoke("GetVersion", &[]).await?.take("GetVersionResult")
    }
}

#[async_trait]
impl SettingsService for SoapChannel {
    async fn retrieve_field_setup_by_type(
        &self,
        auth_token: AuthToken,
        types: Option<Vec<TypeName>>,
    ) -> Result<Authenticated<String>, RpcError> {
        let types: Option<Vec<String>> = types.map(|types| types.iter().map(ToString::to_string).collect());
        let type_param = types.as_deref().map_or(Param::Absent, Param::List);
        let mut response = self
            .invoke(
                "RetrieveFieldSetupByIshType",
                &[("psAuthContext", Param::Text(auth_token.expose())), ("pasIshTypes", type_param)],
            )
            .await?;
        let setup = response.take("psOutXMLFieldSetup")?;
        Ok(Authenticated::new(Self::refreshed(&mut response, auth_token), setup))
    }

    async fn get_metadata(
        &self,
        auth_token: AuthToken,
        requested_metadata: String,
    ) -> Result<Authenticated<String>, RpcError> {
        let mut response = self
            .invoke("GetMetaData", &metadata_params(&auth_token, &requested_metadata))
            .await?;
        let objects = response.take("psOutXMLObjList")?;
        Ok(Authenticated::new(Self::refreshed(&mut response, auth_token), objects))
    }
}

#[async_trait]
impl UserService for SoapChannel {
    async fn get_my_metadata(
        &self,
        auth_token: AuthToken,
        requested_metadata: String,
    ) -> Result<Authenticated<String>, RpcError> {
        let mut response = self
            .invoke("GetMyMetaData", &metadata_params(&auth_token, &requested_metadata))
            .await?;
        let objects = response.take("psOutXMLObjList")?;
        Ok(Authenticated::new(Self::refreshed(&mut response, auth_token), objects))
    }
}

/// Parameters shared by the metadata reads. The object list is a by-reference
/// parameter and is sent empty.
fn metadata_params<'a>(auth_token: &'a AuthToken, requested_metadata: &'a str) -> [(&'static str, Param<'a>); 3] {
    [
        ("psAuthContext", Param::Text(auth_token.expose())),
        ("psXMLRequestedMetaData", Param::Text(requested_metadata)),
        ("psOutXMLObjList", Param::Text("")),
    ]
}

/// Builds [`SoapChannel`]s for a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoapChannelFactory;

impl SoapChannelFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self
    }
}

impl ServiceFactory for SoapChannelFactory {
    type Handle = SoapChannel;

    fn create(&self, endpoint: &ServiceEndpoint, settings: &ChannelSettings) -> Result<SoapChannel, RpcError> {
        SoapChannel::new(endpoint.clone(), settings)
    }
}
