//! SOAP/HTTP adapter for the session ports.
//!
//! Implements [`session::BootstrapTransport`] over a plain HTTP GET and the
//! service ports ([`session::ApplicationService`], [`session::SettingsService`],
//! [`session::UserService`]) over SOAP 1.1 document/literal calls.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP client construction, trust policy, timeouts and
//! envelope encoding live here. The [`session`] crate sees only its ports.
//!
//! ## Endpoints
//!
//! Each service is reached at `{base_url}{service lowercased}.asmx`, e.g.
//! `https://example.com/ISHWS/application25.asmx`, with a `SOAPAction` of
//! `"urn:trisoft-com:ISH.WS.{service}/{operation}"`.

pub mod channel;
pub mod envelope;
pub mod transport;

pub use channel::{SoapChannel, SoapChannelFactory};
pub use transport::HttpTransport;

use session::{Session, SessionConfig, SessionError};

/// A session whose services are reached over SOAP.
pub type SoapSession = Session<SoapChannelFactory>;

/// Opens a session over HTTP using `config`'s timeout and trust policy for
/// every connection.
pub async fn connect(config: SessionConfig) -> Result<SoapSession, SessionError> {
    let transport = HttpTransport::new(config.timeout, config.trust_policy)?;
    Session::open(config, &transport, SoapChannelFactory::new()).await
}
