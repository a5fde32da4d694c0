//! Connection configuration discovery.
//!
//! Every server publishes a small unauthenticated bootstrap document next to
//! its web services:
//!
//! ```xml
//! <connectionconfiguration version="1.0.0.0">
//!   <infosharewsurl>https://example.com/ISHWS/</infosharewsurl>
//!   <applicationname>InfoShareAuthor</applicationname>
//!   <softwareversion>14.0.4</softwareversion>
//! </connectionconfiguration>
//! ```
//!
//! The discovered service URL is informational only. When it differs from the
//! URL the caller supplied, the difference is logged and the caller's URL is
//! used for every subsequent call.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::ports::BootstrapTransport;
use crate::{ApplicationName, SessionError, TransportErrorKind};

/// File name of the bootstrap document below the base URL.
pub const CONNECTION_CONFIGURATION_DOCUMENT: &str = "connectionconfiguration.xml";

/// Parsed bootstrap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfiguration {
    /// Canonical web services URL as announced by the server.
    pub service_url: Url,
    /// Application name to pass to login.
    pub application_name: ApplicationName,
    /// Software version hint; authoritative version comes from `GetVersion`.
    pub software_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConnectionConfigurationDocument {
    #[serde(default)]
    infosharewsurl: Option<String>,
    #[serde(default)]
    applicationname: Option<String>,
    #[serde(default)]
    softwareversion: Option<String>,
}

impl ConnectionConfiguration {
    /// Parses the bootstrap document. Returns a description of the problem on
    /// failure.
    pub fn parse(xml: &str) -> Result<Self, String> {
        let document: ConnectionConfigurationDocument =
            quick_xml::de::from_str(xml).map_err(|e| format!("not a connection configuration document: {e}"))?;

        let service_url = document
            .infosharewsurl
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "missing web services URL".to_owned())?;
        let service_url =
            Url::parse(&service_url).map_err(|e| format!("invalid web services URL '{service_url}': {e}"))?;

        let application_name = document
            .applicationname
            .and_then(|s| ApplicationName::new(s.trim()))
            .ok_or_else(|| "missing application name".to_owned())?;

        let software_version = document
            .softwareversion
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        Ok(Self {
            service_url,
            application_name,
            software_version,
        })
    }

    /// Fetches and parses the bootstrap document below `base_url`.
    ///
    /// `base_url` must already be normalized (see [`normalize_base_url`]).
    pub async fn load(
        transport: &dyn BootstrapTransport,
        base_url: &Url,
    ) -> Result<Self, SessionError> {
        let uri = document_uri(base_url)?;
        debug!(uri = %uri, "Loading connection configuration");

        let body = transport.fetch(&uri).await.map_err(|e| match e.kind {
            TransportErrorKind::Status(status) => SessionError::ConfigUnavailable {
                uri: uri.to_string(),
                reason: format!("server answered HTTP {status}"),
            },
            _ => SessionError::Transport(e),
        })?;
        let text = String::from_utf8(body).map_err(|e| SessionError::ConfigUnavailable {
            uri: uri.to_string(),
            reason: format!("document is not UTF-8: {e}"),
        })?;
        let configuration = Self::parse(&text).map_err(|reason| SessionError::ConfigUnavailable {
            uri: uri.to_string(),
            reason,
        })?;

        debug!(
            service_url = %configuration.service_url,
            application = %configuration.application_name,
            software_version = configuration.software_version.as_deref().unwrap_or(""),
            "Connection configuration loaded"
        );
        if !configuration.matches_base_url(base_url) {
            debug!(
                supplied = %base_url,
                discovered = %configuration.service_url,
                "Discovered web services URL differs from the supplied one; using the supplied URL"
            );
        }
        Ok(configuration)
    }

    /// Returns `true` if the announced URL equals `base_url`, ignoring a
    /// missing trailing separator.
    pub fn matches_base_url(&self, base_url: &Url) -> bool {
        self.service_url.as_str().trim_end_matches('/') == base_url.as_str().trim_end_matches('/')
    }
}

/// Parses `base_url` and ensures its path ends in exactly one `/`.
pub fn normalize_base_url(base_url: &str) -> Result<Url, SessionError> {
    let mut url = Url::parse(base_url.trim()).map_err(|e| SessionError::InvalidConfiguration {
        message: format!("invalid base URL '{base_url}': {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(SessionError::InvalidConfiguration {
            message: format!("base URL '{base_url}' cannot carry a path"),
        });
    }
    let path = format!("{}/", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

/// URI of the bootstrap document below a normalized base URL.
pub fn document_uri(base_url: &Url) -> Result<Url, SessionError> {
    base_url
        .join(CONNECTION_CONFIGURATION_DOCUMENT)
        .map_err(|e| SessionError::InvalidConfiguration {
            message: format!("cannot derive bootstrap URI from '{base_url}': {e}"),
        })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::TransportError;

    /// Answers every fetch with the same failure.
    struct FailingTransport(TransportErrorKind);

    #[async_trait]
    impl BootstrapTransport for FailingTransport {
        async fn fetch(&self, uri: &Url) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::new(self.0, uri.as_str(), "refused"))
        }
    }

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<connectionconfiguration version="1.0.0.0">
  <infosharewsurl>https://cms.example.com/ISHWS/</infosharewsurl>
  <applicationname>InfoShareAuthor</applicationname>
  <softwareversion>14.0.4</softwareversion>
  <authenticationtype>UsernamePassword</authenticationtype>
</connectionconfiguration>"#;

    #[test]
    fn parses_required_elements_and_ignores_others() {
        let configuration = ConnectionConfiguration::parse(DOCUMENT).unwrap();
        assert_eq!(configuration.service_url.as_str(), "https://cms.example.com/ISHWS/");
        assert_eq!(configuration.application_name.as_str(), "InfoShareAuthor");
        assert_eq!(configuration.software_version.as_deref(), Some("14.0.4"));
    }

    #[test]
    fn missing_application_name_is_rejected() {
        let xml = "<connectionconfiguration><infosharewsurl>https://a/</infosharewsurl></connectionconfiguration>";
        let err = ConnectionConfiguration::parse(xml).unwrap_err();
        assert!(err.contains("application name"), "{err}");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(ConnectionConfiguration::parse("<html><body>502 Bad Gateway").is_err());
        assert!(ConnectionConfiguration::parse("").is_err());
    }

    #[test]
    fn base_url_gets_exactly_one_trailing_separator() {
        for input in [
            "https://example.com/ISHWS",
            "https://example.com/ISHWS/",
            "https://example.com/ISHWS//",
        ] {
            let base = normalize_base_url(input).unwrap();
            assert_eq!(base.as_str(), "https://example.com/ISHWS/");
            assert_eq!(
                document_uri(&base).unwrap().as_str(),
                "https://example.com/ISHWS/connectionconfiguration.xml"
            );
        }
    }

    #[test]
    fn host_only_base_url_gets_root_path() {
        let base = normalize_base_url("https://example.com").unwrap();
        assert_eq!(
            document_uri(&base).unwrap().as_str(),
            "https://example.com/connectionconfiguration.xml"
        );
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(SessionError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            normalize_base_url("mailto:someone@example.com"),
            Err(SessionError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn url_match_ignores_trailing_separator() {
        let configuration = ConnectionConfiguration::parse(DOCUMENT).unwrap();
        assert!(configuration.matches_base_url(&Url::parse("https://cms.example.com/ISHWS").unwrap()));
        assert!(!configuration.matches_base_url(&Url::parse("https://other.example.com/ISHWS/").unwrap()));
    }

    #[tokio::test]
    async fn http_status_on_bootstrap_is_config_unavailable() {
        let base = normalize_base_url("https://cms.example.com/ISHWS").unwrap();
        let err = ConnectionConfiguration::load(&FailingTransport(TransportErrorKind::Status(404)), &base)
            .await
            .unwrap_err();
        match err {
            SessionError::ConfigUnavailable { uri, reason } => {
                assert_eq!(uri, "https://cms.example.com/ISHWS/connectionconfiguration.xml");
                assert!(reason.contains("404"), "{reason}");
            }
            other => panic!("expected ConfigUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn network_failure_on_bootstrap_stays_a_transport_error() {
        let base = normalize_base_url("https://cms.example.com/ISHWS").unwrap();
        for kind in [TransportErrorKind::Connect, TransportErrorKind::Timeout, TransportErrorKind::Tls] {
            let err = ConnectionConfiguration::load(&FailingTransport(kind), &base)
                .await
                .unwrap_err();
            assert!(matches!(err, SessionError::Transport(ref e) if e.kind == kind), "{err:?}");
        }
    }
}
