//! HTTP plumbing shared by the bootstrap fetch and the SOAP channels.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use session::{BootstrapTransport, TransportError, TransportErrorKind, TrustPolicy};
use tracing::{debug, warn};
use url::Url;

/// Builds a client honouring the session's timeout and trust policy.
///
/// The timeout bounds both the connect phase and the whole request.
pub(crate) fn build_client(
    timeout: Duration,
    trust_policy: TrustPolicy,
    cookies: bool,
) -> Result<Client, TransportError> {
    if trust_policy.is_insecure() {
        warn!("Building an HTTP client that accepts any server certificate");
    }
    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .cookie_store(cookies)
        .danger_accept_invalid_certs(trust_policy.is_insecure())
        .build()
        .map_err(|e| TransportError::new(TransportErrorKind::Other, "", format!("cannot build HTTP client: {e}")))
}

/// Maps a reqwest failure onto a [`TransportError`].
pub(crate) fn classify(err: &reqwest::Error, uri: &str) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        if mentions_tls(err) {
            TransportErrorKind::Tls
        } else {
            TransportErrorKind::Connect
        }
    } else if let Some(status) = err.status() {
        TransportErrorKind::Status(status.as_u16())
    } else if err.is_body() || err.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, uri, full_message(err))
}

/// Rejects bodies above `limit`, when one is set.
pub(crate) fn check_size(len: usize, limit: Option<usize>, uri: &str) -> Result<(), TransportError> {
    match limit {
        Some(limit) if len > limit => Err(TransportError::new(
            TransportErrorKind::Body,
            uri,
            format!("response of {len} bytes exceeds the {limit} byte limit"),
        )),
        _ => Ok(()),
    }
}

fn mentions_tls(err: &reqwest::Error) -> bool {
    let message = full_message(err).to_ascii_lowercase();
    ["certificate", "tls", "handshake"]
        .iter()
        .any(|needle| message.contains(needle))
}

fn full_message(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Unauthenticated GET transport for the bootstrap document.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport. No cookies, no retries.
    pub fn new(timeout: Duration, trust_policy: TrustPolicy) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(timeout, trust_policy, false)?,
        })
    }
}

#[async_trait]
impl BootstrapTransport for HttpTransport {
    async fn fetch(&self, uri: &Url) -> Result<Vec<u8>, TransportError> {
        debug!(uri = %uri, "GET");
        let response = self
            .client
            .get(uri.clone())
            .send()
            .await
            .map_err(|e| classify(&e, uri.as_str()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                TransportErrorKind::Status(status.as_u16()),
                uri.as_str(),
                format!("server answered {status}"),
            ));
        }

        let body = response.bytes().await.map_err(|e| classify(&e, uri.as_str()))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_limit_is_optional() {
        assert!(check_size(10, None, "u").is_ok());
        assert!(check_size(10, Some(10), "u").is_ok());
        let err = check_size(11, Some(10), "u").unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Body);
    }

    #[test]
    fn clients_build_for_both_trust_policies() {
        for policy in [TrustPolicy::ValidateCertificates, TrustPolicy::AcceptAnyCertificate] {
            assert!(HttpTransport::new(Duration::from_secs(1), policy).is_ok());
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connect_failure() {
        let transport = HttpTransport::new(Duration::from_secs(2), TrustPolicy::default()).unwrap();
        // Port 9 on loopback is closed in test environments.
        let uri = Url::parse("http://127.0.0.1:9/ISHWS/connectionconfiguration.xml").unwrap();
        let err = transport.fetch(&uri).await.unwrap_err();
        assert!(
            matches!(err.kind, TransportErrorKind::Connect | TransportErrorKind::Timeout),
            "{err:?}"
        );
    }
}
