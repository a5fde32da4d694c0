//! Per-session cache of service clients.
//!
//! A client is constructed on first use of its service name and shared
//! afterwards. Construction happens under the write lock, so concurrent first
//! requests for the same service still build exactly one client.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::ports::{ChannelSettings, ServiceEndpoint, ServiceFactory};
use crate::{RpcError, ServiceName, SessionError};

/// Lazily populated map from service name to client handle.
pub struct ServiceRegistry<F: ServiceFactory> {
    factory: F,
    base_url: Url,
    settings: ChannelSettings,
    handles: RwLock<HashMap<ServiceName, Arc<F::Handle>>>,
}

impl<F: ServiceFactory> ServiceRegistry<F> {
    /// Creates an empty registry. `base_url` must end in `/`.
    pub fn new(factory: F, base_url: Url, settings: ChannelSettings) -> Self {
        Self {
            factory,
            base_url,
            settings,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the client for `service`, constructing it on first use.
    pub async fn get(&self, service: &ServiceName) -> Result<Arc<F::Handle>, SessionError> {
        if let Some(handle) = self.handles.read().await.get(service) {
            return Ok(Arc::clone(handle));
        }

        let mut handles = self.handles.write().await;
        if let Some(handle) = handles.get(service) {
            return Ok(Arc::clone(handle));
        }

        let endpoint = ServiceEndpoint::for_service(&self.base_url, service).map_err(|e| {
            SessionError::ServiceUnavailable {
                service: service.clone(),
                source: RpcError::malformed(format!("cannot derive endpoint: {e}")),
            }
        })?;
        let handle = self
            .factory
            .create(&endpoint, &self.settings)
            .map_err(|source| SessionError::ServiceUnavailable {
                service: service.clone(),
                source,
            })?;
        debug!(service = %service, endpoint = %endpoint.url, "Service client created");

        let handle = Arc::new(handle);
        handles.insert(service.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Number of clients created so far.
    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }

    /// Returns `true` if no client has been created.
    pub async fn is_empty(&self) -> bool {
        self.handles.read().await.is_empty()
    }

    /// Drops every cached client. Handles still held by callers stay valid.
    pub async fn clear(&self) {
        self.handles.write().await.clear();
    }

    /// Channel settings every client is built with.
    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }
}
