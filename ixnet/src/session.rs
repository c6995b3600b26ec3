//! The aggregate session object.
//!
//! [`IxNetworkSession`] owns the transport handle, the request observer and
//! the [`ResourceStore`]. The topology chain, traffic and service operations
//! live in their own modules as further `impl` blocks on this type.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{IxError, Result};
use crate::store::ResourceStore;
use crate::transport::{
    HttpTransport, RequestObserver, RestRequest, RestResponse, RestTransport, SessionConfig,
    TracingObserver,
};

/// Root of the single appliance session every call targets.
pub const SESSION_ROOT: &str = "/api/v1/sessions/1/ixnetwork";

/// Join a suffix onto [`SESSION_ROOT`].
pub(crate) fn session_path(suffix: &str) -> String {
    format!("{}{}", SESSION_ROOT, suffix)
}

/// One appliance session and the resources created through it.
///
/// Not meant to be shared between tasks: the store assumes one writer.
pub struct IxNetworkSession {
    transport: Arc<dyn RestTransport>,
    observer: Arc<dyn RequestObserver>,
    pub(crate) store: ResourceStore,
}

impl IxNetworkSession {
    /// Wrap an already authenticated transport.
    pub fn new(transport: Arc<dyn RestTransport>) -> Self {
        Self {
            transport,
            observer: Arc::new(TracingObserver),
            store: ResourceStore::new(),
        }
    }

    /// Log in over HTTP and wrap the resulting transport.
    pub async fn connect(config: &SessionConfig) -> Result<Self> {
        let transport = HttpTransport::connect(config).await?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Replace the observer called after every request.
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Hrefs collected so far.
    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Send one request, notify the observer, and reject non-2xx replies.
    pub(crate) async fn call(&self, request: RestRequest) -> Result<RestResponse> {
        let response = self.transport.send(&request).await?;
        self.observer.observe(&request, &response);

        if !response.is_success() {
            return Err(IxError::Http {
                method: request.method.to_string(),
                path: request.path,
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response)
    }

    pub(crate) async fn get(&self, path: impl Into<String>) -> Result<RestResponse> {
        self.call(RestRequest::get(path)).await
    }

    pub(crate) async fn post(&self, path: impl Into<String>, body: Value) -> Result<RestResponse> {
        self.call(RestRequest::post(path, body)).await
    }

    pub(crate) async fn patch(&self, path: impl Into<String>, body: Value) -> Result<RestResponse> {
        self.call(RestRequest::patch(path, body)).await
    }
}
