//! Per-request observers.

use tracing::debug;

use super::{RestRequest, RestResponse};

/// Hook invoked after every remote call, success or not.
pub trait RequestObserver: Send + Sync {
    fn observe(&self, request: &RestRequest, response: &RestResponse);
}

/// Pretty-prints each request/response pair through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn observe(&self, request: &RestRequest, response: &RestResponse) {
        let body = match &request.body {
            Some(body) => serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string()),
            None => "None".to_string(),
        };
        // Saved configs come back as binary blobs.
        let reply = match serde_json::from_slice::<serde_json::Value>(&response.body) {
            Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_default(),
            Err(_) => "binary content".to_string(),
        };
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "\nREQUEST\nJSON:    {}\nRESPONSE\nHeaders: {:?}\nJSON:    {}",
            body,
            response.headers,
            reply
        );
    }
}

/// Observer that does nothing (for testing)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn observe(&self, _request: &RestRequest, _response: &RestResponse) {}
}
