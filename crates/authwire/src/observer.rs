//! `tracing`-backed event observer.

use tracing::{debug, trace, warn};

use authwire_core::{EventObserver, HttpRequest};

/// Emits pipeline events as `tracing` events.
///
/// Bodies are only logged at `trace` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn on_request_sent(&self, request: &HttpRequest) {
        debug!(method = %request.method, url = %request.url, "request sent");
    }

    fn on_response_received(&self, request: &HttpRequest, status: u16, body: &[u8]) {
        debug!(method = %request.method, url = %request.url, status, len = body.len(), "response received");
        trace!(body = %String::from_utf8_lossy(body), "response body");
    }

    fn on_response_decoded(&self, value: &serde_json::Value) {
        trace!(%value, "response decoded");
    }

    fn on_unauthorized_session_ended(&self, request: &HttpRequest) {
        warn!(method = %request.method, url = %request.url, "session ended after repeated unauthorized response");
    }
}
