//! Request lifecycle hooks.

use crate::types::HttpRequest;

/// Observes the request pipeline for telemetry.
///
/// Every attempt, including retries, produces a sent/received pair. All
/// methods default to doing nothing.
pub trait EventObserver: Send + Sync {
    fn on_request_sent(&self, _request: &HttpRequest) {}

    fn on_response_received(&self, _request: &HttpRequest, _status: u16, _body: &[u8]) {}

    fn on_response_decoded(&self, _value: &serde_json::Value) {}

    /// The session was logged out because the server kept rejecting `request`.
    fn on_unauthorized_session_ended(&self, _request: &HttpRequest) {}
}

impl<T: EventObserver + ?Sized> EventObserver for std::sync::Arc<T> {
    fn on_request_sent(&self, request: &HttpRequest) {
        (**self).on_request_sent(request)
    }

    fn on_response_received(&self, request: &HttpRequest, status: u16, body: &[u8]) {
        (**self).on_response_received(request, status, body)
    }

    fn on_response_decoded(&self, value: &serde_json::Value) {
        (**self).on_response_decoded(value)
    }

    fn on_unauthorized_session_ended(&self, request: &HttpRequest) {
        (**self).on_unauthorized_session_ended(request)
    }
}

/// An observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EventObserver for NoopObserver {}
