//! Network transport trait.

use async_trait::async_trait;

use crate::Result;
use crate::types::{HttpRequest, HttpResponse};

/// Executes a request and returns the raw response.
///
/// Any status code is a successful send; only failures to obtain a response
/// are errors. Timeouts must be reported as
/// [`TransportError::Timeout`](crate::error::TransportError::Timeout) so the
/// pipeline can retry them.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).send(request).await
    }
}
