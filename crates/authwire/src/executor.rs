//! Sending signed requests with the bounded retry policy.
//!
//! Each logical request gets at most one retry, chosen by the first failure:
//!
//! - a transport timeout or a status outside 200..=499 is resent once with
//!   the same credentials;
//! - a 401 on an access-token request forces a token refresh and is
//!   replayed once. If the replay fails for any reason, or the refresh
//!   itself fails, the session is logged out and
//!   [`AuthError::UnauthorizedSession`] is returned;
//! - a 401 on a refresh-token request ends the session straight away. A
//!   rejected refresh credential cannot be repaired by refreshing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use authwire_core::error::{AuthError, ResponseError, TransportError};
use authwire_core::{
    AuthorizationRequirement, Error, EventObserver, HttpRequest, HttpResponse, Result, Transport,
};

use crate::signer::RequestSigner;

/// How a response status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx: the body is handed to the decoder.
    Success,
    /// Outside 200..=499: resent once.
    Transient,
    /// 401: refresh and replay once.
    Unauthorized,
    /// Any other 3xx or 4xx: surfaced without retry.
    Rejected,
}

/// Classify a response status.
pub fn classify_status(status: u16) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        401 => ResponseClass::Unauthorized,
        300..=499 => ResponseClass::Rejected,
        _ => ResponseClass::Transient,
    }
}

/// Result of a single attempt.
#[derive(Debug)]
enum Outcome {
    Success(HttpResponse),
    RetryTransient(Error),
    RetryUnauthorized(Error),
    Failure(Error),
}

/// Executes signed requests against a transport.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    signer: RequestSigner,
    observer: Arc<dyn EventObserver>,
    request_timeout: Option<Duration>,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        signer: RequestSigner,
        observer: Arc<dyn EventObserver>,
    ) -> Self {
        Self {
            transport,
            signer,
            observer,
            request_timeout: None,
        }
    }

    /// Bound every attempt by `timeout`; elapsed attempts count as transport timeouts.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    pub(crate) fn observer(&self) -> &dyn EventObserver {
        self.observer.as_ref()
    }

    /// Sign, send and classify `request`, retrying at most once.
    ///
    /// Returns the 2xx response.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url, %requirement))]
    pub async fn execute(
        &self,
        request: HttpRequest,
        requirement: AuthorizationRequirement,
    ) -> Result<HttpResponse> {
        let signed = match self.signer.sign(request.clone(), requirement).await {
            Ok(signed) => signed,
            Err(err) => return Err(self.signing_failed(err).await),
        };

        match self.attempt(signed, requirement).await {
            Outcome::Success(response) => Ok(response),
            Outcome::Failure(err) => Err(err),
            Outcome::RetryTransient(err) => {
                warn!(error = %err, "Transient failure, retrying once");
                self.retry_transient(request, requirement).await
            }
            Outcome::RetryUnauthorized(err)
                if requirement == AuthorizationRequirement::REFRESH_TOKEN =>
            {
                warn!(error = %err, "Refresh credential rejected");
                Err(self.end_session(&request, err).await)
            }
            Outcome::RetryUnauthorized(err) => {
                warn!(error = %err, "Request unauthorized, refreshing token and retrying once");
                self.retry_unauthorized(request, requirement).await
            }
        }
    }

    async fn retry_transient(
        &self,
        request: HttpRequest,
        requirement: AuthorizationRequirement,
    ) -> Result<HttpResponse> {
        let signed = match self.signer.sign(request, requirement).await {
            Ok(signed) => signed,
            Err(err) => return Err(self.signing_failed(err).await),
        };

        match self.attempt(signed, requirement).await {
            Outcome::Success(response) => Ok(response),
            Outcome::RetryTransient(err)
            | Outcome::RetryUnauthorized(err)
            | Outcome::Failure(err) => Err(err),
        }
    }

    async fn retry_unauthorized(
        &self,
        request: HttpRequest,
        requirement: AuthorizationRequirement,
    ) -> Result<HttpResponse> {
        let signed = match self
            .signer
            .sign_with_refresh(request.clone(), requirement)
            .await
        {
            Ok(signed) => signed,
            Err(err) => return Err(self.end_session(&request, err).await),
        };

        match self.attempt(signed, requirement).await {
            Outcome::Success(response) => Ok(response),
            Outcome::RetryTransient(err)
            | Outcome::RetryUnauthorized(err)
            | Outcome::Failure(err) => Err(self.end_session(&request, err).await),
        }
    }

    /// A refresh failure while signing ends the session; other signing
    /// errors pass through.
    async fn signing_failed(&self, err: Error) -> Error {
        if matches!(err, Error::Auth(AuthError::AuthorizationFailed { .. })) {
            self.logout().await;
        }
        err
    }

    /// Log out and report the session end, unless the session is already
    /// gone (for example ended by a request made from inside the refresh).
    async fn end_session(&self, request: &HttpRequest, cause: Error) -> Error {
        if self.signer.provider().is_authenticated() {
            warn!(error = %cause, "Ending unauthorized session");
            self.logout().await;
            self.observer.on_unauthorized_session_ended(request);
        } else {
            debug!(error = %cause, "Session already ended");
        }
        AuthError::unauthorized_session(cause).into()
    }

    async fn logout(&self) {
        if let Err(err) = self.signer.provider().logout().await {
            warn!(error = %err, "Failed to clear stored token");
        }
    }

    /// Send one signed request and classify the result.
    async fn attempt(&self, request: HttpRequest, requirement: AuthorizationRequirement) -> Outcome {
        self.observer.on_request_sent(&request);
        debug!("Sending request");

        let sent = match self.request_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.transport.send(request.clone())).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout {
                        duration_ms: limit.as_millis() as u64,
                    }
                    .into()),
                }
            }
            None => self.transport.send(request.clone()).await,
        };

        let response = match sent {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return Outcome::RetryTransient(err),
            Err(err) => return Outcome::Failure(err),
        };

        self.observer
            .on_response_received(&request, response.status, &response.body);
        debug!(status = response.status, "Response received");

        match classify_status(response.status) {
            ResponseClass::Success => Outcome::Success(response),
            ResponseClass::Transient => Outcome::RetryTransient(rejection(&response)),
            ResponseClass::Unauthorized if requirement.is_required() => {
                Outcome::RetryUnauthorized(rejection(&response))
            }
            ResponseClass::Unauthorized | ResponseClass::Rejected => {
                Outcome::Failure(rejection(&response))
            }
        }
    }
}

fn rejection(response: &HttpResponse) -> Error {
    ResponseError::from_body(response.status, &response.body).into()
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("signer", &self.signer)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
