//! Token refresh over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use authwire_core::error::{AuthError, ResponseError};
use authwire_core::{
    AccessToken, ExpiryPolicy, HttpRequest, Method, RefreshToken, Result, Token, TokenRefresher,
    Transport,
};

/// Response body of a refresh endpoint.
///
/// Accepts both camelCase and OAuth2 snake_case field names.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "access_token")]
    access_token: String,
    #[serde(default, alias = "refresh_token")]
    refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default, alias = "expires_in")]
    expires_in: Option<i64>,
}

/// Refreshes tokens by POSTing to an endpoint with the refresh credential
/// as a bearer token.
///
/// If the server does not rotate the refresh credential, the previous one
/// is kept.
#[derive(Clone)]
pub struct HttpTokenRefresher {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    policy: ExpiryPolicy,
}

impl HttpTokenRefresher {
    pub fn new(transport: impl Transport + 'static, endpoint: Url) -> Self {
        Self {
            transport: Arc::new(transport),
            endpoint,
            policy: ExpiryPolicy::default(),
        }
    }

    /// Use a custom expiry policy.
    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    #[instrument(skip(self, current), fields(endpoint = %self.endpoint))]
    async fn refresh(&self, current: &Token) -> Result<Token> {
        let refresh = current.refresh.as_ref().ok_or(AuthError::NoRefreshToken)?;

        let request = HttpRequest::new(Method::Post, self.endpoint.clone())
            .with_header("Accept", "application/json")
            .with_bearer(refresh.as_str());
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(ResponseError::from_body(response.status, &response.body).into());
        }

        let body: RefreshResponse = serde_json::from_slice(&response.body)?;
        debug!(rotated = body.refresh_token.is_some(), "Refresh endpoint answered");

        Ok(Token {
            access: AccessToken::new(body.access_token),
            refresh: body
                .refresh_token
                .map(RefreshToken::new)
                .or_else(|| current.refresh.clone()),
            expires_at: body.expires_in.and_then(expiry_after),
        })
    }

    fn needs_refresh(&self, token: &Token, now: DateTime<Utc>) -> bool {
        self.policy.needs_refresh(token, now)
    }
}

/// Absolute expiry for a lifetime in seconds. Lifetimes beyond the
/// representable range are stored as no expiry.
fn expiry_after(secs: i64) -> Option<DateTime<Utc>> {
    let expiry = Duration::try_seconds(secs).and_then(|d| Utc::now().checked_add_signed(d));
    if expiry.is_none() {
        warn!(expires_in = secs, "Ignoring out of range token lifetime");
    }
    expiry
}

impl std::fmt::Debug for HttpTokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenRefresher")
            .field("endpoint", &self.endpoint.as_str())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use authwire_core::error::ResponseErrorKind;
    use authwire_core::{Error, HttpResponse};

    struct Canned {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn refresher(status: u16, body: &str) -> (Arc<Canned>, HttpTokenRefresher) {
        let transport = Arc::new(Canned {
            response: HttpResponse::new(status, body),
            seen: Mutex::new(Vec::new()),
        });
        let endpoint = Url::parse("https://auth.example.com/token/refresh").unwrap();
        (transport.clone(), HttpTokenRefresher::new(transport, endpoint))
    }

    #[tokio::test]
    async fn sends_refresh_credential_and_parses_rotation() {
        let (transport, refresher) = refresher(
            200,
            r#"{"accessToken": "A2", "refreshToken": "R2", "expiresIn": 3600}"#,
        );
        let current = Token::new("A1").with_refresh("R1");

        let token = refresher.refresh(&current).await.unwrap();
        assert_eq!(token.access.as_str(), "A2");
        assert_eq!(token.refresh.unwrap().as_str(), "R2");
        let expires_at = token.expires_at.unwrap();
        assert!(expires_at > Utc::now() + Duration::seconds(3500));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(seen[0].authorization(), Some("Bearer R1"));
    }

    #[tokio::test]
    async fn keeps_refresh_credential_when_not_rotated() {
        let (_, refresher) = refresher(200, r#"{"access_token": "A2"}"#);
        let current = Token::new("A1").with_refresh("R1");

        let token = refresher.refresh(&current).await.unwrap();
        assert_eq!(token.access.as_str(), "A2");
        assert_eq!(token.refresh.unwrap().as_str(), "R1");
        assert!(token.expires_at.is_none());
    }

    #[tokio::test]
    async fn out_of_range_lifetime_is_stored_without_expiry() {
        for expires_in in ["100000000000000000", "9223372036854775807", "-9223372036854775808"] {
            let body = format!(
                r#"{{"accessToken": "A2", "refreshToken": "R2", "expiresIn": {expires_in}}}"#
            );
            let (_, refresher) = refresher(200, &body);
            let current = Token::new("A1").with_refresh("R1");

            let token = refresher.refresh(&current).await.unwrap();
            assert_eq!(token.access.as_str(), "A2");
            assert_eq!(token.refresh.unwrap().as_str(), "R2");
            assert!(token.expires_at.is_none());
        }
    }

    #[tokio::test]
    async fn rejected_refresh_is_an_error() {
        let (_, refresher) = refresher(400, r#"{"error": "invalid_grant"}"#);
        let current = Token::new("A1").with_refresh("R1");

        let err = refresher.refresh(&current).await.unwrap_err();
        match err {
            Error::Response(err) => assert_eq!(err.kind, ResponseErrorKind::BadRequest),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn token_without_refresh_credential_is_not_sent() {
        let (transport, refresher) = refresher(200, "{}");

        let err = refresher.refresh(&Token::new("A1")).await.unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::NoRefreshToken)));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn uses_configured_policy() {
        let (_, refresher) = refresher(200, "{}");
        let refresher = refresher.with_policy(ExpiryPolicy::new(Duration::seconds(10)));
        let now = Utc::now();
        let token = Token::new("A1").with_expiry(now + Duration::seconds(60));
        assert!(!refresher.needs_refresh(&token, now));
    }
}
