//! Attaching bearer credentials to outgoing requests.

use tracing::{debug, instrument};

use authwire_core::{AuthorizationRequirement, HttpRequest, Result, TokenKind};

use crate::provider::TokenProvider;

/// Turns a request and its [`AuthorizationRequirement`] into an authorized request.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    provider: TokenProvider,
}

impl RequestSigner {
    pub fn new(provider: TokenProvider) -> Self {
        Self { provider }
    }

    /// The provider credentials are fetched from.
    pub fn provider(&self) -> &TokenProvider {
        &self.provider
    }

    /// Sign a request with the credential its requirement names.
    ///
    /// Requests that need no authorization are returned unmodified.
    #[instrument(skip(self, request), fields(method = %request.method, %requirement))]
    pub async fn sign(
        &self,
        request: HttpRequest,
        requirement: AuthorizationRequirement,
    ) -> Result<HttpRequest> {
        match requirement {
            AuthorizationRequirement::None => Ok(request),
            AuthorizationRequirement::Bearer(TokenKind::Access) => {
                let token = self.provider.get_access_token(false).await?;
                Ok(request.with_bearer(token.as_str()))
            }
            AuthorizationRequirement::Bearer(TokenKind::Refresh) => {
                let token = self.provider.get_refresh_token().await?;
                Ok(request.with_bearer(token.as_str()))
            }
        }
    }

    /// Force a token refresh, then sign. Used to replay a request the
    /// server rejected as unauthorized.
    ///
    /// Refresh-token requests are signed with the stored refresh credential
    /// and never trigger a refresh: the refresh call may itself be such a
    /// request.
    #[instrument(skip(self, request), fields(method = %request.method, %requirement))]
    pub async fn sign_with_refresh(
        &self,
        request: HttpRequest,
        requirement: AuthorizationRequirement,
    ) -> Result<HttpRequest> {
        match requirement {
            AuthorizationRequirement::None => Ok(request),
            AuthorizationRequirement::Bearer(TokenKind::Access) => {
                let token = self.provider.get_access_token(true).await?;
                debug!("Re-signed with refreshed access token");
                Ok(request.with_bearer(token.as_str()))
            }
            AuthorizationRequirement::Bearer(TokenKind::Refresh) => {
                let token = self.provider.get_refresh_token().await?;
                Ok(request.with_bearer(token.as_str()))
            }
        }
    }
}
