//! Token refresh trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::tokens::{ExpiryPolicy, Token};

/// Obtains replacement tokens and decides when a token is stale.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `current` for a fresh token.
    ///
    /// Only called with tokens that carry a refresh credential.
    async fn refresh(&self, current: &Token) -> Result<Token>;

    /// Whether `token` should be refreshed before use at `now`.
    ///
    /// Defaults to [`ExpiryPolicy::default`] (five minute lookahead).
    fn needs_refresh(&self, token: &Token, now: DateTime<Utc>) -> bool {
        ExpiryPolicy::default().needs_refresh(token, now)
    }
}

#[async_trait]
impl<T: TokenRefresher + ?Sized> TokenRefresher for std::sync::Arc<T> {
    async fn refresh(&self, current: &Token) -> Result<Token> {
        (**self).refresh(current).await
    }

    fn needs_refresh(&self, token: &Token, now: DateTime<Utc>) -> bool {
        (**self).needs_refresh(token, now)
    }
}
