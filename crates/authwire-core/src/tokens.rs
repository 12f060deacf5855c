//! Bearer token types.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default lookahead before expiry at which a token is considered stale.
pub const DEFAULT_REFRESH_LOOKAHEAD_SECS: i64 = 300;

/// A short-lived credential authorizing API calls.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A longer-lived credential used solely to obtain a new access token.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// The credentials of a logged-in session.
///
/// A token without a refresh credential can never be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<RefreshToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Create a token with only an access credential.
    pub fn new(access: impl Into<String>) -> Self {
        Self {
            access: AccessToken::new(access),
            refresh: None,
            expires_at: None,
        }
    }

    /// Attach a refresh credential.
    pub fn with_refresh(mut self, refresh: impl Into<String>) -> Self {
        self.refresh = Some(RefreshToken::new(refresh));
        self
    }

    /// Attach an absolute expiry instant.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns true if this token carries a refresh credential.
    pub fn can_refresh(&self) -> bool {
        self.refresh.is_some()
    }
}

/// Decides when a token is close enough to expiry to be refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    lookahead: Duration,
}

impl ExpiryPolicy {
    /// Create a policy with the given lookahead window.
    pub fn new(lookahead: Duration) -> Self {
        Self { lookahead }
    }

    /// The lookahead window.
    pub fn lookahead(&self) -> Duration {
        self.lookahead
    }

    /// A token needs refreshing when it expires before `now + lookahead`.
    /// Tokens without an expiry never do.
    pub fn needs_refresh(&self, token: &Token, now: DateTime<Utc>) -> bool {
        let Some(expires_at) = token.expires_at else {
            return false;
        };
        match expires_at.checked_sub_signed(self.lookahead) {
            Some(refresh_at) => refresh_at < now,
            // The window reaches past the representable range.
            None => self.lookahead > Duration::zero(),
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_REFRESH_LOOKAHEAD_SECS))
    }
}
