//! Per-endpoint authorization requirement.

use std::fmt;

/// Which bearer credential a request must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The short-lived access credential.
    Access,
    /// The refresh credential, used by token-refresh endpoints.
    Refresh,
}

/// The authorization an endpoint requires.
///
/// Chosen by the endpoint definition and attached to every request built
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthorizationRequirement {
    /// The request is sent unmodified.
    #[default]
    None,
    /// The request carries `Authorization: Bearer <token>`.
    Bearer(TokenKind),
}

impl AuthorizationRequirement {
    /// Requires the current access credential.
    pub const ACCESS_TOKEN: Self = AuthorizationRequirement::Bearer(TokenKind::Access);

    /// Requires the current refresh credential.
    pub const REFRESH_TOKEN: Self = AuthorizationRequirement::Bearer(TokenKind::Refresh);

    /// Returns true if any credential is required.
    pub fn is_required(&self) -> bool {
        !matches!(self, AuthorizationRequirement::None)
    }
}

impl fmt::Display for AuthorizationRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationRequirement::None => f.write_str("none"),
            AuthorizationRequirement::Bearer(TokenKind::Access) => f.write_str("bearer:access"),
            AuthorizationRequirement::Bearer(TokenKind::Refresh) => f.write_str("bearer:refresh"),
        }
    }
}
