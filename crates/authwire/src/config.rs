//! Client configuration.

use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

use authwire_core::ExpiryPolicy;

/// Tunables for a [`Client`](crate::Client).
///
/// Deserializable so it can be embedded in a host application's config file:
///
/// ```
/// let config: authwire::ClientConfig =
///     serde_json::from_str(r#"{"request_timeout_ms": 5000}"#).unwrap();
/// assert_eq!(config.request_timeout_ms, Some(5000));
/// assert!(config.expiry_policy().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Refresh tokens that expire within this many seconds. `None` leaves
    /// the decision to the refresher's own policy.
    pub refresh_lookahead_secs: Option<u64>,
    /// Per-attempt timeout. `None` leaves timeouts to the transport.
    pub request_timeout_ms: Option<u64>,
}

impl ClientConfig {
    /// Expiry policy overriding the refresher's, if one is configured.
    ///
    /// Lookaheads too large to represent saturate, which refreshes before
    /// every request.
    pub fn expiry_policy(&self) -> Option<ExpiryPolicy> {
        self.refresh_lookahead_secs.map(|secs| {
            let lookahead = i64::try_from(secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .unwrap_or(TimeDelta::MAX);
            ExpiryPolicy::new(lookahead)
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert!(config.expiry_policy().is_none());
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn oversized_lookahead_saturates() {
        for secs in [u64::MAX, i64::MAX as u64] {
            let config = ClientConfig {
                refresh_lookahead_secs: Some(secs),
                ..ClientConfig::default()
            };
            assert_eq!(
                config.expiry_policy().map(|p| p.lookahead()),
                Some(TimeDelta::MAX)
            );
        }

        let config = ClientConfig {
            refresh_lookahead_secs: Some(10_000_000_000_000),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.expiry_policy().map(|p| p.lookahead()),
            Some(TimeDelta::seconds(10_000_000_000_000))
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"refresh_lookahead_secs": 60}"#).unwrap();
        assert_eq!(config.refresh_lookahead_secs, Some(60));
        assert_eq!(config.request_timeout_ms, None);
        assert_eq!(
            config.expiry_policy().map(|p| p.lookahead()),
            Some(chrono::Duration::seconds(60))
        );
    }
}
