//! Token storage trait.

use std::sync::RwLock;

use crate::Result;
use crate::tokens::Token;

/// Holds zero or one current token.
///
/// Called from inside the token provider's critical section, so
/// implementations must not block for long and must not call back into the
/// provider.
pub trait TokenStore: Send + Sync {
    fn read(&self) -> Option<Token>;

    /// Replace the stored token; `None` clears it.
    fn write(&self, token: Option<Token>) -> Result<()>;

    fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn read(&self) -> Option<Token> {
        (**self).read()
    }

    fn write(&self, token: Option<Token>) -> Result<()> {
        (**self).write(token)
    }

    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }
}

/// A token store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`.
    pub fn with_token(token: Token) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Option<Token> {
        let token = self.token.read().unwrap_or_else(|e| e.into_inner());
        token.clone()
    }

    fn write(&self, token: Option<Token>) -> Result<()> {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = token;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(!store.is_authenticated());

        store.write(Some(Token::new("A1").with_refresh("R1"))).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.read().unwrap().access.as_str(), "A1");

        store.write(None).unwrap();
        assert!(store.read().is_none());
    }
}
