//! Anti-replay collaborator contract and an in-memory implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ExchangeError;

/// Anti-replay predicate over document nonces.
///
/// A single logical call per verification; retry policy, persistence, and
/// expiry all belong to the implementation.
#[async_trait]
pub trait NonceRegistry: Send + Sync {
    /// True if the nonce has not been seen before. Implementations mark
    /// the nonce as seen in the same call.
    async fn is_fresh(&self, nonce: &str) -> Result<bool, ExchangeError>;
}

/// Seen-set registry for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryNonceRegistry {
    seen: RwLock<HashSet<String>>,
}

impl MemoryNonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NonceRegistry for MemoryNonceRegistry {
    async fn is_fresh(&self, nonce: &str) -> Result<bool, ExchangeError> {
        Ok(self.seen.write().await.insert(nonce.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_use_is_fresh_replay_is_not() {
        let registry = MemoryNonceRegistry::new();
        assert!(registry.is_fresh("abc123").await.unwrap());
        assert!(!registry.is_fresh("abc123").await.unwrap());
        assert!(registry.is_fresh("def456").await.unwrap());
    }
}
