//! In-memory token storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{StorageError, TokenStorage};

/// Thread-safe in-memory token store.
///
/// Values live as long as the process. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStorage {
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryTokenStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all stored keys.
    pub async fn keys(&self) -> Vec<String> {
        let tokens = self.tokens.read().await;
        tokens.keys().cloned().collect()
    }

    /// Get count of stored values.
    pub async fn count(&self) -> usize {
        let tokens = self.tokens.read().await;
        tokens.len()
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut tokens = self.tokens.write().await;
        tokens.remove(key);
        Ok(())
    }
}
