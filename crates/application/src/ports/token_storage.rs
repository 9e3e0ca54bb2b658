//! Token storage port
//!
//! Client-side persisted state: two string values under fixed keys.

use async_trait::async_trait;
use lyceum_domain::{ACCESS_TOKEN_KEY, ApiError, Credentials, REFRESH_TOKEN_KEY};

/// Errors that can occur while reading or writing stored tokens.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Key/value store for bearer credentials.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Reads both tokens. Returns `None` without an access token.
    async fn load_credentials(&self) -> Result<Option<Credentials>, StorageError> {
        let Some(access_token) = self.get(ACCESS_TOKEN_KEY).await? else {
            return Ok(None);
        };
        let refresh_token = self.get(REFRESH_TOKEN_KEY).await?;
        Ok(Some(Credentials {
            access_token,
            refresh_token,
        }))
    }

    /// Persists both tokens; a missing refresh token clears the stored one.
    async fn store_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        self.set(ACCESS_TOKEN_KEY, &credentials.access_token).await?;
        match &credentials.refresh_token {
            Some(refresh) => self.set(REFRESH_TOKEN_KEY, refresh).await,
            None => self.remove(REFRESH_TOKEN_KEY).await,
        }
    }

    /// Removes both tokens.
    async fn clear_credentials(&self) -> Result<(), StorageError> {
        self.remove(ACCESS_TOKEN_KEY).await?;
        self.remove(REFRESH_TOKEN_KEY).await
    }
}
