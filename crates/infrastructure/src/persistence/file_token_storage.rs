//! File-based token storage.
//!
//! Tokens are kept in one small JSON object so they survive restarts:
//! ```json
//! {
//!   "refresh_token": "eyJ...",
//!   "token": "eyJ..."
//! }
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lyceum_application::ports::{StorageError, TokenStorage};
use tokio::fs;
use tokio::sync::Mutex;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// File name used under the configuration directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

type TokenMap = BTreeMap<String, String>;

/// Token storage backed by a JSON file.
///
/// A missing file reads as empty. Writes go through a temporary sibling
/// file and a rename. Removing the last key deletes the file.
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStorage {
    /// Stores tokens at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default location: `<config dir>/lyceum/credentials.json`.
    ///
    /// Returns `None` when the platform has no configuration directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lyceum").join(CREDENTIALS_FILE))
    }

    /// File the tokens live in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<TokenMap, StorageError> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(TokenMap::new()),
            Ok(bytes) => Ok(from_json_bytes(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(TokenMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, tokens: &TokenMap) -> Result<(), StorageError> {
        if tokens.is_empty() {
            return match fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = to_json_stable_bytes(tokens)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, &content).await?;
        fs::rename(&staging, &self.path).await?;
        tracing::trace!(path = %self.path.display(), keys = tokens.len(), "token file written");
        Ok(())
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut tokens = self.read_map().await?;
        tokens.insert(key.to_string(), value.to_string());
        self.write_map(&tokens).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut tokens = self.read_map().await?;
        if tokens.remove(key).is_none() {
            return Ok(());
        }
        self.write_map(&tokens).await
    }
}
