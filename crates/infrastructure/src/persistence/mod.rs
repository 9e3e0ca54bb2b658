//! Persistence implementations for file-based storage.

mod file_token_storage;

pub use file_token_storage::{CREDENTIALS_FILE, FileTokenStorage};
