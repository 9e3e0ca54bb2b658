//! Application error types

use lyceum_domain::ApiError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::ports::{StorageError, TransportError};

/// Application-level errors, surfaced by the composition root.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The HTTP transport could not be built.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl ApplicationError {
    /// Status of the failed API call, if the error came from one.
    #[must_use]
    pub const fn api_status(&self) -> Option<u16> {
        match self {
            Self::Api(error) => Some(error.status()),
            _ => None,
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
