//! Environment-driven settings.

use std::path::PathBuf;
use std::str::FromStr;

use lyceum_application::config::{ClientConfig, ConfigError};

use crate::persistence::FileTokenStorage;
use crate::telemetry::DEFAULT_LOG_LEVEL;

/// API base URL.
pub const ENV_BASE_URL: &str = "LYCEUM_API_BASE_URL";
/// Transport attempts per request.
pub const ENV_MAX_ATTEMPTS: &str = "LYCEUM_MAX_ATTEMPTS";
/// Backoff unit in milliseconds.
pub const ENV_RETRY_BASE_DELAY_MS: &str = "LYCEUM_RETRY_BASE_DELAY_MS";
/// Forced-logout destination.
pub const ENV_LOGIN_PATH: &str = "LYCEUM_LOGIN_PATH";
/// Token file location.
pub const ENV_TOKEN_FILE: &str = "LYCEUM_TOKEN_FILE";
/// Default tracing filter.
pub const ENV_LOG_LEVEL: &str = "LYCEUM_LOG_LEVEL";

/// Everything the composition root reads from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// API client settings.
    pub client: ClientConfig,
    /// Where tokens are persisted; `None` keeps them in memory.
    pub token_file: Option<PathBuf>,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value or the
    /// resulting client configuration does not validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset or blank variables keep defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Settings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut client = ClientConfig::default();
        if let Some(base_url) = get(ENV_BASE_URL) {
            client.base_url = base_url;
        }
        if let Some(login_path) = get(ENV_LOGIN_PATH) {
            client.login_path = login_path;
        }
        if let Some(raw) = get(ENV_MAX_ATTEMPTS) {
            client.max_attempts = parse(ENV_MAX_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = get(ENV_RETRY_BASE_DELAY_MS) {
            client.retry_base_delay_ms = parse(ENV_RETRY_BASE_DELAY_MS, &raw)?;
        }
        client.validate()?;

        let token_file = get(ENV_TOKEN_FILE)
            .map(PathBuf::from)
            .or_else(FileTokenStorage::default_path);
        let log_level = get(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Self {
            client,
            token_file,
            log_level,
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
