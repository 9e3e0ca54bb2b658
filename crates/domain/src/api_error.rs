//! Normalized API errors.
//!
//! Every failed call is converted into exactly one [`ApiError`] where the
//! transport hands a response (or the lack of one) back to the client. UI
//! layers only ever see this type.
//!
//! Backend error bodies follow one of two shapes:
//!
//! ```json
//! { "detail": "Incorrect email or password" }
//! { "detail": [{ "loc": ["body", "email"], "msg": "field required" }] }
//! ```
//!
//! Anything else degrades to a generic `Request failed with status code N`.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Status reported for failures where no HTTP response was received.
pub const NETWORK_ERROR_STATUS: u16 = 500;

/// Status reported for errors raised locally, before or after any HTTP exchange.
pub const LOCAL_ERROR_STATUS: u16 = 0;

/// Key under which the raw validation list is exposed by [`ApiError::details`].
pub const VALIDATION_ERRORS_KEY: &str = "validation_errors";

/// A failed API call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No response was received (DNS, refused connection, reset socket).
    #[error("{message}")]
    Network {
        /// Text of the underlying transport error.
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the body, or a generic fallback.
        message: String,
        /// Machine-readable error code, when the backend sends one.
        code: Option<String>,
        /// Parsed JSON body, if any.
        body: Option<Value>,
    },

    /// The backend rejected the payload with a list of field errors.
    #[error("{message}")]
    Validation {
        /// HTTP status code (usually 422).
        status: u16,
        /// Comma-joined summary of the field messages.
        message: String,
        /// The raw `detail` list as sent by the backend.
        errors: Vec<Value>,
    },

    /// The backend answered 401 and the session could not be recovered.
    #[error("{message}")]
    Unauthorized {
        /// Message extracted from the body, or a generic fallback.
        message: String,
        /// Machine-readable error code, when the backend sends one.
        code: Option<String>,
    },

    /// A success response carried a body that did not match the expected type.
    #[error("failed to decode response body: {message}")]
    Decode {
        /// HTTP status code of the response.
        status: u16,
        /// Decoder error text.
        message: String,
    },

    /// The request could not be built (bad URL, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Reading or writing stored credentials failed.
    #[error("credential storage error: {0}")]
    Storage(String),

    /// Manual retry was requested after its attempt budget was spent.
    #[error("Maximum retry attempts reached")]
    MaxRetriesExceeded {
        /// The configured retry budget.
        attempts: u32,
    },

    /// Manual retry was requested before any call was made.
    #[error("no previous call to retry")]
    NothingToRetry,
}

impl ApiError {
    /// Creates a network error from transport error text.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Builds the error for a non-success response.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        let code = parsed
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        let detail = parsed.as_ref().and_then(|v| v.get("detail"));

        let summary = match detail {
            Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
            Some(Value::Array(items)) if !items.is_empty() => Some(summarize(items)),
            _ => None,
        };
        let message = summary.unwrap_or_else(|| generic_message(status));

        if status == 401 {
            return Self::Unauthorized { message, code };
        }

        if let Some(Value::Array(items)) = detail
            && !items.is_empty()
        {
            return Self::Validation {
                status,
                message,
                errors: items.clone(),
            };
        }

        Self::Http {
            status,
            message,
            code,
            body: parsed,
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status associated with this error.
    ///
    /// Network failures report [`NETWORK_ERROR_STATUS`]; locally raised errors
    /// report [`LOCAL_ERROR_STATUS`].
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Network { .. } => NETWORK_ERROR_STATUS,
            Self::Http { status, .. }
            | Self::Validation { status, .. }
            | Self::Decode { status, .. } => *status,
            Self::Unauthorized { .. } => 401,
            Self::InvalidRequest(_)
            | Self::Storage(_)
            | Self::MaxRetriesExceeded { .. }
            | Self::NothingToRetry => LOCAL_ERROR_STATUS,
        }
    }

    /// Machine-readable error code, when present.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } | Self::Unauthorized { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Structured details; validation failures carry the raw field list.
    #[must_use]
    pub fn details(&self) -> Option<Map<String, Value>> {
        match self {
            Self::Validation { errors, .. } => {
                let mut details = Map::new();
                details.insert(
                    VALIDATION_ERRORS_KEY.to_string(),
                    Value::Array(errors.clone()),
                );
                Some(details)
            }
            _ => None,
        }
    }

    /// Typed view over validation entries.
    #[must_use]
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::Validation { errors, .. } => errors.iter().map(FieldError::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Transient failures: no response at all, or a 5xx status.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Http { status, .. } | Self::Validation { status, .. } => {
                (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Returns true for authentication failures.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status() == 401
    }

    /// Flattens the error into the serializable shape handed to UI code.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            message: self.message(),
            status: self.status(),
            code: self.code().map(str::to_owned),
            details: self.details(),
        }
    }
}

impl From<crate::DomainError> for ApiError {
    fn from(error: crate::DomainError) -> Self {
        Self::InvalidRequest(error.to_string())
    }
}

fn generic_message(status: u16) -> String {
    format!("Request failed with status code {status}")
}

fn summarize(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => text.clone(),
            other => entry_message(other).unwrap_or_else(|| other.to_string()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn entry_message(entry: &Value) -> Option<String> {
    entry
        .get("msg")
        .or_else(|| entry.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Serializable error shape: `{ message, status, code?, details? }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub message: String,
    /// HTTP status, see [`ApiError::status`].
    pub status: u16,
    /// Machine-readable code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

/// One entry of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted location of the offending field, e.g. `body.email`.
    pub field: Option<String>,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    fn from_value(entry: &Value) -> Self {
        let field = entry.get("loc").and_then(Value::as_array).map(|parts| {
            parts
                .iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        });
        let message = match entry {
            Value::String(text) => text.clone(),
            other => entry_message(other).unwrap_or_else(|| other.to_string()),
        };
        Self { field, message }
    }
}
