//! HTTP transport port

use std::future::Future;

use lyceum_domain::HttpMethod;
use thiserror::Error;

/// A fully resolved outgoing HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute URL including the query string.
    pub url: String,
    /// Headers in send order.
    pub headers: Vec<(String, String)>,
    /// Encoded body.
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    /// Looks up a header value, ignoring name case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A received HTTP response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Creates a response with a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures where no HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// DNS resolution failed.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// The host that failed to resolve.
        host: String,
        /// The error message.
        message: String,
    },

    /// Connection was refused.
    #[error("connection refused: {host}:{port}")]
    ConnectionRefused {
        /// The target host.
        host: String,
        /// The target port.
        port: u16,
    },

    /// Connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Response body could not be read.
    #[error("failed to read body: {0}")]
    Body(String),

    /// Anything else the HTTP library reports.
    #[error("{0}")]
    Other(String),
}

/// Port for sending HTTP requests.
///
/// Implementations perform exactly one exchange per call: no retries, no
/// auth handling, no timeout. Those concerns live in the API client.
pub trait HttpTransport: Send + Sync {
    /// Sends the request and returns the response for any status.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received.
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}
