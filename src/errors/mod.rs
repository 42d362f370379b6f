//! Error types for the generation client.
//!
//! Every failure is either fatal (never retried) or retryable (bounded retry
//! with a fixed backoff). Being offline is not an error: the client falls back
//! to offline templates instead of returning one of these.

use std::time::Duration;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for client operations.
pub type CoachResult<T> = Result<T, CoachError>;

/// Error type for generation client operations.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Configuration error (invalid base URL, probe endpoint, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The request body could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Authentication error (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message.
        message: String,
    },

    /// A 2xx response whose body could not be decoded or held no content.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// Any status code that is neither success nor a known failure class.
    #[error("Unexpected HTTP status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Error message.
        message: String,
        /// Value of the `retry-after` header, if the provider sent one.
        retry_after: Option<Duration>,
    },

    /// Server error (5xx status codes).
    #[error("Server error (HTTP {status_code}): {message}")]
    Server {
        /// Error message.
        message: String,
        /// HTTP status code.
        status_code: u16,
    },

    /// Network/connection error.
    #[error("Network error: {message}")]
    Network {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Request timed out: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },
}

impl CoachError {
    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoachError::RateLimit { .. }
                | CoachError::Server { .. }
                | CoachError::Network { .. }
                | CoachError::Timeout { .. }
        )
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        CoachError::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        CoachError::InvalidResponse {
            message: message.into(),
        }
    }

    /// Short, stable label used as a metrics key.
    pub fn kind(&self) -> &'static str {
        match self {
            CoachError::Configuration { .. } => "configuration",
            CoachError::Serialization { .. } => "serialization",
            CoachError::Authentication { .. } => "authentication",
            CoachError::InvalidResponse { .. } => "invalid_response",
            CoachError::UnexpectedStatus { .. } => "unexpected_status",
            CoachError::RateLimit { .. } => "rate_limit",
            CoachError::Server { .. } => "server",
            CoachError::Network { .. } => "network",
            CoachError::Timeout { .. } => "timeout",
        }
    }
}

/// API error response body, as sent by OpenAI-compatible providers.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// The error details.
    pub error: ApiErrorDetail,
}

/// Detailed API error information.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// The error message.
    pub message: String,
    /// The error type.
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

impl From<TransportError> for CoachError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { timeout } => CoachError::Timeout {
                message: format!("no response within {timeout:?}"),
            },
            other => CoachError::Network {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for CoachError {
    fn from(err: serde_json::Error) -> Self {
        CoachError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for CoachError {
    fn from(err: url::ParseError) -> Self {
        CoachError::Configuration {
            message: format!("Invalid URL: {err}"),
        }
    }
}
