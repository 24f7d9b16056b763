//! Error types for SWASTIK core

use std::time::Duration;
use thiserror::Error;

/// Main error type for SWASTIK operations
#[derive(Debug, Error)]
pub enum SwastikError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A turn is already in flight for this conversation
    #[error("A message is already being processed")]
    Busy,

    /// Backend failure surfaced outside the fallback chain
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type using SwastikError
pub type Result<T> = std::result::Result<T, SwastikError>;

impl SwastikError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        SwastikError::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        SwastikError::Validation(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        SwastikError::Other(msg.into())
    }
}

/// Failure of a single backend adapter call.
///
/// Every variant means the same thing to the fallback chain: this backend
/// failed this turn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Required credentials or identifiers are absent; no request was sent
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    /// No response arrived within the bound
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Non-success status, transport failure or malformed body
    #[error("Upstream error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream {
        /// HTTP status, when the upstream answered at all
        status: Option<u16>,
        /// Upstream body or transport error text
        message: String,
    },

    /// Success status but no reply content could be extracted
    #[error("Upstream returned no reply content")]
    EmptyResponse,
}

impl BackendError {
    /// Create a missing-configuration error
    pub fn missing(what: impl Into<String>) -> Self {
        BackendError::ConfigurationMissing(what.into())
    }

    /// Create an upstream error
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        BackendError::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Short machine-friendly kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::ConfigurationMissing(_) => "configuration_missing",
            BackendError::Timeout(_) => "timeout",
            BackendError::Upstream { .. } => "upstream_error",
            BackendError::EmptyResponse => "empty_response",
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::upstream(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SwastikError::config("missing key");
        assert_eq!(err.to_string(), "Configuration error: missing key");

        assert_eq!(
            SwastikError::Busy.to_string(),
            "A message is already being processed"
        );
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::upstream(Some(502), "bad gateway");
        assert_eq!(err.to_string(), "Upstream error (502): bad gateway");

        let err = BackendError::upstream(None, "connection refused");
        assert_eq!(err.to_string(), "Upstream error: connection refused");

        let err = BackendError::Timeout(Duration::from_secs(4));
        assert_eq!(err.to_string(), "Timed out after 4000ms");
    }

    #[test]
    fn test_backend_error_kind() {
        assert_eq!(BackendError::missing("WXO_AGENT_ID").kind(), "configuration_missing");
        assert_eq!(BackendError::EmptyResponse.kind(), "empty_response");
        assert_eq!(BackendError::Timeout(Duration::ZERO).kind(), "timeout");
    }

    #[test]
    fn test_backend_error_converts_into_crate_error() {
        let err: SwastikError = BackendError::EmptyResponse.into();
        assert!(matches!(err, SwastikError::Backend(BackendError::EmptyResponse)));
    }
}
