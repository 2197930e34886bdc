//! Unified error types shared across the orchestrator.

use thiserror::Error;

/// Result type used at crate boundaries.
pub type FerroqResult<T> = Result<T, FerroqError>;

/// Unified error type for the orchestrator.
///
/// Layer-specific errors (`StoreError`, `ExecutorError`, ...) convert into
/// this type at the top of the application. Only configuration and store
/// construction failures are fatal at startup.
#[derive(Error, Debug)]
pub enum FerroqError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Shared store error (connection, timeout, pool exhausted).
    #[error("Store error: {0}")]
    Store(String),

    /// Executor transport or protocol error.
    #[error("Executor error: {0}")]
    Executor(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FerroqError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Executor(_) => "EXECUTOR_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            FerroqError::configuration("bad").error_code(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            FerroqError::Store("down".to_string()).error_code(),
            "STORE_ERROR"
        );
        assert_eq!(FerroqError::internal("oops").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_display() {
        let err = FerroqError::Executor("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FerroqError = parse_err.into();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }
}
