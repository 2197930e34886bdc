//! Executor client error types.

use ferroq_core::FerroqError;
use thiserror::Error;

/// Result type for executor operations.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors raised by the executor clients.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The circuit breaker is open; the sidecar was not contacted.
    #[error("Executor circuit is open")]
    CircuitOpen,

    /// Non-success HTTP status from the sidecar.
    #[error("Executor returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Request-level failure: connection refused, deadline exceeded, DNS.
    #[error("Executor request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// gRPC call failed.
    #[error("Executor gRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    /// gRPC channel could not be established.
    #[error("Executor connection failed: {0}")]
    Connect(#[from] tonic::transport::Error),

    /// Response body is not a valid execution result.
    #[error("Malformed executor response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Health endpoint reachable but reporting not-ready.
    #[error("Executor unhealthy: {0}")]
    Unhealthy(String),
}

impl ExecutorError {
    /// Whether the HTTP transport retry loop should try again.
    ///
    /// Connection failures and 5xx responses are retryable; 4xx responses,
    /// malformed bodies and an open circuit are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Request(_) | Self::Grpc(_) | Self::Connect(_) => true,
            Self::CircuitOpen | Self::Decode(_) | Self::Unhealthy(_) => false,
        }
    }
}

impl From<ExecutorError> for FerroqError {
    fn from(err: ExecutorError) -> Self {
        FerroqError::Executor(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = ExecutorError::Status {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = ExecutorError::Status {
            status: 422,
            message: "bad job".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!ExecutorError::CircuitOpen.is_retryable());
    }
}
