//! Worker pipeline error types.

use thiserror::Error;

/// Errors returned by [`crate::Processor::submit`].
///
/// Job-content problems are never submission errors; they flow through the
/// spawned task as execution outcomes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The processor has been flipped to not-running.
    #[error("Processor is shutting down")]
    ShuttingDown,

    /// Admission was cancelled while waiting for a token.
    #[error("Admission was cancelled")]
    Cancelled,
}

/// Errors returned by [`crate::Processor::shutdown`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShutdownError {
    /// In-flight work did not drain before the deadline. The remaining
    /// tasks keep running to completion on their own.
    #[error("Shutdown deadline exceeded with {active} jobs still in flight")]
    DeadlineExceeded { active: usize },
}
