//! # Ferroq Core
//!
//! Shared domain types for the Ferroq job orchestrator: the wire-level job
//! record and execution result, the unified error type, and epoch-time
//! helpers used by every layer.

pub mod error;
pub mod job;
pub mod time;

pub use error::{FerroqError, FerroqResult};
pub use job::{ExecutionResult, ExecutionStatus, JobRecord};
pub use time::epoch_seconds;
