//! # Ferroq Worker
//!
//! The concurrent processing pipeline of the orchestrator:
//!
//! - [`Semaphore`]: the admission gate bounding in-flight work, and the
//!   system's backpressure valve.
//! - [`Processor`]: accepts a job, spawns a task that runs it against the
//!   executor and applies the retry decision.
//! - [`RetryPolicy`]: decides drop / schedule / dead for a completed job.
//! - [`Supervisor`]: the poll loop feeding the processor plus the periodic
//!   scheduled-set sweep.
//!
//! ```text
//! producer -> queue:<name> -> [Supervisor] poll -> [Semaphore] admit
//!     -> [Processor] task -> executor -> [RetryPolicy]
//!     -> ack | schedule | dead
//! ```

pub mod error;
pub mod metrics;
pub mod processor;
pub mod retry;
pub mod semaphore;
pub mod supervisor;

pub use error::{ShutdownError, SubmitError};
pub use processor::Processor;
pub use retry::{Disposition, Outcome, RetryPolicy};
pub use semaphore::Semaphore;
pub use supervisor::Supervisor;
