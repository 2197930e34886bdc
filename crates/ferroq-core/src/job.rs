//! Wire-level job record and execution result.

use crate::time::epoch_seconds;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// A job record as written by the producer and consumed by the orchestrator.
///
/// The record is Sidekiq-wire-compatible: `args` is a heterogeneous JSON
/// array whose element types are preserved, timestamps are fractional epoch
/// seconds, and any field this struct does not know about is retained in
/// `extra` so that a retry round-trip never drops producer data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Identifier of the user logic to run.
    pub class: String,

    /// Ordered, heterogeneous arguments.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Unique job identifier.
    pub jid: String,

    /// Logical queue name (unqualified; the store prefixes it).
    pub queue: String,

    /// When the producer created the record.
    #[serde(default)]
    pub created_at: f64,

    /// When the record was pushed onto the queue.
    #[serde(default)]
    pub enqueued_at: f64,

    /// Attempts consumed so far. Absent on the wire means zero.
    #[serde(default)]
    pub retry: u32,

    /// Per-job override of the maximum attempts before dead-lettering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Epoch seconds of the most recent failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<f64>,

    /// Message from the most recent failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Classification of the most recent failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_class: Option<String>,

    /// Fields unknown to the orchestrator, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRecord {
    /// Creates a fresh record the way a producer would.
    #[must_use]
    pub fn new(class: impl Into<String>, args: Vec<Value>, queue: impl Into<String>) -> Self {
        let now = epoch_seconds();
        Self {
            class: class.into(),
            args,
            jid: Uuid::new_v4().simple().to_string(),
            queue: queue.into(),
            created_at: now,
            enqueued_at: now,
            retry: 0,
            max_retries: None,
            failed_at: None,
            error_message: None,
            error_class: None,
            extra: Map::new(),
        }
    }

    /// Serialize to the wire encoding.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from the wire encoding.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Records a failed attempt: bumps the attempt counter and stamps
    /// `failed_at`.
    pub fn record_attempt_failure(&mut self, now: f64) {
        self.retry += 1;
        self.failed_at = Some(now);
    }

    /// Attaches failure details for the retry/dead path.
    pub fn set_error(&mut self, message: impl Into<String>, class: impl Into<String>) {
        self.error_message = Some(message.into());
        self.error_class = Some(class.into());
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.jid, self.class)
    }
}

/// Outcome reported by the executor.
///
/// A transport-layer problem (timeout, 5xx, connection failure) is never an
/// `ExecutionResult`; it surfaces as an executor-client error instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the user logic succeeded.
    pub status: ExecutionStatus,

    /// Wall-clock seconds the executor spent running the job.
    #[serde(default)]
    pub execution_time: f64,

    /// Present iff `status` is `failure`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Opaque payload returned on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl ExecutionResult {
    /// Returns true when the executor reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Convenience constructor for a successful run.
    #[must_use]
    pub fn success(execution_time: f64) -> Self {
        Self {
            status: ExecutionStatus::Success,
            execution_time,
            error_message: None,
            result: None,
        }
    }

    /// Convenience constructor for an executor-reported failure.
    #[must_use]
    pub fn failure(message: impl Into<String>, execution_time: f64) -> Self {
        Self {
            status: ExecutionStatus::Failure,
            execution_time,
            error_message: Some(message.into()),
            result: None,
        }
    }
}

/// Executor-reported status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// The user logic completed.
    Success,
    /// The user logic raised; the orchestrator decides retry vs. dead.
    Failure,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}
