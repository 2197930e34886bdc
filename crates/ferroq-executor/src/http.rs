//! HTTP executor client.

use crate::error::{ExecutorError, ExecutorResult};
use crate::Executor;
use async_trait::async_trait;
use ferroq_config::SidecarConfig;
use ferroq_core::{ExecutionResult, JobRecord};
use ferroq_resilience::BackoffSchedule;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Deadline for the health probe, independent of the execute deadline.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-over-HTTP executor client.
///
/// `POST {base}{execute_path}` with the encoded job record as body; the
/// response body is the encoded execution result. Connection failures and
/// 5xx responses are retried on the quadratic backoff schedule; 4xx
/// responses return immediately.
pub struct HttpExecutor {
    client: Client,
    base_url: String,
    execute_path: String,
    backoff: BackoffSchedule,
}

impl HttpExecutor {
    /// Creates a new HTTP executor client.
    pub fn new(config: &SidecarConfig) -> ExecutorResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        let execute_path = if config.execute_path.starts_with('/') {
            config.execute_path.clone()
        } else {
            format!("/{}", config.execute_path)
        };

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            execute_path,
            backoff: BackoffSchedule::default(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute_once(&self, job: &JobRecord) -> ExecutorResult<ExecutionResult> {
        let response = self
            .client
            .post(self.url(&self.execute_path))
            .json(job)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExecutorError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn execute(&self, job: &JobRecord) -> ExecutorResult<ExecutionResult> {
        let mut attempt = 0;

        loop {
            match self.execute_once(job).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    if self.backoff.is_exhausted(attempt) {
                        return Err(e);
                    }
                    let delay = self.backoff.delay_for_attempt(attempt);
                    debug!(
                        jid = %job.jid,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying executor request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn health(&self) -> ExecutorResult<()> {
        let response = self
            .client
            .get(self.url("/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExecutorError::Unhealthy(format!("HTTP {status}")));
        }

        let health: HealthBody = serde_json::from_slice(&response.bytes().await?)?;
        if health.status == "ok" && health.rails_loaded {
            Ok(())
        } else {
            Err(ExecutorError::Unhealthy(format!(
                "status={}, rails_loaded={}",
                health.status, health.rails_loaded
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    rails_loaded: bool,
}
