//! Application configuration structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared store (Redis) configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Executor sidecar configuration.
    #[serde(default)]
    pub sidecar: SidecarConfig,

    /// Worker pipeline configuration.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Job-level retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Scheduled-set sweep configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Circuit breaker configuration.
    #[serde(default)]
    pub breaker: BreakerConfig,
}

/// Shared store connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL.
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Optional password, injected into the URL when it carries none.
    #[serde(default)]
    pub password: Option<String>,

    /// Database index.
    #[serde(default)]
    pub db: i64,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Dial timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-operation read/write timeout in seconds.
    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,

    /// Retries when acquiring a connection fails transiently.
    #[serde(default = "default_store_retries")]
    pub max_retries: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            password: None,
            db: 0,
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout(),
            op_timeout_secs: default_op_timeout(),
            max_retries: default_store_retries(),
        }
    }
}

impl RedisConfig {
    /// URL with password and database index folded in.
    ///
    /// A password or db already present in `url` wins over the separate
    /// fields.
    #[must_use]
    pub fn effective_url(&self) -> String {
        let mut url = self.url.clone();

        if let Some(password) = &self.password {
            if !url.contains('@') {
                if let Some(rest) = url.strip_prefix("redis://") {
                    url = format!("redis://:{password}@{rest}");
                }
            }
        }

        if self.db != 0 {
            let has_db_path = url
                .splitn(2, "://")
                .nth(1)
                .is_some_and(|rest| rest.contains('/'));
            if !has_db_path {
                url = format!("{}/{}", url, self.db);
            }
        }

        url
    }

    /// Dial timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-operation timeout as a `Duration`.
    #[must_use]
    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_op_timeout() -> u64 {
    3
}

fn default_store_retries() -> u32 {
    3
}

/// Executor sidecar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarConfig {
    /// Executor endpoint.
    #[serde(default = "default_sidecar_url")]
    pub url: String,

    /// Transport to reach the executor with.
    #[serde(default)]
    pub protocol: SidecarProtocol,

    /// Per-request deadline in seconds.
    #[serde(default = "default_sidecar_timeout")]
    pub timeout_secs: u64,

    /// Execute path for the HTTP transport. Producer-compatible sidecars
    /// expose `/jobs/execute`; the reference executor exposes `/execute`.
    #[serde(default = "default_execute_path")]
    pub execute_path: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            url: default_sidecar_url(),
            protocol: SidecarProtocol::default(),
            timeout_secs: default_sidecar_timeout(),
            execute_path: default_execute_path(),
        }
    }
}

impl SidecarConfig {
    /// Per-request deadline as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_sidecar_url() -> String {
    "http://localhost:9292".to_string()
}

fn default_sidecar_timeout() -> u64 {
    30
}

fn default_execute_path() -> String {
    "/execute".to_string()
}

/// Executor transport selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarProtocol {
    /// JSON over HTTP.
    #[default]
    Http,
    /// Protobuf over gRPC.
    Grpc,
}

impl fmt::Display for SidecarProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Grpc => write!(f, "grpc"),
        }
    }
}

impl FromStr for SidecarProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "grpc" => Ok(Self::Grpc),
            other => Err(format!("unknown sidecar protocol: {other}")),
        }
    }
}

/// Worker pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Semaphore capacity: maximum jobs in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Queues to drain, highest priority first.
    #[serde(default = "default_queues")]
    pub queues: Vec<String>,

    /// Idle sleep after an empty poll, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Drain deadline on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queues: default_queues(),
            poll_interval_ms: default_poll_interval(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl WorkerConfig {
    /// Idle poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shutdown drain deadline as a `Duration`.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_concurrency() -> usize {
    10
}

fn default_queues() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_poll_interval() -> u64 {
    250
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Job-level retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts before a job is dead-lettered, unless the record overrides.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay in seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,

    /// Backoff ceiling in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
            max_delay_secs: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    25
}

fn default_base_delay() -> u64 {
    15
}

fn default_max_delay() -> u64 {
    86_400
}

/// Scheduled-set sweep configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often due retries are promoted back to their queues, in seconds.
    #[serde(default = "default_promote_interval")]
    pub promote_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            promote_interval_secs: default_promote_interval(),
        }
    }
}

impl SchedulerConfig {
    /// Sweep period as a `Duration`.
    #[must_use]
    pub fn promote_interval(&self) -> Duration {
        Duration::from_secs(self.promote_interval_secs)
    }
}

fn default_promote_interval() -> u64 {
    5
}

/// Circuit breaker configuration for the executor client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive transport failures before the circuit opens.
    #[serde(default = "default_max_failures")]
    pub max_failures: u64,

    /// Cooling-off period before a half-open probe, in seconds.
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            reset_timeout_secs: default_reset_timeout(),
        }
    }
}

impl BreakerConfig {
    /// Cooling-off period as a `Duration`.
    #[must_use]
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

fn default_max_failures() -> u64 {
    5
}

fn default_reset_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.redis.pool_size, 10);
        assert_eq!(config.sidecar.protocol, SidecarProtocol::Http);
        assert_eq!(config.worker.concurrency, 10);
        assert_eq!(config.worker.queues, vec!["default".to_string()]);
        assert_eq!(config.retry.max_attempts, 25);
        assert_eq!(config.retry.base_delay_secs, 15);
        assert_eq!(config.breaker.max_failures, 5);
    }

    #[test]
    fn test_effective_url_plain() {
        let config = RedisConfig::default();
        assert_eq!(config.effective_url(), "redis://localhost:6379");
    }

    #[test]
    fn test_effective_url_with_password_and_db() {
        let config = RedisConfig {
            password: Some("s3cret".to_string()),
            db: 2,
            ..RedisConfig::default()
        };
        assert_eq!(config.effective_url(), "redis://:s3cret@localhost:6379/2");
    }

    #[test]
    fn test_effective_url_keeps_embedded_credentials() {
        let config = RedisConfig {
            url: "redis://:inline@host:6379/1".to_string(),
            password: Some("ignored".to_string()),
            db: 4,
            ..RedisConfig::default()
        };
        assert_eq!(config.effective_url(), "redis://:inline@host:6379/1");
    }

    #[test]
    fn test_protocol_parsing() {
        assert_eq!("http".parse::<SidecarProtocol>(), Ok(SidecarProtocol::Http));
        assert_eq!("GRPC".parse::<SidecarProtocol>(), Ok(SidecarProtocol::Grpc));
        assert!("smtp".parse::<SidecarProtocol>().is_err());
    }

    #[test]
    fn test_section_deserialization() {
        let toml = r#"
            [worker]
            concurrency = 4
            queues = ["critical", "default"]

            [sidecar]
            protocol = "grpc"
            timeout_secs = 10
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.worker.concurrency, 4);
        assert_eq!(config.worker.queues.len(), 2);
        assert_eq!(config.sidecar.protocol, SidecarProtocol::Grpc);
        assert_eq!(config.sidecar.timeout(), Duration::from_secs(10));
        // Untouched sections keep their defaults.
        assert_eq!(config.retry.max_attempts, 25);
    }
}
