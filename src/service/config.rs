//! Service configuration

use crate::core::{Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wait budget for pushing a job onto a full queue
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_millis(30);

/// Configuration for a [`Service`](super::Service)
///
/// Only the queue capacity and the per-push job timeout affect behavior; the
/// name and thread prefix are for diagnostics.
///
/// ```rust
/// use rust_service_system::service::ServiceConfig;
/// use std::time::Duration;
///
/// let config = ServiceConfig::new("icecream")
///     .with_queue_capacity(8)
///     .with_job_timeout(Duration::from_millis(100));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name used in logs and errors
    pub name: String,
    /// Maximum queued jobs (0 = unbounded)
    pub queue_capacity: usize,
    /// How long `submit` waits for queue space before giving up
    #[serde(rename = "job_timeout_ms", with = "duration_ms")]
    pub job_timeout: Duration,
    /// Worker thread name prefix
    pub thread_name_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new("service")
    }
}

impl ServiceConfig {
    /// Create a configuration for a named service with an unbounded queue
    #[must_use]
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        Self {
            thread_name_prefix: name.clone(),
            name,
            queue_capacity: 0,
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }

    /// Set maximum queue size
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the per-push job timeout
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ServiceError::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::invalid_config(
                "name",
                "Service name must not be empty",
            ));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err(ServiceError::invalid_config(
                "thread_name_prefix",
                "Thread name prefix must not be empty",
            ));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
