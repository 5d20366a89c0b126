//! Error types for the service system

use crate::core::job::JobId;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors that can occur in the service system
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    /// Service is already running with details
    #[error("Service '{service_name}' is already running with {worker_count} workers")]
    AlreadyRunning {
        /// Name of the service
        service_name: String,
        /// Number of worker threads
        worker_count: usize,
    },

    /// Service is draining and no longer accepts jobs
    #[error("Service '{service_name}' is shutting down and rejects new jobs")]
    ShuttingDown {
        /// Name of the service
        service_name: String,
    },

    /// Service was already joined
    #[error("Service '{service_name}' is stopped")]
    Stopped {
        /// Name of the service
        service_name: String,
    },

    /// Job submission timed out waiting for queue space
    #[error("Service '{service_name}': job submission timed out after {timeout_ms}ms")]
    SubmissionTimeout {
        /// Name of the service
        service_name: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Job body panicked while executing
    #[error("Job panicked (job_id: {job_id}): {message}")]
    JobPanicked {
        /// ID of the failed job
        job_id: JobId,
        /// Panic message
        message: String,
    },

    /// Promise was dropped before a value was written
    #[error("Promise dropped without a result (job_id: {job_id})")]
    PromiseBroken {
        /// ID of the job owning the promise
        job_id: JobId,
    },

    /// Result was already taken out of the future
    #[error("Result already taken (job_id: {job_id})")]
    ResultTaken {
        /// ID of the job
        job_id: JobId,
    },

    /// Bounded wait on a future elapsed before the result was ready
    #[error("Result not ready after {timeout_ms}ms (job_id: {job_id})")]
    FutureTimeout {
        /// ID of the job
        job_id: JobId,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{worker_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// General error
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    /// Create an already running error
    pub fn already_running(service_name: impl Into<String>, worker_count: usize) -> Self {
        ServiceError::AlreadyRunning {
            service_name: service_name.into(),
            worker_count,
        }
    }

    /// Create a shutting down error
    pub fn shutting_down(service_name: impl Into<String>) -> Self {
        ServiceError::ShuttingDown {
            service_name: service_name.into(),
        }
    }

    /// Create a stopped error
    pub fn stopped(service_name: impl Into<String>) -> Self {
        ServiceError::Stopped {
            service_name: service_name.into(),
        }
    }

    /// Create a submission timeout error
    pub fn submission_timeout(service_name: impl Into<String>, timeout_ms: u64) -> Self {
        ServiceError::SubmissionTimeout {
            service_name: service_name.into(),
            timeout_ms,
        }
    }

    /// Create a job panicked error
    pub fn job_panicked(job_id: JobId, message: impl Into<String>) -> Self {
        ServiceError::JobPanicked {
            job_id,
            message: message.into(),
        }
    }

    /// Create a broken promise error
    pub fn promise_broken(job_id: JobId) -> Self {
        ServiceError::PromiseBroken { job_id }
    }

    /// Create a result taken error
    pub fn result_taken(job_id: JobId) -> Self {
        ServiceError::ResultTaken { job_id }
    }

    /// Create a future timeout error
    pub fn future_timeout(job_id: JobId, timeout_ms: u64) -> Self {
        ServiceError::FutureTimeout { job_id, timeout_ms }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ServiceError::SpawnError {
            worker_id,
            message: message.into(),
            source,
        }
    }

    /// Create a join error
    pub fn join(worker_id: usize, message: impl Into<String>) -> Self {
        ServiceError::JoinError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ServiceError::Other(msg.into())
    }

    /// Whether the error means the job never ran and never will.
    pub fn is_dropped_job(&self) -> bool {
        matches!(
            self,
            ServiceError::SubmissionTimeout { .. }
                | ServiceError::ShuttingDown { .. }
                | ServiceError::Stopped { .. }
                | ServiceError::PromiseBroken { .. }
        )
    }
}
