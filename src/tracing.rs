//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, workers run inside a `worker` span and
//! the service emits structured events on submission, completion, panic and
//! lifecycle changes. Plain log lines go through the `log` facade either way.
//!
//! # Example
//!
//! ```rust,ignore
//! use rust_service_system::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("rust_service_system=trace".parse().unwrap()))
//!     .init();
//!
//! let service = Service::new("traced")?;
//! service.detach(4)?;
//! ```

/// Metrics recording functions for observability.
///
/// These functions emit tracing events that can be consumed by
/// metrics collection systems like Prometheus via tracing-opentelemetry.
pub mod metrics {
    use std::time::Duration;

    /// Records a job submission event.
    #[inline]
    pub fn record_submission(queue_depth: usize) {
        tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.queue_depth = queue_depth as i64,
            "job submitted"
        );
    }

    /// Records job completion with timing.
    #[inline]
    pub fn record_completion(duration: Duration) {
        tracing::trace!(
            counter.jobs_completed = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job completed"
        );
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        tracing::trace!(gauge.workers_busy = 1, worker_id = worker_id, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records service startup.
    #[inline]
    pub fn record_service_start(service: &str, num_workers: usize) {
        tracing::info!(service = service, workers = num_workers, "service started");
    }

    /// Records service shutdown.
    #[inline]
    pub fn record_service_stop(service: &str, jobs_completed: u64, jobs_panicked: u64) {
        tracing::info!(
            service = service,
            jobs_completed = jobs_completed,
            jobs_panicked = jobs_panicked,
            "service stopped"
        );
    }
}
