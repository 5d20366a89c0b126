//! Named services backed by a bounded job queue and a worker pool

mod config;
mod job_service;
mod stats;
mod worker;

pub use config::{ServiceConfig, DEFAULT_JOB_TIMEOUT};
pub use job_service::{Service, ServiceState};
pub use stats::{ServiceStats, ServiceStatsSnapshot};
pub use worker::{Worker, WorkerPool};
