//! # Rust Service System
//!
//! Two composable primitives for small producer/consumer pipelines: a
//! capacity-bounded blocking queue, and named services that run submitted work
//! on a worker pool and hand results back through futures.
//!
//! ## Features
//!
//! - **Bounded Blocking Queue**: FIFO with blocking pop and timed push
//! - **Services**: named worker pools fed from a bounded job queue
//! - **Promise/Future Results**: one-shot result handles per submitted job
//! - **Panic Isolation**: a panicking job fails its own future, not the worker
//! - **Graceful Shutdown**: `join` drains queued jobs, then joins every worker
//!
//! ## Quick Start
//!
//! ```rust
//! use rust_service_system::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // Create a service and start its workers
//! let service = Service::with_capacity("squares", 16)?;
//! service.detach(4)?;
//!
//! // Submit work and keep the futures
//! let futures: Vec<_> = (0..10u64)
//!     .map(|i| service.submit(move || i * i))
//!     .collect::<Result<_>>()?;
//!
//! for (i, future) in futures.into_iter().enumerate() {
//!     assert_eq!(future.wait()?, (i * i) as u64);
//! }
//!
//! // Drain and stop
//! service.join()?;
//! assert_eq!(service.total_jobs(), 10);
//! # Ok(())
//! # }
//! ```
//!
//! ## Submission Timeout
//!
//! ```rust
//! use rust_service_system::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = ServiceConfig::new("tiny")
//!     .with_queue_capacity(1)
//!     .with_job_timeout(Duration::from_millis(10));
//! let service = Service::with_config(config)?;
//!
//! // No workers yet: the first job fills the queue, the second is rejected
//! let first = service.submit(|| 1)?;
//! assert!(matches!(
//!     service.submit(|| 2),
//!     Err(ServiceError::SubmissionTimeout { .. })
//! ));
//!
//! service.detach(1)?;
//! assert_eq!(first.wait()?, 1);
//! service.join()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod prelude;
pub mod queue;
pub mod service;
#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::core::{Job, JobFuture, JobId, JobPromise, Result, ServiceError, Task};
pub use crate::queue::{BoundedBlockingQueue, QueueError};
pub use crate::service::{Service, ServiceConfig, ServiceState, ServiceStatsSnapshot};
