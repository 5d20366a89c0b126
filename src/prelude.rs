//! Convenient re-exports for common types and traits

pub use crate::core::{JobFuture, JobId, JobPromise, Result, ServiceError};
pub use crate::queue::{BoundedBlockingQueue, QueueError};
pub use crate::service::{Service, ServiceConfig, ServiceState, ServiceStatsSnapshot};
