//! Core types and traits for the service system

pub mod error;
pub mod job;
pub mod promise;

pub use error::{Result, ServiceError};
pub use job::{Job, JobId, Task};
pub use promise::{JobFuture, JobPromise};
