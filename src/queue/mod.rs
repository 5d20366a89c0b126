//! Capacity-bounded blocking queue.
//!
//! [`BoundedBlockingQueue`] is a thread-safe FIFO used as the job list of every
//! [`Service`](crate::service::Service), but it holds any `T: Send` and can be
//! used on its own:
//!
//! ```rust
//! use rust_service_system::queue::BoundedBlockingQueue;
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let queue = Arc::new(BoundedBlockingQueue::new(2));
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for i in 0..5 {
//!             queue.push(i, Duration::from_secs(1)).unwrap();
//!         }
//!     })
//! };
//!
//! let popped: Vec<i32> = (0..5).map(|_| queue.pop()).collect();
//! producer.join().unwrap();
//! assert_eq!(popped, vec![0, 1, 2, 3, 4]);
//! ```

mod bounded;

pub use bounded::BoundedBlockingQueue;

use std::fmt;

/// Result type for queue pushes
pub type QueueResult<T, I> = std::result::Result<T, QueueError<I>>;

/// Errors returned by [`BoundedBlockingQueue`] operations.
///
/// Only pushes fail; the rejected item is handed back so the caller decides
/// whether to retry or drop it. Pops report an empty queue as `None`.
pub enum QueueError<T> {
    /// Queue stayed full for the whole push timeout
    Timeout(T),
    /// Queue is full (non-blocking push)
    Full(T),
}

impl<T> QueueError<T> {
    /// Recover the rejected item
    pub fn into_inner(self) -> T {
        match self {
            QueueError::Timeout(item) | QueueError::Full(item) => item,
        }
    }

    /// Whether the error is a push timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueueError::Timeout(_))
    }
}

impl<T> fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Timeout(_) => write!(f, "Timeout(..)"),
            QueueError::Full(_) => write!(f, "Full(..)"),
        }
    }
}

impl<T> fmt::Display for QueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Timeout(_) => write!(f, "push timed out waiting for space"),
            QueueError::Full(_) => write!(f, "queue is full"),
        }
    }
}

impl<T> std::error::Error for QueueError<T> {}
