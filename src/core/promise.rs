//! One-shot promise/future pair used to hand job results back to callers
//!
//! A [`JobPromise`] is the single-owner write end; a [`JobFuture`] is the read
//! end held by whoever submitted the job. Fulfilling consumes the promise, so a
//! value can be written at most once. Dropping an unfulfilled promise resolves
//! the future with [`ServiceError::PromiseBroken`], or with
//! [`ServiceError::JobPanicked`] when the drop happens during a panic, so a
//! caller never waits forever on a job that was discarded or crashed.
//!
//! # Example
//!
//! ```rust
//! use rust_service_system::core::promise;
//! use std::thread::{self, ThreadId};
//!
//! let (promise, future) = promise::channel::<u32>();
//!
//! thread::spawn(move || promise.fulfill(42));
//!
//! assert_eq!(future.wait().unwrap(), 42);
//! ```

use crate::core::error::{Result, ServiceError};
use crate::core::job::JobId;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

enum Slot<R> {
    Pending,
    Ready(Result<R>),
    Taken,
}

struct Shared<R> {
    job_id: JobId,
    slot: Mutex<Slot<R>>,
    ready: Condvar,
    // Thread of a live PanicReporter. A promise unwinding on that thread
    // leaves the slot to the reporter so the panic message is not lost.
    reporter_thread: Mutex<Option<ThreadId>>,
}

impl<R> Shared<R> {
    fn complete(&self, outcome: Result<R>) {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Ready(outcome);
            self.ready.notify_all();
        }
    }

    fn take(&self, slot: &mut Slot<R>) -> Result<R> {
        match std::mem::replace(slot, Slot::Taken) {
            Slot::Ready(outcome) => outcome,
            Slot::Taken => Err(ServiceError::result_taken(self.job_id)),
            Slot::Pending => unreachable!("take called on a pending slot"),
        }
    }
}

/// Create a linked promise/future pair with a fresh job id
pub fn channel<R>() -> (JobPromise<R>, JobFuture<R>) {
    channel_for(JobId::new())
}

/// Create a linked promise/future pair for the given job
pub fn channel_for<R>(job_id: JobId) -> (JobPromise<R>, JobFuture<R>) {
    let shared = Arc::new(Shared {
        job_id,
        slot: Mutex::new(Slot::Pending),
        ready: Condvar::new(),
        reporter_thread: Mutex::new(None),
    });
    (
        JobPromise {
            shared: Some(Arc::clone(&shared)),
        },
        JobFuture { shared },
    )
}

/// Write end of a one-shot result cell
pub struct JobPromise<R> {
    shared: Option<Arc<Shared<R>>>,
}

impl<R> JobPromise<R> {
    /// Id of the job this promise belongs to
    pub fn job_id(&self) -> JobId {
        self.shared
            .as_ref()
            .map(|s| s.job_id)
            .unwrap_or_default()
    }

    /// Resolve the future with a value
    pub fn fulfill(self, value: R) {
        self.complete(Ok(value));
    }

    /// Resolve the future with an error
    pub fn fail(self, error: ServiceError) {
        self.complete(Err(error));
    }

    /// Resolve the future with an outcome
    pub fn complete(mut self, outcome: Result<R>) {
        if let Some(shared) = self.shared.take() {
            shared.complete(outcome);
        }
    }

    /// Second write handle, bound to the current thread, that reports a panic
    /// of the code holding this promise with the real panic message.
    pub(crate) fn panic_reporter(&self) -> Option<PanicReporter<R>> {
        self.shared.as_ref().map(|shared| {
            *shared.reporter_thread.lock() = Some(thread::current().id());
            PanicReporter {
                shared: Arc::clone(shared),
            }
        })
    }
}

impl<R> Drop for JobPromise<R> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            let job_id = shared.job_id;
            let error = if thread::panicking() {
                if *shared.reporter_thread.lock() == Some(thread::current().id()) {
                    return;
                }
                ServiceError::job_panicked(job_id, "panicked before fulfilling its promise")
            } else {
                ServiceError::promise_broken(job_id)
            };
            shared.complete(Err(error));
        }
    }
}

/// Writes [`ServiceError::JobPanicked`] into a future whose promise was
/// dropped by a panic. No-op if the future already holds a result.
pub(crate) struct PanicReporter<R> {
    shared: Arc<Shared<R>>,
}

impl<R> PanicReporter<R> {
    pub(crate) fn report(self, message: String) {
        let job_id = self.shared.job_id;
        self.shared
            .complete(Err(ServiceError::job_panicked(job_id, message)));
    }
}

impl<R> Drop for PanicReporter<R> {
    fn drop(&mut self) {
        *self.shared.reporter_thread.lock() = None;
    }
}

impl<R> fmt::Debug for JobPromise<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobPromise")
            .field("job_id", &self.job_id())
            .finish()
    }
}

/// Read end of a one-shot result cell
pub struct JobFuture<R> {
    shared: Arc<Shared<R>>,
}

impl<R> JobFuture<R> {
    /// Id of the job this future belongs to
    pub fn job_id(&self) -> JobId {
        self.shared.job_id
    }

    /// Whether a result (or failure) has been written and not yet taken
    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.slot.lock(), Slot::Ready(_))
    }

    /// Take the result if one is available, without blocking
    pub fn try_take(&self) -> Option<Result<R>> {
        let mut slot = self.shared.slot.lock();
        match *slot {
            Slot::Pending => None,
            _ => Some(self.shared.take(&mut slot)),
        }
    }

    /// Block until the result is available and return it
    pub fn wait(self) -> Result<R> {
        let mut slot = self.shared.slot.lock();
        while matches!(*slot, Slot::Pending) {
            self.shared.ready.wait(&mut slot);
        }
        self.shared.take(&mut slot)
    }

    /// Block for at most `timeout` waiting for the result.
    ///
    /// Returns [`ServiceError::FutureTimeout`] if nothing arrived in time; the
    /// future stays usable and can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<R> {
        let mut slot = self.shared.slot.lock();
        self.shared
            .ready
            .wait_while_for(&mut slot, |s| matches!(s, Slot::Pending), timeout);
        if matches!(*slot, Slot::Pending) {
            return Err(ServiceError::future_timeout(
                self.shared.job_id,
                timeout.as_millis() as u64,
            ));
        }
        self.shared.take(&mut slot)
    }
}

impl<R> fmt::Debug for JobFuture<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.shared.slot.lock() {
            Slot::Pending => "pending",
            Slot::Ready(_) => "ready",
            Slot::Taken => "taken",
        };
        f.debug_struct("JobFuture")
            .field("job_id", &self.shared.job_id)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::{self, ThreadId};

    #[test]
    fn test_fulfill_then_wait() {
        let (promise, future) = channel::<String>();
        promise.fulfill("cone".to_string());
        assert!(future.is_ready());
        assert_eq!(future.wait().unwrap(), "cone");
    }

    #[test]
    fn test_wait_across_threads() {
        let (promise, future) = channel::<u64>();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            promise.fulfill(7);
        });
        assert_eq!(future.wait().unwrap(), 7);
        handle.join().unwrap();
    }

    #[test]
    fn test_dropped_promise_breaks_future() {
        let (promise, future) = channel::<u8>();
        let job_id = future.job_id();
        drop(promise);

        match future.wait() {
            Err(ServiceError::PromiseBroken { job_id: id }) => assert_eq!(id, job_id),
            other => panic!("expected PromiseBroken, got {:?}", other),
        }
    }

    #[test]
    fn test_panicking_holder_fails_future() {
        let (promise, future) = channel::<u8>();
        let handle = thread::spawn(move || {
            let _promise = promise;
            panic!("chair broke");
        });
        assert!(handle.join().is_err());

        assert!(matches!(
            future.wait(),
            Err(ServiceError::JobPanicked { .. })
        ));
    }

    #[test]
    fn test_panic_reporter_keeps_message() {
        let (promise, future) = channel::<u8>();
        let reporter = promise.panic_reporter().unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _promise = promise;
            panic!("chair broke");
        }));
        assert!(result.is_err());
        assert!(!future.is_ready());

        reporter.report("chair broke".to_string());
        match future.wait() {
            Err(ServiceError::JobPanicked { message, .. }) => assert_eq!(message, "chair broke"),
            other => panic!("expected JobPanicked, got {:?}", other),
        }
    }

    #[test]
    fn test_reporter_ignores_panics_on_other_threads() {
        let (promise, future) = channel::<u8>();
        let _reporter = promise.panic_reporter().unwrap();
        let handle = thread::spawn(move || {
            let _promise = promise;
            panic!("courier tripped");
        });
        assert!(handle.join().is_err());

        assert!(matches!(
            future.wait(),
            Err(ServiceError::JobPanicked { .. })
        ));
    }

    #[test]
    fn test_reporter_does_not_override_value() {
        let (promise, future) = channel::<u8>();
        let reporter = promise.panic_reporter().unwrap();
        promise.fulfill(3);
        reporter.report("late".to_string());
        assert_eq!(future.wait().unwrap(), 3);
    }

    #[test]
    fn test_fail_surfaces_error() {
        let (promise, future) = channel::<u8>();
        let job_id = promise.job_id();
        promise.fail(ServiceError::job_panicked(job_id, "bad order"));
        assert!(matches!(
            future.wait(),
            Err(ServiceError::JobPanicked { .. })
        ));
    }

    #[test]
    fn test_try_take_pending_then_taken() {
        let (promise, future) = channel::<i32>();
        assert!(future.try_take().is_none());

        promise.fulfill(-1);
        assert_eq!(future.try_take().unwrap().unwrap(), -1);
        assert!(matches!(
            future.try_take(),
            Some(Err(ServiceError::ResultTaken { .. }))
        ));
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let (_promise, future) = channel::<i32>();
        let start = std::time::Instant::now();
        let result = future.wait_timeout(Duration::from_millis(30));
        assert!(matches!(result, Err(ServiceError::FutureTimeout { .. })));
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(!future.is_ready());
    }

    #[test]
    fn test_wait_timeout_returns_value() {
        let (promise, future) = channel::<i32>();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            promise.fulfill(5);
        });
        assert_eq!(future.wait_timeout(Duration::from_secs(5)).unwrap(), 5);
    }

    #[test]
    fn test_channel_for_keeps_job_id() {
        let id = JobId::new();
        let (promise, future) = channel_for::<()>(id);
        assert_eq!(promise.job_id(), id);
        assert_eq!(future.job_id(), id);
    }
}
