//! Named service: a bounded job queue drained by a worker pool

use crate::core::promise::{self, JobFuture, JobPromise};
use crate::core::{Job, JobId, Result, ServiceError, Task};
use crate::queue::{BoundedBlockingQueue, QueueError};
use crate::service::config::ServiceConfig;
use crate::service::stats::{ServiceStats, ServiceStatsSnapshot};
use crate::service::worker::{panic_message, WorkerPool};
use parking_lot::{Condvar, Mutex, RwLock};
use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of a [`Service`].
///
/// `Idle -> Running -> Draining -> Stopped`; `Idle` may also go straight to
/// `Draining`. Every transition happens under one write lock. Submissions check
/// the state and register themselves as in flight under the matching read lock,
/// then release it before waiting for queue space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceState {
    /// Constructed, no workers yet. Jobs queue up until `detach`.
    Idle,
    /// Workers are consuming jobs
    Running,
    /// `join` is in progress; new jobs are rejected
    Draining,
    /// All workers joined
    Stopped,
}

impl ServiceState {
    /// Whether `submit` accepts jobs in this state
    pub fn accepts_jobs(self) -> bool {
        matches!(self, ServiceState::Idle | ServiceState::Running)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Idle => "idle",
            ServiceState::Running => "running",
            ServiceState::Draining => "draining",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A named producer/consumer service.
///
/// Work submitted through [`submit`](Self::submit) and friends is wrapped into
/// a job together with a promise, pushed onto a bounded queue, and executed by
/// one of the worker threads started with [`detach`](Self::detach). The caller
/// keeps the matching [`JobFuture`].
///
/// Concrete services usually wrap a `Service` and expose typed methods:
///
/// ```rust
/// use rust_service_system::prelude::*;
///
/// struct IcecreamVendor {
///     service: Service,
/// }
///
/// impl IcecreamVendor {
///     fn serve(&self, order: &str) -> Result<JobFuture<String>> {
///         self.service
///             .submit_with(order.to_string(), |order| format!("Cone with: {}", order))
///     }
/// }
///
/// # fn main() -> Result<()> {
/// let vendor = IcecreamVendor { service: Service::new("icecream")? };
/// vendor.service.detach(2)?;
///
/// let cone = vendor.serve("Vanilla")?;
/// assert_eq!(cone.wait()?, "Cone with: Vanilla");
///
/// vendor.service.join()?;
/// assert_eq!(vendor.service.total_jobs(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Service {
    config: ServiceConfig,
    queue: Arc<BoundedBlockingQueue<Task>>,
    state: RwLock<ServiceState>,
    pool: Mutex<Option<WorkerPool>>,
    stats: Arc<ServiceStats>,
    job_timeout: Mutex<Duration>,
    in_flight: Mutex<usize>,
    in_flight_done: Condvar,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .field("workers", &self.worker_count())
            .field("queue", &self.queue)
            .field("job_timeout", &self.job_timeout())
            .finish()
    }
}

impl Service {
    /// Create an idle service with an unbounded queue
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        Self::with_config(ServiceConfig::new(name))
    }

    /// Create an idle service whose queue holds at most `capacity` jobs (0 = unbounded)
    pub fn with_capacity<S: Into<String>>(name: S, capacity: usize) -> Result<Self> {
        Self::with_config(ServiceConfig::new(name).with_queue_capacity(capacity))
    }

    /// Create an idle service from a configuration
    pub fn with_config(config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            queue: Arc::new(BoundedBlockingQueue::new(config.queue_capacity)),
            state: RwLock::new(ServiceState::Idle),
            pool: Mutex::new(None),
            stats: Arc::new(ServiceStats::new()),
            job_timeout: Mutex::new(config.job_timeout),
            in_flight: Mutex::new(0),
            in_flight_done: Condvar::new(),
            config,
        })
    }

    /// Start `worker_count` worker threads (0 = number of CPUs).
    ///
    /// # Errors
    ///
    /// - `ServiceError::AlreadyRunning` - `detach` was already called
    /// - `ServiceError::Stopped` - the service was joined
    /// - `ServiceError::SpawnError` - a worker thread could not be created
    pub fn detach(&self, worker_count: usize) -> Result<()> {
        let mut state = self.state.write();
        match *state {
            ServiceState::Idle => {}
            ServiceState::Running => {
                return Err(ServiceError::already_running(
                    &self.config.name,
                    self.worker_count(),
                ));
            }
            ServiceState::Draining | ServiceState::Stopped => {
                return Err(ServiceError::stopped(&self.config.name));
            }
        }

        let worker_count = if worker_count == 0 {
            num_cpus::get()
        } else {
            worker_count
        };

        let pool = WorkerPool::start(
            worker_count,
            &self.config.thread_name_prefix,
            Arc::clone(&self.queue),
            Arc::clone(&self.stats),
        )?;
        *self.pool.lock() = Some(pool);
        *state = ServiceState::Running;

        log::info!(
            "{}: started with {} workers ({} jobs already queued)",
            self.config.name,
            worker_count,
            self.queue.len()
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_service_start(&self.config.name, worker_count);

        Ok(())
    }

    /// Stop accepting jobs, drain the queue, and join every worker.
    ///
    /// Queued jobs run before the workers exit. If `detach` was never called,
    /// queued jobs are discarded and their futures resolve to
    /// [`ServiceError::PromiseBroken`].
    ///
    /// # Errors
    ///
    /// - `ServiceError::Stopped` - `join` was already called
    /// - `ServiceError::JoinError` - a worker thread could not be joined
    pub fn join(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if !state.accepts_jobs() {
                return Err(ServiceError::stopped(&self.config.name));
            }
            *state = ServiceState::Draining;
        }

        // Submitters admitted before the flip may still be waiting for space.
        // Their jobs must land ahead of the stop sentinels.
        {
            let mut in_flight = self.in_flight.lock();
            self.in_flight_done
                .wait_while(&mut in_flight, |count| *count > 0);
        }

        let pool = self.pool.lock().take();
        let result = match pool {
            Some(pool) => pool.stop(),
            None => {
                let discarded = self.queue.clear();
                if !discarded.is_empty() {
                    log::warn!(
                        "{}: discarding {} jobs queued on a service that never started",
                        self.config.name,
                        discarded.len()
                    );
                    self.stats.add_discarded(discarded.len() as u64);
                }
                Ok(())
            }
        };

        *self.state.write() = ServiceState::Stopped;

        log::info!(
            "{}: stopped after {} jobs",
            self.config.name,
            self.total_jobs()
        );
        #[cfg(feature = "tracing")]
        {
            let snap = self.stats.snapshot();
            crate::tracing::metrics::record_service_stop(
                &self.config.name,
                snap.completed,
                snap.panicked,
            );
        }

        result
    }

    /// Submit a closure and get a future for its return value.
    ///
    /// A panic inside `work` resolves the future with
    /// [`ServiceError::JobPanicked`]; the worker keeps running.
    ///
    /// # Errors
    ///
    /// - `ServiceError::ShuttingDown` - `join` has begun
    /// - `ServiceError::SubmissionTimeout` - the queue stayed full for the job
    ///   timeout; the job was dropped
    pub fn submit<R, F>(&self, work: F) -> Result<JobFuture<R>>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let job_id = JobId::new();
        let (promise, future) = promise::channel_for(job_id);

        let job = Job::with_id(job_id, move || match catch_unwind(AssertUnwindSafe(work)) {
            Ok(value) => promise.fulfill(value),
            Err(payload) => {
                promise.fail(ServiceError::job_panicked(
                    job_id,
                    panic_message(payload.as_ref()),
                ));
                // Let the worker log and count it.
                resume_unwind(payload);
            }
        });

        self.enqueue(job)?;
        Ok(future)
    }

    /// Submit `work` applied to `payload`.
    pub fn submit_with<P, R, F>(&self, payload: P, work: F) -> Result<JobFuture<R>>
    where
        P: Send + 'static,
        R: Send + 'static,
        F: FnOnce(P) -> R + Send + 'static,
    {
        self.submit(move || work(payload))
    }

    /// Submit work that receives the promise and fulfills it itself.
    ///
    /// If `work` returns without fulfilling the promise, the future resolves to
    /// [`ServiceError::PromiseBroken`]; if it panics first, to
    /// [`ServiceError::JobPanicked`].
    pub fn submit_promise<R, F>(&self, work: F) -> Result<JobFuture<R>>
    where
        R: Send + 'static,
        F: FnOnce(JobPromise<R>) + Send + 'static,
    {
        let job_id = JobId::new();
        let (promise, future) = promise::channel_for(job_id);

        let job = Job::with_id(job_id, move || {
            let reporter = promise.panic_reporter();
            if let Err(payload) = catch_unwind(AssertUnwindSafe(move || work(promise))) {
                if let Some(reporter) = reporter {
                    reporter.report(panic_message(payload.as_ref()));
                }
                resume_unwind(payload);
            }
        });

        self.enqueue(job)?;
        Ok(future)
    }

    fn enqueue(&self, job: Job) -> Result<()> {
        {
            let state = self.state.read();
            if !state.accepts_jobs() {
                self.stats.increment_rejected();
                log::warn!(
                    "{}: rejected job {} while {}",
                    self.config.name,
                    job.id(),
                    *state
                );
                return Err(ServiceError::shutting_down(&self.config.name));
            }
            *self.in_flight.lock() += 1;
        }

        let timeout = self.job_timeout();
        let result = match self.queue.push(Task::Run(job), timeout) {
            Ok(()) => {
                self.stats.increment_submitted();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_submission(self.queue.len());
                Ok(())
            }
            Err(QueueError::Timeout(task)) | Err(QueueError::Full(task)) => {
                self.stats.increment_rejected();
                if let Task::Run(job) = &task {
                    log::warn!(
                        "{}: job {} timed out. Timeout is at {}ms",
                        self.config.name,
                        job.id(),
                        timeout.as_millis()
                    );
                }
                Err(ServiceError::submission_timeout(
                    &self.config.name,
                    timeout.as_millis() as u64,
                ))
            }
        };

        let mut in_flight = self.in_flight.lock();
        *in_flight -= 1;
        if *in_flight == 0 {
            self.in_flight_done.notify_all();
        }

        result
    }

    /// Change the wait budget used by subsequent submissions
    pub fn set_job_timeout(&self, timeout: Duration) {
        *self.job_timeout.lock() = timeout;
    }

    /// Wait budget used when pushing a job onto a full queue
    pub fn job_timeout(&self) -> Duration {
        *self.job_timeout.lock()
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration the service was built from
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Whether workers are consuming jobs
    pub fn is_running(&self) -> bool {
        self.state() == ServiceState::Running
    }

    /// Number of workers started by `detach` and not yet joined
    pub fn worker_count(&self) -> usize {
        self.pool.lock().as_ref().map_or(0, |pool| pool.size())
    }

    /// Number of worker threads still alive
    pub fn alive_workers(&self) -> usize {
        self.pool.lock().as_ref().map_or(0, |pool| pool.alive())
    }

    /// Jobs executed so far. Shutdown sentinels are not counted.
    pub fn total_jobs(&self) -> u64 {
        self.stats.get_jobs_completed()
    }

    /// Jobs waiting in the queue right now (advisory)
    pub fn current_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Queue capacity (`usize::MAX` when unbounded)
    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Snapshot of the job counters
    pub fn stats(&self) -> ServiceStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        if self.state().accepts_jobs() {
            if let Err(e) = self.join() {
                log::error!(
                    "{}: failed to join service during drop: {}",
                    self.config.name,
                    e
                );
            }
        }
    }
}
