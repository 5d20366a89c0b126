//! Worker threads and the fixed-size pool that owns them

use crate::core::{Job, Result, ServiceError, Task};
use crate::queue::BoundedBlockingQueue;
use crate::service::stats::ServiceStats;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// A worker thread that pops tasks from a service queue until it pops [`Task::Stop`]
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Create and start a new worker
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier of this worker within its pool
    /// * `thread_name` - OS thread name
    /// * `queue` - The service's job queue
    /// * `stats` - Counters shared with the owning service
    pub fn new(
        id: usize,
        thread_name: String,
        queue: Arc<BoundedBlockingQueue<Task>>,
        stats: Arc<ServiceStats>,
    ) -> Result<Self> {
        let thread = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                Self::run(id, queue, stats);
            })
            .map_err(|e| ServiceError::spawn_with_source(id, "Cannot create thread", e))?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Whether the OS thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| ServiceError::join(self.id, "Worker panicked"))?;
        }
        Ok(())
    }

    /// Main worker loop: WaitingForJob -> Executing -> WaitingForJob until a
    /// stop sentinel arrives.
    fn run(id: usize, queue: Arc<BoundedBlockingQueue<Task>>, stats: Arc<ServiceStats>) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("worker {} started", id);

        loop {
            match queue.pop() {
                Task::Run(job) => {
                    #[cfg(feature = "tracing")]
                    crate::tracing::metrics::record_worker_busy(id);

                    Self::execute_job(id, job, &stats);

                    #[cfg(feature = "tracing")]
                    crate::tracing::metrics::record_worker_idle(id);
                }
                Task::Stop => break,
            }
        }

        log::debug!(
            "worker {} stopped ({} jobs completed by service)",
            id,
            stats.get_jobs_completed()
        );
    }

    /// Execute a single job with panic protection
    fn execute_job(id: usize, job: Job, stats: &ServiceStats) {
        let job_id = job.id();
        let start = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| job.run()));

        let elapsed = start.elapsed();
        stats.increment_completed();
        stats.add_processing_time(elapsed.as_micros() as u64);

        match outcome {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("worker {}: job {} panicked: {}", id, job_id, message);
                stats.increment_panicked();

                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_panic(elapsed);
            }
        }
    }
}

/// A fixed-size set of workers sharing one queue.
///
/// [`stop`](Self::stop) always joins exactly the threads [`start`](Self::start)
/// spawned: one [`Task::Stop`] is queued per worker behind every job already
/// queued, so the queue drains before the workers exit.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
    queue: Arc<BoundedBlockingQueue<Task>>,
}

impl WorkerPool {
    /// Spawn `size` workers named `{prefix}-{id}`
    pub fn start(
        size: usize,
        thread_name_prefix: &str,
        queue: Arc<BoundedBlockingQueue<Task>>,
        stats: Arc<ServiceStats>,
    ) -> Result<Self> {
        let mut pool = Self {
            workers: Vec::with_capacity(size),
            queue,
        };

        for id in 0..size {
            let name = format!("{}-{}", thread_name_prefix, id);
            // On error, dropping `pool` stops the workers already running.
            let worker = Worker::new(id, name, Arc::clone(&pool.queue), Arc::clone(&stats))?;
            pool.workers.push(worker);
        }

        Ok(pool)
    }

    /// Number of workers this pool started
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers whose thread is still alive
    pub fn alive(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_finished()).count()
    }

    /// Queue one stop sentinel per worker and join all of them
    pub fn stop(mut self) -> Result<()> {
        self.stop_inner()
    }

    fn stop_inner(&mut self) -> Result<()> {
        let workers = std::mem::take(&mut self.workers);
        for _ in &workers {
            self.queue.push_blocking(Task::Stop);
        }

        let mut first_error = None;
        for worker in workers {
            if let Err(e) = worker.join() {
                log::error!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            let _ = self.stop_inner();
        }
    }
}
