//! Job and task types moved through a service's queue

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier assigned to every submitted job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random job id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A deferred zero-argument unit of work.
///
/// Jobs are moved, never copied: caller → queue → worker thread.
pub struct Job {
    id: JobId,
    body: Box<dyn FnOnce() + Send + 'static>,
}

impl Job {
    /// Wrap a closure into a job with a fresh id
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_id(JobId::new(), body)
    }

    /// Wrap a closure into a job with an existing id
    pub fn with_id<F>(id: JobId, body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            body: Box::new(body),
        }
    }

    /// The job's id
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Consume the job and run its body on the current thread
    pub fn run(self) {
        (self.body)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.id)
    }
}

/// An item on a service's job queue.
///
/// Shutdown sentinels are tagged explicitly so they are never mistaken for
/// business jobs in counters.
#[derive(Debug)]
pub enum Task {
    /// Execute the wrapped job
    Run(Job),
    /// Stop the worker that pops this task
    Stop,
}

impl Task {
    /// Whether this task is a shutdown sentinel
    pub fn is_stop(&self) -> bool {
        matches!(self, Task::Stop)
    }
}

impl From<Job> for Task {
    fn from(job: Job) -> Self {
        Task::Run(job)
    }
}
