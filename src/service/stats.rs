//! Job counters shared between a service and its workers

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative job counters for a service.
///
/// Only business jobs are counted; shutdown sentinels never touch these.
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// Jobs accepted onto the queue
    pub jobs_submitted: AtomicU64,
    /// Jobs rejected at submission (timeout or shutdown)
    pub jobs_rejected: AtomicU64,
    /// Jobs executed to completion, panicked ones included
    pub jobs_completed: AtomicU64,
    /// Jobs whose body panicked
    pub jobs_panicked: AtomicU64,
    /// Jobs discarded without running
    pub jobs_discarded: AtomicU64,
    /// Total time spent executing jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl ServiceStats {
    /// Create zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs submitted counter
    pub fn increment_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs rejected counter
    pub fn increment_rejected(&self) {
        self.jobs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs completed counter
    pub fn increment_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the discarded counter
    pub fn add_discarded(&self, count: u64) {
        self.jobs_discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs completed
    pub fn get_jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        let completed = self.jobs_completed.load(Ordering::Relaxed);
        let total_us = self.total_processing_time_us.load(Ordering::Relaxed);
        ServiceStatsSnapshot {
            submitted: self.jobs_submitted.load(Ordering::Relaxed),
            rejected: self.jobs_rejected.load(Ordering::Relaxed),
            completed,
            panicked: self.jobs_panicked.load(Ordering::Relaxed),
            discarded: self.jobs_discarded.load(Ordering::Relaxed),
            average_processing_time_us: if completed > 0 {
                total_us as f64 / completed as f64
            } else {
                0.0
            },
        }
    }
}

/// Snapshot of [`ServiceStats`]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ServiceStatsSnapshot {
    /// Jobs accepted onto the queue
    pub submitted: u64,
    /// Jobs rejected at submission
    pub rejected: u64,
    /// Jobs executed
    pub completed: u64,
    /// Jobs whose body panicked
    pub panicked: u64,
    /// Jobs discarded without running
    pub discarded: u64,
    /// Mean execution time per completed job
    pub average_processing_time_us: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = ServiceStats::new();
        stats.increment_submitted();
        stats.increment_submitted();
        stats.increment_rejected();
        stats.increment_completed();
        stats.increment_panicked();
        stats.add_discarded(3);
        stats.add_processing_time(40);

        let snap = stats.snapshot();
        assert_eq!(snap.submitted, 2);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.panicked, 1);
        assert_eq!(snap.discarded, 3);
        assert_eq!(snap.average_processing_time_us, 40.0);
        assert_eq!(stats.get_jobs_completed(), 1);
    }

    #[test]
    fn test_average_without_jobs() {
        assert_eq!(ServiceStats::new().snapshot().average_processing_time_us, 0.0);
    }
}
