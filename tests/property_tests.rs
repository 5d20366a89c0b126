//! Property-based tests for rust_service_system using proptest

use proptest::prelude::*;
use rust_service_system::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// BoundedBlockingQueue Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Single-threaded pushes come back out in the same order
    #[test]
    fn test_queue_fifo(values in prop::collection::vec(any::<u32>(), 0..64)) {
        let queue = BoundedBlockingQueue::unbounded();
        for v in &values {
            queue.push(*v, Duration::from_millis(1)).unwrap();
        }
        prop_assert_eq!(queue.len(), values.len());

        let popped: Vec<u32> = (0..values.len()).map(|_| queue.pop()).collect();
        prop_assert_eq!(popped, values);
        prop_assert!(queue.is_empty());
    }

    /// The observed length never exceeds capacity, and exactly `capacity`
    /// non-blocking pushes succeed on an empty queue
    #[test]
    fn test_queue_never_exceeds_capacity(capacity in 1usize..16, attempts in 1usize..40) {
        let queue = BoundedBlockingQueue::new(capacity);
        let mut accepted = 0;
        for i in 0..attempts {
            match queue.try_push(i) {
                Ok(()) => accepted += 1,
                Err(QueueError::Full(item)) => prop_assert_eq!(item, i),
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
            prop_assert!(queue.len() <= capacity);
        }
        prop_assert_eq!(accepted, attempts.min(capacity));
        prop_assert_eq!(queue.is_full(), attempts >= capacity);
    }

    /// Every pushed item is popped exactly once across concurrent producers
    /// and consumers
    #[test]
    fn test_queue_no_loss_no_duplication(
        producers in 1usize..4,
        consumers in 1usize..4,
        per_producer in 1usize..50,
        capacity in 1usize..8
    ) {
        let queue = Arc::new(BoundedBlockingQueue::new(capacity));
        let total = producers * per_producer;

        let producer_handles: Vec<_> = (0..producers)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..per_producer {
                        queue.push_blocking(Some(p * per_producer + i));
                    }
                })
            })
            .collect();

        let consumer_handles: Vec<_> = (0..consumers)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(item) = queue.pop() {
                        assert!(queue.len() <= capacity);
                        seen.push(item);
                    }
                    seen
                })
            })
            .collect();

        for handle in producer_handles {
            handle.join().unwrap();
        }
        for _ in 0..consumers {
            queue.push_blocking(None);
        }

        let mut seen = HashSet::new();
        for handle in consumer_handles {
            for item in handle.join().unwrap() {
                prop_assert!(seen.insert(item), "item {} popped twice", item);
            }
        }
        prop_assert_eq!(seen.len(), total);
    }
}

// ============================================================================
// Service Tests
// ============================================================================

thread_local! {
    // Released by the thread-local destructor when a worker thread exits
    static WORKER_MARK: RefCell<Option<Arc<()>>> = RefCell::new(None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Each future carries the result of its own job, and total_jobs counts
    /// every submission once the service is joined
    #[test]
    fn test_service_results_match_inputs(
        workers in 1usize..6,
        inputs in prop::collection::vec(0u64..1_000_000, 1..100)
    ) {
        let service = Service::new("squares").unwrap();
        service.detach(workers).unwrap();

        let futures: Vec<_> = inputs
            .iter()
            .map(|&n| service.submit(move || n * 2).unwrap())
            .collect();

        for (n, future) in inputs.iter().zip(futures) {
            prop_assert_eq!(future.wait().unwrap(), n * 2);
        }

        service.join().unwrap();
        prop_assert_eq!(service.total_jobs(), inputs.len() as u64);
        prop_assert_eq!(service.current_jobs(), 0);
    }

    /// join runs every queued job and every worker thread has exited when
    /// it returns
    #[test]
    fn test_join_drains_queue(workers in 1usize..4, jobs in 1usize..60) {
        let service = Service::with_capacity("drain", 8).unwrap();
        service.set_job_timeout(Duration::from_secs(5));
        service.detach(workers).unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let mark = Arc::new(());
        for _ in 0..jobs {
            let counter = Arc::clone(&counter);
            let mark = Arc::clone(&mark);
            service.submit(move || {
                WORKER_MARK.with(|slot| *slot.borrow_mut() = Some(mark));
                counter.fetch_add(1, Ordering::SeqCst);
            }).unwrap();
        }

        service.join().unwrap();
        prop_assert_eq!(counter.load(Ordering::SeqCst), jobs);
        prop_assert_eq!(service.total_jobs(), jobs as u64);
        prop_assert_eq!(service.current_jobs(), 0);
        // Only exited worker threads have dropped their marks
        prop_assert_eq!(Arc::strong_count(&mark), 1);
    }

    /// Panicking jobs fail only their own future
    #[test]
    fn test_panic_isolation(panic_count in 1usize..8, success_count in 1usize..8) {
        let service = Service::new("fragile").unwrap();
        service.detach(2).unwrap();

        let bad: Vec<_> = (0..panic_count)
            .map(|_| service.submit(|| -> u8 { panic!("Intentional panic for testing") }).unwrap())
            .collect();
        let good: Vec<_> = (0..success_count)
            .map(|i| service.submit(move || i).unwrap())
            .collect();

        for future in bad {
            let is_panicked = matches!(future.wait(), Err(ServiceError::JobPanicked { .. }));
            prop_assert!(is_panicked);
        }
        for (i, future) in good.into_iter().enumerate() {
            prop_assert_eq!(future.wait().unwrap(), i);
        }

        service.join().unwrap();
        let stats = service.stats();
        prop_assert_eq!(stats.panicked, panic_count as u64);
        prop_assert_eq!(stats.completed, (panic_count + success_count) as u64);
    }

    /// Configurations survive a JSON round trip
    #[test]
    fn test_config_json_roundtrip(
        name in "[a-z]{1,12}",
        capacity in 0usize..1024,
        timeout_ms in 0u64..10_000
    ) {
        let config = ServiceConfig::new(name)
            .with_queue_capacity(capacity)
            .with_job_timeout(Duration::from_millis(timeout_ms));
        let json = serde_json::to_string(&config).unwrap();
        prop_assert_eq!(ServiceConfig::from_json(&json).unwrap(), config);
    }
}
