//! Bounded FIFO queue with blocking push/pop.

use super::{QueueError, QueueResult};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

/// A thread-safe FIFO with a fixed maximum number of items.
///
/// Producers block in [`push`](Self::push) while the queue is full, for at most
/// the given timeout. Consumers block in [`pop`](Self::pop) while it is empty,
/// without a timeout. A capacity of 0 means unbounded (`usize::MAX`).
///
/// The observed length never exceeds [`capacity`](Self::capacity), and every
/// item is handed to exactly one consumer.
///
/// # Example
///
/// ```rust
/// use rust_service_system::queue::{BoundedBlockingQueue, QueueError};
/// use std::time::Duration;
///
/// let queue = BoundedBlockingQueue::new(1);
/// queue.push("first", Duration::from_millis(10)).unwrap();
///
/// // Queue is full - the push times out and the item comes back
/// match queue.push("second", Duration::from_millis(10)) {
///     Err(QueueError::Timeout(item)) => assert_eq!(item, "second"),
///     _ => panic!("expected Timeout error"),
/// }
///
/// assert_eq!(queue.pop(), "first");
/// ```
pub struct BoundedBlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedBlockingQueue<T> {
    /// Creates a new queue holding at most `capacity` items.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The maximum number of items. `0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { usize::MAX } else { capacity };
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Creates a queue without a practical bound.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Returns the maximum capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `item`, waiting up to `timeout` for space.
    ///
    /// On timeout the item is handed back in [`QueueError::Timeout`].
    pub fn push(&self, item: T, timeout: Duration) -> QueueResult<(), T> {
        let capacity = self.capacity;
        let mut items = self.items.lock();

        if items.len() >= capacity {
            self.not_full
                .wait_while_for(&mut items, |items| items.len() >= capacity, timeout);
            if items.len() >= capacity {
                return Err(QueueError::Timeout(item));
            }
        }

        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Appends `item`, waiting as long as it takes for space.
    pub fn push_blocking(&self, item: T) {
        let capacity = self.capacity;
        let mut items = self.items.lock();
        self.not_full
            .wait_while(&mut items, |items| items.len() >= capacity);

        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
    }

    /// Appends `item` only if there is space right now.
    pub fn try_push(&self, item: T) -> QueueResult<(), T> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(QueueError::Full(item));
        }

        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Removes and returns the front item, waiting as long as the queue is empty.
    pub fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                drop(items);
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut items);
        }
    }

    /// Removes and returns the front item, waiting up to `timeout`.
    ///
    /// Returns `None` if the queue stayed empty.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let mut items = self.items.lock();
        if items.is_empty() {
            self.not_empty
                .wait_while_for(&mut items, |items| items.is_empty(), timeout);
        }

        let item = items.pop_front()?;
        drop(items);
        self.not_full.notify_one();
        Some(item)
    }

    /// Removes and returns the front item if there is one.
    pub fn try_pop(&self) -> Option<T> {
        let item = self.items.lock().pop_front()?;
        self.not_full.notify_one();
        Some(item)
    }

    /// Removes every queued item, front first.
    pub fn clear(&self) -> Vec<T> {
        let drained: Vec<T> = self.items.lock().drain(..).collect();
        self.not_full.notify_all();
        drained
    }

    /// Current number of items. May be stale as soon as it returns.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Alias for [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Whether the queue is currently empty. May be stale as soon as it returns.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Alias for [`is_empty`](Self::is_empty).
    pub fn empty(&self) -> bool {
        self.is_empty()
    }

    /// Whether the queue is currently at capacity.
    pub fn is_full(&self) -> bool {
        self.items.lock().len() >= self.capacity
    }

    /// Free slots at this instant.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.items.lock().len()
    }
}

impl<T> Default for BoundedBlockingQueue<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> fmt::Debug for BoundedBlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedBlockingQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
