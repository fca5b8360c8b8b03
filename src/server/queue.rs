use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

/// Unbounded FIFO shared between the listener and the workers.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Notify,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Never blocks.
    pub fn put(&self, item: T) {
        self.lock().push_back(item);
        self.available.notify_one();
    }

    /// Waits up to `timeout` for an item. `None` means the wait timed out.
    pub async fn get(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register as a waiter before looking, so every put that lands
            // after the check wakes a distinct waiter.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next = self.lock().pop_front();
            if next.is_some() {
                return next;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                let last_chance = self.lock().pop_front();
                return last_chance;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
