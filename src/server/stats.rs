use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters shared by the listener and every worker.
///
/// All mutation goes through one mutex and each critical section is a single
/// increment or decrement.
#[derive(Debug)]
pub struct ServerStats {
    pool_size: usize,
    counters: Mutex<Counters>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub active_workers: usize,
    pub peak_active_workers: usize,
    pub total_requests: u64,
    pub total_connections: u64,
}

impl ServerStats {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        // A panic cannot leave the counters half-updated.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a worker busy until the returned guard is dropped.
    pub fn worker_started(&self) -> ActiveWorker<'_> {
        let mut counters = self.lock();
        counters.active_workers += 1;
        debug_assert!(counters.active_workers <= self.pool_size);
        counters.peak_active_workers = counters.peak_active_workers.max(counters.active_workers);
        ActiveWorker { stats: self }
    }

    fn worker_finished(&self) {
        let mut counters = self.lock();
        counters.active_workers = counters.active_workers.saturating_sub(1);
    }

    pub fn record_request(&self) {
        self.lock().total_requests += 1;
    }

    pub fn record_connection(&self) {
        self.lock().total_connections += 1;
    }

    pub fn active_workers(&self) -> usize {
        self.lock().active_workers
    }

    pub fn total_requests(&self) -> u64 {
        self.lock().total_requests
    }

    pub fn snapshot(&self) -> Counters {
        *self.lock()
    }
}

/// Decrements the active-worker count on drop, including during unwinding.
#[derive(Debug)]
pub struct ActiveWorker<'a> {
    stats: &'a ServerStats,
}

impl Drop for ActiveWorker<'_> {
    fn drop(&mut self) {
        self.stats.worker_finished();
    }
}
