use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::server::queue::WorkQueue;
use crate::server::stats::ServerStats;

/// Fixed set of workers draining a [`WorkQueue`].
///
/// Each worker runs one handler invocation at a time, so at most `size`
/// items are in progress. The queue itself is unbounded.
#[derive(Debug)]
pub struct WorkerPool<T> {
    queue: Arc<WorkQueue<T>>,
    stats: Arc<ServerStats>,
    running: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawns `stats.pool_size()` workers. `poll_interval` bounds how long an
    /// idle worker waits before re-checking the running flag.
    pub fn start<H, Fut>(stats: Arc<ServerStats>, poll_interval: Duration, handler: H) -> Self
    where
        H: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let queue = Arc::new(WorkQueue::new());
        let running = Arc::new(AtomicBool::new(true));
        let handler = Arc::new(handler);

        let workers = (1..=stats.pool_size())
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: Arc::clone(&queue),
                    stats: Arc::clone(&stats),
                    running: Arc::clone(&running),
                    poll_interval,
                };
                tokio::spawn(worker.run(Arc::clone(&handler)))
            })
            .collect();

        info!(workers = stats.pool_size(), "worker pool started");

        Self {
            queue,
            stats,
            running,
            workers,
        }
    }

    /// Queues an item for the next free worker.
    pub fn submit(&self, item: T) {
        self.queue.put(item);
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    pub fn size(&self) -> usize {
        self.stats.pool_size()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clears the running flag and waits up to `grace` for the workers.
    ///
    /// Workers finish the item they hold before exiting. Any still busy after
    /// `grace` are left to finish on their own.
    pub async fn stop(self, grace: Duration) {
        self.running.store(false, Ordering::Release);

        let joined = tokio::time::timeout(grace, async {
            for worker in self.workers {
                if let Err(e) = worker.await {
                    error!(error = %e, "worker task failed");
                }
            }
        })
        .await;

        match joined {
            Ok(()) => info!("worker pool stopped"),
            Err(_) => warn!(
                active = self.stats.active_workers(),
                "worker pool stop timed out; detaching busy workers"
            ),
        }
    }
}

struct Worker<T> {
    id: usize,
    queue: Arc<WorkQueue<T>>,
    stats: Arc<ServerStats>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl<T: Send + 'static> Worker<T> {
    async fn run<H, Fut>(self, handler: Arc<H>)
    where
        H: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        while self.running.load(Ordering::Acquire) {
            let Some(item) = self.queue.get(self.poll_interval).await else {
                continue;
            };

            let _active = self.stats.worker_started();
            let span = info_span!("worker", id = self.id);

            // Run the handler as its own task so a panic is reported through
            // the join handle instead of killing this worker.
            match tokio::spawn(handler(item).instrument(span)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(worker = self.id, error = %e, "connection handler failed"),
                Err(e) => error!(worker = self.id, error = %e, "connection handler panicked"),
            }
        }

        debug!(worker = self.id, "worker exiting");
    }
}
