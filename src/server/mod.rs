//! Accept path, work queue and worker pool.

pub mod listener;
pub mod pool;
pub mod queue;
pub mod stats;

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::content::{self, JsonUploads, StaticFiles};
use crate::http::connection::{Connection, ConnectionContext};
use crate::http::router::Router;
use crate::http::security::{HostPolicy, PathGuard};

pub use listener::WorkItem;
pub use pool::WorkerPool;
pub use queue::WorkQueue;
pub use stats::{Counters, ServerStats};

/// A bound server with its worker pool already running.
#[derive(Debug)]
pub struct Server {
    config: Config,
    listener: TcpListener,
    local_addr: SocketAddr,
    pool: WorkerPool<WorkItem>,
    stats: Arc<ServerStats>,
}

impl Server {
    /// Binds with the filesystem-backed collaborators rooted at
    /// `config.content.root`, creating the directories if needed.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        content::bootstrap(&config.content)
            .await
            .with_context(|| format!("preparing {}", config.content.root.display()))?;

        let public_uploads = format!("/{}", config.content.uploads_dir.display());
        let router = Router::new(
            Arc::new(StaticFiles::new(&config.content.root)),
            Arc::new(JsonUploads::new(config.content.uploads_path(), public_uploads)),
        );
        Self::bind_with_router(config, router).await
    }

    /// Binds with caller-supplied collaborators. The content root must exist.
    pub async fn bind_with_router(config: Config, router: Router) -> anyhow::Result<Self> {
        config.validate()?;

        let listener = listener::bind(
            &config.server.host,
            config.server.port,
            config.server.backlog,
        )
        .await?;
        let local_addr = listener.local_addr()?;

        let stats = Arc::new(ServerStats::new(config.server.workers));
        let ctx = Arc::new(ConnectionContext {
            limits: config.limits.clone(),
            host_policy: HostPolicy::new(
                &config.server.host,
                local_addr.port(),
                config.is_wildcard(),
            ),
            path_guard: path_guard(&config.content.root)?,
            router,
            stats: Arc::clone(&stats),
        });

        let pool = WorkerPool::start(
            Arc::clone(&stats),
            config.limits.queue_poll_interval(),
            move |item: WorkItem| {
                let ctx = Arc::clone(&ctx);
                async move { Connection::new(item.stream, item.peer, ctx).run().await }
            },
        );

        info!(
            addr = %local_addr,
            workers = config.server.workers,
            root = %config.content.root.display(),
            "server listening"
        );

        Ok(Self {
            config,
            listener,
            local_addr,
            pool,
            stats,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Serves until `shutdown` resolves, then stops the pool.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let Server {
            config,
            listener,
            pool,
            stats,
            ..
        } = self;

        let result = listener::run(listener, &pool, Arc::clone(&stats), shutdown).await;
        pool.stop(config.limits.shutdown_grace()).await;

        let totals = stats.snapshot();
        info!(
            requests = totals.total_requests,
            connections = totals.total_connections,
            "server stopped"
        );
        result
    }
}

fn path_guard(root: &Path) -> anyhow::Result<PathGuard> {
    PathGuard::new(root).with_context(|| format!("content root {} is not usable", root.display()))
}
