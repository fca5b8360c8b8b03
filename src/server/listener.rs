use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, info, warn};

use crate::server::pool::WorkerPool;
use crate::server::stats::ServerStats;

/// Pause after an accept failure that is not tied to one connection, such as
/// running out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// An accepted connection waiting for a worker.
#[derive(Debug)]
pub struct WorkItem {
    pub stream: TcpStream,
    pub peer: SocketAddr,
}

/// Binds `host:port` with address reuse and the given backlog.
pub async fn bind(host: &str, port: u16, backlog: u32) -> anyhow::Result<TcpListener> {
    let addr = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("resolving {host}:{port}"))?
        .next()
        .with_context(|| format!("no address found for {host}:{port}"))?;

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4()?,
        SocketAddr::V6(_) => TcpSocket::new_v6()?,
    };
    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("binding {addr}"))?;
    Ok(socket.listen(backlog)?)
}

/// Accepts connections and hands them to the pool until `shutdown` resolves.
///
/// The listening socket is dropped on return, so later connection attempts
/// are refused.
pub async fn run<F>(
    listener: TcpListener,
    pool: &WorkerPool<WorkItem>,
    stats: Arc<ServerStats>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => {
                info!("listener shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                    tokio::time::sleep(accept_retry_delay(&e)).await;
                    continue;
                }
            },
        };

        stats.record_connection();
        let active = stats.active_workers();
        if active >= pool.size() {
            warn!(
                %peer,
                queued = pool.queue_depth() + 1,
                "worker pool saturated, queuing connection"
            );
        } else {
            debug!(%peer, active, "accepted connection");
        }

        pool.submit(WorkItem { stream, peer });
    }

    drop(listener);
    Ok(())
}

/// A peer that gave up before accept is retried at once; anything else
/// (EMFILE, ENFILE, ENOBUFS) waits so the loop does not spin.
fn accept_retry_delay(e: &io::Error) -> Duration {
    match e.kind() {
        io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset => Duration::ZERO,
        _ => ACCEPT_BACKOFF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_exhaustion_backs_off() {
        // EMFILE
        let too_many_files = io::Error::from_raw_os_error(24);
        assert_eq!(accept_retry_delay(&too_many_files), ACCEPT_BACKOFF);

        let aborted = io::Error::from(io::ErrorKind::ConnectionAborted);
        assert_eq!(accept_retry_delay(&aborted), Duration::ZERO);
    }
}
