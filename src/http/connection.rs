use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::LimitsConfig;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::router::Router;
use crate::http::security::{HostPolicy, PathGuard};
use crate::http::writer::ResponseWriter;
use crate::server::stats::ServerStats;

const INITIAL_BUFFER: usize = 4096;
/// How long a rejected connection keeps draining input before closing.
const LINGER: Duration = Duration::from_secs(1);
const LINGER_LIMIT: usize = 64 * 1024;

/// Everything a connection needs that outlives it.
#[derive(Debug)]
pub struct ConnectionContext {
    pub limits: LimitsConfig,
    pub host_policy: HostPolicy,
    pub path_guard: PathGuard,
    pub router: Router,
    pub stats: Arc<ServerStats>,
}

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    state: ConnectionState,
    ctx: Arc<ConnectionContext>,
    requests_served: usize,
    /// Set when the peer may still be sending a request we rejected.
    unread_input: bool,
}

pub enum ConnectionState {
    Reading,
    Validating(Request),
    Routing(Request, PathBuf),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

/// What a read attempt produced.
enum Incoming {
    Request(Request),
    /// Bytes arrived but do not form a usable request.
    Rejected(StatusCode, String),
    /// Peer went away or stayed idle with nothing buffered.
    Gone(&'static str),
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: Arc<ConnectionContext>) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER),
            state: ConnectionState::Reading,
            ctx,
            requests_served: 0,
            unread_input: false,
        }
    }

    /// Drives the connection until it closes. The socket is closed when
    /// `self` is dropped.
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(peer = %self.peer, "connection opened");
        let result = self.serve().await;
        if self.unread_input {
            self.linger().await;
        }
        info!(
            peer = %self.peer,
            requests = self.requests_served,
            "connection closed"
        );
        result
    }

    async fn serve(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await {
                        Incoming::Request(req) => {
                            self.count_request();
                            ConnectionState::Validating(req)
                        }
                        Incoming::Rejected(status, reason) => {
                            self.count_request();
                            self.unread_input = true;
                            debug!(peer = %self.peer, %reason, "rejecting request");
                            Self::closing(Response::error(status))
                        }
                        Incoming::Gone(reason) => {
                            debug!(peer = %self.peer, reason, "peer gone");
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Validating(req) => {
                    info!(
                        peer = %self.peer,
                        method = %req.method,
                        path = %req.path,
                        version = %req.version,
                        "request"
                    );
                    self.state = self.validate(req).await;
                }

                ConnectionState::Routing(req, target) => {
                    self.state = match self.ctx.router.route(&req, &target).await {
                        Ok(response) => self.negotiate(&req, response),
                        Err(e) => {
                            warn!(peer = %self.peer, error = %e, "request handling failed");
                            Self::closing(Response::internal_error())
                        }
                    };
                }

                ConnectionState::Writing(mut writer, keep_alive) => {
                    if let Err(e) = writer.write_to_stream(&mut self.stream).await {
                        debug!(peer = %self.peer, error = %e, "write failed");
                        continue;
                    }
                    debug!(peer = %self.peer, bytes = writer.len(), "response sent");

                    if keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Half-closes the socket and discards input for a short while, so the
    /// peer reads the error response instead of a reset.
    async fn linger(&mut self) {
        if self.stream.shutdown().await.is_err() {
            return;
        }

        let drain = async {
            let mut discarded = 0;
            let mut scratch = [0u8; 4096];
            while discarded < LINGER_LIMIT {
                match self.stream.read(&mut scratch).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => discarded += n,
                }
            }
        };
        let _ = timeout(LINGER, drain).await;
    }

    async fn read_request(&mut self) -> Incoming {
        let limits = &self.ctx.limits;

        loop {
            // Try parsing whatever we already have
            if !self.buffer.is_empty() {
                match parse_http_request(&self.buffer) {
                    Ok((_, consumed)) if consumed > limits.max_request_size => {
                        return Incoming::Rejected(
                            StatusCode::PayloadTooLarge,
                            format!("request exceeds {} bytes", limits.max_request_size),
                        );
                    }
                    Ok((request, consumed)) => {
                        // Pipelined bytes stay for the next round
                        self.buffer.advance(consumed);
                        return Incoming::Request(request);
                    }
                    Err(ParseError::Incomplete) => {
                        if self.buffer.len() >= limits.max_request_size {
                            return Incoming::Rejected(
                                StatusCode::PayloadTooLarge,
                                format!("request exceeds {} bytes", limits.max_request_size),
                            );
                        }
                    }
                    Err(e) => return Incoming::Rejected(StatusCode::BadRequest, e.to_string()),
                }
            }

            self.buffer.reserve(INITIAL_BUFFER);
            let read = timeout(limits.idle_timeout(), self.stream.read_buf(&mut self.buffer)).await;
            let gone = match read {
                Ok(Ok(0)) => "closed by peer",
                Ok(Ok(_)) => continue,
                Err(_) => "idle timeout",
                Ok(Err(e)) if is_disconnect(&e) => "connection reset",
                Ok(Err(e)) => {
                    debug!(peer = %self.peer, error = %e, "read failed");
                    "read error"
                }
            };

            if self.buffer.is_empty() {
                return Incoming::Gone(gone);
            }
            // Half a request and no more coming
            self.buffer.clear();
            return Incoming::Rejected(
                StatusCode::BadRequest,
                format!("incomplete request ({gone})"),
            );
        }
    }

    async fn validate(&self, req: Request) -> ConnectionState {
        if let Err(violation) = self.ctx.host_policy.check(&req) {
            warn!(peer = %self.peer, %violation, "host validation failed");
            return Self::closing(Response::error(violation.status()));
        }

        match self.ctx.path_guard.check(&req.path).await {
            Ok(target) => ConnectionState::Routing(req, target),
            Err(violation) => {
                warn!(peer = %self.peer, %violation, "path validation failed");
                Self::closing(Response::error(violation.status()))
            }
        }
    }

    /// Applies keep-alive negotiation to a routed response.
    fn negotiate(&self, req: &Request, mut response: Response) -> ConnectionState {
        let limits = &self.ctx.limits;
        let keep_alive =
            req.keep_alive() && self.requests_served < limits.max_requests_per_connection;

        if keep_alive {
            response.headers.set("Connection", "keep-alive");
            response.headers.set(
                "Keep-Alive",
                format!(
                    "timeout={}, max={}",
                    limits.idle_timeout_secs, limits.max_requests_per_connection
                ),
            );
        } else {
            response.headers.set("Connection", "close");
        }

        info!(
            peer = %self.peer,
            status = response.status.as_u16(),
            bytes = response.body_len(),
            keep_alive,
            "response"
        );
        ConnectionState::Writing(ResponseWriter::new(&response), keep_alive)
    }

    fn closing(mut response: Response) -> ConnectionState {
        response.headers.set("Connection", "close");
        ConnectionState::Writing(ResponseWriter::new(&response), false)
    }

    fn count_request(&mut self) {
        self.requests_served += 1;
        self.ctx.stats.record_request();
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
