#![allow(dead_code)]

use harbor::config::Config;
use harbor::http::router::Router;
use harbor::server::{Server, ServerStats};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const INDEX: &str = "<!DOCTYPE html><html><body><h1>Harbor</h1></body></html>";

pub struct TestServer {
    pub addr: SocketAddr,
    pub stats: Arc<ServerStats>,
    pub root: tempfile::TempDir,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

/// Starts a server on an ephemeral loopback port over a populated content root.
pub async fn start(configure: impl FnOnce(&mut Config)) -> TestServer {
    launch(configure, None).await
}

/// Like [`start`], but GET and POST go to the given collaborators.
pub async fn start_with_router(router: Router) -> TestServer {
    launch(|_| {}, Some(router)).await
}

async fn launch(configure: impl FnOnce(&mut Config), router: Option<Router>) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("index.html"), INDEX).unwrap();
    std::fs::write(root.path().join("notes.txt"), "some notes").unwrap();

    let mut config = Config::default();
    config.server.port = 0;
    config.server.workers = 4;
    config.limits.idle_timeout_secs = 5;
    config.limits.queue_poll_millis = 50;
    config.content.root = root.path().to_path_buf();
    configure(&mut config);

    let server = match router {
        Some(router) => Server::bind_with_router(config, router).await.unwrap(),
        None => Server::bind(config).await.unwrap(),
    };
    let addr = server.local_addr();
    let stats = server.stats();
    let (shutdown, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async move {
        let _ = rx.await;
    }));

    TestServer {
        addr,
        stats,
        root,
        shutdown,
        handle,
    }
}

impl TestServer {
    pub fn host(&self) -> String {
        format!("127.0.0.1:{}", self.addr.port())
    }

    pub async fn connect(&self) -> Client {
        Client::connect(self.addr.port()).await
    }

    /// Opens a connection, sends one GET with a valid Host and reads the reply.
    pub async fn get(&self, path: &str) -> RawResponse {
        let mut client = self.connect().await;
        client
            .send(format!("GET {path} HTTP/1.1\r\nHost: {}\r\n\r\n", self.host()).as_bytes())
            .await;
        client.response().await
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap().unwrap();
    }
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Minimal client that keeps unread bytes between responses.
pub struct Client {
    pub stream: TcpStream,
    buf: Vec<u8>,
}

impl Client {
    pub async fn connect(port: u16) -> Self {
        Self {
            stream: TcpStream::connect(("127.0.0.1", port)).await.unwrap(),
            buf: Vec::new(),
        }
    }

    pub async fn send(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    pub async fn response(&mut self) -> RawResponse {
        tokio::time::timeout(Duration::from_secs(10), self.read_response())
            .await
            .expect("timed out waiting for response")
    }

    async fn read_response(&mut self) -> RawResponse {
        loop {
            if let Some(response) = self.try_parse() {
                return response;
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before a full response");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn try_parse(&mut self) -> Option<RawResponse> {
        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut parsed = httparse::Response::new(&mut headers);
        let head_len = match parsed.parse(&self.buf).unwrap() {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return None,
        };

        let headers: Vec<(String, String)> = parsed
            .headers
            .iter()
            .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
            .collect();
        let length: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .map_or(0, |(_, v)| v.parse().unwrap());

        if self.buf.len() < head_len + length {
            return None;
        }

        let status = parsed.code.unwrap();
        let body = self.buf[head_len..head_len + length].to_vec();
        self.buf.drain(..head_len + length);
        Some(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// True when the server closes the connection within `wait`.
    pub async fn closed_within(&mut self, wait: Duration) -> bool {
        let mut byte = [0u8; 1];
        matches!(
            tokio::time::timeout(wait, self.stream.read(&mut byte)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }
}
