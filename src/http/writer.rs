use std::fmt::Write as _;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::http::response::Response;

/// Serializes a response into its exact wire bytes.
///
/// A Content-Length header is appended after the caller's headers when a
/// body is present and none was set explicitly.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let body = resp.body.as_ref().map(|b| b.as_bytes());

    let mut head = String::with_capacity(256);
    // Writing into a String cannot fail.
    let _ = write!(
        head,
        "HTTP/1.1 {} {}\r\n",
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    for (name, value) in resp.headers.iter() {
        let _ = write!(head, "{name}: {value}\r\n");
    }
    if let Some(body) = body
        && !resp.headers.contains("Content-Length")
    {
        let _ = write!(head, "Content-Length: {}\r\n", body.len());
    }
    head.push_str("\r\n");

    let mut wire = head.into_bytes();
    wire.extend_from_slice(body.unwrap_or_default());
    wire
}

/// Holds serialized response bytes and tracks how many reached the socket.
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes the remaining bytes. There is no timeout on writes.
    pub async fn write_to_stream(&mut self, stream: &mut TcpStream) -> anyhow::Result<()> {
        while let Some(rest) = self.buffer.get(self.written..).filter(|r| !r.is_empty()) {
            match stream.write(rest).await? {
                0 => anyhow::bail!("peer stopped accepting response bytes"),
                n => self.written += n,
            }
        }

        stream.flush().await?;
        Ok(())
    }
}
