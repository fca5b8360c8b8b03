use crate::http::request::{Method, Request, Version};
use std::collections::HashMap;
use thiserror::Error;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("request line must have exactly three tokens")]
    InvalidRequestLine,
    #[error("unsupported protocol version {0:?}")]
    UnsupportedVersion(String),
    #[error("content-length is not a valid integer: {0:?}")]
    InvalidContentLength(String),
    /// More bytes are needed before the request is complete.
    #[error("request is incomplete")]
    Incomplete,
}

/// Parses one request from the front of `buf`.
///
/// On success returns the request and the number of bytes it occupied, so
/// pipelined bytes after it can stay buffered for the next call.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    // Look for header/body separator
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;
    let header_bytes = &buf[..headers_end];
    let body_start = headers_end + HEADER_TERMINATOR.len();
    let body_bytes = &buf[body_start..];

    let headers_str = String::from_utf8_lossy(header_bytes);
    let mut lines = headers_str.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let [method, path, version] = parts[..] else {
        return Err(ParseError::InvalidRequestLine);
    };

    let version = Version::parse(version)
        .ok_or_else(|| ParseError::UnsupportedVersion(version.to_string()))?;

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    // Body
    let content_length = headers
        .get("content-length")
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(v.clone()))
        })
        .transpose()?
        .unwrap_or(0);

    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let request = Request {
        method: Method::parse(method),
        path: path.to_string(),
        version,
        headers,
        body: body_bytes[..content_length].to_vec(),
    };

    Ok((request, body_start + content_length))
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.header("Host"), Some("example.com"));
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn leaves_pipelined_bytes_unconsumed() {
        let first = b"GET /a HTTP/1.1\r\nHost: x\r\n\r\n".to_vec();
        let mut buf = first.clone();
        buf.extend_from_slice(b"GET /b HTTP/1.1\r\n");

        let (parsed, consumed) = parse_http_request(&buf).unwrap();

        assert_eq!(parsed.path, "/a");
        assert_eq!(consumed, first.len());
        assert_eq!(
            parse_http_request(&buf[consumed..]).unwrap_err(),
            ParseError::Incomplete
        );
    }
}
