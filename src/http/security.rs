//! Request validation applied before routing.
//!
//! Both checks close the connection on failure; see
//! [`SecurityViolation::status`] for the status each violation maps to.

use std::io;
use std::net::Ipv6Addr;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::http::request::Request;
use crate::http::response::StatusCode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecurityViolation {
    #[error("missing Host header")]
    MissingHost,
    #[error("Host header {0:?} does not name this server")]
    HostMismatch(String),
    #[error("path {0:?} escapes the content root")]
    PathTraversal(String),
}

impl SecurityViolation {
    pub fn status(&self) -> StatusCode {
        match self {
            SecurityViolation::MissingHost => StatusCode::BadRequest,
            SecurityViolation::HostMismatch(_) | SecurityViolation::PathTraversal(_) => {
                StatusCode::Forbidden
            }
        }
    }
}

/// Decides which `Host` header values name this server.
#[derive(Debug, Clone)]
pub struct HostPolicy {
    accepted: Vec<String>,
    wildcard: bool,
}

impl HostPolicy {
    /// `host` and `port` are the address actually bound. A wildcard bind
    /// accepts every Host value.
    pub fn new(host: &str, port: u16, wildcard: bool) -> Self {
        let host = host_literal(host);
        let mut accepted = Vec::with_capacity(6);
        for name in [host.as_str(), "localhost", "127.0.0.1"] {
            let with_port = format!("{name}:{port}");
            for candidate in [with_port, name.to_string()] {
                if !accepted.iter().any(|a: &String| a.eq_ignore_ascii_case(&candidate)) {
                    accepted.push(candidate);
                }
            }
        }

        Self { accepted, wildcard }
    }

    pub fn check(&self, request: &Request) -> Result<(), SecurityViolation> {
        let host = request
            .header("host")
            .ok_or(SecurityViolation::MissingHost)?;

        if self.wildcard || self.accepted.iter().any(|a| a.eq_ignore_ascii_case(host)) {
            Ok(())
        } else {
            Err(SecurityViolation::HostMismatch(host.to_string()))
        }
    }
}

/// IPv6 literals appear bracketed in `Host` headers.
fn host_literal(host: &str) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

/// Keeps request paths inside the content root.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Canonicalizes `root`, which therefore has to exist.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    /// Returns the target as a path relative to the root. `/` yields an empty
    /// path. The query string and fragment are not part of the target.
    pub async fn check(&self, raw: &str) -> Result<PathBuf, SecurityViolation> {
        let reject = || SecurityViolation::PathTraversal(raw.to_string());

        if raw.contains("..") || raw.starts_with("//") {
            return Err(reject());
        }

        let target = raw.split(['?', '#']).next().unwrap_or_default();
        let target = target.strip_prefix('/').unwrap_or(target);

        let mut relative = PathBuf::new();
        for component in Path::new(target).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(reject());
                }
            }
        }

        let full = self.root.join(&relative);
        // Symlinks can still point outside the root, so resolve what exists.
        let resolved = match tokio::fs::canonicalize(&full).await {
            Ok(path) => path,
            Err(_) => full,
        };

        if resolved.starts_with(&self.root) {
            Ok(relative)
        } else {
            Err(reject())
        }
    }
}
