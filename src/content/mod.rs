//! Content collaborators used by the router.
//!
//! The connection engine only sees the [`ContentResolver`] and [`UploadSink`]
//! traits; the filesystem-backed implementations live in the submodules.

pub mod static_files;
pub mod uploads;

use std::io;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ContentConfig;

pub use static_files::StaticFiles;
pub use uploads::JsonUploads;

/// How a resolved file should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKind {
    /// Rendered inline as `text/html`.
    Markup,
    /// Sent as an attachment with the given file name.
    Download { file_name: String },
}

#[derive(Debug)]
pub struct Content {
    pub bytes: Vec<u8>,
    pub kind: ContentKind,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resource not found")]
    NotFound,
    #[error("unsupported content type for extension {0:?}")]
    Unsupported(String),
    #[error("failed to read resource: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to encode upload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write upload: {0}")]
    Io(#[from] io::Error),
}

/// Looks up files for GET requests.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// `relative` has already passed traversal checks and is relative to the
    /// content root.
    async fn resolve(&self, relative: &Path) -> Result<Content, ResolveError>;
}

/// Persists JSON documents from POST requests.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Stores the document and returns the path clients can refer to it by.
    async fn store(&self, document: &serde_json::Value) -> Result<String, UploadError>;
}

/// Creates the content root and uploads directory when missing.
pub async fn bootstrap(config: &ContentConfig) -> io::Result<()> {
    tokio::fs::create_dir_all(&config.root).await?;
    tokio::fs::create_dir_all(config.uploads_path()).await?;
    tracing::debug!(root = %config.root.display(), "content directories ready");
    Ok(())
}
