use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Content, ContentKind, ContentResolver, ResolveError};

const INDEX_FILE: &str = "index.html";
const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];
const DOWNLOAD_EXTENSIONS: &[&str] = &["txt", "png", "jpg", "jpeg"];

/// Serves files from a directory on disk.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Classifies a file by its (case-insensitive) extension.
pub fn classify(path: &Path) -> Result<ContentKind, ResolveError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if MARKUP_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(ContentKind::Markup);
    }

    if DOWNLOAD_EXTENSIONS.contains(&ext.as_str()) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(ContentKind::Download { file_name });
    }

    Err(ResolveError::Unsupported(ext))
}

#[async_trait]
impl ContentResolver for StaticFiles {
    async fn resolve(&self, relative: &Path) -> Result<Content, ResolveError> {
        let relative = if relative.as_os_str().is_empty() {
            Path::new(INDEX_FILE)
        } else {
            relative
        };
        let full_path = self.root.join(relative);

        match tokio::fs::metadata(&full_path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ResolveError::NotFound),
            // A file in the way of a directory, an overlong segment or a NUL
            // byte all mean nothing can live at this path.
            Err(e) if e.kind() != io::ErrorKind::PermissionDenied => {
                return Err(ResolveError::NotFound);
            }
            Err(e) => return Err(e.into()),
        }

        let kind = classify(&full_path)?;
        let bytes = tokio::fs::read(&full_path).await?;

        tracing::debug!(path = %relative.display(), bytes = bytes.len(), "resolved static file");
        Ok(Content { bytes, kind })
    }
}
