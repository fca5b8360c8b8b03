use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use uuid::Uuid;

use super::{UploadError, UploadSink};

/// Writes each upload as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonUploads {
    dir: PathBuf,
    /// Prefix of the path reported back to clients.
    public_prefix: String,
}

impl JsonUploads {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into(),
        }
    }

    fn next_file_name() -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let id = Uuid::new_v4().simple().to_string();
        format!("upload_{secs}_{}.json", &id[..8])
    }
}

#[async_trait]
impl UploadSink for JsonUploads {
    async fn store(&self, document: &serde_json::Value) -> Result<String, UploadError> {
        let contents = serde_json::to_vec_pretty(document)?;
        let file_name = Self::next_file_name();
        let path = self.dir.join(&file_name);

        tokio::fs::write(&path, contents).await?;
        tracing::info!(path = %path.display(), "created upload");

        Ok(format!(
            "{}/{}",
            self.public_prefix.trim_end_matches('/'),
            file_name
        ))
    }
}
