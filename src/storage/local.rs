//! Local directory sink.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use super::Uploader;
use crate::error::{ExportError, Result};
use crate::utils::ensure_writable_dir;

/// Writes objects to `<root>/<key>`, creating directories as needed.
#[derive(Debug, Clone)]
pub struct LocalUploader {
    root: PathBuf,
}

impl LocalUploader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key.trim_start_matches('/'))
    }
}

impl Uploader for LocalUploader {
    #[instrument(level = "info", skip_all, fields(root = %self.root.display(), %key))]
    async fn upload(&self, key: &str, body: String) -> Result<()> {
        let path = self.path_for(key);
        let parent = path.parent().unwrap_or(Path::new("."));
        ensure_writable_dir(parent)
            .await
            .map_err(|e| ExportError::Upload(format!("{}: {e}", parent.display())))?;
        fs::write(&path, body.as_bytes())
            .await
            .map_err(|e| ExportError::Upload(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), bytes = body.len(), "Wrote document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_creates_prefix_dirs_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let uploader = LocalUploader::new(tmp.path().to_path_buf());
        let key = "test/stats-medium-metrics-2024-03-05.csv";

        uploader.upload(key, "first\n".into()).await.unwrap();
        uploader.upload(key, "second\n".into()).await.unwrap();

        let written = std::fs::read_to_string(tmp.path().join(key)).unwrap();
        assert_eq!(written, "second\n");
    }

    #[tokio::test]
    async fn test_upload_failure_is_upload_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("test");
        std::fs::write(&blocker, "not a directory").unwrap();
        let uploader = LocalUploader::new(tmp.path().to_path_buf());

        let err = uploader.upload("test/doc.csv", "x".into()).await.unwrap_err();
        assert!(matches!(err, ExportError::Upload(_)));
    }
}
