//! Scoped working copy of the source video.
//!
//! Frame decoding needs a locally readable file, so the orchestrator
//! materializes one per invocation: downloaded from a presigned URL, or
//! copied from a local path. The copy is exclusively owned by the
//! invocation and removed on every exit path — dropping the handle deletes
//! the file, success or failure alike.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// Exclusive, self-deleting local copy of the source video.
pub struct WorkingCopy {
    file: NamedTempFile,
}

impl WorkingCopy {
    /// Path of the local copy.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Materialize a working copy from a presigned URL or a local path.
    pub async fn fetch(source: &str) -> VisionResult<WorkingCopy> {
        let file = tempfile::Builder::new()
            .prefix("icoach-")
            .suffix(".mp4")
            .tempfile()
            .map_err(|e| VisionError::working_copy(format!("temp file: {e}")))?;

        if source.starts_with("http://") || source.starts_with("https://") {
            let response = reqwest::get(source)
                .await
                .map_err(|e| VisionError::working_copy(format!("download: {e}")))?;
            if !response.status().is_success() {
                return Err(VisionError::working_copy(format!(
                    "download returned {}",
                    response.status()
                )));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| VisionError::working_copy(format!("download body: {e}")))?;
            tokio::fs::write(file.path(), &bytes)
                .await
                .map_err(|e| VisionError::working_copy(format!("write: {e}")))?;
            debug!(bytes = bytes.len(), path = %file.path().display(), "working copy downloaded");
        } else {
            let source_path = Path::new(source);
            if !source_path.exists() {
                return Err(VisionError::FileNotFound(source_path.to_path_buf()));
            }
            tokio::fs::copy(source_path, file.path())
                .await
                .map_err(|e| VisionError::working_copy(format!("copy: {e}")))?;
            debug!(from = source, path = %file.path().display(), "working copy created");
        }

        Ok(WorkingCopy { file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_local_copy_and_cleanup() {
        let mut source = NamedTempFile::new().unwrap();
        source.write_all(b"not really a video").unwrap();

        let copy_path: PathBuf;
        {
            let copy = WorkingCopy::fetch(source.path().to_str().unwrap())
                .await
                .unwrap();
            copy_path = copy.path().to_path_buf();
            assert!(copy_path.exists());
            let contents = std::fs::read(&copy_path).unwrap();
            assert_eq!(contents, b"not really a video");
        }

        // Dropped: the working copy is gone, the source is untouched.
        assert!(!copy_path.exists());
        assert!(source.path().exists());
    }

    #[tokio::test]
    async fn test_missing_local_source_fails() {
        let result = WorkingCopy::fetch("/nonexistent/input.mp4").await;
        assert!(matches!(result, Err(VisionError::FileNotFound(_))));
    }
}
