//! Error types for the analysis pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur during video analysis.
///
/// These are the pipeline-fatal kinds. Per-frame detection misses (no face,
/// no landmarks, pose solve non-convergence, no body) are `Option`-shaped
/// soft results on the capability traits, not errors.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("could not open video: {0}")]
    VideoOpen(PathBuf),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("working copy failed: {0}")]
    WorkingCopy(String),

    #[error("detection failed: {0}")]
    DetectionFailed(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("segment retrieval failed: {0}")]
    Segments(#[from] icoach_indexing::InsightError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("invalid video file: {0}")]
    InvalidVideo(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a working copy failure error.
    pub fn working_copy(message: impl Into<String>) -> Self {
        Self::WorkingCopy(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
