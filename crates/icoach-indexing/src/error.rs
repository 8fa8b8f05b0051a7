//! Error types for the video-understanding client.

use thiserror::Error;

/// Result type for collaborator operations.
pub type InsightResult<T> = Result<T, InsightError>;

/// Errors from the video-understanding collaborator.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("job reported terminal state: {state}")]
    JobFailed { state: String },

    #[error("job did not finish within {waited_secs} seconds")]
    Timeout { waited_secs: u64 },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl InsightError {
    /// Create an API error from a status code and body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }
}
