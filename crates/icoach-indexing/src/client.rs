//! HTTP client for the video-understanding service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{InsightError, InsightResult};
use crate::poll::{poll_until_ready, JobStatus, PollConfig};
use crate::types::VideoAnalysis;

/// Analysis features requested from the collaborator.
const ANALYZE_FEATURES: &[&str] = &["shots", "actions", "objects", "captions", "ocr", "logos"];

/// Capability the orchestrator depends on: turn a video URL into the
/// collaborator's full analysis. Lets tests and alternative vendors stand
/// in for the real service.
#[async_trait]
pub trait VideoUnderstanding: Send + Sync {
    async fn analyze_video(&self, video_url: &str) -> InsightResult<VideoAnalysis>;
}

/// Client configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    /// Service base URL
    pub base_url: String,
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Index reused (or created) per deployment
    pub index_name: String,
    /// Analysis engine identifier
    pub engine: String,
    /// Poll settings while the video is being indexed
    pub ready_poll: PollConfig,
    /// Poll settings for the analyze job
    pub analyze_poll: PollConfig,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.videoinsight.example/v1".to_string(),
            api_key: String::new(),
            index_name: "icoach-index".to_string(),
            engine: "pegasus-1.2".to_string(),
            ready_poll: PollConfig::new(Duration::from_secs(4), Duration::from_secs(1200)),
            analyze_poll: PollConfig::new(Duration::from_secs(3), Duration::from_secs(1200)),
        }
    }
}

impl InsightConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("INSIGHT_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("INSIGHT_API_KEY").unwrap_or_default(),
            index_name: std::env::var("INSIGHT_INDEX_NAME").unwrap_or(defaults.index_name),
            engine: std::env::var("INSIGHT_ENGINE").unwrap_or(defaults.engine),
            ready_poll: PollConfig::new(
                env_secs("INSIGHT_READY_POLL_SECS", 4),
                env_secs("INSIGHT_POLL_DEADLINE_SECS", 1200),
            ),
            analyze_poll: PollConfig::new(
                env_secs("INSIGHT_ANALYZE_POLL_SECS", 3),
                env_secs("INSIGHT_POLL_DEADLINE_SECS", 1200),
            ),
        }
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    data: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobState {
    status: String,
    #[serde(default)]
    result: Option<Value>,
}

/// Client for the video-understanding service.
pub struct InsightClient {
    config: InsightConfig,
    http: Client,
}

impl InsightClient {
    /// Create a client. Fails when no API key is configured.
    pub fn new(config: InsightConfig) -> InsightResult<Self> {
        if config.api_key.is_empty() {
            return Err(InsightError::MissingField("INSIGHT_API_KEY"));
        }
        Ok(Self {
            config,
            http: Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get(&self, path: &str) -> InsightResult<Value> {
        let response = self
            .http
            .get(self.url(path))
            .header("x-api-key", &self.config.api_key)
            .send()
            .await?;
        Self::into_json(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> InsightResult<Value> {
        let response = self
            .http
            .post(self.url(path))
            .header("x-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;
        Self::into_json(response).await
    }

    async fn into_json(response: reqwest::Response) -> InsightResult<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::api(status.as_u16(), body));
        }
        Ok(response.json().await?)
    }

    /// Find the deployment index by name, creating it when absent.
    pub async fn ensure_index(&self) -> InsightResult<String> {
        let list: IndexList = serde_json::from_value(self.get("/indexes").await?)?;
        if let Some(existing) = list.data.iter().find(|i| i.name == self.config.index_name) {
            debug!(index_id = %existing.id, "reusing existing index");
            return Ok(existing.id.clone());
        }

        let created: Created = serde_json::from_value(
            self.post(
                "/indexes",
                &json!({ "name": self.config.index_name, "engine": self.config.engine }),
            )
            .await?,
        )?;
        info!(index_id = %created.id, "created index");
        Ok(created.id)
    }

    /// Register a video (by presigned URL) into an index.
    pub async fn register_video(
        &self,
        index_id: &str,
        video_url: &str,
    ) -> InsightResult<String> {
        let created: Created = serde_json::from_value(
            self.post(
                "/videos",
                &json!({ "index_id": index_id, "video_url": video_url }),
            )
            .await?,
        )?;
        Ok(created.id)
    }

    /// Fetch and classify the job state behind `path`.
    async fn job_status(&self, path: &str) -> InsightResult<JobStatus> {
        let state: JobState = serde_json::from_value(self.get(path).await?)?;
        Ok(Self::classify(&state.status))
    }

    /// Poll until the registered video is indexed.
    pub async fn wait_until_ready(&self, video_id: &str) -> InsightResult<()> {
        let path = format!("/videos/{video_id}");
        poll_until_ready(self.config.ready_poll, "indexing", || {
            self.job_status(&path)
        })
        .await
    }

    /// Run the analyze job and return its raw result.
    pub async fn analyze(&self, video_id: &str) -> InsightResult<VideoAnalysis> {
        let submitted: Created = serde_json::from_value(
            self.post(
                "/analyze",
                &json!({ "video_id": video_id, "features": ANALYZE_FEATURES }),
            )
            .await?,
        )?;

        let path = format!("/analyze/{}", submitted.id);
        poll_until_ready(self.config.analyze_poll, "analyze", || {
            self.job_status(&path)
        })
        .await?;

        let state: JobState = serde_json::from_value(self.get(&path).await?)?;
        let result = state.result.ok_or(InsightError::MissingField("result"))?;
        Ok(VideoAnalysis::new(result))
    }

    fn classify(status: &str) -> JobStatus {
        match status {
            "ready" => JobStatus::Ready,
            "failed" | "error" => JobStatus::Failed(status.to_string()),
            _ => JobStatus::Pending,
        }
    }
}

#[async_trait]
impl VideoUnderstanding for InsightClient {
    /// Full submission flow: ensure index, register, wait, analyze.
    async fn analyze_video(&self, video_url: &str) -> InsightResult<VideoAnalysis> {
        let index_id = self.ensure_index().await?;
        let video_id = self.register_video(&index_id, video_url).await?;
        info!(%video_id, "video registered, waiting for indexing");
        self.wait_until_ready(&video_id).await?;
        self.analyze(&video_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> InsightConfig {
        InsightConfig {
            base_url,
            api_key: "test-key".to_string(),
            ready_poll: PollConfig::new(Duration::from_millis(5), Duration::from_millis(200)),
            analyze_poll: PollConfig::new(Duration::from_millis(5), Duration::from_millis(200)),
            ..InsightConfig::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = InsightConfig::default();
        assert!(InsightClient::new(config).is_err());
    }

    #[tokio::test]
    async fn test_ensure_index_reuses_existing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "idx-1", "name": "icoach-index"}]
            })))
            .mount(&server)
            .await;

        let client = InsightClient::new(test_config(server.uri())).unwrap();
        assert_eq!(client.ensure_index().await.unwrap(), "idx-1");
    }

    #[tokio::test]
    async fn test_ensure_index_creates_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "idx-9" })))
            .mount(&server)
            .await;

        let client = InsightClient::new(test_config(server.uri())).unwrap();
        assert_eq!(client.ensure_index().await.unwrap(), "idx-9");
    }

    #[tokio::test]
    async fn test_wait_until_ready_maps_failed_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/v-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "failed" })))
            .mount(&server)
            .await;

        let client = InsightClient::new(test_config(server.uri())).unwrap();
        let result = client.wait_until_ready("v-1").await;
        assert!(matches!(result, Err(InsightError::JobFailed { .. })));
    }

    #[tokio::test]
    async fn test_wait_until_ready_times_out_on_pending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/v-2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "indexing" })),
            )
            .mount(&server)
            .await;

        let client = InsightClient::new(test_config(server.uri())).unwrap();
        let result = client.wait_until_ready("v-2").await;
        assert!(matches!(result, Err(InsightError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_analyze_returns_raw_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "job-1" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/analyze/job-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ready",
                "result": {"shots": [{"start": 0.0, "end": 5.0}], "actions": []}
            })))
            .mount(&server)
            .await;

        let client = InsightClient::new(test_config(server.uri())).unwrap();
        let analysis = client.analyze("v-3").await.unwrap();
        assert_eq!(analysis.shots().len(), 1);
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = InsightClient::new(test_config(server.uri())).unwrap();
        match client.ensure_index().await {
            Err(InsightError::Api { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
