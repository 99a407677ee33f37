//! VGen backend REST client.
//!
//! Thin typed wrapper over the backend endpoints with:
//! - HTTP client tuning (pooling, timeouts)
//! - Structured `detail` extraction on failures
//! - Observability (tracing spans, metrics)
//!
//! Nothing here retries; retries live entirely in the backend queue.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info_span, Instrument};
use url::Url;
use validator::Validate;

use vgen_models::{
    BatchAction, BatchActionResponse, BatchOutcome, CancelJobResponse, CustomScriptRequest,
    GenerateIdeasRequest, GeneratedIdeas, Idea, IdeaId, JobQueueStatus, PipelineStatus,
    QueueStats, Script, Stage, StartPipelineResponse, UploadVideoRequest, UploadVideoResponse,
    ValidateIdeaRequest, Video,
};

use crate::error::{ClientError, ClientResult};
use crate::metrics::record_request;

/// Backend used when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

// =============================================================================
// Configuration
// =============================================================================

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (scheme, host, optional path prefix)
    pub base_url: Url,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("VGEN_BACKEND_URL")
            .or_else(|_| std::env::var("REACT_APP_BACKEND_URL"))
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

        let timeout_secs: u64 = std::env::var("VGEN_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("VGEN_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            base_url: parse_base_url(&base_url)?,
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ClientError::invalid_config("backend URL cannot be empty"));
    }
    let url = Url::parse(raw)
        .map_err(|e| ClientError::invalid_config(format!("invalid backend URL {:?}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::invalid_config(format!(
            "backend URL must be http or https, got {}",
            url.scheme()
        )));
    }
    Ok(url)
}

// =============================================================================
// Client
// =============================================================================

/// REST client for the VGen backend.
#[derive(Clone)]
pub struct StudioClient {
    http: Client,
    base_url: String,
}

impl StudioClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("vgen-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        let base_url = config.base_url.as_str().trim_end_matches('/').to_string();

        Ok(Self { http, base_url })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn idea_url(&self, prefix: &str, idea_id: &IdeaId, suffix: &str) -> String {
        self.resource_url(prefix, idea_id.as_str(), suffix)
    }

    fn resource_url(&self, prefix: &str, id: &str, suffix: &str) -> String {
        self.url(&format!("{}/{}{}", prefix, urlencoding::encode(id), suffix))
    }

    // =========================================================================
    // Ideas
    // =========================================================================

    /// Fetch the full idea collection.
    pub async fn list_ideas(&self) -> ClientResult<Vec<Idea>> {
        let request = self.http.get(self.url("/api/ideas/"));
        self.send_json("list_ideas", None, request).await
    }

    pub async fn get_idea(&self, idea_id: &IdeaId) -> ClientResult<Idea> {
        let request = self.http.get(self.idea_url("/api/ideas", idea_id, ""));
        self.send_json("get_idea", Some(idea_id), request).await
    }

    /// Ask the backend to generate new ideas.
    pub async fn generate_ideas(&self, body: &GenerateIdeasRequest) -> ClientResult<GeneratedIdeas> {
        body.validate()?;
        let request = self.http.post(self.url("/api/ideas/generate")).json(body);
        self.send_json("generate_ideas", None, request).await
    }

    /// Create an idea from an operator-written script.
    pub async fn create_from_script(&self, body: &CustomScriptRequest) -> ClientResult<GeneratedIdeas> {
        body.validate()?;
        let request = self.http.post(self.url("/api/ideas/custom-script")).json(body);
        self.send_json("create_from_script", None, request).await
    }

    pub async fn validate_idea(&self, idea_id: &IdeaId, body: &ValidateIdeaRequest) -> ClientResult<Idea> {
        body.validate()?;
        let request = self
            .http
            .patch(self.idea_url("/api/ideas", idea_id, "/validate"))
            .json(body);
        self.send_json("validate_idea", Some(idea_id), request).await
    }

    pub async fn reject_idea(&self, idea_id: &IdeaId) -> ClientResult<()> {
        let request = self.http.patch(self.idea_url("/api/ideas", idea_id, "/reject"));
        self.send_discard("reject_idea", Some(idea_id), request).await
    }

    pub async fn delete_idea(&self, idea_id: &IdeaId) -> ClientResult<()> {
        let request = self.http.delete(self.idea_url("/api/ideas", idea_id, ""));
        self.send_discard("delete_idea", Some(idea_id), request).await
    }

    /// Apply one action to many ideas; the outcome is reported per id.
    pub async fn batch_action(&self, idea_ids: &[IdeaId], action: BatchAction) -> ClientResult<BatchOutcome> {
        let mut query: Vec<(&str, &str)> = idea_ids.iter().map(|id| ("idea_ids", id.as_str())).collect();
        query.push(("action", action.as_str()));

        let request = self.http.post(self.url("/api/ideas/batch-action")).query(&query);
        let response: BatchActionResponse = self.send_json("batch_action", None, request).await?;
        Ok(response.results)
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Queue generation for an idea starting at `stage`.
    pub async fn start_pipeline(&self, idea_id: &IdeaId, stage: Stage) -> ClientResult<StartPipelineResponse> {
        let request = self
            .http
            .post(self.idea_url("/api/pipeline/generate", idea_id, ""))
            .query(&[("start_from", stage.as_str())]);
        self.send_json("start_pipeline", Some(idea_id), request).await
    }

    pub async fn pipeline_status(&self, idea_id: &IdeaId) -> ClientResult<PipelineStatus> {
        let request = self.http.get(self.idea_url("/api/pipeline/status", idea_id, ""));
        self.send_json("pipeline_status", Some(idea_id), request).await
    }

    // =========================================================================
    // Queue
    // =========================================================================

    pub async fn queue_stats(&self) -> ClientResult<QueueStats> {
        let request = self.http.get(self.url("/api/queue/stats"));
        self.send_json("queue_stats", None, request).await
    }

    pub async fn job_status(&self, idea_id: &IdeaId) -> ClientResult<JobQueueStatus> {
        let request = self.http.get(self.idea_url("/api/queue/status", idea_id, ""));
        self.send_json("job_status", Some(idea_id), request).await
    }

    /// Remove a waiting job from the queue.
    pub async fn cancel_job(&self, idea_id: &IdeaId) -> ClientResult<CancelJobResponse> {
        let request = self.http.post(self.idea_url("/api/queue/cancel", idea_id, ""));
        self.send_json("cancel_job", Some(idea_id), request).await
    }

    // =========================================================================
    // Scripts, videos, YouTube
    // =========================================================================

    pub async fn script_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Script> {
        let request = self.http.get(self.idea_url("/api/scripts/by-idea", idea_id, ""));
        self.send_json("script_by_idea", Some(idea_id), request).await
    }

    pub async fn list_videos(&self) -> ClientResult<Vec<Video>> {
        let request = self.http.get(self.url("/api/videos/"));
        self.send_json("list_videos", None, request).await
    }

    /// The rendered video of an idea; 404 until video generation finished.
    pub async fn video_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Video> {
        let request = self.http.get(self.idea_url("/api/videos/by-idea", idea_id, ""));
        self.send_json("video_by_idea", Some(idea_id), request).await
    }

    /// Publish a rendered video on YouTube, now or at `publish_at`.
    pub async fn upload_video(&self, video: &Video, body: &UploadVideoRequest) -> ClientResult<UploadVideoResponse> {
        body.validate()?;
        let request = self
            .http
            .post(self.resource_url("/api/youtube/upload", &video.id, ""))
            .json(body);
        self.send_json("upload_video", Some(&video.idea_id), request).await
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    async fn send_json<T>(&self, operation: &str, idea_id: Option<&IdeaId>, request: RequestBuilder) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        self.execute_request(operation, idea_id, async move {
            let response = request.send().await?;
            let status = response.status();

            if !status.is_success() {
                return Err(Self::handle_error_response(response).await);
            }

            let bytes = response.bytes().await?;
            let value = serde_json::from_slice(&bytes)?;
            Ok(value)
        })
        .await
    }

    async fn send_discard(&self, operation: &str, idea_id: Option<&IdeaId>, request: RequestBuilder) -> ClientResult<()> {
        self.execute_request(operation, idea_id, async move {
            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(Self::handle_error_response(response).await);
            }
            Ok(())
        })
        .await
    }

    async fn execute_request<T, F>(&self, operation: &str, idea_id: Option<&IdeaId>, fut: F) -> ClientResult<T>
    where
        F: std::future::Future<Output = ClientResult<T>>,
    {
        let span = if let Some(id) = idea_id {
            info_span!("studio_request", operation = %operation, idea_id = %id)
        } else {
            info_span!("studio_request", operation = %operation)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(operation, status, latency_ms);

        if let Err(e) = &result {
            debug!(operation = %operation, status, "Backend request failed: {}", e);
        }

        result
    }

    async fn handle_error_response(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ClientError::from_http_status(status, body)
    }
}

// =============================================================================
// Tests
// =============================================================================
