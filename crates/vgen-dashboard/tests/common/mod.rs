//! In-memory backend shared by the dashboard integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use vgen_client::{ClientError, ClientResult, StudioApi};
use vgen_dashboard::{IdeaCollection, PipelineController, RefreshHandle};
use vgen_models::{
    BatchAction, BatchOutcome, CancelJobResponse, CustomScriptRequest, GenerateIdeasRequest, GeneratedIdeas,
    Idea, IdeaId, IdeaStatus, JobQueueStatus, JobStatus, PipelineStatus, QueueStats, Script, Stage,
    StartPipelineResponse, UploadVideoRequest, UploadVideoResponse, ValidateIdeaRequest, Video,
};

/// A request the fake received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListIdeas,
    GetIdea(IdeaId),
    GenerateIdeas(u32),
    CreateFromScript,
    Validate(IdeaId),
    Reject(IdeaId),
    Delete(IdeaId),
    Batch(Vec<IdeaId>, BatchAction),
    StartPipeline(IdeaId, Stage),
    PipelineStatus(IdeaId),
    QueueStats,
    JobStatus(IdeaId),
    CancelJob(IdeaId),
    ScriptByIdea(IdeaId),
    ListVideos,
    VideoByIdea(IdeaId),
    /// Video id and requested publish time
    Upload(String, Option<DateTime<Utc>>),
}

#[derive(Default)]
pub struct FakeStudio {
    ideas: Mutex<Vec<Idea>>,
    calls: Mutex<Vec<(Instant, Call)>>,
    /// Error bodies returned by `start_pipeline`, keyed by idea
    start_failures: Mutex<HashMap<IdeaId, (u16, String)>>,
    batch_outcome: Mutex<Option<BatchOutcome>>,
    list_fails: Mutex<bool>,
    start_latency: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    list_latency: Mutex<Duration>,
    lists_in_flight: AtomicUsize,
    max_lists_in_flight: AtomicUsize,
}

impl FakeStudio {
    pub fn with_ideas(ideas: Vec<Idea>) -> Arc<Self> {
        let fake = Self::default();
        *fake.ideas.lock().unwrap() = ideas;
        Arc::new(fake)
    }

    pub fn set_ideas(&self, ideas: Vec<Idea>) {
        *self.ideas.lock().unwrap() = ideas;
    }

    pub fn set_status(&self, id: &str, status: IdeaStatus) {
        let mut ideas = self.ideas.lock().unwrap();
        if let Some(idea) = ideas.iter_mut().find(|i| i.id.as_str() == id) {
            idea.status = status;
        }
    }

    pub fn fail_start(&self, id: &str, status: u16, body: &str) {
        self.start_failures
            .lock()
            .unwrap()
            .insert(IdeaId::from(id), (status, body.to_string()));
    }

    pub fn set_batch_outcome(&self, outcome: BatchOutcome) {
        *self.batch_outcome.lock().unwrap() = Some(outcome);
    }

    pub fn set_list_fails(&self, fails: bool) {
        *self.list_fails.lock().unwrap() = fails;
    }

    pub fn set_start_latency(&self, latency: Duration) {
        *self.start_latency.lock().unwrap() = latency;
    }

    /// Delay before `list_ideas` answers with the list it saw when called.
    pub fn set_list_latency(&self, latency: Duration) {
        *self.list_latency.lock().unwrap() = latency;
    }

    pub fn max_lists_in_flight(&self) -> usize {
        self.max_lists_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    fn find(&self, idea_id: &IdeaId) -> ClientResult<Idea> {
        self.ideas
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.id == idea_id)
            .cloned()
            .ok_or_else(|| ClientError::from_http_status(404, format!(r#"{{"detail": "Idea {} not found"}}"#, idea_id)))
    }
}

#[async_trait]
impl StudioApi for FakeStudio {
    async fn list_ideas(&self) -> ClientResult<Vec<Idea>> {
        self.record(Call::ListIdeas);
        if *self.list_fails.lock().unwrap() {
            return Err(ClientError::from_http_status(503, "Service Unavailable"));
        }

        let snapshot = self.ideas.lock().unwrap().clone();
        let latency = *self.list_latency.lock().unwrap();
        if !latency.is_zero() {
            let now = self.lists_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_lists_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(latency).await;
            self.lists_in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(snapshot)
    }

    async fn get_idea(&self, idea_id: &IdeaId) -> ClientResult<Idea> {
        self.record(Call::GetIdea(idea_id.clone()));
        self.find(idea_id)
    }

    async fn generate_ideas(&self, request: &GenerateIdeasRequest) -> ClientResult<GeneratedIdeas> {
        self.record(Call::GenerateIdeas(request.count));
        let ideas: Vec<Idea> = (0..request.count)
            .map(|n| Idea::new(format!("gen-{}", n), format!("Idée générée {}", n), IdeaStatus::Pending))
            .collect();
        self.ideas.lock().unwrap().extend(ideas.iter().cloned());
        Ok(GeneratedIdeas {
            success: true,
            count: request.count,
            ideas,
        })
    }

    async fn create_from_script(&self, request: &CustomScriptRequest) -> ClientResult<GeneratedIdeas> {
        self.record(Call::CreateFromScript);
        let mut idea = Idea::new("custom", request.custom_title.clone().unwrap_or_default(), IdeaStatus::Validated);
        idea.video_type = request.video_type;
        Ok(GeneratedIdeas {
            success: true,
            count: 1,
            ideas: vec![idea],
        })
    }

    async fn validate_idea(&self, idea_id: &IdeaId, request: &ValidateIdeaRequest) -> ClientResult<Idea> {
        self.record(Call::Validate(idea_id.clone()));
        let mut idea = self.find(idea_id)?;
        idea.status = IdeaStatus::Validated;
        idea.video_type = request.video_type;
        idea.duration_seconds = Some(request.duration_seconds);
        Ok(idea)
    }

    async fn reject_idea(&self, idea_id: &IdeaId) -> ClientResult<()> {
        self.record(Call::Reject(idea_id.clone()));
        self.find(idea_id).map(|_| ())
    }

    async fn delete_idea(&self, idea_id: &IdeaId) -> ClientResult<()> {
        self.record(Call::Delete(idea_id.clone()));
        self.find(idea_id)?;
        self.ideas.lock().unwrap().retain(|i| &i.id != idea_id);
        Ok(())
    }

    async fn batch_action(&self, idea_ids: &[IdeaId], action: BatchAction) -> ClientResult<BatchOutcome> {
        self.record(Call::Batch(idea_ids.to_vec(), action));
        Ok(self.batch_outcome.lock().unwrap().clone().unwrap_or_else(|| BatchOutcome {
            success: idea_ids.to_vec(),
            failed: Vec::new(),
        }))
    }

    async fn start_pipeline(&self, idea_id: &IdeaId, stage: Stage) -> ClientResult<StartPipelineResponse> {
        self.record(Call::StartPipeline(idea_id.clone(), stage));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let latency = *self.start_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some((status, body)) = self.start_failures.lock().unwrap().get(idea_id) {
            return Err(ClientError::from_http_status(*status, body.clone()));
        }

        let position = self.count(|c| matches!(c, Call::StartPipeline(..))) as u32;
        Ok(StartPipelineResponse {
            success: true,
            message: "Job added to queue".to_string(),
            job_id: format!("job-{}", idea_id),
            idea_id: idea_id.clone(),
            queue_position: Some(position),
            start_from: stage,
        })
    }

    async fn pipeline_status(&self, idea_id: &IdeaId) -> ClientResult<PipelineStatus> {
        self.record(Call::PipelineStatus(idea_id.clone()));
        let idea = self.find(idea_id)?;
        Ok(PipelineStatus {
            idea_id: idea.id.clone(),
            status: idea.status,
            progress_percentage: idea.progress_percentage,
            current_step: idea.current_step.clone(),
            error_message: idea.error_message.clone(),
        })
    }

    async fn queue_stats(&self) -> ClientResult<QueueStats> {
        self.record(Call::QueueStats);
        Ok(QueueStats::default())
    }

    async fn job_status(&self, idea_id: &IdeaId) -> ClientResult<JobQueueStatus> {
        self.record(Call::JobStatus(idea_id.clone()));
        let idea = self.find(idea_id)?;
        let mut status = JobQueueStatus::no_job(idea.id.clone());
        if idea.status == IdeaStatus::Queued {
            status.has_job = true;
            status.status = Some(JobStatus::Queued);
            status.queue_position = Some(3);
        }
        Ok(status)
    }

    async fn cancel_job(&self, idea_id: &IdeaId) -> ClientResult<CancelJobResponse> {
        self.record(Call::CancelJob(idea_id.clone()));
        self.set_status(idea_id.as_str(), IdeaStatus::Validated);
        Ok(CancelJobResponse {
            success: true,
            message: "Job cancelled".to_string(),
            job_id: Some(format!("job-{}", idea_id)),
        })
    }

    async fn script_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Script> {
        self.record(Call::ScriptByIdea(idea_id.clone()));
        let idea = self.find(idea_id)?;
        match idea.script_id {
            Some(script_id) => Ok(Script {
                id: script_id,
                idea_id: idea.id.clone(),
                title: idea.title.clone(),
                original_script: format!("Script de {}", idea.title),
                elevenlabs_adapted_script: None,
                youtube_description: None,
                phrases: vec![format!("Script de {}", idea.title)],
            }),
            None => Err(ClientError::from_http_status(
                404,
                format!(r#"{{"detail": "Script for idea {} not found"}}"#, idea_id),
            )),
        }
    }

    async fn list_videos(&self) -> ClientResult<Vec<Video>> {
        self.record(Call::ListVideos);
        Ok(self
            .ideas
            .lock()
            .unwrap()
            .iter()
            .filter(|i| matches!(i.status, IdeaStatus::VideoGenerated | IdeaStatus::Uploaded))
            .map(|i| Video::new(format!("vid-{}", i.id), i.id.clone(), i.title.clone()))
            .collect())
    }

    async fn video_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Video> {
        self.record(Call::VideoByIdea(idea_id.clone()));
        let idea = self.find(idea_id)?;
        if !matches!(idea.status, IdeaStatus::VideoGenerated | IdeaStatus::Uploaded) {
            return Err(ClientError::from_http_status(
                404,
                format!(r#"{{"detail": "Video for idea {} not found"}}"#, idea_id),
            ));
        }
        Ok(Video::new(format!("vid-{}", idea.id), idea.id.clone(), idea.title.clone()))
    }

    async fn upload_video(&self, video: &Video, request: &UploadVideoRequest) -> ClientResult<UploadVideoResponse> {
        self.record(Call::Upload(video.id.clone(), request.publish_at));
        self.set_status(video.idea_id.as_str(), IdeaStatus::Uploaded);
        Ok(UploadVideoResponse {
            success: true,
            youtube_video_id: format!("yt-{}", video.idea_id),
            youtube_url: format!("https://www.youtube.com/watch?v=yt-{}", video.idea_id),
            description_generated: None,
        })
    }
}

/// A controller wired to a fake backend and a pre-loaded collection.
pub struct Harness {
    pub api: Arc<FakeStudio>,
    pub collection: Arc<RwLock<IdeaCollection>>,
    pub refresh: RefreshHandle,
    pub controller: PipelineController,
}

pub fn harness(ideas: Vec<Idea>, bulk_delay: Duration) -> Harness {
    let api = FakeStudio::with_ideas(ideas.clone());
    let mut collection = IdeaCollection::new();
    collection.replace_all(ideas);
    let collection = Arc::new(RwLock::new(collection));
    let refresh = RefreshHandle::new();

    let controller = PipelineController::new(api.clone(), Arc::clone(&collection), refresh.clone(), bulk_delay);

    Harness {
        api,
        collection,
        refresh,
        controller,
    }
}

pub fn idea(id: &str, status: IdeaStatus) -> Idea {
    let mut idea = Idea::new(id, format!("Idée {}", id), status);
    if status == IdeaStatus::Error {
        idea.error_message = Some("TTS quota exceeded".to_string());
    }
    idea
}

/// Whether a refresh was requested, without waiting on real time.
pub async fn refresh_requested(handle: &RefreshHandle) -> bool {
    tokio::time::timeout(Duration::from_millis(10), handle.requested())
        .await
        .is_ok()
}
