//! Backend seam used by the dashboard.
//!
//! The dashboard only depends on this trait so its scheduling and state
//! logic can run against an in-memory backend in tests.

use async_trait::async_trait;

use vgen_models::{
    BatchAction, BatchOutcome, CancelJobResponse, CustomScriptRequest, GenerateIdeasRequest,
    GeneratedIdeas, Idea, IdeaId, JobQueueStatus, PipelineStatus, QueueStats, Stage,
    Script, StartPipelineResponse, UploadVideoRequest, UploadVideoResponse, ValidateIdeaRequest,
    Video,
};

use crate::client::StudioClient;
use crate::error::ClientResult;

/// Operations the dashboard issues against the backend.
#[async_trait]
pub trait StudioApi: Send + Sync {
    async fn list_ideas(&self) -> ClientResult<Vec<Idea>>;
    async fn get_idea(&self, idea_id: &IdeaId) -> ClientResult<Idea>;
    async fn generate_ideas(&self, request: &GenerateIdeasRequest) -> ClientResult<GeneratedIdeas>;
    async fn create_from_script(&self, request: &CustomScriptRequest) -> ClientResult<GeneratedIdeas>;
    async fn validate_idea(&self, idea_id: &IdeaId, request: &ValidateIdeaRequest) -> ClientResult<Idea>;
    async fn reject_idea(&self, idea_id: &IdeaId) -> ClientResult<()>;
    async fn delete_idea(&self, idea_id: &IdeaId) -> ClientResult<()>;
    async fn batch_action(&self, idea_ids: &[IdeaId], action: BatchAction) -> ClientResult<BatchOutcome>;
    async fn start_pipeline(&self, idea_id: &IdeaId, stage: Stage) -> ClientResult<StartPipelineResponse>;
    async fn pipeline_status(&self, idea_id: &IdeaId) -> ClientResult<PipelineStatus>;
    async fn queue_stats(&self) -> ClientResult<QueueStats>;
    async fn job_status(&self, idea_id: &IdeaId) -> ClientResult<JobQueueStatus>;
    async fn cancel_job(&self, idea_id: &IdeaId) -> ClientResult<CancelJobResponse>;
    async fn script_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Script>;
    async fn list_videos(&self) -> ClientResult<Vec<Video>>;
    async fn video_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Video>;
    async fn upload_video(&self, video: &Video, request: &UploadVideoRequest) -> ClientResult<UploadVideoResponse>;
}

#[async_trait]
impl StudioApi for StudioClient {
    async fn list_ideas(&self) -> ClientResult<Vec<Idea>> {
        StudioClient::list_ideas(self).await
    }

    async fn get_idea(&self, idea_id: &IdeaId) -> ClientResult<Idea> {
        StudioClient::get_idea(self, idea_id).await
    }

    async fn generate_ideas(&self, request: &GenerateIdeasRequest) -> ClientResult<GeneratedIdeas> {
        StudioClient::generate_ideas(self, request).await
    }

    async fn create_from_script(&self, request: &CustomScriptRequest) -> ClientResult<GeneratedIdeas> {
        StudioClient::create_from_script(self, request).await
    }

    async fn validate_idea(&self, idea_id: &IdeaId, request: &ValidateIdeaRequest) -> ClientResult<Idea> {
        StudioClient::validate_idea(self, idea_id, request).await
    }

    async fn reject_idea(&self, idea_id: &IdeaId) -> ClientResult<()> {
        StudioClient::reject_idea(self, idea_id).await
    }

    async fn delete_idea(&self, idea_id: &IdeaId) -> ClientResult<()> {
        StudioClient::delete_idea(self, idea_id).await
    }

    async fn batch_action(&self, idea_ids: &[IdeaId], action: BatchAction) -> ClientResult<BatchOutcome> {
        StudioClient::batch_action(self, idea_ids, action).await
    }

    async fn start_pipeline(&self, idea_id: &IdeaId, stage: Stage) -> ClientResult<StartPipelineResponse> {
        StudioClient::start_pipeline(self, idea_id, stage).await
    }

    async fn pipeline_status(&self, idea_id: &IdeaId) -> ClientResult<PipelineStatus> {
        StudioClient::pipeline_status(self, idea_id).await
    }

    async fn queue_stats(&self) -> ClientResult<QueueStats> {
        StudioClient::queue_stats(self).await
    }

    async fn job_status(&self, idea_id: &IdeaId) -> ClientResult<JobQueueStatus> {
        StudioClient::job_status(self, idea_id).await
    }

    async fn cancel_job(&self, idea_id: &IdeaId) -> ClientResult<CancelJobResponse> {
        StudioClient::cancel_job(self, idea_id).await
    }

    async fn script_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Script> {
        StudioClient::script_by_idea(self, idea_id).await
    }

    async fn list_videos(&self) -> ClientResult<Vec<Video>> {
        StudioClient::list_videos(self).await
    }

    async fn video_by_idea(&self, idea_id: &IdeaId) -> ClientResult<Video> {
        StudioClient::video_by_idea(self, idea_id).await
    }

    async fn upload_video(&self, video: &Video, request: &UploadVideoRequest) -> ClientResult<UploadVideoResponse> {
        StudioClient::upload_video(self, video, request).await
    }
}
