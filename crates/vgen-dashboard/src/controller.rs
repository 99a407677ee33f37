//! Pipeline controller.
//!
//! Single entry point for every command the operator issues. The controller
//! never writes an idea's status: after each command that reached the
//! backend it asks the refresher for a re-fetch, and the next collection is
//! the only source of truth.
//!
//! Local refusals (locked or terminal idea, cancel outside the queue, resume
//! outside `error`, upload before the video exists) return before any request
//! is built. Batch and bulk commands apply the same rules per id.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, Instrument};

use vgen_client::StudioApi;
use vgen_models::{
    BatchAction, BatchOutcome, BatchSummary, CancelJobResponse, CustomScriptRequest,
    GenerateIdeasRequest, GeneratedIdeas, Idea, IdeaId, IdeaStatus, Stage, StartPipelineResponse,
    UploadVideoRequest, UploadVideoResponse, ValidateIdeaRequest,
};

use crate::collection::IdeaCollection;
use crate::error::{DashboardError, DashboardResult};
use crate::logging::IdeaLogger;
use crate::metrics::record_action;
use crate::refresh::RefreshHandle;

// =============================================================================
// Affordances
// =============================================================================

/// An action the operator may take on an idea in its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "stage", rename_all = "snake_case")]
pub enum IdeaAction {
    Validate,
    Reject,
    /// Start the next stage on the happy path
    Start(Stage),
    /// Continue after the last checkpoint of a failed run
    Resume(Stage),
    /// Start a failed run over from the script
    Restart,
    Cancel,
    /// Publish the rendered video on YouTube
    Upload,
    Delete,
}

/// Actions enabled for `idea`.
///
/// Locked ideas only offer cancel, and only while queued.
pub fn actions_for(idea: &Idea) -> Vec<IdeaAction> {
    use IdeaAction::*;

    if idea.status.is_locked() {
        return match idea.status {
            IdeaStatus::Queued => vec![Cancel],
            _ => Vec::new(),
        };
    }

    match idea.status {
        IdeaStatus::Pending => vec![Validate, Reject, Delete],
        IdeaStatus::Validated => vec![Start(Stage::Script), Delete],
        IdeaStatus::ScriptGenerated => vec![Start(Stage::Adapt), Delete],
        IdeaStatus::ScriptAdapted => vec![Start(Stage::Audio), Delete],
        IdeaStatus::AudioGenerated => vec![Start(Stage::Video), Delete],
        IdeaStatus::Error => {
            let mut actions = Vec::with_capacity(3);
            if let Some(plan) = idea.recovery_plan() {
                if !plan.is_full_restart() {
                    actions.push(Resume(plan.resume));
                }
            }
            actions.push(Restart);
            actions.push(Delete);
            actions
        }
        IdeaStatus::VideoGenerated => vec![Upload, Delete],
        IdeaStatus::Uploaded | IdeaStatus::Rejected => vec![Delete],
        IdeaStatus::Queued
        | IdeaStatus::Processing
        | IdeaStatus::ScriptGenerating
        | IdeaStatus::ScriptAdapting
        | IdeaStatus::AudioGenerating
        | IdeaStatus::VideoGenerating => Vec::new(),
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Result of a batch action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcome: BatchOutcome,
    pub summary: BatchSummary,
    /// Requested ids unknown to the current collection, never sent
    pub dropped: Vec<IdeaId>,
    /// Known ids whose status forbids the action, never sent
    pub refused: Vec<(IdeaId, SkipReason)>,
}

impl BatchReport {
    /// Operator-facing line with both counts.
    pub fn message(&self) -> String {
        self.summary.to_string()
    }
}

/// Why an id was left out of a bulk start or a batch action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Unknown,
    Locked { status: IdeaStatus },
    Terminal { status: IdeaStatus },
}

impl SkipReason {
    fn into_error(self, idea_id: &IdeaId) -> Option<DashboardError> {
        match self {
            SkipReason::Unknown => None,
            SkipReason::Locked { status } => Some(DashboardError::locked(idea_id, status)),
            SkipReason::Terminal { status } => Some(DashboardError::Terminal {
                idea_id: idea_id.clone(),
                status,
            }),
        }
    }
}

/// Why `idea` must not be sent a command, if it must not.
///
/// Locked ideas accept nothing. Terminal ideas only accept deletion.
fn refusal(idea: &Idea, terminal_allowed: bool) -> Option<SkipReason> {
    let status = idea.status;
    if status.is_locked() {
        Some(SkipReason::Locked { status })
    } else if status.is_terminal() && !terminal_allowed {
        Some(SkipReason::Terminal { status })
    } else {
        None
    }
}

/// Result of a bulk start, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkStartReport {
    pub started: Vec<StartPipelineResponse>,
    pub failed: Vec<(IdeaId, String)>,
    pub skipped: Vec<(IdeaId, SkipReason)>,
}

impl BulkStartReport {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            succeeded: self.started.len(),
            failed: self.failed.len(),
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

pub struct PipelineController {
    api: Arc<dyn StudioApi>,
    collection: Arc<RwLock<IdeaCollection>>,
    refresh: RefreshHandle,
    bulk_delay: Duration,
}

impl PipelineController {
    pub fn new(
        api: Arc<dyn StudioApi>,
        collection: Arc<RwLock<IdeaCollection>>,
        refresh: RefreshHandle,
        bulk_delay: Duration,
    ) -> Self {
        Self {
            api,
            collection,
            refresh,
            bulk_delay,
        }
    }

    /// Queue generation of `idea` starting at `stage`.
    pub async fn start_stage(&self, idea: &Idea, stage: Stage) -> DashboardResult<StartPipelineResponse> {
        let result = self.submit_start(idea, stage, "start_stage").await;
        if !matches!(result, Err(ref e) if e.is_local_refusal()) {
            self.refresh.request();
        }
        result
    }

    /// Continue a failed run after its last checkpoint.
    pub async fn resume(&self, idea: &Idea) -> DashboardResult<StartPipelineResponse> {
        let plan = idea.recovery_plan().ok_or_else(|| DashboardError::NotResumable {
            idea_id: idea.id.clone(),
            status: idea.status,
        })?;
        self.start_stage(idea, plan.resume).await
    }

    /// Start a failed run over from the script.
    pub async fn restart(&self, idea: &Idea) -> DashboardResult<StartPipelineResponse> {
        let plan = idea.recovery_plan().ok_or_else(|| DashboardError::NotResumable {
            idea_id: idea.id.clone(),
            status: idea.status,
        })?;
        self.start_stage(idea, plan.restart).await
    }

    /// Pull a waiting job out of the queue.
    pub async fn cancel(&self, idea: &Idea) -> DashboardResult<CancelJobResponse> {
        let logger = IdeaLogger::new(&idea.id, "cancel");

        if idea.status != IdeaStatus::Queued {
            logger.log_warning(&format!("status is {}", idea.status));
            record_action("cancel", "refused");
            return Err(DashboardError::NotCancellable {
                idea_id: idea.id.clone(),
                status: idea.status,
            });
        }

        logger.log_start("cancelling queued job");
        let result = self.api.cancel_job(&idea.id).instrument(logger.span()).await;
        self.refresh.request();

        let response = self.finish(&logger, "cancel", result)?;
        logger.log_completion(&response.message);
        Ok(response)
    }

    pub async fn delete(&self, idea: &Idea) -> DashboardResult<()> {
        let logger = IdeaLogger::new(&idea.id, "delete");
        self.ensure_actionable(idea, &logger, "delete", true)?;

        logger.log_start("deleting idea");
        let result = self.api.delete_idea(&idea.id).instrument(logger.span()).await;
        self.refresh.request();

        self.finish(&logger, "delete", result)?;
        logger.log_completion("idea deleted");
        Ok(())
    }

    /// Validate a pending idea with its video parameters.
    pub async fn validate(&self, idea: &Idea, request: &ValidateIdeaRequest) -> DashboardResult<Idea> {
        let logger = IdeaLogger::new(&idea.id, "validate");
        self.ensure_actionable(idea, &logger, "validate", false)?;

        logger.log_start(&format!(
            "{} video, {}s",
            request.video_type.as_str(),
            request.duration_seconds
        ));
        let result = self
            .api
            .validate_idea(&idea.id, request)
            .instrument(logger.span())
            .await;
        self.refresh.request();

        let updated = self.finish(&logger, "validate", result)?;
        logger.log_completion(&format!("now {}", updated.status));
        Ok(updated)
    }

    pub async fn reject(&self, idea: &Idea) -> DashboardResult<()> {
        let logger = IdeaLogger::new(&idea.id, "reject");
        self.ensure_actionable(idea, &logger, "reject", false)?;

        logger.log_start("rejecting idea");
        let result = self.api.reject_idea(&idea.id).instrument(logger.span()).await;
        self.refresh.request();

        self.finish(&logger, "reject", result)?;
        logger.log_completion("idea rejected");
        Ok(())
    }

    /// Apply `action` to many ideas at once.
    ///
    /// Ids unknown to the current collection are dropped before sending, and
    /// ids whose status forbids `action` are refused with the same rules as
    /// the single-idea commands. Partial failure is a normal outcome,
    /// reported through the summary.
    pub async fn batch_action(&self, idea_ids: &[IdeaId], action: BatchAction) -> DashboardResult<BatchReport> {
        let terminal_allowed = action == BatchAction::Delete;
        let (resolved, sendable, refused) = {
            let collection = self.collection.read().await;
            let resolved = collection.resolve_ids(idea_ids);
            let mut sendable = Vec::with_capacity(resolved.known.len());
            let mut refused = Vec::new();
            for id in &resolved.known {
                match collection.get(id).and_then(|idea| refusal(idea, terminal_allowed)) {
                    Some(reason) => refused.push((id.clone(), reason)),
                    None => sendable.push(id.clone()),
                }
            }
            (resolved, sendable, refused)
        };

        for id in &resolved.unknown {
            debug!(idea_id = %id, action = %action, "Dropping unknown idea from batch");
        }
        for (id, reason) in &refused {
            IdeaLogger::new(id, "batch_action").log_warning(&format!("{} refused: {:?}", action, reason));
        }

        if sendable.is_empty() {
            if !refused.is_empty() {
                record_action("batch_action", "refused");
            }
            return Ok(BatchReport {
                dropped: resolved.unknown,
                refused,
                ..Default::default()
            });
        }

        info!(
            action = %action,
            count = sendable.len(),
            refused = refused.len(),
            "Submitting batch action"
        );
        let result = self.api.batch_action(&sendable, action).await;
        self.refresh.request();

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                record_action("batch_action", "error");
                return Err(e.into());
            }
        };

        let summary = outcome.summary();
        record_action("batch_action", if summary.failed == 0 { "ok" } else { "partial" });
        info!(action = %action, succeeded = summary.succeeded, failed = summary.failed, "Batch action done");

        Ok(BatchReport {
            outcome,
            summary,
            dropped: resolved.unknown,
            refused,
        })
    }

    /// Start `stage` for each idea, one request at a time, in the given order.
    ///
    /// Submissions are separated by the configured delay. A failure is
    /// recorded and the loop moves on; unknown, locked and terminal ideas are
    /// skipped.
    pub async fn bulk_start(&self, idea_ids: &[IdeaId], stage: Stage) -> BulkStartReport {
        // Snapshot under the read lock; nothing is held across the requests.
        let targets: Vec<(IdeaId, Option<Idea>)> = {
            let collection = self.collection.read().await;
            let mut targets: Vec<(IdeaId, Option<Idea>)> = Vec::with_capacity(idea_ids.len());
            for id in idea_ids {
                if !targets.iter().any(|(seen, _)| seen == id) {
                    targets.push((id.clone(), collection.get(id).cloned()));
                }
            }
            targets
        };

        let total = targets.len();
        let mut report = BulkStartReport::default();
        let mut submitted = 0usize;

        for (idea_id, idea) in targets {
            let Some(idea) = idea else {
                debug!(idea_id = %idea_id, "Skipping unknown idea in bulk start");
                report.skipped.push((idea_id, SkipReason::Unknown));
                continue;
            };
            if let Some(reason) = refusal(&idea, false) {
                debug!(idea_id = %idea_id, status = %idea.status, "Skipping idea in bulk start");
                report.skipped.push((idea_id, reason));
                continue;
            }

            if submitted > 0 && !self.bulk_delay.is_zero() {
                tokio::time::sleep(self.bulk_delay).await;
            }
            submitted += 1;
            IdeaLogger::new(&idea_id, "bulk_start")
                .log_progress(&format!("submission {} of at most {}", submitted, total));

            match self.submit_start(&idea, stage, "bulk_start").await {
                Ok(response) => report.started.push(response),
                Err(e) => report.failed.push((idea_id, e.user_message())),
            }
        }

        if submitted > 0 {
            self.refresh.request();
        }

        let summary = report.summary();
        info!(
            stage = %stage,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = report.skipped.len(),
            "Bulk start done"
        );
        report
    }

    /// Publish the rendered video of `idea` on YouTube, now or at the
    /// request's `publish_at`.
    pub async fn upload(&self, idea: &Idea, request: &UploadVideoRequest) -> DashboardResult<UploadVideoResponse> {
        let logger = IdeaLogger::new(&idea.id, "upload");

        if idea.status != IdeaStatus::VideoGenerated {
            logger.log_warning(&format!("status is {}", idea.status));
            record_action("upload", "refused");
            return Err(DashboardError::NotUploadable {
                idea_id: idea.id.clone(),
                status: idea.status,
            });
        }

        match request.publish_at {
            Some(at) => logger.log_start(&format!("scheduled for {}", at)),
            None => logger.log_start("publishing now"),
        }

        let video = match self.api.video_by_idea(&idea.id).instrument(logger.span()).await {
            Ok(video) => video,
            Err(e) => {
                logger.log_error(&e.user_message());
                record_action("upload", "error");
                return Err(e.into());
            }
        };
        logger.log_progress(&format!("uploading video {}", video.id));

        let result = self
            .api
            .upload_video(&video, request)
            .instrument(logger.span())
            .await;
        self.refresh.request();

        let response = self.finish(&logger, "upload", result)?;
        logger.log_completion(&response.youtube_url);
        Ok(response)
    }

    pub async fn generate_ideas(&self, request: &GenerateIdeasRequest) -> DashboardResult<GeneratedIdeas> {
        info!(count = request.count, "Generating ideas");
        let result = self.api.generate_ideas(request).await;
        record_action("generate_ideas", if result.is_ok() { "ok" } else { "error" });

        let generated = result?;
        self.refresh.request();
        info!(created = generated.count, "Ideas generated");
        Ok(generated)
    }

    pub async fn create_from_script(&self, request: &CustomScriptRequest) -> DashboardResult<GeneratedIdeas> {
        info!(chars = request.script_text.chars().count(), "Creating idea from custom script");
        let result = self.api.create_from_script(request).await;
        record_action("create_from_script", if result.is_ok() { "ok" } else { "error" });

        let created = result?;
        self.refresh.request();
        Ok(created)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn submit_start(
        &self,
        idea: &Idea,
        stage: Stage,
        operation: &'static str,
    ) -> DashboardResult<StartPipelineResponse> {
        let logger = IdeaLogger::new(&idea.id, operation);
        self.ensure_actionable(idea, &logger, operation, false)?;

        logger.log_start(&format!("start_from={}", stage));
        let result = self
            .api
            .start_pipeline(&idea.id, stage)
            .instrument(logger.span())
            .await;

        let response = self.finish(&logger, operation, result)?;
        match response.queue_position {
            Some(position) => logger.log_completion(&format!("queued at position {}", position)),
            None => logger.log_completion(&response.message),
        }
        Ok(response)
    }

    fn ensure_actionable(
        &self,
        idea: &Idea,
        logger: &IdeaLogger,
        action: &'static str,
        terminal_allowed: bool,
    ) -> DashboardResult<()> {
        match refusal(idea, terminal_allowed).and_then(|reason| reason.into_error(&idea.id)) {
            Some(err) => {
                logger.log_warning(&format!("idea is {}", idea.status));
                record_action(action, "refused");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn finish<T>(
        &self,
        logger: &IdeaLogger,
        action: &'static str,
        result: vgen_client::ClientResult<T>,
    ) -> DashboardResult<T> {
        match result {
            Ok(value) => {
                record_action(action, "ok");
                Ok(value)
            }
            Err(e) => {
                logger.log_error(&e.user_message());
                record_action(action, "error");
                Err(e.into())
            }
        }
    }
}
