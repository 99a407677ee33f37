//! Job-queue snapshots reported by the backend.
//!
//! These are read-only views used for display; none of them feed back into
//! an idea's authoritative `status`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::{lenient_timestamp, null_as_default};
use crate::{IdeaId, IdeaStatus, Stage};

/// State of a generation job in the backend queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a worker slot
    #[default]
    Queued,
    /// Worker is running the job
    Processing,
    Completed,
    Failed,
    /// Removed from the queue by the operator
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Only a waiting job can be removed from the queue.
    pub fn is_cancellable(&self) -> bool {
        *self == JobStatus::Queued
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response of `GET /api/queue/status/{idea_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobQueueStatus {
    pub idea_id: IdeaId,

    /// False when the backend has no job for this idea
    #[serde(default)]
    pub has_job: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,

    /// 1-based position, present only while the job waits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub retry_count: u32,
}

impl JobQueueStatus {
    /// Snapshot for an idea the backend has no job for.
    pub fn no_job(idea_id: impl Into<IdeaId>) -> Self {
        Self {
            idea_id: idea_id.into(),
            has_job: false,
            job_id: None,
            status: None,
            queue_position: None,
            created_at: None,
            started_at: None,
            error_message: None,
            retry_count: 0,
        }
    }

    /// Whether the operator can still pull the job out of the queue.
    pub fn is_cancellable(&self) -> bool {
        self.has_job && self.status.is_some_and(|s| s.is_cancellable())
    }

    /// Number of jobs ahead of this one.
    pub fn jobs_ahead(&self) -> Option<u32> {
        self.queue_position.map(|p| p.saturating_sub(1))
    }
}

/// Response of `GET /api/queue/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct QueueStats {
    #[serde(default)]
    pub queued: u32,
    #[serde(default)]
    pub processing: u32,
    #[serde(default)]
    pub completed_today: u32,
    #[serde(default)]
    pub max_concurrent: u32,
    #[serde(default)]
    pub available_slots: u32,
}

impl QueueStats {
    /// True when every worker slot is busy.
    pub fn is_saturated(&self) -> bool {
        self.max_concurrent > 0 && self.available_slots == 0
    }
}

/// Response of `GET /api/pipeline/status/{idea_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineStatus {
    pub idea_id: IdeaId,
    pub status: IdeaStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress_percentage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Response of `POST /api/pipeline/generate/{idea_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StartPipelineResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub job_id: String,
    pub idea_id: IdeaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
    pub start_from: Stage,
}

/// Response of `POST /api/queue/cancel/{idea_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CancelJobResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}
