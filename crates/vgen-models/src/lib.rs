//! Shared data models for the VGen dashboard.
//!
//! This crate provides Serde-serializable types for:
//! - Ideas and their pipeline status vocabulary
//! - Pipeline stages and resume planning
//! - Job-queue snapshots and statistics
//! - Request bodies and batch results
//! - Rendered videos, scripts and YouTube uploads
//! - Display metadata for statuses and progress

pub mod batch;
pub mod display;
pub mod idea;
pub mod queue;
pub mod requests;
pub mod stage;
pub mod status;
pub mod utils;
pub mod video;

// Re-export common types
pub use batch::{BatchAction, BatchActionResponse, BatchFailure, BatchOutcome, BatchSummary};
pub use display::{progress_bar, progress_tone, status_display, ProgressTone, StatusDisplay, Tone};
pub use idea::{Idea, IdeaId, InvariantViolation, VideoType};
pub use queue::{CancelJobResponse, JobQueueStatus, JobStatus, PipelineStatus, QueueStats, StartPipelineResponse};
pub use requests::{CustomScriptRequest, GenerateIdeasRequest, GeneratedIdeas, ValidateIdeaRequest};
pub use stage::{resume_stage, RecoveryPlan, Stage, UnknownStage};
pub use status::{IdeaStatus, StatusGroup, UnknownStatus};
pub use utils::parse_keywords;
pub use video::{Script, UploadVideoRequest, UploadVideoResponse, Video};
