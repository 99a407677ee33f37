//! Idea pipeline status vocabulary.
//!
//! The backend owns every transition; this module only encodes the closed
//! set of states it may report and the rules the dashboard derives from them
//! (which actions are locked, which states are polled, what "done" means).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pipeline status of an idea, in pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    /// Freshly generated, waiting for operator review
    #[default]
    Pending,
    /// Accepted by the operator, parameters fixed
    Validated,
    /// Job admitted to the backend queue
    Queued,
    /// Worker picked the job up
    Processing,
    ScriptGenerating,
    ScriptGenerated,
    ScriptAdapting,
    ScriptAdapted,
    AudioGenerating,
    AudioGenerated,
    VideoGenerating,
    VideoGenerated,
    /// Published to YouTube
    Uploaded,
    /// Declined by the operator (terminal)
    Rejected,
    /// A stage failed; see `error_message` and `last_successful_step`
    Error,
}

impl IdeaStatus {
    /// Every status, in pipeline order followed by the branch states.
    pub const ALL: [IdeaStatus; 15] = [
        IdeaStatus::Pending,
        IdeaStatus::Validated,
        IdeaStatus::Queued,
        IdeaStatus::Processing,
        IdeaStatus::ScriptGenerating,
        IdeaStatus::ScriptGenerated,
        IdeaStatus::ScriptAdapting,
        IdeaStatus::ScriptAdapted,
        IdeaStatus::AudioGenerating,
        IdeaStatus::AudioGenerated,
        IdeaStatus::VideoGenerating,
        IdeaStatus::VideoGenerated,
        IdeaStatus::Uploaded,
        IdeaStatus::Rejected,
        IdeaStatus::Error,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaStatus::Pending => "pending",
            IdeaStatus::Validated => "validated",
            IdeaStatus::Queued => "queued",
            IdeaStatus::Processing => "processing",
            IdeaStatus::ScriptGenerating => "script_generating",
            IdeaStatus::ScriptGenerated => "script_generated",
            IdeaStatus::ScriptAdapting => "script_adapting",
            IdeaStatus::ScriptAdapted => "script_adapted",
            IdeaStatus::AudioGenerating => "audio_generating",
            IdeaStatus::AudioGenerated => "audio_generated",
            IdeaStatus::VideoGenerating => "video_generating",
            IdeaStatus::VideoGenerated => "video_generated",
            IdeaStatus::Uploaded => "uploaded",
            IdeaStatus::Rejected => "rejected",
            IdeaStatus::Error => "error",
        }
    }

    /// No further transition is issued from a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IdeaStatus::Rejected | IdeaStatus::Uploaded)
    }

    /// Terminal success states carry `progress_percentage == 100`.
    pub fn is_complete(&self) -> bool {
        matches!(self, IdeaStatus::VideoGenerated | IdeaStatus::Uploaded)
    }

    /// States in which the queue observer polls job status.
    pub fn is_poll_eligible(&self) -> bool {
        matches!(
            self,
            IdeaStatus::Queued
                | IdeaStatus::Processing
                | IdeaStatus::ScriptGenerating
                | IdeaStatus::AudioGenerating
                | IdeaStatus::VideoGenerating
        )
    }

    /// The backend is actively working on the idea.
    ///
    /// Stage-start and delete are refused locally while locked.
    pub fn is_locked(&self) -> bool {
        self.is_poll_eligible() || *self == IdeaStatus::ScriptAdapting
    }

    /// A stage is running and has a well-defined done successor.
    pub fn is_generating(&self) -> bool {
        self.done_successor().is_some()
    }

    /// Successor reached when the running stage completes.
    pub fn done_successor(&self) -> Option<IdeaStatus> {
        match self {
            IdeaStatus::ScriptGenerating => Some(IdeaStatus::ScriptGenerated),
            IdeaStatus::ScriptAdapting => Some(IdeaStatus::ScriptAdapted),
            IdeaStatus::AudioGenerating => Some(IdeaStatus::AudioGenerated),
            IdeaStatus::VideoGenerating => Some(IdeaStatus::VideoGenerated),
            _ => None,
        }
    }

    /// The idea has reached or passed `script_generated` on the happy path.
    pub fn has_script(&self) -> bool {
        matches!(
            self,
            IdeaStatus::ScriptGenerated
                | IdeaStatus::ScriptAdapting
                | IdeaStatus::ScriptAdapted
                | IdeaStatus::AudioGenerating
                | IdeaStatus::AudioGenerated
                | IdeaStatus::VideoGenerating
                | IdeaStatus::VideoGenerated
                | IdeaStatus::Uploaded
        )
    }

    /// Dashboard counter bucket.
    pub fn group(&self) -> StatusGroup {
        match self {
            IdeaStatus::Pending => StatusGroup::Pending,
            IdeaStatus::Rejected => StatusGroup::Rejected,
            _ => StatusGroup::InProgress,
        }
    }
}

impl fmt::Display for IdeaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown idea status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for IdeaStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdeaStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Coarse grouping used by the dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    Pending,
    InProgress,
    Rejected,
}
