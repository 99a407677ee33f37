//! Idea model.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stage::{resume_stage, RecoveryPlan};
use crate::utils::{lenient_timestamp, null_as_default};
use crate::{IdeaStatus, Stage};

/// Opaque identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct IdeaId(pub String);

impl IdeaId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IdeaId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdeaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Output format of the rendered video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoType {
    /// Vertical 9:16
    #[default]
    Short,
    /// Horizontal 16:9, split into sections
    Normal,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Short => "short",
            VideoType::Normal => "normal",
        }
    }

    pub fn aspect_ratio(&self) -> &'static str {
        match self {
            VideoType::Short => "9:16",
            VideoType::Normal => "16:9",
        }
    }
}

impl fmt::Display for VideoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One candidate video concept and its pipeline state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Idea {
    pub id: IdeaId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub video_type: VideoType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,

    /// Section count for long-form videos
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_titles: Option<Vec<String>>,

    #[serde(default)]
    pub status: IdeaStatus,

    /// Set once script generation succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Raw checkpoint marker; may hold values outside the status vocabulary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_step: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub progress_percentage: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Idea {
    /// Minimal idea, mostly useful for fixtures.
    pub fn new(id: impl Into<IdeaId>, title: impl Into<String>, status: IdeaStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            keywords: Vec::new(),
            video_type: VideoType::default(),
            duration_seconds: None,
            sections_count: None,
            section_titles: None,
            status,
            script_id: None,
            error_message: None,
            last_successful_step: None,
            progress_percentage: 0,
            current_step: None,
            created_at: None,
        }
    }

    /// Progress clamped to 0-100.
    pub fn progress(&self) -> u8 {
        self.progress_percentage.min(100)
    }

    /// Error text, only when the idea is actually in `error`.
    pub fn error_message(&self) -> Option<&str> {
        match self.status {
            IdeaStatus::Error => self.error_message.as_deref().filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }

    /// Checkpoint marker, only meaningful in `error`.
    pub fn checkpoint(&self) -> Option<&str> {
        match self.status {
            IdeaStatus::Error => self.last_successful_step.as_deref(),
            _ => None,
        }
    }

    /// Stage the resume action would start from.
    pub fn resume_stage(&self) -> Stage {
        resume_stage(self.checkpoint())
    }

    /// Recovery actions, offered only for ideas in `error`.
    pub fn recovery_plan(&self) -> Option<RecoveryPlan> {
        (self.status == IdeaStatus::Error).then(|| RecoveryPlan::from_checkpoint(self.checkpoint()))
    }

    /// Parameters are frozen once the pipeline moved past `validated`.
    pub fn parameters_locked(&self) -> bool {
        !matches!(
            self.status,
            IdeaStatus::Pending | IdeaStatus::Validated | IdeaStatus::Rejected
        )
    }

    /// Case-insensitive match over title, keywords and status.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(needle)
            || self.keywords.iter().any(|k| k.to_lowercase().contains(needle))
            || self.status.as_str().contains(needle)
            || crate::display::status_display(self.status)
                .label
                .to_lowercase()
                .contains(needle)
    }

    /// Data-model invariants the backend is expected to uphold.
    pub fn invariant_violations(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if self.status == IdeaStatus::Error && self.error_message().is_none() {
            violations.push(InvariantViolation::ErrorWithoutMessage);
        }

        let has_script = self.script_id.as_deref().is_some_and(|s| !s.is_empty());
        if self.status.has_script() && !has_script {
            violations.push(InvariantViolation::MissingScriptId);
        }

        let complete = self.progress() == 100;
        if complete != self.status.is_complete() {
            violations.push(InvariantViolation::ProgressMismatch {
                progress: self.progress_percentage,
            });
        }

        violations
    }
}

/// A breach of the idea data-model invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    ErrorWithoutMessage,
    MissingScriptId,
    ProgressMismatch { progress: u8 },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::ErrorWithoutMessage => write!(f, "status is error but error_message is empty"),
            InvariantViolation::MissingScriptId => write!(f, "script stage passed but script_id is missing"),
            InvariantViolation::ProgressMismatch { progress } => {
                write!(f, "progress {}% does not match status", progress)
            }
        }
    }
}
