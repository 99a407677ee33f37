//! Pipeline stages and resume planning.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::IdeaStatus;

/// A unit of pipeline work that can be started independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// LLM script generation
    #[default]
    Script,
    /// Script adaptation for text-to-speech
    Adapt,
    /// Audio synthesis
    Audio,
    /// Video rendering
    Video,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Script, Stage::Adapt, Stage::Audio, Stage::Video];

    /// Value sent as `start_from`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Script => "script",
            Stage::Adapt => "adapt",
            Stage::Audio => "audio",
            Stage::Video => "video",
        }
    }

    /// Status reported while this stage runs.
    pub fn running_status(&self) -> IdeaStatus {
        match self {
            Stage::Script => IdeaStatus::ScriptGenerating,
            Stage::Adapt => IdeaStatus::ScriptAdapting,
            Stage::Audio => IdeaStatus::AudioGenerating,
            Stage::Video => IdeaStatus::VideoGenerating,
        }
    }

    /// Status reported once this stage completes.
    pub fn done_status(&self) -> IdeaStatus {
        match self {
            Stage::Script => IdeaStatus::ScriptGenerated,
            Stage::Adapt => IdeaStatus::ScriptAdapted,
            Stage::Audio => IdeaStatus::AudioGenerated,
            Stage::Video => IdeaStatus::VideoGenerated,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown pipeline stage: {0} (expected script, adapt, audio or video)")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "script" => Ok(Stage::Script),
            "adapt" => Ok(Stage::Adapt),
            "audio" => Ok(Stage::Audio),
            "video" => Ok(Stage::Video),
            other => Err(UnknownStage(other.to_string())),
        }
    }
}

/// Stage to restart from after an error.
///
/// Pure function of the `last_successful_step` marker. Markers the backend
/// writes outside the three resumable checkpoints (including `"aucune"` and
/// `video_generated`) restart from the script.
pub fn resume_stage(last_successful_step: Option<&str>) -> Stage {
    match last_successful_step {
        Some("script_generated") => Stage::Adapt,
        Some("script_adapted") => Stage::Audio,
        Some("audio_generated") => Stage::Video,
        _ => Stage::Script,
    }
}

/// The pair of recovery actions offered for an idea in `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoveryPlan {
    /// Continue after the last checkpoint
    pub resume: Stage,
    /// Always offered: start over from the script
    pub restart: Stage,
}

impl RecoveryPlan {
    pub fn from_checkpoint(last_successful_step: Option<&str>) -> Self {
        Self {
            resume: resume_stage(last_successful_step),
            restart: Stage::Script,
        }
    }

    /// True when resume and restart would issue the same command.
    pub fn is_full_restart(&self) -> bool {
        self.resume == self.restart
    }
}
