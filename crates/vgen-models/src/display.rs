//! Display metadata for statuses and progress.
//!
//! Every mapping here is an exhaustive `match` so a new backend status is a
//! compile error until it has a label.

use serde::Serialize;

use crate::IdeaStatus;

/// Visual tone of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Info,
    Working,
    Success,
    Danger,
}

/// Label and tone for a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub tone: Tone,
}

const fn display(label: &'static str, tone: Tone) -> StatusDisplay {
    StatusDisplay { label, tone }
}

/// Badge for a status.
pub fn status_display(status: IdeaStatus) -> StatusDisplay {
    match status {
        IdeaStatus::Pending => display("En attente", Tone::Neutral),
        IdeaStatus::Validated => display("Validée", Tone::Info),
        IdeaStatus::Queued => display("Dans la queue", Tone::Working),
        IdeaStatus::Processing => display("En traitement", Tone::Working),
        IdeaStatus::ScriptGenerating => display("Génération du script", Tone::Working),
        IdeaStatus::ScriptGenerated => display("Script généré", Tone::Info),
        IdeaStatus::ScriptAdapting => display("Adaptation du script", Tone::Working),
        IdeaStatus::ScriptAdapted => display("Script adapté", Tone::Info),
        IdeaStatus::AudioGenerating => display("Génération audio", Tone::Working),
        IdeaStatus::AudioGenerated => display("Audio généré", Tone::Info),
        IdeaStatus::VideoGenerating => display("Génération vidéo", Tone::Working),
        IdeaStatus::VideoGenerated => display("Vidéo générée", Tone::Success),
        IdeaStatus::Uploaded => display("Uploadée", Tone::Success),
        IdeaStatus::Rejected => display("Rejetée", Tone::Danger),
        IdeaStatus::Error => display("Erreur", Tone::Danger),
    }
}

/// Fill level of a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTone {
    Idle,
    Low,
    Medium,
    High,
    Complete,
}

pub fn progress_tone(progress: u8) -> ProgressTone {
    match progress {
        100.. => ProgressTone::Complete,
        75..=99 => ProgressTone::High,
        50..=74 => ProgressTone::Medium,
        25..=49 => ProgressTone::Low,
        _ => ProgressTone::Idle,
    }
}

/// Text progress bar, e.g. `[######----] 60%`.
pub fn progress_bar(progress: u8, width: usize) -> String {
    let progress = progress.min(100);
    let filled = (progress as usize * width) / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress
    )
}
