//! Batch actions over selected ideas.
//!
//! A batch reports success and failure per id; partial failure is a normal
//! outcome, not an error.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::IdeaId;

/// Action applied to every id of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    /// Queue pipeline generation
    Generate,
    Delete,
    Validate,
    Reject,
}

impl BatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchAction::Generate => "generate",
            BatchAction::Delete => "delete",
            BatchAction::Validate => "validate",
            BatchAction::Reject => "reject",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BatchAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate" => Ok(BatchAction::Generate),
            "delete" => Ok(BatchAction::Delete),
            "validate" => Ok(BatchAction::Validate),
            "reject" => Ok(BatchAction::Reject),
            other => Err(format!("unknown batch action: {}", other)),
        }
    }
}

/// A failed entry; the backend reports either a bare id or `{id, reason}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum BatchFailure {
    Detailed {
        id: IdeaId,
        #[serde(default)]
        reason: Option<String>,
    },
    Id(IdeaId),
}

impl BatchFailure {
    pub fn id(&self) -> &IdeaId {
        match self {
            BatchFailure::Detailed { id, .. } | BatchFailure::Id(id) => id,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            BatchFailure::Detailed { reason, .. } => reason.as_deref(),
            BatchFailure::Id(_) => None,
        }
    }
}

/// Per-id outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchOutcome {
    #[serde(default)]
    pub success: Vec<IdeaId>,
    #[serde(default)]
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            succeeded: self.success.len(),
            failed: self.failed.len(),
        }
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &IdeaId> {
        self.failed.iter().map(BatchFailure::id)
    }
}

/// Response envelope of `POST /api/ideas/batch-action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BatchActionResponse {
    pub results: BatchOutcome,
}

/// Counts shown to the operator after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn is_partial(&self) -> bool {
        self.succeeded > 0 && self.failed > 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} idée(s) traitée(s) avec succès, {} échec(s)",
            self.succeeded, self.failed
        )
    }
}
