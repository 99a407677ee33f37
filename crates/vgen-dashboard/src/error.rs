//! Dashboard error types.

use thiserror::Error;

use vgen_client::ClientError;
use vgen_models::{IdeaId, IdeaStatus};

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The backend is working on the idea; stage-start and delete are disabled.
    #[error("Idea {idea_id} is locked while {status}")]
    ActionLocked { idea_id: IdeaId, status: IdeaStatus },

    /// Rejected and uploaded ideas accept no further transition.
    #[error("Idea {idea_id} is {status}, no further transition")]
    Terminal { idea_id: IdeaId, status: IdeaStatus },

    #[error("Idea {idea_id} cannot be uploaded while {status}")]
    NotUploadable { idea_id: IdeaId, status: IdeaStatus },

    #[error("Idea {idea_id} cannot be cancelled while {status}")]
    NotCancellable { idea_id: IdeaId, status: IdeaStatus },

    #[error("Idea {idea_id} cannot be resumed while {status}")]
    NotResumable { idea_id: IdeaId, status: IdeaStatus },
}

impl DashboardError {
    pub fn locked(idea_id: &IdeaId, status: IdeaStatus) -> Self {
        Self::ActionLocked {
            idea_id: idea_id.clone(),
            status,
        }
    }

    /// True when the command was refused locally and nothing was sent.
    pub fn is_local_refusal(&self) -> bool {
        !matches!(self, DashboardError::Client(_))
    }

    /// The only string shown to the operator for a failed action.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Client(e) => e.user_message(),
            DashboardError::ActionLocked { status, .. } => format!(
                "Action indisponible : l'idée est en cours de traitement ({})",
                vgen_models::status_display(*status).label
            ),
            DashboardError::Terminal { status, .. } => format!(
                "Action indisponible : l'idée est dans un état final ({})",
                vgen_models::status_display(*status).label
            ),
            DashboardError::NotUploadable { status, .. } => format!(
                "Seules les vidéos générées peuvent être publiées (statut actuel : {})",
                vgen_models::status_display(*status).label
            ),
            DashboardError::NotCancellable { status, .. } => format!(
                "Seules les idées dans la queue peuvent être annulées (statut actuel : {})",
                vgen_models::status_display(*status).label
            ),
            DashboardError::NotResumable { status, .. } => format!(
                "Seules les idées en erreur peuvent être relancées (statut actuel : {})",
                vgen_models::status_display(*status).label
            ),
        }
    }
}
