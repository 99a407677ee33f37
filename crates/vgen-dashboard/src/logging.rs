//! Structured logging for operator actions.
//!
//! Every controller command logs through an [`IdeaLogger`] so the idea id and
//! the operation name are attached as fields, not baked into the message.

use tracing::{debug, error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vgen_models::IdeaId;

/// Logger bound to one idea and one operation.
#[derive(Debug, Clone)]
pub struct IdeaLogger {
    idea_id: String,
    operation: &'static str,
}

impl IdeaLogger {
    pub fn new(idea_id: &IdeaId, operation: &'static str) -> Self {
        Self {
            idea_id: idea_id.to_string(),
            operation,
        }
    }

    /// The command is about to be sent.
    pub fn log_start(&self, message: &str) {
        info!(
            idea_id = %self.idea_id,
            operation = %self.operation,
            "Action started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        debug!(
            idea_id = %self.idea_id,
            operation = %self.operation,
            "Action progress: {}", message
        );
    }

    /// The command was refused locally or skipped.
    pub fn log_warning(&self, message: &str) {
        warn!(
            idea_id = %self.idea_id,
            operation = %self.operation,
            "Action refused: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            idea_id = %self.idea_id,
            operation = %self.operation,
            "Action failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            idea_id = %self.idea_id,
            operation = %self.operation,
            "Action completed: {}", message
        );
    }

    pub fn idea_id(&self) -> &str {
        &self.idea_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Span carrying the same fields, for instrumenting the request future.
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "idea_action",
            idea_id = %self.idea_id,
            operation = %self.operation
        )
    }
}

/// Install the global subscriber.
///
/// JSON lines when `json` is set, colored human output otherwise. `RUST_LOG`
/// is honored on top of the `vgen=info` default.
pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::from_default_env().add_directive(
        "vgen=info"
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    );

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}
