//! Dashboard metrics.
//!
//! Emitted through the `metrics` facade; a no-op unless the host installs a
//! recorder.

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    /// Job-status polls by outcome (`ok`, `not_found`, `error`, `discarded`).
    pub const QUEUE_POLLS_TOTAL: &str = "queue_polls_total";

    /// Ideas currently tracked by the queue observer.
    pub const OBSERVER_TRACKED_IDEAS: &str = "observer_tracked_ideas";

    /// Collection re-fetches by outcome.
    pub const COLLECTION_REFRESHES_TOTAL: &str = "collection_refreshes_total";

    /// Controller commands by action and outcome.
    pub const ACTIONS_TOTAL: &str = "dashboard_actions_total";
}

/// Outcome of a single job-status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ok,
    NotFound,
    Error,
    /// Result arrived after the poller was stopped
    Discarded,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Ok => "ok",
            PollOutcome::NotFound => "not_found",
            PollOutcome::Error => "error",
            PollOutcome::Discarded => "discarded",
        }
    }
}

pub fn record_poll(outcome: PollOutcome) {
    counter!(names::QUEUE_POLLS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

pub fn set_tracked_ideas(count: usize) {
    gauge!(names::OBSERVER_TRACKED_IDEAS).set(count as f64);
}

pub fn record_refresh(success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!(names::COLLECTION_REFRESHES_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a controller command. `outcome` is `ok`, `refused` or `error`.
pub fn record_action(action: &'static str, outcome: &'static str) {
    counter!(names::ACTIONS_TOTAL, "action" => action, "outcome" => outcome).increment(1);
}
