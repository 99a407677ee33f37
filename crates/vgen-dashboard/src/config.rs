//! Dashboard configuration.

use std::time::Duration;

/// Timing and output settings for a dashboard session.
///
/// Backend connection settings live in `vgen_client::ClientConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Cadence of the per-idea job-status poll
    pub queue_poll_interval: Duration,
    /// Cadence of the full collection re-fetch
    pub refresh_interval: Duration,
    /// Pause between two submissions of a bulk start
    pub bulk_delay: Duration,
    /// Emit JSON logs instead of human-readable ones
    pub json_logs: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            queue_poll_interval: Duration::from_secs(5),
            refresh_interval: Duration::from_secs(5),
            bulk_delay: Duration::from_millis(500),
            json_logs: false,
        }
    }
}

impl DashboardConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            queue_poll_interval: std::env::var("VGEN_QUEUE_POLL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.queue_poll_interval),
            refresh_interval: std::env::var("VGEN_REFRESH_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            bulk_delay: std::env::var("VGEN_BULK_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.bulk_delay),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }
}
