//! Tunables for [`super::manager::Session`] construction.

use chrono::TimeDelta;
use tokio::time::Duration;

/// Configuration for a [`super::manager::Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout applied to an outbound request when the caller doesn't
    /// override it.
    pub default_timeout: TimeDelta,

    /// How often the background task sweeps for expired pending requests.
    pub cleanup_interval: Duration,

    /// Maximum number of simultaneously in-flight outbound requests
    /// (0 = unlimited).
    pub max_pending_requests: usize,

    /// Bound on how long `close_gracefully` waits for in-flight responses
    /// to arrive before force-failing them.
    pub shutdown_drain_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_timeout: TimeDelta::seconds(30),
            cleanup_interval: Duration::from_secs(5),
            max_pending_requests: 1000,
            shutdown_drain_timeout: Duration::from_secs(5),
        }
    }
}
