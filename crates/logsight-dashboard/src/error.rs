//! Error types for the dashboard poller.

use logsight_client::ClientError;
use thiserror::Error;

/// Result type alias for dashboard operations.
pub type DashboardResult<T> = Result<T, DashboardError>;

/// Errors that can occur while driving the dashboard.
#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    /// `activate` was called while a schedule is already running.
    #[error("dashboard poller is already active")]
    AlreadyActive,

    /// The operation needs an active poller.
    #[error("dashboard poller is not active")]
    NotActive,

    /// The refresh interval cannot drive a schedule.
    #[error("invalid refresh interval: {0:?}")]
    InvalidInterval(std::time::Duration),

    /// The poller was deactivated while this cycle's fetch was in flight;
    /// its result was discarded.
    #[error("cycle from epoch {epoch} superseded by deactivation")]
    Superseded {
        /// Epoch the cycle was started under.
        epoch: u64,
    },

    /// Fetching the snapshot failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl DashboardError {
    /// Whether this is a discarded stale cycle rather than a real failure.
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}
