//! Poller configuration.

use std::time::Duration;

/// Default refresh interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10_000);

/// Default snapshot endpoint, relative to the API base.
pub const DEFAULT_ENDPOINT: &str = "/dashboard-data";

/// Configuration for the dashboard poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Time between scheduled cycles.
    pub interval: Duration,
    /// Snapshot endpoint.
    pub endpoint: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl PollerConfig {
    /// Set the refresh interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the snapshot endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}
