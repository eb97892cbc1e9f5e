//! Dashboard poller.
//!
//! `Idle -> Active -> Idle`. Activation runs one cycle immediately and then
//! one per interval, measured from the moment of activation. Every cycle is
//! spawned as its own task, so a slow fetch never delays the schedule and
//! two fetches may overlap.
//!
//! Deactivation stops the schedule and bumps the epoch. A cycle remembers
//! the epoch it started under and drops its snapshot if the epoch moved
//! while the fetch was in flight. The epoch check and the sink calls run
//! under the render gate, which `deactivate` also takes before bumping the
//! epoch: a frame already being drawn finishes first, and nothing renders
//! after `deactivate` returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use logsight_client::{ApiClient, ClientResult, Transport};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::sink::{self, PanelSink};
use crate::snapshot::DashboardSnapshot;

/// Poller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// No schedule running.
    Idle,
    /// Cycles are scheduled.
    Active {
        /// Time between scheduled cycles.
        interval: Duration,
    },
}

struct Schedule {
    interval: Duration,
    ticker: JoinHandle<()>,
}

struct Inner<T> {
    client: ApiClient<T>,
    sink: Arc<dyn PanelSink>,
    config: PollerConfig,
    epoch: AtomicU64,
    schedule: Mutex<Option<Schedule>>,
    render_gate: Mutex<()>,
}

impl<T: Transport> Inner<T> {
    async fn cycle(&self, epoch: u64) -> DashboardResult<DashboardSnapshot> {
        let result = self
            .client
            .get::<DashboardSnapshot>(&self.config.endpoint)
            .await;
        self.publish(epoch, result)
    }
}

impl<T> Inner<T> {
    /// Hand a fetch result to the sink unless the epoch moved. Runs under
    /// the render gate.
    fn publish(
        &self,
        epoch: u64,
        result: ClientResult<DashboardSnapshot>,
    ) -> DashboardResult<DashboardSnapshot> {
        let _gate = self.render_gate.lock();
        let current = self.epoch.load(Ordering::Acquire);
        if current != epoch {
            debug!(epoch, current, "discarding result of superseded cycle");
            return Err(DashboardError::Superseded { epoch });
        }

        match result {
            Ok(snapshot) => {
                sink::render(self.sink.as_ref(), &snapshot);
                debug!(epoch, timestamp = %snapshot.timestamp, "dashboard rendered");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(epoch, error = %e, "dashboard refresh failed");
                self.sink.report_failure(&e.to_string());
                Err(e.into())
            }
        }
    }

    /// Bump the epoch once no cycle is rendering. Returns the new epoch.
    fn advance_epoch(&self) -> u64 {
        let _gate = self.render_gate.lock();
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Fetches dashboard snapshots on a schedule and renders them to a
/// [`PanelSink`].
///
/// Scheduling methods spawn onto the current Tokio runtime and must be
/// called from within one.
pub struct DashboardPoller<T> {
    inner: Arc<Inner<T>>,
}

impl<T> std::fmt::Debug for DashboardPoller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardPoller")
            .field("config", &self.inner.config)
            .field("epoch", &self.inner.epoch.load(Ordering::Acquire))
            .field("active", &self.inner.schedule.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DashboardPoller<T> {
    /// Create an idle poller.
    pub fn new(client: ApiClient<T>, sink: Arc<dyn PanelSink>, config: PollerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                sink,
                config,
                epoch: AtomicU64::new(0),
                schedule: Mutex::new(None),
                render_gate: Mutex::new(()),
            }),
        }
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PollerState {
        self.inner
            .schedule
            .lock()
            .as_ref()
            .map_or(PollerState::Idle, |s| PollerState::Active {
                interval: s.interval,
            })
    }

    /// Whether a schedule is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.schedule.lock().is_some()
    }

    /// Current epoch. Advances on every deactivation.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    /// Activate with the configured interval.
    pub fn activate(&self) -> DashboardResult<()> {
        self.activate_every(self.inner.config.interval)
    }

    /// Activate: run one cycle now, then one every `interval`.
    pub fn activate_every(&self, interval: Duration) -> DashboardResult<()> {
        if interval.is_zero() {
            return Err(DashboardError::InvalidInterval(interval));
        }

        let mut schedule = self.inner.schedule.lock();
        if schedule.is_some() {
            return Err(DashboardError::AlreadyActive);
        }

        let epoch = self.epoch();
        let start = Instant::now();
        spawn_cycle(&self.inner, epoch);

        let inner = Arc::clone(&self.inner);
        let ticker = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(start + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                spawn_cycle(&inner, epoch);
            }
        });

        *schedule = Some(Schedule { interval, ticker });
        info!(?interval, epoch, "dashboard polling activated");
        Ok(())
    }

    /// Run one extra cycle now without touching the schedule. Requires an
    /// active poller.
    pub async fn manual_refresh(&self) -> DashboardResult<DashboardSnapshot> {
        if !self.is_active() {
            return Err(DashboardError::NotActive);
        }
        debug!("manual dashboard refresh");
        self.inner.cycle(self.epoch()).await
    }

    /// Run one cycle now, whatever the state.
    pub async fn run_cycle(&self) -> DashboardResult<DashboardSnapshot> {
        self.inner.cycle(self.epoch()).await
    }

    /// Stop the schedule. Cycles already in flight finish but do not render.
    /// A frame that is mid-render when this is called completes before it
    /// returns. Safe to call when idle.
    ///
    /// Must not be called from inside a [`PanelSink`] method.
    pub fn deactivate(&self) {
        let Some(schedule) = self.inner.schedule.lock().take() else {
            return;
        };
        schedule.ticker.abort();
        let epoch = self.inner.advance_epoch();
        info!(epoch, "dashboard polling deactivated");
    }
}

impl<T> Drop for DashboardPoller<T> {
    fn drop(&mut self) {
        if let Some(schedule) = self.inner.schedule.lock().take() {
            schedule.ticker.abort();
            self.inner.advance_epoch();
        }
    }
}

fn spawn_cycle<T: Transport>(inner: &Arc<Inner<T>>, epoch: u64) {
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        // Failures are already logged and reported to the sink.
        let _ = inner.cycle(epoch).await;
    });
}
