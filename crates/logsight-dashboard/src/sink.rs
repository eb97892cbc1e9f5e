//! Where rendered panels go.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::panels::{self, PanelKind, PanelUpdate};
use crate::snapshot::DashboardSnapshot;

/// Capacity of the board event channel.
const BOARD_CHANNEL_CAPACITY: usize = 64;

/// Receives panel redraws from the poller.
///
/// Calls for one snapshot arrive back to back from a single task: five
/// [`update_panel`](Self::update_panel) calls followed by
/// [`set_last_updated`](Self::set_last_updated).
pub trait PanelSink: Send + Sync {
    /// Redraw one panel.
    fn update_panel(&self, update: PanelUpdate);

    /// Show the snapshot's generation time.
    fn set_last_updated(&self, timestamp: &str);

    /// A cycle failed; prior panels stay as they are.
    fn report_failure(&self, message: &str);
}

/// Apply every panel of `snapshot` to `sink`.
pub fn render(sink: &dyn PanelSink, snapshot: &DashboardSnapshot) {
    for update in panels::project(snapshot) {
        sink.update_panel(update);
    }
    sink.set_last_updated(&snapshot.timestamp);
}

/// Event published by a [`PanelBoard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// A full frame was rendered.
    Frame {
        /// Frame counter after this frame.
        frame: u64,
    },
    /// A cycle failed.
    Failure {
        /// What went wrong.
        message: String,
    },
}

/// Snapshot of what a [`PanelBoard`] is showing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardView {
    /// Latest configuration per panel.
    pub panels: BTreeMap<PanelKind, PanelUpdate>,
    /// Server timestamp of the latest frame.
    pub last_updated: Option<String>,
    /// Local time the latest frame completed.
    pub rendered_at: Option<DateTime<Utc>>,
    /// Number of complete frames rendered.
    pub frames: u64,
    /// Number of failed cycles.
    pub failures: u64,
    /// Most recent failure message.
    pub last_error: Option<String>,
}

/// In-memory [`PanelSink`] keeping the latest state of every panel.
#[derive(Debug)]
pub struct PanelBoard {
    view: RwLock<BoardView>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for PanelBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelBoard {
    /// Empty board.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(BOARD_CHANNEL_CAPACITY);
        Self {
            view: RwLock::new(BoardView::default()),
            events,
        }
    }

    /// Subscribe to frame and failure events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Copy of the current view.
    #[must_use]
    pub fn view(&self) -> BoardView {
        self.view.read().clone()
    }

    /// Latest configuration of one panel.
    #[must_use]
    pub fn panel(&self, kind: PanelKind) -> Option<PanelUpdate> {
        self.view.read().panels.get(&kind).cloned()
    }

    /// Complete frames rendered so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.view.read().frames
    }

    /// Failed cycles so far.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.view.read().failures
    }

    /// Most recent failure message.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.view.read().last_error.clone()
    }

    fn publish(&self, event: BoardEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl PanelSink for PanelBoard {
    fn update_panel(&self, update: PanelUpdate) {
        self.view.write().panels.insert(update.kind(), update);
    }

    fn set_last_updated(&self, timestamp: &str) {
        let frame = {
            let mut view = self.view.write();
            view.last_updated = Some(timestamp.to_string());
            view.rendered_at = Some(Utc::now());
            view.frames += 1;
            view.frames
        };
        self.publish(BoardEvent::Frame { frame });
    }

    fn report_failure(&self, message: &str) {
        {
            let mut view = self.view.write();
            view.failures += 1;
            view.last_error = Some(message.to_string());
        }
        self.publish(BoardEvent::Failure {
            message: message.to_string(),
        });
    }
}
