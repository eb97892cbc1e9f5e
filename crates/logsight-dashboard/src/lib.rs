//! # logsight-dashboard
//!
//! Live situational-awareness dashboard for the Logsight console.
//!
//! A [`DashboardPoller`] fetches one [`DashboardSnapshot`] per cycle from
//! `GET /dashboard-data` and fans it out to five independently redrawn
//! panels through a [`PanelSink`]:
//!
//! | Panel | Source | Chart |
//! |-------|--------|-------|
//! | Alert trend | `historical_data` | [`TrendChart`](panels::TrendChart) |
//! | Threat gauge | `threat_intelligence.threat_level` | [`GaugeChart`](panels::GaugeChart) |
//! | Alert types | `security_alerts.alert_types` | [`PieChart`](panels::PieChart) |
//! | Attack sources | `threat_intelligence.attack_sources` | [`BarChart`](panels::BarChart) |
//! | System performance | `system_performance` | [`RadarChart`](panels::RadarChart) |
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use logsight_client::{ApiClient, ClientConfig, ReqwestTransport};
//! use logsight_dashboard::{DashboardPoller, PanelBoard, PollerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(ReqwestTransport::new(), ClientConfig::default())?;
//! let board = Arc::new(PanelBoard::new());
//! let poller = DashboardPoller::new(client, board.clone(), PollerConfig::default());
//!
//! poller.activate()?;
//! poller.manual_refresh().await?;
//! poller.deactivate();
//! println!("{} frames", board.frames());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod panels;
pub mod poller;
pub mod sink;
pub mod snapshot;

pub use config::PollerConfig;
pub use error::{DashboardError, DashboardResult};
pub use panels::{PanelKind, PanelUpdate};
pub use poller::{DashboardPoller, PollerState};
pub use sink::{BoardEvent, BoardView, PanelBoard, PanelSink};
pub use snapshot::DashboardSnapshot;
