//! # logsight-cli
//!
//! Command-line front end for the Logsight security log-analysis console.
//!
//! Provides commands for:
//! - Sign in, registration and the persisted session
//! - Log file upload, listing and deletion
//! - Triggering analysis and reading its results
//! - Watching the live situational-awareness dashboard
//!
//! Every command runs against one [`Console`](logsight_client::Console):
//! the session is restored from the state directory, protected commands
//! pass through the navigation guard first, and a 401 from the server
//! clears the persisted session.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, DashboardArgs, FileCommands, Format};
pub use error::CliError;
pub use output::OutputFormat;
