//! CLI error types.

use std::fmt;

use logsight_client::{ClientError, NavigationError};
use logsight_dashboard::DashboardError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// The console API call failed.
    Client(ClientError),
    /// The dashboard poller refused or failed.
    Dashboard(DashboardError),
    /// Navigation could not settle.
    Navigation(NavigationError),
    /// The command needs a signed-in session.
    NotSignedIn,
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotSignedIn => 3,
            Self::Client(e) if e.is_unauthorized() => 3,
            Self::Dashboard(DashboardError::Client(e)) if e.is_unauthorized() => 3,
            Self::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(e) => write!(f, "{e}"),
            Self::Dashboard(e) => write!(f, "dashboard: {e}"),
            Self::Navigation(e) => write!(f, "navigation: {e}"),
            Self::NotSignedIn => write!(f, "not signed in; run `logsight login` first"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Client(e) => Some(e),
            Self::Dashboard(e) => Some(e),
            Self::Navigation(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        Self::Client(err)
    }
}

impl From<DashboardError> for CliError {
    fn from(err: DashboardError) -> Self {
        Self::Dashboard(err)
    }
}

impl From<NavigationError> for CliError {
    fn from(err: NavigationError) -> Self {
        Self::Navigation(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
