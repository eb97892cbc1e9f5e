//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`auth`] - Sign in, registration and the persisted session
//! - [`files`] - Log file management
//! - [`analysis`] - Server-side analysis and its results
//! - [`dashboard`] - Live situational-awareness dashboard
//! - [`route`] - Guarded view resolution

pub mod analysis;
pub mod auth;
pub mod dashboard;
pub mod files;
pub mod route;

pub use analysis::AnalysisCommand;
pub use auth::AuthCommand;
pub use dashboard::DashboardCommand;
pub use files::FileCommand;
pub use route::RouteCommand;

use logsight_client::guard::{LOGIN_PATH, NavigationState};
use logsight_client::{Console, Location, Transport};
use tracing::debug;

use crate::error::CliError;

/// Enter the view that backs a command. A guard redirect to the sign-in
/// view means there is no usable session.
pub(crate) fn enter_view<T: Transport>(
    console: &Console<T>,
    view: &str,
) -> Result<NavigationState, CliError> {
    let state = console.navigator().navigate(view)?;
    if state.location.path == LOGIN_PATH && Location::parse(view).path != LOGIN_PATH {
        debug!(view, "guard sent command to sign-in");
        return Err(CliError::NotSignedIn);
    }
    Ok(state)
}
