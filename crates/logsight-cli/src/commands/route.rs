//! Route command implementation.

use std::io::Write;

use logsight_client::{Console, Location, Transport};

use crate::error::CliError;
use crate::output::{OutputFormat, RouteView};

/// Handler for the route command.
pub struct RouteCommand<'a, T> {
    console: &'a Console<T>,
}

impl<'a, T: Transport> RouteCommand<'a, T> {
    /// Creates a new route command handler.
    #[must_use]
    pub const fn new(console: &'a Console<T>) -> Self {
        Self { console }
    }

    /// Show where navigating to `path` would land for the current session.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        path: &str,
    ) -> Result<(), CliError> {
        let requested = Location::parse(path);
        let state = self.console.navigator().resolve(path)?;
        let view = RouteView {
            redirected: state.location != requested,
            requested: requested.full_path(),
            location: state.location.full_path(),
            route: state.route,
            params: state.params,
            title: state.title,
        };
        format.write(out, &view)
    }
}
