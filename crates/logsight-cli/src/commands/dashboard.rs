//! Dashboard command implementation.
//!
//! `--once` renders a single snapshot. Otherwise the poller stays active
//! and every completed frame is written out until ctrl-c or the frame
//! limit.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use logsight_client::{Console, Transport};
use logsight_dashboard::{BoardEvent, DashboardPoller, PanelBoard, PollerConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::enter_view;
use crate::cli::DashboardArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Handler for the dashboard command.
pub struct DashboardCommand<'a, T> {
    console: &'a Console<T>,
}

impl<'a, T: Transport> DashboardCommand<'a, T> {
    /// Creates a new dashboard command handler.
    #[must_use]
    pub const fn new(console: &'a Console<T>) -> Self {
        Self { console }
    }

    /// Executes the dashboard command, stopping on ctrl-c.
    ///
    /// # Errors
    ///
    /// Returns error if the session is missing or lost while polling.
    pub async fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &DashboardArgs,
    ) -> Result<(), CliError> {
        self.execute_until(out, format, args, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Like [`execute`](Self::execute), stopping when `shutdown` resolves.
    pub async fn execute_until<W, F>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &DashboardArgs,
        shutdown: F,
    ) -> Result<(), CliError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        enter_view(self.console, "/dashboard")?;
        if args.interval_ms == 0 {
            return Err(CliError::InvalidArgument(
                "interval must be at least 1ms".into(),
            ));
        }

        let board = Arc::new(PanelBoard::new());
        let config = PollerConfig::default().with_interval(Duration::from_millis(args.interval_ms));
        let poller = DashboardPoller::new(self.console.client().clone(), board.clone(), config);

        if args.once {
            poller.run_cycle().await?;
            return format.write(out, &board.view());
        }

        let mut events = board.subscribe();
        poller.activate()?;
        let outcome = self
            .watch(out, format, &board, &mut events, args.frames, shutdown)
            .await;
        poller.deactivate();
        outcome
    }

    async fn watch<W, F>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        board: &PanelBoard,
        events: &mut tokio::sync::broadcast::Receiver<BoardEvent>,
        limit: Option<u64>,
        shutdown: F,
    ) -> Result<(), CliError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    debug!("dashboard interrupted");
                    return Ok(());
                }
                event = events.recv() => match event {
                    Ok(BoardEvent::Frame { frame }) => {
                        format.write(out, &board.view())?;
                        if !format.is_json() {
                            writeln!(out)?;
                        }
                        out.flush()?;
                        if limit.is_some_and(|max| frame >= max) {
                            return Ok(());
                        }
                    }
                    Ok(BoardEvent::Failure { message }) => {
                        if !self.console.state().is_authenticated() {
                            return Err(CliError::NotSignedIn);
                        }
                        warn!(%message, "dashboard refresh failed, keeping last frame");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "dashboard output fell behind");
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
        }
    }
}
