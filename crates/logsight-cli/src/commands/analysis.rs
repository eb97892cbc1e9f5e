//! Analysis command implementation.

use std::io::Write;

use logsight_client::{Console, Transport};

use super::enter_view;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Handler for `analyze` and `results`.
pub struct AnalysisCommand<'a, T> {
    console: &'a Console<T>,
}

impl<'a, T: Transport> AnalysisCommand<'a, T> {
    /// Creates a new analysis command handler.
    #[must_use]
    pub const fn new(console: &'a Console<T>) -> Self {
        Self { console }
    }

    /// Start analysis of file `id`.
    pub async fn analyze<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: u64,
    ) -> Result<(), CliError> {
        enter_view(self.console, &format!("/analysis/{id}"))?;
        let handle = self.console.store().analyze_log_file(id).await?;
        format.write(out, &handle)
    }

    /// Show every result for file `id`, or just the one named `kind`.
    pub async fn results<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        id: u64,
        kind: Option<&str>,
    ) -> Result<(), CliError> {
        enter_view(self.console, &format!("/analysis/{id}"))?;
        let store = self.console.store();
        match kind {
            Some(kind) => {
                let entry = store.fetch_analysis_result(id, kind).await?;
                format.write(out, &entry)
            }
            None => {
                let results = store.fetch_analysis_results(id).await?;
                format.write(out, &results)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::commands::fixture::{log_file, rendered, signed_in, signed_out};
    use logsight_client::Method;
    use serde_json::json;

    #[tokio::test]
    async fn analyze_reports_started() {
        let (console, transport, _) = signed_in();
        let mut file = log_file(5, "auth.log");
        file["status"] = json!("processing");
        transport.respond(
            Method::POST,
            "/analysis/analyze/5",
            200,
            json!({"message": "Analysis started", "file": file}),
        );
        let mut out = Vec::new();

        AnalysisCommand::new(&console)
            .analyze(&mut out, &OutputFormat::default(), 5)
            .await
            .expect("analyze");

        let text = rendered(out);
        assert!(text.starts_with("Analysis started\n"));
        assert!(text.contains("File 5 (auth.log): processing"));
        assert_eq!(console.navigator().current().location.path, "/analysis/5");
        assert!(console.state().analysis_results().is_none());
    }

    #[tokio::test]
    async fn results_are_stored_and_rendered() {
        let (console, transport, _) = signed_in();
        transport.respond(
            Method::GET,
            "/analysis/results/5",
            200,
            json!({
                "file": log_file(5, "auth.log"),
                "results": {
                    "summary": {"total_lines": 120},
                    "anomaly": {"count": 3}
                }
            }),
        );
        let mut out = Vec::new();

        AnalysisCommand::new(&console)
            .results(&mut out, &OutputFormat::new(Format::Json), 5, None)
            .await
            .expect("results");

        let value: serde_json::Value = serde_json::from_str(&rendered(out)).expect("json");
        assert_eq!(value["file_id"], 5);
        assert_eq!(value["results"]["anomaly"]["count"], 3);
        let stored = console.state().analysis_results().expect("stored");
        assert_eq!(stored.results.len(), 2);
    }

    #[tokio::test]
    async fn single_kind() {
        let (console, transport, _) = signed_in();
        transport.respond(
            Method::GET,
            "/analysis/results/5/anomaly",
            200,
            json!({"analysis_type": "anomaly", "result": {"count": 3}}),
        );
        let mut out = Vec::new();

        AnalysisCommand::new(&console)
            .results(&mut out, &OutputFormat::default(), 5, Some("anomaly"))
            .await
            .expect("result");

        let text = rendered(out);
        assert!(text.starts_with("[anomaly]\n"));
        assert!(text.contains("\"count\": 3"));
    }

    #[tokio::test]
    async fn analysis_needs_session() {
        let (console, transport, _) = signed_out();
        let mut out = Vec::new();

        let err = AnalysisCommand::new(&console)
            .analyze(&mut out, &OutputFormat::default(), 5)
            .await
            .expect_err("guarded");

        assert!(matches!(err, CliError::NotSignedIn));
        let current = console.navigator().current();
        assert_eq!(current.location.query_value("redirect"), Some("/analysis/5"));
        assert!(transport.requests().is_empty());
    }
}
