//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::collections::BTreeMap;
use std::io::Write;

use logsight_client::{
    Ack, AnalysisEntry, AnalysisHandle, AnalysisResults, LogFile, UploadReceipt, User,
    UserProfile,
};
use logsight_dashboard::panels::{BarChart, GaugeChart, PieChart, RadarChart, TrendChart};
use logsight_dashboard::{BoardView, PanelKind, PanelUpdate};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Who is signed in.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    /// Whether a session is held.
    pub authenticated: bool,
    /// The signed-in user.
    pub user: Option<User>,
}

impl TableDisplay for SessionView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match (&self.user, self.authenticated) {
            (Some(user), true) => {
                write!(writer, "Signed in as {} (id {})", user.username, user.id)?;
                if let Some(email) = &user.email {
                    write!(writer, " <{email}>")?;
                }
                writeln!(writer)?;
            }
            _ => writeln!(writer, "Not signed in")?,
        }
        Ok(())
    }
}

impl TableDisplay for UserProfile {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Profile")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "ID:        {}", self.id)?;
        writeln!(writer, "Username:  {}", self.username)?;
        writeln!(writer, "Email:     {}", self.email.as_deref().unwrap_or("-"))?;
        writeln!(writer, "Created:   {}", self.created_at.as_deref().unwrap_or("-"))?;
        Ok(())
    }
}

/// A listing of log files.
#[derive(Debug, Clone, Serialize)]
pub struct FileList {
    /// Files in server order.
    pub files: Vec<LogFile>,
    /// Total files across all pages.
    pub total: u64,
    /// Page shown, when paginated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Page count, when paginated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
}

impl TableDisplay for FileList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.files.is_empty() {
            writeln!(writer, "No log files uploaded")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:>6}  {:<32}  {:>10}  {:<10}  {:>5}  {:<19}",
            "ID", "NAME", "SIZE", "STATUS", "PROG", "UPLOADED"
        )?;
        writeln!(writer, "{}", "─".repeat(94))?;

        for file in &self.files {
            writeln!(
                writer,
                "{:>6}  {:<32}  {:>10}  {:<10}  {:>4.0}%  {:<19}",
                file.id,
                truncate(file.display_name(), 32),
                human_size(file.file_size),
                file.status,
                file.processing_progress,
                file.upload_time.as_deref().unwrap_or("-"),
            )?;
        }

        writeln!(writer)?;
        match (self.page, self.pages) {
            (Some(page), Some(pages)) => writeln!(
                writer,
                "Page {page} of {pages}, {} file(s) total",
                self.total
            )?,
            _ => writeln!(writer, "Total: {} file(s)", self.total)?,
        }
        Ok(())
    }
}

impl TableDisplay for LogFile {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Log File: {}", self.display_name())?;
        writeln!(writer, "══════════════════════════════════════════════")?;
        writeln!(writer, "ID:          {}", self.id)?;
        writeln!(writer, "Stored as:   {}", self.filename)?;
        writeln!(writer, "Type:        {}", self.file_type.as_deref().unwrap_or("-"))?;
        writeln!(writer, "Size:        {}", human_size(self.file_size))?;
        writeln!(writer, "Uploaded:    {}", self.upload_time.as_deref().unwrap_or("-"))?;
        writeln!(writer, "Status:      {}", self.status)?;
        writeln!(writer, "Progress:    {:.0}%", self.processing_progress)?;
        Ok(())
    }
}

impl TableDisplay for UploadReceipt {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message.as_deref().unwrap_or("Upload accepted"))?;
        let id = self.file_id.or_else(|| self.file.as_ref().map(|f| f.id));
        if let Some(id) = id {
            writeln!(writer, "File ID: {id}")?;
        }
        Ok(())
    }
}

impl TableDisplay for AnalysisHandle {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message.as_deref().unwrap_or("Analysis started"))?;
        if let Some(file) = &self.file {
            writeln!(
                writer,
                "File {} ({}): {} {:.0}%",
                file.id,
                file.display_name(),
                file.status,
                file.processing_progress
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for AnalysisResults {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.results.is_empty() {
            writeln!(writer, "No analysis results for file {}", self.file_id)?;
            return Ok(());
        }

        writeln!(writer, "Analysis results for file {}", self.file_id)?;
        for (kind, result) in &self.results {
            writeln!(writer)?;
            writeln!(writer, "[{kind}]")?;
            write_json_block(writer, result)?;
        }
        Ok(())
    }
}

impl TableDisplay for AnalysisEntry {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "[{}]", self.analysis_type)?;
        write_json_block(writer, &self.result)
    }
}

impl TableDisplay for Ack {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message.as_deref().unwrap_or("OK"))?;
        Ok(())
    }
}

/// Where a navigation would land.
#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    /// What was asked for.
    pub requested: String,
    /// Where the guard settled.
    pub location: String,
    /// Matched route name.
    pub route: Option<String>,
    /// Captured path parameters.
    pub params: BTreeMap<String, String>,
    /// Window title for the view.
    pub title: String,
    /// Whether the guard moved the request elsewhere.
    pub redirected: bool,
}

impl TableDisplay for RouteView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.redirected {
            writeln!(writer, "{} -> {}", self.requested, self.location)?;
        } else {
            writeln!(writer, "{}", self.location)?;
        }
        writeln!(writer, "Route:  {}", self.route.as_deref().unwrap_or("-"))?;
        writeln!(writer, "Title:  {}", self.title)?;
        for (name, value) in &self.params {
            writeln!(writer, "  :{name} = {value}")?;
        }
        Ok(())
    }
}

impl TableDisplay for BoardView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Situational Awareness  (updated {}, frame {})",
            self.last_updated.as_deref().unwrap_or("never"),
            self.frames
        )?;
        writeln!(writer, "{}", "═".repeat(60))?;

        for kind in PanelKind::ALL {
            let Some(panel) = self.panels.get(&kind) else {
                continue;
            };
            writeln!(writer)?;
            match panel {
                PanelUpdate::AlertTrend(chart) => write_trend(writer, chart)?,
                PanelUpdate::ThreatGauge(gauge) => write_gauge(writer, gauge)?,
                PanelUpdate::AlertTypes(pie) => write_pie(writer, pie)?,
                PanelUpdate::AttackSources(bar) => write_bar(writer, bar)?,
                PanelUpdate::SystemPerformance(radar) => write_radar(writer, radar)?,
            }
        }

        if let Some(error) = &self.last_error {
            writeln!(writer)?;
            writeln!(writer, "Last error ({} failed): {error}", self.failures)?;
        }
        Ok(())
    }
}

fn write_trend<W: Write>(writer: &mut W, chart: &TrendChart) -> Result<(), CliError> {
    writeln!(writer, "{}", chart.title)?;
    write!(writer, "  {:<12}", "DATE")?;
    for series in &chart.series {
        write!(writer, "  {:>14}", series.name)?;
    }
    writeln!(writer)?;
    for (i, date) in chart.categories.iter().enumerate() {
        write!(writer, "  {date:<12}")?;
        for series in &chart.series {
            let value = series.data.get(i).copied().unwrap_or_default();
            write!(writer, "  {value:>14.0}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_gauge<W: Write>(writer: &mut W, gauge: &GaugeChart) -> Result<(), CliError> {
    writeln!(
        writer,
        "{}: {:.1} / {:.0}  {}",
        gauge.label,
        gauge.value,
        gauge.max,
        meter(gauge.value, gauge.max, 20)
    )?;
    Ok(())
}

fn write_pie<W: Write>(writer: &mut W, pie: &PieChart) -> Result<(), CliError> {
    writeln!(writer, "{}", pie.title)?;
    for slice in &pie.slices {
        writeln!(writer, "  {:<24}  {:>8.0}", truncate(&slice.name, 24), slice.value)?;
    }
    Ok(())
}

fn write_bar<W: Write>(writer: &mut W, bar: &BarChart) -> Result<(), CliError> {
    writeln!(writer, "{}", bar.title)?;
    let peak = bar.series.data.iter().copied().fold(0.0_f64, f64::max);
    for (name, value) in bar.categories.iter().zip(&bar.series.data) {
        writeln!(
            writer,
            "  {:<24}  {:>8.0}  {}",
            truncate(name, 24),
            value,
            meter(*value, peak, 20)
        )?;
    }
    Ok(())
}

fn write_radar<W: Write>(writer: &mut W, radar: &RadarChart) -> Result<(), CliError> {
    writeln!(writer, "{}", radar.title)?;
    for (indicator, value) in radar.indicators.iter().zip(&radar.series.data) {
        writeln!(
            writer,
            "  {:<24}  {:>6.1}  {}",
            indicator.name,
            value,
            meter(*value, indicator.max, 20)
        )?;
    }
    Ok(())
}

fn write_json_block<W: Write>(writer: &mut W, value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
    for line in text.lines() {
        writeln!(writer, "  {line}")?;
    }
    Ok(())
}

/// A fixed-width bar filled in proportion to `value / max`.
fn meter(value: f64, max: f64, width: usize) -> String {
    let ratio = if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Byte count with a binary unit suffix.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
