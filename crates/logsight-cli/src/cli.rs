//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use logsight_client::config::DEFAULT_BASE_URL;

/// Logsight - security log analysis from the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "logsight")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the console API.
    #[arg(short = 'u', long, env = "LOGSIGHT_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Directory holding the persisted session.
    #[arg(short = 'd', long, env = "LOGSIGHT_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The state directory, defaulting to `~/.logsight`.
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join(".logsight")
        })
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in and persist the session.
    Login {
        /// Account name.
        username: String,
        /// Password.
        #[arg(short, long, env = "LOGSIGHT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in with it.
    Register {
        /// Account name.
        username: String,
        /// Contact address.
        #[arg(short, long)]
        email: String,
        /// Password.
        #[arg(short, long, env = "LOGSIGHT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the persisted session.
    Logout,

    /// Show the persisted session.
    Whoami,

    /// Fetch the signed-in user's profile.
    Profile,

    /// Log file management.
    Files {
        /// File subcommand to execute.
        #[command(subcommand)]
        command: FileCommands,
    },

    /// Start server-side analysis of a file.
    Analyze {
        /// File id.
        id: u64,
    },

    /// Show analysis results for a file.
    Results {
        /// File id.
        id: u64,
        /// Only this analysis kind.
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Watch the situational-awareness dashboard.
    Dashboard(DashboardArgs),

    /// Show where navigating to a view would land.
    Route {
        /// View path, e.g. `/files` or `/analysis/7`.
        path: String,
    },
}

/// File subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum FileCommands {
    /// List uploaded files.
    List {
        /// Page to fetch; all files when omitted.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },

    /// Show one file.
    Show {
        /// File id.
        id: u64,
    },

    /// Upload a log file.
    Upload {
        /// Path of the file to upload.
        path: PathBuf,
    },

    /// Delete a file.
    Delete {
        /// File id.
        id: u64,
    },
}

/// Arguments for the dashboard command.
#[derive(Args, Debug, Clone)]
pub struct DashboardArgs {
    /// Refresh interval in milliseconds.
    #[arg(short, long, default_value_t = 10_000)]
    pub interval_ms: u64,

    /// Render one snapshot and exit.
    #[arg(long)]
    pub once: bool,

    /// Exit after this many rendered frames.
    #[arg(long, conflicts_with = "once")]
    pub frames: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_login() {
        let cli = Cli::parse_from(["logsight", "login", "a", "--password", "b"]);
        match cli.command {
            Commands::Login { username, password } => {
                assert_eq!(username, "a");
                assert_eq!(password, "b");
            }
            other => panic!("expected login, got {other:?}"),
        }
    }

    #[test]
    fn parses_global_flags() {
        let cli = Cli::parse_from([
            "logsight",
            "-u",
            "https://soc.example/api",
            "--format",
            "json",
            "--state-dir",
            "/tmp/s",
            "whoami",
        ]);
        assert_eq!(cli.api_url, "https://soc.example/api");
        assert_eq!(cli.format, Format::Json);
        assert_eq!(cli.state_dir(), PathBuf::from("/tmp/s"));
    }

    #[test]
    fn parses_paged_file_list() {
        let cli = Cli::parse_from(["logsight", "files", "list", "--page", "2"]);
        assert!(matches!(
            cli.command,
            Commands::Files {
                command: FileCommands::List {
                    page: Some(2),
                    per_page: 10
                }
            }
        ));
    }

    #[test]
    fn parses_results_kind() {
        let cli = Cli::parse_from(["logsight", "results", "7", "--kind", "anomaly"]);
        assert!(matches!(
            cli.command,
            Commands::Results { id: 7, kind: Some(ref k) } if k == "anomaly"
        ));
    }

    #[test]
    fn dashboard_defaults() {
        let cli = Cli::parse_from(["logsight", "dashboard"]);
        let Commands::Dashboard(args) = cli.command else {
            panic!("expected dashboard");
        };
        assert_eq!(args.interval_ms, 10_000);
        assert!(!args.once);
        assert!(args.frames.is_none());
    }

    #[test]
    fn dashboard_once_conflicts_with_frames() {
        let result = Cli::try_parse_from(["logsight", "dashboard", "--once", "--frames", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn default_format_is_table() {
        let cli = Cli::parse_from(["logsight", "logout"]);
        assert_eq!(cli.format, Format::Table);
        assert_eq!(cli.timeout_secs, 60);
    }
}
