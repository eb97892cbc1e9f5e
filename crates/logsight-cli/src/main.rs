//! Logsight CLI binary entrypoint.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use logsight_cli::cli::{Cli, Commands};
use logsight_cli::commands::{
    AnalysisCommand, AuthCommand, DashboardCommand, FileCommand, RouteCommand,
};
use logsight_cli::output::OutputFormat;
use logsight_cli::CliError;
use logsight_client::{ClientConfig, Console};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let config = ClientConfig::new(cli.api_url.as_str())
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let console = Console::connect(config, &cli.state_dir())?;
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Login { username, password } => {
            let cmd = AuthCommand::new(&console);
            cmd.login(&mut stdout, &format, username, password).await?;
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let cmd = AuthCommand::new(&console);
            cmd.register(&mut stdout, &format, username, email, password)
                .await?;
        }
        Commands::Logout => {
            AuthCommand::new(&console).logout(&mut stdout, &format)?;
        }
        Commands::Whoami => {
            AuthCommand::new(&console).whoami(&mut stdout, &format)?;
        }
        Commands::Profile => {
            AuthCommand::new(&console).profile(&mut stdout, &format).await?;
        }
        Commands::Files { command } => {
            let cmd = FileCommand::new(&console);
            cmd.execute(&mut stdout, &format, command).await?;
        }
        Commands::Analyze { id } => {
            let cmd = AnalysisCommand::new(&console);
            cmd.analyze(&mut stdout, &format, *id).await?;
        }
        Commands::Results { id, kind } => {
            let cmd = AnalysisCommand::new(&console);
            cmd.results(&mut stdout, &format, *id, kind.as_deref()).await?;
        }
        Commands::Dashboard(args) => {
            let cmd = DashboardCommand::new(&console);
            cmd.execute(&mut stdout, &format, args).await?;
        }
        Commands::Route { path } => {
            RouteCommand::new(&console).execute(&mut stdout, &format, path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsight_cli::cli::Format;

    fn cli_in(dir: &std::path::Path, args: &[&str]) -> Cli {
        let mut argv = vec![
            "logsight".to_string(),
            "--state-dir".to_string(),
            dir.display().to_string(),
            "--api-url".to_string(),
            "http://127.0.0.1:9/api".to_string(),
            "--timeout-secs".to_string(),
            "2".to_string(),
        ];
        argv.extend(args.iter().map(ToString::to_string));
        Cli::parse_from(argv)
    }

    #[test]
    fn cli_parses_whoami() {
        let cli = Cli::parse_from(["logsight", "whoami"]);
        assert!(matches!(cli.command, Commands::Whoami));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["logsight", "--format", "json", "whoami"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[tokio::test]
    async fn run_whoami_without_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run(cli_in(dir.path(), &["whoami"])).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn run_protected_command_without_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run(cli_in(dir.path(), &["files", "list"])).await;
        assert!(matches!(result, Err(CliError::NotSignedIn)));
    }

    #[tokio::test]
    async fn run_login_without_server_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = run(cli_in(dir.path(), &["login", "alice", "--password", "pw"])).await;
        assert!(matches!(result, Err(CliError::Client(_))));
    }

    #[tokio::test]
    async fn run_rejects_bad_api_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cli = cli_in(dir.path(), &["whoami"]);
        cli.api_url = "not a url".into();
        let result = run(cli).await;
        assert!(matches!(result, Err(CliError::Client(_))));
    }
}
