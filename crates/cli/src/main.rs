// tabtrack CLI - tablet return extraction and snapshot reconciliation

mod diff;
mod exit_codes;
mod extract;
mod history;
mod input;
mod pdf;
mod settings;
mod trend;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tabtrack_config::ConfigError;
use tabtrack_extract::PipelineError;
use tabtrack_io::IoError;
use tabtrack_recon::ReconError;

use exit_codes::{
    EXIT_CONFIG, EXIT_ERROR, EXIT_EXTRACT_NO_TABLES, EXIT_HISTORY_ORDER, EXIT_HISTORY_STORE,
    EXIT_INPUT, EXIT_IO, EXIT_SUCCESS, EXIT_TREND_INSUFFICIENT, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "tabtrack")]
#[command(about = "Extract tablet return reports into snapshots and track them over time")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/tabtrack/tabtrack.toml)
    #[arg(long, global = true, env = "TABTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Log extraction decisions (same as RUST_LOG=debug)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a snapshot from a report
    #[command(after_help = "\
Examples:
  tabtrack extract --pdf tablillas_20250922.pdf --out snapshots/2025-09-22.csv
  tabtrack extract --text report.txt --date 2025-09-22 --json
  tabtrack extract --grid stream.json lattice.json --history history.jsonl")]
    Extract(extract::ExtractArgs),

    /// Compare two snapshot files (or report a baseline)
    #[command(after_help = "\
Examples:
  tabtrack diff 2025-09-15.csv 2025-09-16.csv
  tabtrack diff prev.xlsx curr.xlsx --json
  tabtrack diff --baseline 2025-09-15.csv")]
    Diff(diff::DiffArgs),

    /// Trend over a sequence of snapshots
    #[command(after_help = "\
Examples:
  tabtrack trend 2025-09-15.csv 2025-09-16.csv 2025-09-17.csv
  tabtrack trend --history history.jsonl --last 7 --json")]
    Trend(trend::TrendArgs),

    /// Inspect or extend a snapshot history file
    #[command(subcommand)]
    History(history::HistoryCommands),

    /// Show or validate settings
    #[command(subcommand)]
    Config(settings::ConfigCommands),
}

/// Shared `--date` parsing (`2025-09-22`).
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Extract(args) => extract::cmd_extract(args, config),
        Commands::Diff(args) => diff::cmd_diff(args, config),
        Commands::Trend(args) => trend::cmd_trend(args, config),
        Commands::History(cmd) => history::cmd_history(cmd, config),
        Commands::Config(cmd) => settings::cmd_config(cmd, config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    /// Exit with `code` and no message; the command already reported.
    pub fn silent(code: u8) -> Self {
        Self::new(code, "")
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let code = match &err {
            IoError::File { .. } => EXIT_IO,
            IoError::NoDate { .. } => EXIT_USAGE,
            IoError::Format { .. } | IoError::Unsupported { .. } | IoError::Snapshot(_) => EXIT_INPUT,
        };
        let hint = match &err {
            IoError::NoDate { .. } => Some("pass --date YYYY-MM-DD".to_string()),
            IoError::Unsupported { .. } => Some("supported: .csv .tsv .txt .xlsx .xlsm .xlsb .xls .ods".to_string()),
            _ => None,
        };
        Self {
            code,
            message: err.to_string(),
            hint,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(EXIT_CONFIG, err.to_string())
            .with_hint("`tabtrack config show` prints the effective settings")
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        let code = match &err {
            PipelineError::NoTablesDetected { .. } => EXIT_EXTRACT_NO_TABLES,
            PipelineError::Setup(_) => EXIT_CONFIG,
            PipelineError::Snapshot(_) => EXIT_INPUT,
        };
        Self::new(code, err.to_string())
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        match &err {
            ReconError::InsufficientSnapshots { .. } => Self::new(EXIT_TREND_INSUFFICIENT, err.to_string())
                .with_hint("a trend needs at least two snapshots"),
            ReconError::NonMonotonicDate { .. } => Self::new(EXIT_HISTORY_ORDER, err.to_string())
                .with_hint("history is append-only; corrections go in as a newer snapshot"),
            ReconError::Store(_) => Self::new(EXIT_HISTORY_STORE, err.to_string()),
        }
    }
}

/// Pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("cannot serialize output: {e}")))?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use proptest::prelude::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn date_argument() {
        assert_eq!(parse_date("2025-09-22"), Ok(NaiveDate::from_ymd_opt(2025, 9, 22).unwrap()));
        assert!(parse_date("22/09/2025").is_err());
    }

    proptest! {
        #[test]
        fn any_calendar_date_parses_back(days in 0i64..40_000) {
            let d = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
            prop_assert_eq!(parse_date(&d.format("%Y-%m-%d").to_string()), Ok(d));
        }
    }

    #[test]
    fn recon_errors_map_to_history_codes() {
        let order = CliError::from(ReconError::NonMonotonicDate {
            last: NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        });
        assert_eq!(order.code, EXIT_HISTORY_ORDER);
        assert!(order.hint.is_some());

        let short = CliError::from(ReconError::InsufficientSnapshots { found: 1 });
        assert_eq!(short.code, EXIT_TREND_INSUFFICIENT);
    }

    #[test]
    fn usage_error_starts_without_hint() {
        let err = CliError::args("diff needs two snapshots");
        assert_eq!(err.code, EXIT_USAGE);
        assert_eq!(err.message, "diff needs two snapshots");
        assert!(err.hint.is_none());

        let err = err.with_hint("use --baseline");
        assert_eq!(err.hint.as_deref(), Some("use --baseline"));
    }
}
