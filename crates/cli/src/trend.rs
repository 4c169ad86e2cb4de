//! `tabtrack trend`: direction of pending tablets over a snapshot sequence.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{ArgGroup, Args};
use tabtrack_config::Settings;
use tabtrack_io::JsonlHistory;
use tabtrack_recon::{trend, HistoryStore, TrendReport};

use crate::{input, parse_date, print_json, CliError};

#[derive(Args)]
#[command(group(ArgGroup::new("snapshots").required(true).args(["files", "history"])))]
pub struct TrendArgs {
    /// Snapshot files, in any order (sorted by date)
    #[arg(value_name = "SNAPSHOT")]
    files: Vec<PathBuf>,

    /// Read snapshots from a history file instead
    #[arg(long, value_name = "FILE", conflicts_with = "files")]
    history: Option<PathBuf>,

    /// Only the most recent N snapshots
    #[arg(long, value_name = "N")]
    last: Option<usize>,

    /// Earliest snapshot date (history only)
    #[arg(long, value_parser = parse_date, requires = "history")]
    from: Option<NaiveDate>,

    /// Latest snapshot date (history only)
    #[arg(long, value_parser = parse_date, requires = "history")]
    to: Option<NaiveDate>,

    /// Intervals the label looks at (overrides trend.window)
    #[arg(long)]
    window: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub fn cmd_trend(args: TrendArgs, config: Option<&Path>) -> Result<(), CliError> {
    let mut settings = Settings::load_or_default(config)?;
    if let Some(window) = args.window {
        if window == 0 {
            return Err(CliError::args("--window must be at least 1"));
        }
        settings.trend.window = window;
    }

    let report = match &args.history {
        Some(path) => {
            let history = JsonlHistory::new(path).load()?;
            let selected = history.range(args.from, args.to);
            let start = selected.len().saturating_sub(args.last.unwrap_or(selected.len()));
            trend(&selected[start..], &settings.trend)?
        }
        None => {
            let snapshots = input::load_sequence(&args.files, &settings)?;
            let start = snapshots.len().saturating_sub(args.last.unwrap_or(snapshots.len()));
            trend(&snapshots[start..], &settings.trend)?
        }
    };

    if args.json {
        print_json(&report)
    } else {
        print_trend(&report);
        Ok(())
    }
}

fn print_trend(report: &TrendReport) {
    println!(
        "{:<10} {:<10} {:>5} {:>6} {:>8} {:>7} {:>7}",
        "from", "to", "new", "closed", "modified", "pending", "change"
    );
    for i in &report.intervals {
        println!(
            "{:<10} {:<10} {:>5} {:>6} {:>8} {:>7} {:>+7}",
            i.from.to_string(),
            i.to.to_string(),
            i.new,
            i.closed,
            i.modified,
            i.pending_after,
            i.pending_change()
        );
    }
    println!();
    println!(
        "trend: {} (last {} interval{})",
        report.label,
        report.window,
        if report.window == 1 { "" } else { "s" }
    );
}
