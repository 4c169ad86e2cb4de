//! `tabtrack history`: the append-only snapshot log.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Subcommand;
use tabtrack_config::Settings;
use tabtrack_io::JsonlHistory;

use crate::{input, parse_date, print_json, CliError};

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List history entries with their totals
    #[command(after_help = "\
Examples:
  tabtrack history list history.jsonl
  tabtrack history list history.jsonl --json")]
    List {
        /// History file (JSON lines)
        file: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Append a snapshot file and report what changed since the last entry
    #[command(after_help = "\
Examples:
  tabtrack history append history.jsonl tablillas_20250922.csv
  tabtrack history append history.jsonl latest.xlsx --date 2025-09-22")]
    Append {
        /// History file (created when missing)
        file: PathBuf,

        /// Snapshot table (CSV or Excel)
        snapshot: PathBuf,

        /// Snapshot date (default: stamp in the file name, else its modification date)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Print the diff as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_history(cmd: HistoryCommands, config: Option<&Path>) -> Result<(), CliError> {
    match cmd {
        HistoryCommands::List { file, json } => cmd_history_list(&file, json),
        HistoryCommands::Append {
            file,
            snapshot,
            date,
            json,
        } => cmd_history_append(&file, &snapshot, date, json, config),
    }
}

fn cmd_history_list(file: &Path, json: bool) -> Result<(), CliError> {
    if !file.exists() {
        return Err(CliError::io(format!("{}: no such history file", file.display())));
    }
    let entries = JsonlHistory::new(file).entries()?;
    if json {
        return print_json(&entries);
    }
    println!("{:<10} {:>7} {:>7} {:>7}", "date", "records", "tablets", "open");
    for e in &entries {
        println!(
            "{:<10} {:>7} {:>7} {:>7}",
            e.date.to_string(),
            e.records,
            e.total_tablets,
            e.total_open
        );
    }
    Ok(())
}

fn cmd_history_append(
    file: &Path,
    snapshot: &Path,
    date: Option<NaiveDate>,
    json: bool,
    config: Option<&Path>,
) -> Result<(), CliError> {
    let settings = Settings::load_or_default(config)?;
    let snapshot = input::load(snapshot, date, &settings)?;
    let mut store = JsonlHistory::new(file);
    let diff = tabtrack_recon::record(&mut store, snapshot)?;
    if json {
        print_json(&diff)
    } else {
        crate::diff::print_diff(&diff);
        Ok(())
    }
}
