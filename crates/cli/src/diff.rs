//! `tabtrack diff`: what changed between two snapshots.

use std::path::{Path, PathBuf};

use clap::Args;
use tabtrack_config::Settings;
use tabtrack_recon::{baseline, diff, DiffResult};

use crate::exit_codes::EXIT_DIFF_CHANGES;
use crate::{input, print_json, CliError};

#[derive(Args)]
pub struct DiffArgs {
    /// PREVIOUS and CURRENT snapshot files (CURRENT only with --baseline)
    #[arg(value_name = "SNAPSHOT", num_args = 1..=2, required = true)]
    files: Vec<PathBuf>,

    /// Treat the single file as the first snapshot: every slip is new
    #[arg(long)]
    baseline: bool,

    /// Print the diff as JSON
    #[arg(long)]
    json: bool,

    /// Exit 1 when the snapshots differ (like diff(1))
    #[arg(long)]
    exit_code: bool,
}

pub fn cmd_diff(args: DiffArgs, config: Option<&Path>) -> Result<(), CliError> {
    let settings = Settings::load_or_default(config)?;

    let result = match (args.baseline, args.files.as_slice()) {
        (true, [current]) => baseline(&input::load(current, None, &settings)?),
        (false, [previous, current]) => {
            let previous = input::load(previous, None, &settings)?;
            let current = input::load(current, None, &settings)?;
            if previous.date() > current.date() {
                log::warn!(
                    "previous snapshot ({}) is dated after the current one ({})",
                    previous.date(),
                    current.date()
                );
            }
            diff(&previous, &current)
        }
        (true, _) => {
            return Err(CliError::args("--baseline takes exactly one snapshot")
                .with_hint("tabtrack diff --baseline CURRENT.csv"))
        }
        (false, _) => {
            return Err(CliError::args("diff needs PREVIOUS and CURRENT snapshots")
                .with_hint("use --baseline to report a single snapshot"))
        }
    };

    if args.json {
        print_json(&result)?;
    } else {
        print_diff(&result);
    }

    let s = &result.summary;
    if args.exit_code && (s.new + s.closed + s.modified) > 0 {
        return Err(CliError::silent(EXIT_DIFF_CHANGES));
    }
    Ok(())
}

fn key_line(label: &str, keys: &[String]) {
    if keys.is_empty() {
        println!("{label:<10} 0");
    } else {
        println!("{label:<10} {}  {}", keys.len(), keys.join(" "));
    }
}

/// Human-readable diff on stdout.
pub(crate) fn print_diff(result: &DiffResult) {
    match result.previous_date {
        Some(prev) => println!("{prev} -> {}", result.current_date),
        None => println!("baseline {}", result.current_date),
    }
    key_line("new", &result.new_keys);
    key_line("closed", &result.closed_keys);
    println!("{:<10} {}", "modified", result.modified.len());
    println!("{:<10} {}", "unchanged", result.unchanged_keys.len());

    let s = &result.summary;
    println!(
        "{:<10} closed {}, added {}, net {:+}",
        "tablets", s.closed_tablets, s.added_tablets, s.net_tablet_delta
    );

    for m in &result.modified {
        println!("  {}", m.slip_id);
        for c in &m.changes {
            println!("    {}: {} -> {}", c.field, c.previous, c.current);
        }
        if !m.closed_tablets.is_empty() {
            println!("    closed tablets: {}", m.closed_tablets.join(", "));
        }
        if !m.added_tablets.is_empty() {
            println!("    added tablets: {}", m.added_tablets.join(", "));
        }
    }
}
