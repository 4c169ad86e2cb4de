//! `tabtrack extract`: report → validated snapshot.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{ArgGroup, Args};
use serde::Serialize;
use tabtrack_config::Settings;
use tabtrack_core::{summarize, Confidence, Record, SnapshotSummary};
use tabtrack_extract::{Attempt, AttemptOutcome, DocumentDiagnostic, Extraction, LayoutTextSource, Pipeline, PipelineError};
use tabtrack_io::table::read_file_as_utf8;
use tabtrack_io::{load_grids, resolve_snapshot_date, write_snapshot, JsonlHistory};
use tabtrack_recon::DiffResult;

use crate::exit_codes::EXIT_EXTRACT_FAILED;
use crate::pdf::PdfSource;
use crate::{parse_date, print_json, CliError};

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["pdf", "text", "grid"])))]
pub struct ExtractArgs {
    /// Report PDF, read through `pdftotext -layout`
    #[arg(long, value_name = "FILE")]
    pdf: Option<PathBuf>,

    /// Layout text already extracted from a report (pages split by form feeds)
    #[arg(long, value_name = "FILE")]
    text: Option<PathBuf>,

    /// Pre-detected grids (JSON, CSV or Excel). One strategy per file, tried in order
    #[arg(long, value_name = "FILE", num_args = 1..)]
    grid: Vec<PathBuf>,

    /// Snapshot date (default: stamp in the file name, else its modification date)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Write the snapshot as CSV, or Excel for .xlsx
    #[arg(long, short = 'o', value_name = "FILE")]
    out: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Append the snapshot to this history file and report the change since the last entry
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Fail (exit 11) instead of keeping a best effort when no strategy is adequate
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct ExtractReport<'a> {
    document: String,
    date: NaiveDate,
    summary: SnapshotSummary,
    diagnostic: &'a DocumentDiagnostic,
    attempts: &'a [Attempt],
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a DiffResult>,
    records: Vec<&'a Record>,
}

fn run(args: &ExtractArgs, settings: &Settings) -> Result<(PathBuf, Extraction), CliError> {
    let pipeline = Pipeline::new(settings).map_err(PipelineError::from)?;

    if let Some(pdf) = &args.pdf {
        let date = resolve_snapshot_date(args.date, pdf)?;
        let source = PdfSource::new(pdf)?;
        return Ok((pdf.clone(), pipeline.run(&source, date)?));
    }
    if let Some(text) = &args.text {
        let date = resolve_snapshot_date(args.date, text)?;
        let source = LayoutTextSource::new(read_file_as_utf8(text)?);
        return Ok((text.clone(), pipeline.run(&source, date)?));
    }
    let first = args
        .grid
        .first()
        .ok_or_else(|| CliError::args("one of --pdf, --text or --grid is required"))?;
    let date = resolve_snapshot_date(args.date, first)?;
    let (grids, strategies) = load_grids(&args.grid)?;
    let extraction = pipeline.with_strategies(strategies).run(&grids, date)?;
    Ok((first.clone(), extraction))
}

pub fn cmd_extract(args: ExtractArgs, config: Option<&Path>) -> Result<(), CliError> {
    let settings = Settings::load_or_default(config)?;
    let (document, extraction) = run(&args, &settings)?;
    let Extraction {
        snapshot,
        diagnostic,
        attempts,
    } = extraction;

    let rejected = args.strict && diagnostic.confidence == Confidence::Failed;
    let mut diff = None;
    if !rejected {
        if let Some(out) = &args.out {
            write_snapshot(&snapshot, out)?;
            log::info!("wrote {} records to {}", snapshot.len(), out.display());
        }
        if let Some(path) = &args.history {
            let mut store = JsonlHistory::new(path);
            diff = Some(tabtrack_recon::record(&mut store, snapshot.clone())?);
        }
    }

    if args.json {
        print_json(&ExtractReport {
            document: document.display().to_string(),
            date: snapshot.date(),
            summary: summarize(&snapshot),
            diagnostic: &diagnostic,
            attempts: &attempts,
            diff: diff.as_ref(),
            records: snapshot.records().collect(),
        })?;
    } else {
        print_report(&document, &diagnostic, &attempts, snapshot.records());
        if let Some(diff) = &diff {
            println!();
            crate::diff::print_diff(diff);
        }
    }

    if rejected {
        return Err(CliError::new(EXIT_EXTRACT_FAILED, "no extraction strategy was adequate")
            .with_hint("rerun without --strict to keep the best effort, or add strategies to the settings"));
    }
    Ok(())
}

fn attempt_line(a: &Attempt) -> String {
    match &a.outcome {
        AttemptOutcome::DetectFailed { error } => format!("{}: {error}", a.strategy),
        AttemptOutcome::NoTables => format!("{}: no tables", a.strategy),
        AttemptOutcome::Inadequate {
            records,
            extraction_rate,
        } => format!(
            "{}: inadequate ({records} records, {:.1}%)",
            a.strategy,
            extraction_rate * 100.0
        ),
        AttemptOutcome::Accepted {
            records,
            extraction_rate,
        } => format!(
            "{}: accepted ({records} records, {:.1}%)",
            a.strategy,
            extraction_rate * 100.0
        ),
    }
}

fn print_report<'a>(
    document: &Path,
    d: &DocumentDiagnostic,
    attempts: &[Attempt],
    records: impl Iterator<Item = &'a Record>,
) {
    println!("{}", document.display());
    println!("  confidence  {}", d.confidence);
    println!("  strategy    {}", d.strategy);
    for a in attempts {
        println!("              {}", attempt_line(a));
    }
    let by_confidence: Vec<String> = d
        .by_confidence
        .iter()
        .map(|(k, n)| format!("{k} {n}"))
        .collect();
    println!("  records     {} ({})", d.records, by_confidence.join(", "));
    println!("  rate        {:.1}% of {} rows", d.extraction_rate * 100.0, d.rows_seen);

    if d.sequence_gaps.is_empty() {
        println!("  gaps        none");
    } else {
        for g in &d.sequence_gaps {
            println!("  gap         {} .. {} ({} missing)", g.after, g.before, g.missing);
        }
    }
    for t in &d.totals {
        let mark = if t.reconciled { "ok" } else { "MISMATCH" };
        println!("  total       {} declared {} extracted {} {mark}", t.field, t.declared, t.extracted);
    }
    for r in &d.rejected_rows {
        println!("  rejected    page {} row {}: {}", r.page, r.row, r.reason);
    }
    if !d.duplicate_slips.is_empty() {
        println!("  duplicates  {}", d.duplicate_slips.join(", "));
    }
    if !d.unknown_columns.is_empty() {
        println!("  unknown     {}", d.unknown_columns.join(", "));
    }

    for r in records.filter(|r| r.confidence != Confidence::Perfect) {
        let issues: Vec<String> = r
            .issues
            .iter()
            .map(|i| format!("{}:{}", i.field, i.kind.as_str()))
            .collect();
        println!("  review      {} {} {}", r.slip_id, r.confidence, issues.join(" "));
    }
}
