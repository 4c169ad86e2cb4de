//! Snapshot files named on the command line.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tabtrack_config::Settings;
use tabtrack_core::Snapshot;
use tabtrack_io::{load_snapshot, resolve_snapshot_date};

use crate::CliError;

/// Read one snapshot table, dated by `date` or recovered from the file.
pub(crate) fn load(path: &Path, date: Option<NaiveDate>, settings: &Settings) -> Result<Snapshot, CliError> {
    let date = resolve_snapshot_date(date, path)?;
    let loaded = load_snapshot(path, date, settings)?;
    if !loaded.rejected.is_empty() || !loaded.duplicates.is_empty() {
        log::warn!(
            "{}: {} row(s) without a slip, {} duplicate slip(s)",
            path.display(),
            loaded.rejected.len(),
            loaded.duplicates.len()
        );
    }
    Ok(loaded.snapshot)
}

/// Several snapshot tables, oldest first.
pub(crate) fn load_sequence(paths: &[PathBuf], settings: &Settings) -> Result<Vec<Snapshot>, CliError> {
    let mut snapshots = paths
        .iter()
        .map(|p| load(p, None, settings))
        .collect::<Result<Vec<_>, _>>()?;
    snapshots.sort_by_key(Snapshot::date);
    Ok(snapshots)
}
