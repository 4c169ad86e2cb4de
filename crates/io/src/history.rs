// JSON-lines snapshot history: one `{date, records[]}` object per line, append-only

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tabtrack_core::Snapshot;
use tabtrack_recon::{History, HistoryStore, ReconError};

#[derive(Debug, Clone)]
pub struct JsonlHistory {
    path: PathBuf,
}

/// One line of `history list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub date: chrono::NaiveDate,
    pub records: usize,
    pub total_tablets: u64,
    pub total_open: u64,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, err: impl std::fmt::Display) -> ReconError {
        ReconError::Store(format!("{}: {err}", self.path.display()))
    }

    /// Per-entry totals without keeping the records around.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, ReconError> {
        Ok(self
            .load()?
            .snapshots()
            .iter()
            .map(|s| HistoryEntry {
                date: s.date(),
                records: s.len(),
                total_tablets: s.total_tablets(),
                total_open: s.total_open(),
            })
            .collect())
    }
}

impl HistoryStore for JsonlHistory {
    /// A missing file is an empty history.
    fn load(&self) -> Result<History, ReconError> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(History::new()),
            Err(e) => return Err(self.store_error(e)),
        };

        let mut history = History::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.store_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let snapshot: Snapshot = serde_json::from_str(&line)
                .map_err(|e| self.store_error(format!("line {}: {e}", n + 1)))?;
            history.append(snapshot)?;
        }
        Ok(history)
    }

    fn append(&mut self, snapshot: &Snapshot) -> Result<(), ReconError> {
        if let Some(last) = self.load()?.latest() {
            if snapshot.date() <= last.date() {
                return Err(ReconError::NonMonotonicDate {
                    last: last.date(),
                    date: snapshot.date(),
                });
            }
        }

        let mut line = serde_json::to_string(snapshot).map_err(|e| self.store_error(e))?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.store_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.store_error(e))?;
        log::debug!("{}: appended {}", self.path.display(), snapshot.date());
        Ok(())
    }
}
