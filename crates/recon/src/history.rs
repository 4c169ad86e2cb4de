//! Append-only snapshot history.
//!
//! The history is owned by the caller and passed in; nothing here holds
//! global state. Persistence goes through [`HistoryStore`], whose write path
//! only ever adds entries.

use chrono::NaiveDate;
use tabtrack_config::TrendSettings;
use tabtrack_core::Snapshot;

use crate::diff::{diff_from, DiffResult};
use crate::error::ReconError;
use crate::trend::{trend, TrendReport};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries already in date order.
    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Result<Self, ReconError> {
        let mut history = Self::new();
        for s in snapshots {
            history.append(s)?;
        }
        Ok(history)
    }

    /// Add a snapshot dated strictly after the last entry.
    pub fn append(&mut self, snapshot: Snapshot) -> Result<(), ReconError> {
        if let Some(last) = self.latest() {
            if snapshot.date() <= last.date() {
                return Err(ReconError::NonMonotonicDate {
                    last: last.date(),
                    date: snapshot.date(),
                });
            }
        }
        self.snapshots.push(snapshot);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Snapshot> {
        self.snapshots
            .binary_search_by_key(&date, Snapshot::date)
            .ok()
            .map(|i| &self.snapshots[i])
    }

    /// Snapshots dated within `[from, to]`; open ends are unbounded.
    pub fn range(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> &[Snapshot] {
        let start = from.map_or(0, |d| self.snapshots.partition_point(|s| s.date() < d));
        let end = to.map_or(self.snapshots.len(), |d| {
            self.snapshots.partition_point(|s| s.date() <= d)
        });
        if start >= end {
            return &[];
        }
        &self.snapshots[start..end]
    }

    /// The most recent `n` snapshots.
    pub fn last(&self, n: usize) -> &[Snapshot] {
        &self.snapshots[self.snapshots.len().saturating_sub(n)..]
    }

    pub fn trend(&self, settings: &TrendSettings) -> Result<TrendReport, ReconError> {
        trend(&self.snapshots, settings)
    }

    /// Diff of the latest entry against its predecessor, or a baseline when
    /// it is the first.
    pub fn latest_diff(&self) -> Option<DiffResult> {
        let (current, earlier) = self.snapshots.split_last()?;
        Some(diff_from(earlier.last(), current))
    }
}

/// Persistence collaborator for the history.
pub trait HistoryStore {
    fn load(&self) -> Result<History, ReconError>;

    /// Persist one more entry. Existing entries are never rewritten.
    fn append(&mut self, snapshot: &Snapshot) -> Result<(), ReconError>;
}

/// In-memory store.
impl HistoryStore for History {
    fn load(&self) -> Result<History, ReconError> {
        Ok(self.clone())
    }

    fn append(&mut self, snapshot: &Snapshot) -> Result<(), ReconError> {
        History::append(self, snapshot.clone())
    }
}

/// Append `snapshot` through `store` and return the diff against the entry
/// it follows.
pub fn record(store: &mut dyn HistoryStore, snapshot: Snapshot) -> Result<DiffResult, ReconError> {
    let mut history = store.load()?;
    store.append(&snapshot)?;
    history.append(snapshot)?;
    log::info!(
        "history: appended snapshot {} ({} entries)",
        history.latest().map_or_else(String::new, |s| s.date().to_string()),
        history.len()
    );
    history
        .latest_diff()
        .ok_or_else(|| ReconError::Store("history is empty after append".into()))
}
