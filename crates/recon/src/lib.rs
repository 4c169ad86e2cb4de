//! `tabtrack-recon`: snapshot reconciliation over time.
//!
//! Pure engine crate: receives snapshots, returns diffs and trends.
//! Persistence is a collaborator behind [`HistoryStore`].

pub mod diff;
pub mod error;
pub mod history;
pub mod trend;

pub use diff::{baseline, diff, diff_from, DiffResult, DiffSummary, FieldChange, FieldValue, ModifiedRecord};
pub use error::ReconError;
pub use history::{record, History, HistoryStore};
pub use trend::{trend, IntervalReport, SnapshotPoint, TrendLabel, TrendReport};
