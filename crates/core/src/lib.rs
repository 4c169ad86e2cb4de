//! `tabtrack-core`: shared model for tablet return tracking.
//!
//! Pure types plus the priority scorer. No IO.

pub mod priority;
pub mod record;
pub mod snapshot;
pub mod summary;

pub use priority::{PriorityConfig, PriorityScorer, PriorityWeights};
pub use record::{Confidence, FieldIssue, IssueKind, PriorityBucket, Record, Urgency};
pub use snapshot::{Snapshot, SnapshotError};
pub use summary::{summarize, SnapshotSummary, WarehouseRollup};
