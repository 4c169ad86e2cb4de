//! Pairwise snapshot diff.
//!
//! Keys only in `current` are new, keys only in `previous` are closed, keys in
//! both are unchanged or modified depending on their source fields. Derived
//! values (priority, urgency, confidence, age, issues) are never compared.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use tabtrack_core::{Record, Snapshot};

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    Date(NaiveDate),
    Flag(bool),
    Count(u32),
    List(Vec<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "-"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Flag(b) => write!(f, "{}", if *b { "Yes" } else { "No" }),
            Self::Count(n) => write!(f, "{n}"),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

fn text(v: &Option<String>) -> FieldValue {
    v.clone().map_or(FieldValue::Null, FieldValue::Text)
}

fn date(v: Option<NaiveDate>) -> FieldValue {
    v.map_or(FieldValue::Null, FieldValue::Date)
}

fn count(v: Option<u32>) -> FieldValue {
    v.map_or(FieldValue::Null, FieldValue::Count)
}

/// Tablet lists compare as sets.
fn set(v: &[String]) -> FieldValue {
    let sorted: BTreeSet<&String> = v.iter().collect();
    FieldValue::List(sorted.into_iter().cloned().collect())
}

/// Source fields of a record, in report order.
pub fn compared_fields(r: &Record) -> [(&'static str, FieldValue); 17] {
    [
        ("region", text(&r.region)),
        ("warehouse_code", text(&r.warehouse_code)),
        ("jobsite_id", text(&r.jobsite_id)),
        ("cost_center", text(&r.cost_center)),
        ("return_date", date(r.return_date)),
        ("invoice_start_date", date(r.invoice_start_date)),
        ("invoice_end_date", date(r.invoice_end_date)),
        ("counted_date", date(r.counted_date)),
        ("customer_name", text(&r.customer_name)),
        ("job_site_name", text(&r.job_site_name)),
        ("definitive_flag", FieldValue::Flag(r.definitive_flag)),
        ("tablet_ids", set(&r.tablet_ids)),
        ("open_tablet_ids", set(&r.open_tablet_ids)),
        ("total_tablets", count(r.total_tablets)),
        ("total_open", count(r.total_open)),
        ("counting_delay_days", count(r.counting_delay_days)),
        ("validation_delay_days", count(r.validation_delay_days)),
    ]
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub previous: FieldValue,
    pub current: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedRecord {
    pub slip_id: String,
    pub changes: Vec<FieldChange>,
    /// In `previous.tablet_ids` but not in `current.tablet_ids`.
    pub closed_tablets: Vec<String>,
    /// In `current.tablet_ids` but not in `previous.tablet_ids`.
    pub added_tablets: Vec<String>,
    /// Change in outstanding tablets, current minus previous.
    pub open_delta: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub new: usize,
    pub closed: usize,
    pub unchanged: usize,
    pub modified: usize,
    /// Includes every tablet of a closed slip.
    pub closed_tablets: u64,
    /// Includes every tablet of a new slip.
    pub added_tablets: u64,
    /// `closed_tablets - added_tablets`.
    pub net_tablet_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    /// `None` for a baseline.
    pub previous_date: Option<NaiveDate>,
    pub current_date: NaiveDate,
    pub new_keys: Vec<String>,
    pub closed_keys: Vec<String>,
    pub unchanged_keys: Vec<String>,
    pub modified: Vec<ModifiedRecord>,
    pub summary: DiffSummary,
}

impl DiffResult {
    pub fn modified_keys(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(|m| m.slip_id.as_str())
    }

    pub fn is_baseline(&self) -> bool {
        self.previous_date.is_none()
    }
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

pub fn diff(previous: &Snapshot, current: &Snapshot) -> DiffResult {
    diff_from(Some(previous), current)
}

/// First snapshot of a sequence: every key is new, none closed.
pub fn baseline(current: &Snapshot) -> DiffResult {
    diff_from(None, current)
}

pub fn diff_from(previous: Option<&Snapshot>, current: &Snapshot) -> DiffResult {
    let mut result = DiffResult {
        previous_date: previous.map(Snapshot::date),
        current_date: current.date(),
        new_keys: Vec::new(),
        closed_keys: Vec::new(),
        unchanged_keys: Vec::new(),
        modified: Vec::new(),
        summary: DiffSummary::default(),
    };
    let mut closed_tablets: u64 = 0;
    let mut added_tablets: u64 = 0;

    for record in current.records() {
        match previous.and_then(|p| p.get(&record.slip_id)) {
            None => {
                added_tablets += unique_tablets(record);
                result.new_keys.push(record.slip_id.clone());
            }
            Some(before) => match compare(before, record) {
                None => result.unchanged_keys.push(record.slip_id.clone()),
                Some(m) => {
                    closed_tablets += m.closed_tablets.len() as u64;
                    added_tablets += m.added_tablets.len() as u64;
                    result.modified.push(m);
                }
            },
        }
    }

    if let Some(previous) = previous {
        for record in previous.records() {
            if !current.contains(&record.slip_id) {
                closed_tablets += unique_tablets(record);
                result.closed_keys.push(record.slip_id.clone());
            }
        }
    }

    result.summary = DiffSummary {
        new: result.new_keys.len(),
        closed: result.closed_keys.len(),
        unchanged: result.unchanged_keys.len(),
        modified: result.modified.len(),
        closed_tablets,
        added_tablets,
        net_tablet_delta: closed_tablets as i64 - added_tablets as i64,
    };
    log::debug!(
        "diff {} -> {}: {} new, {} closed, {} modified",
        result
            .previous_date
            .map_or_else(|| "baseline".to_string(), |d| d.to_string()),
        result.current_date,
        result.summary.new,
        result.summary.closed,
        result.summary.modified
    );
    result
}

fn unique_tablets(r: &Record) -> u64 {
    r.tablet_ids.iter().collect::<BTreeSet<_>>().len() as u64
}

/// `None` when every compared field is equal.
fn compare(before: &Record, after: &Record) -> Option<ModifiedRecord> {
    let changes: Vec<FieldChange> = compared_fields(before)
        .into_iter()
        .zip(compared_fields(after))
        .filter(|((_, a), (_, b))| a != b)
        .map(|((field, previous), (_, current))| FieldChange {
            field: field.to_string(),
            previous,
            current,
        })
        .collect();
    if changes.is_empty() {
        return None;
    }

    let was: BTreeSet<&String> = before.tablet_ids.iter().collect();
    let now: BTreeSet<&String> = after.tablet_ids.iter().collect();
    Some(ModifiedRecord {
        slip_id: after.slip_id.clone(),
        changes,
        closed_tablets: was.difference(&now).map(|s| s.to_string()).collect(),
        added_tablets: now.difference(&was).map(|s| s.to_string()).collect(),
        open_delta: i64::from(after.open_count()) - i64::from(before.open_count()),
    })
}
