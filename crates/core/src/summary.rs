//! Per-snapshot metrics: headline counts plus a rollup by warehouse.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::record::Record;
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseRollup {
    pub warehouse_code: String,
    pub records: usize,
    pub tablets: u64,
    pub open: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_counting_delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub date: NaiveDate,
    pub records: usize,
    pub total_tablets: u64,
    pub total_open: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_counting_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_priority_score: Option<f64>,
    pub by_bucket: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<String, usize>,
    pub by_urgency: BTreeMap<String, usize>,
    pub warehouses: Vec<WarehouseRollup>,
}

/// Records without a warehouse code roll up under this label.
const UNKNOWN_WAREHOUSE: &str = "?";

pub fn summarize(snapshot: &Snapshot) -> SnapshotSummary {
    let mut by_bucket = BTreeMap::new();
    let mut by_confidence = BTreeMap::new();
    let mut by_urgency = BTreeMap::new();
    let mut groups: BTreeMap<String, Vec<&Record>> = BTreeMap::new();

    for r in snapshot.records() {
        *by_bucket.entry(r.priority_bucket.to_string()).or_insert(0) += 1;
        *by_confidence.entry(r.confidence.to_string()).or_insert(0) += 1;
        *by_urgency.entry(r.urgency.to_string()).or_insert(0) += 1;
        let wh = r.warehouse_code.clone().unwrap_or_else(|| UNKNOWN_WAREHOUSE.to_string());
        groups.entry(wh).or_default().push(r);
    }

    let all: Vec<&Record> = snapshot.records().collect();
    let scores: Vec<f64> = all.iter().map(|r| r.priority_score).collect();

    let warehouses = groups
        .into_iter()
        .map(|(code, rows)| WarehouseRollup {
            records: rows.len(),
            tablets: rows.iter().map(|r| r.tablet_ids.len() as u64).sum(),
            open: rows.iter().map(|r| r.open_count() as u64).sum(),
            mean_counting_delay: mean_counting_delay(&rows),
            warehouse_code: code,
        })
        .collect();

    SnapshotSummary {
        date: snapshot.date(),
        records: snapshot.len(),
        total_tablets: snapshot.total_tablets(),
        total_open: snapshot.total_open(),
        mean_counting_delay: mean_counting_delay(&all),
        mean_priority_score: mean(&scores),
        by_bucket,
        by_confidence,
        by_urgency,
        warehouses,
    }
}

/// Mean over records that carry a counting delay. Nulls are excluded, not zeroed.
fn mean_counting_delay(rows: &[&Record]) -> Option<f64> {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.counting_delay_days.map(f64::from))
        .collect();
    mean(&values)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
