use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Two records share a slip number.
    DuplicateKey { date: NaiveDate, slip_id: String },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { date, slip_id } => {
                write!(f, "snapshot {date}: duplicate slip '{slip_id}'")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// All records as of one reporting date. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotWire", into = "SnapshotWire")]
pub struct Snapshot {
    date: NaiveDate,
    records: BTreeMap<String, Record>,
}

impl Snapshot {
    pub fn new(date: NaiveDate, records: Vec<Record>) -> Result<Self, SnapshotError> {
        let mut map = BTreeMap::new();
        for record in records {
            if map.contains_key(&record.slip_id) {
                return Err(SnapshotError::DuplicateKey {
                    date,
                    slip_id: record.slip_id,
                });
            }
            map.insert(record.slip_id.clone(), record);
        }
        Ok(Self {
            date,
            records: map,
        })
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            records: BTreeMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, slip_id: &str) -> Option<&Record> {
        self.records.get(slip_id)
    }

    pub fn contains(&self, slip_id: &str) -> bool {
        self.records.contains_key(slip_id)
    }

    /// Records in slip order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Sum of listed tablets across all records.
    pub fn total_tablets(&self) -> u64 {
        self.records.values().map(|r| r.tablet_ids.len() as u64).sum()
    }

    /// Sum of outstanding tablets across all records.
    pub fn total_open(&self) -> u64 {
        self.records.values().map(|r| r.open_count() as u64).sum()
    }
}

/// Serialized shape: `{date, records[]}` as in the persisted history contract.
#[derive(Serialize, Deserialize)]
struct SnapshotWire {
    date: NaiveDate,
    records: Vec<Record>,
}

impl TryFrom<SnapshotWire> for Snapshot {
    type Error = SnapshotError;

    fn try_from(wire: SnapshotWire) -> Result<Self, Self::Error> {
        Snapshot::new(wire.date, wire.records)
    }
}

impl From<Snapshot> for SnapshotWire {
    fn from(s: Snapshot) -> Self {
        SnapshotWire {
            date: s.date,
            records: s.records.into_values().collect(),
        }
    }
}
