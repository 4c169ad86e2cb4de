use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// A trend needs at least two snapshots.
    InsufficientSnapshots { found: usize },
    /// Snapshots must be strictly ordered by date.
    NonMonotonicDate { last: NaiveDate, date: NaiveDate },
    /// The persistence collaborator failed.
    Store(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSnapshots { found } => {
                write!(f, "trend needs at least 2 snapshots, found {found}")
            }
            Self::NonMonotonicDate { last, date } => {
                write!(f, "snapshot dated {date} is not after the last entry ({last})")
            }
            Self::Store(msg) => write!(f, "history store error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
