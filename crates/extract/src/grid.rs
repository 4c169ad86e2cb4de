use serde::{Deserialize, Serialize};

/// One page as the detector saw it: rows of text cells, possibly jagged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGrid {
    /// 1-based page number, for diagnostics.
    #[serde(default)]
    pub number: usize,
    pub rows: Vec<Vec<String>>,
}

impl PageGrid {
    pub fn new(number: usize, rows: Vec<Vec<String>>) -> Self {
        Self { number, rows }
    }

    /// Widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// True when no row carries any text.
    pub fn is_blank(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(|c| c.trim().is_empty()))
    }
}

/// Build a page from string slices. Handy for tests and in-memory sources.
pub fn page(number: usize, rows: &[&[&str]]) -> PageGrid {
    PageGrid::new(
        number,
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}
