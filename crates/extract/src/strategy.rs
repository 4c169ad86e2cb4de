//! Grid detection as a collaborator.
//!
//! A [`GridSource`] turns one document into pages for a given strategy. The
//! pipeline calls it once per configured [`StrategyParams`], in order.

use std::collections::BTreeMap;

use tabtrack_config::StrategyParams;

use crate::error::DetectError;
use crate::grid::PageGrid;

pub trait GridSource {
    fn detect(&self, params: &StrategyParams) -> Result<Vec<PageGrid>, DetectError>;
}

impl<T: GridSource + ?Sized> GridSource for &T {
    fn detect(&self, params: &StrategyParams) -> Result<Vec<PageGrid>, DetectError> {
        (**self).detect(params)
    }
}

/// The same pre-detected grid for every strategy.
#[derive(Debug, Clone, Default)]
pub struct StaticGrid(pub Vec<PageGrid>);

impl GridSource for StaticGrid {
    fn detect(&self, _params: &StrategyParams) -> Result<Vec<PageGrid>, DetectError> {
        Ok(self.0.clone())
    }
}

/// One pre-detected grid per strategy name, e.g. several detector exports of
/// the same document.
#[derive(Debug, Clone, Default)]
pub struct NamedGrids {
    grids: BTreeMap<String, Vec<PageGrid>>,
}

impl NamedGrids {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, pages: Vec<PageGrid>) {
        self.grids.insert(name.into(), pages);
    }

    /// Strategies in name order, one per grid.
    pub fn strategies(&self) -> Vec<StrategyParams> {
        self.grids.keys().map(StrategyParams::named).collect()
    }
}

impl GridSource for NamedGrids {
    fn detect(&self, params: &StrategyParams) -> Result<Vec<PageGrid>, DetectError> {
        self.grids
            .get(&params.name)
            .cloned()
            .ok_or_else(|| DetectError::Unavailable(format!("no grid for '{}'", params.name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::page;

    #[test]
    fn named_grids_dispatch_by_strategy_name() {
        let mut grids = NamedGrids::new();
        grids.insert("stream", vec![page(1, &[&["a"]])]);
        grids.insert("lattice", vec![page(1, &[&["b"]]), page(2, &[])]);

        let names: Vec<String> = grids.strategies().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["lattice", "stream"]);

        let pages = grids.detect(&StrategyParams::named("lattice")).unwrap();
        assert_eq!(pages.len(), 2);

        let err = grids.detect(&StrategyParams::named("ocr")).unwrap_err();
        assert!(matches!(err, DetectError::Unavailable(_)));
    }

    #[test]
    fn static_grid_ignores_params() {
        let source = StaticGrid(vec![page(1, &[&["x"]])]);
        let a = source.detect(&StrategyParams::named("a")).unwrap();
        let b = source.detect(&StrategyParams::named("b").with_column_gap(9)).unwrap();
        assert_eq!(a, b);
    }
}
