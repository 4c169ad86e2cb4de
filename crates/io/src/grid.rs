// Detector grids from files: JSON pages, or one page per sheet of a CSV/Excel export

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tabtrack_config::StrategyParams;
use tabtrack_extract::{NamedGrids, PageGrid};

use crate::error::IoError;
use crate::table::{read_file_as_utf8, read_sheets, TableKind};

/// Accepted JSON shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum GridFile {
    /// `{"pages": [{"number": 1, "rows": [[...]]}]}`
    Pages { pages: Vec<PageGrid> },
    /// `[{"number": 1, "rows": [[...]]}]`
    PageList(Vec<PageGrid>),
    /// `[[["cell", ...], ...], ...]`: pages of rows of cells
    Bare(Vec<Vec<Vec<String>>>),
}

pub fn parse_grid_json(json: &str) -> Result<Vec<PageGrid>, serde_json::Error> {
    let pages = match serde_json::from_str::<GridFile>(json)? {
        GridFile::Pages { pages } | GridFile::PageList(pages) => pages,
        GridFile::Bare(pages) => pages
            .into_iter()
            .enumerate()
            .map(|(i, rows)| PageGrid::new(i + 1, rows))
            .collect(),
    };
    Ok(pages)
}

pub fn read_grid(path: &Path) -> Result<Vec<PageGrid>, IoError> {
    if TableKind::of(path) == Some(TableKind::Json) {
        let json = read_file_as_utf8(path)?;
        return parse_grid_json(&json).map_err(|e| IoError::format(path, e));
    }
    let pages = read_sheets(path)?
        .into_iter()
        .enumerate()
        .map(|(i, sheet)| PageGrid::new(i + 1, sheet.rows))
        .collect();
    Ok(pages)
}

/// One strategy per file, named after the file stem, in the order given.
pub fn load_grids(paths: &[PathBuf]) -> Result<(NamedGrids, Vec<StrategyParams>), IoError> {
    let mut grids = NamedGrids::new();
    let mut strategies = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("grid{}", i + 1));
        let name = if strategies.iter().any(|s: &StrategyParams| s.name == stem) {
            format!("{stem}#{}", i + 1)
        } else {
            stem
        };
        let pages = read_grid(path)?;
        log::debug!("{}: {} page(s) as strategy '{name}'", path.display(), pages.len());
        grids.insert(name.clone(), pages);
        strategies.push(StrategyParams::named(name));
    }
    Ok((grids, strategies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tabtrack_extract::GridSource;
    use tempfile::tempdir;

    #[test]
    fn test_json_shapes() {
        let bare = parse_grid_json(r#"[[["Slip", "Tablets"], ["729000018669", "1"]], [["x"]]]"#)
            .unwrap();
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[1].number, 2);
        assert_eq!(bare[0].rows[1], vec!["729000018669", "1"]);

        let pages = parse_grid_json(r#"{"pages": [{"number": 3, "rows": [["a", "b"]]}]}"#).unwrap();
        assert_eq!(pages[0].number, 3);

        let list = parse_grid_json(r#"[{"number": 1, "rows": []}]"#).unwrap();
        assert_eq!(list.len(), 1);

        assert!(parse_grid_json(r#"{"rows": 1}"#).is_err());
    }

    #[test]
    fn test_load_grids_keeps_argument_order() {
        let dir = tempdir().unwrap();
        let stream = dir.path().join("stream.json");
        let lattice = dir.path().join("lattice.csv");
        fs::write(&stream, r#"[[["Slip"], ["729000018669"]]]"#).unwrap();
        fs::write(&lattice, "Slip,Tablets\n729000018669,1\n").unwrap();

        let (grids, strategies) = load_grids(&[stream, lattice]).unwrap();
        let names: Vec<&str> = strategies.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["stream", "lattice"]);

        let pages = grids.detect(&strategies[1]).unwrap();
        assert_eq!(pages[0].rows[1], vec!["729000018669", "1"]);
    }

    #[test]
    fn test_duplicate_stems_are_numbered() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        fs::create_dir(&a).unwrap();
        let first = dir.path().join("grid.json");
        let second = a.join("grid.json");
        fs::write(&first, "[]").unwrap();
        fs::write(&second, "[]").unwrap();

        let (_, strategies) = load_grids(&[first, second]).unwrap();
        assert_eq!(strategies[1].name, "grid#2");
    }
}
