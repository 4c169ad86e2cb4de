// Snapshot date recovery for files that do not carry one

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;

use crate::error::IoError;

fn stamp() -> Option<&'static Regex> {
    static STAMP: OnceLock<Option<Regex>> = OnceLock::new();
    STAMP
        .get_or_init(|| Regex::new(r"(?:^|\D)(\d{4})-?(\d{2})-?(\d{2})(?:\D|$)").ok())
        .as_ref()
}

/// `tablillas_20250922_0800.xlsx` → 2025-09-22. The first valid stamp wins.
pub fn date_from_filename(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let re = stamp()?;
    let mut at = 0;
    while let Some(caps) = re.captures_at(name, at) {
        let parts: Option<Vec<u32>> = (1..=3)
            .map(|i| caps.get(i).and_then(|m| m.as_str().parse().ok()))
            .collect();
        if let Some([y, m, d]) = parts.as_deref() {
            if let Some(date) = NaiveDate::from_ymd_opt(*y as i32, *m, *d) {
                return Some(date);
            }
        }
        // The trailing separator was consumed; resume inside this candidate
        at = caps.get(1)?.start() + 1;
    }
    None
}

/// Local modification date of the file.
pub fn modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}

/// Explicit date, else a stamp in the file name, else the file's modification date.
pub fn resolve_snapshot_date(explicit: Option<NaiveDate>, path: &Path) -> Result<NaiveDate, IoError> {
    if let Some(date) = explicit {
        return Ok(date);
    }
    if let Some(date) = date_from_filename(path) {
        log::debug!("{}: snapshot date {date} from file name", path.display());
        return Ok(date);
    }
    if let Some(date) = modified_date(path) {
        log::info!("{}: no date given, using modification date {date}", path.display());
        return Ok(date);
    }
    Err(IoError::NoDate {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn d(y: i32, m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, day)
    }

    #[test]
    fn test_stamps_in_file_names() {
        assert_eq!(date_from_filename(Path::new("tablillas_20250922_0800.xlsx")), d(2025, 9, 22));
        assert_eq!(date_from_filename(Path::new("/tmp/x/2025-09-15.csv")), d(2025, 9, 15));
        assert_eq!(date_from_filename(Path::new("report-20251301-20250930.csv")), d(2025, 9, 30));
        assert_eq!(date_from_filename(Path::new("snapshot.csv")), None);
        assert_eq!(date_from_filename(Path::new("slip_729000018669.csv")), None);
    }

    #[test]
    fn test_resolution_order() {
        let dir = tempdir().unwrap();
        let stamped = dir.path().join("tablillas_20250922_0800.csv");
        let plain = dir.path().join("latest.csv");
        fs::write(&stamped, "").unwrap();
        fs::write(&plain, "").unwrap();

        assert_eq!(resolve_snapshot_date(d(2025, 1, 1), &stamped).ok(), d(2025, 1, 1));
        assert_eq!(resolve_snapshot_date(None, &stamped).ok(), d(2025, 9, 22));
        assert_eq!(
            resolve_snapshot_date(None, &plain).ok(),
            Some(Local::now().date_naive())
        );
        assert!(matches!(
            resolve_snapshot_date(None, &dir.path().join("gone.csv")),
            Err(IoError::NoDate { .. })
        ));
    }
}
