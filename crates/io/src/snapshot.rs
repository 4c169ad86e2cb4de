// Pre-built snapshot files: one row per slip under canonical (or known) headers

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use tabtrack_config::Settings;
use tabtrack_core::{FieldIssue, IssueKind, PriorityScorer, Record, Snapshot};
use tabtrack_extract::headers::{canonicalize, field, is_canonical, sequel, HeaderMatch};
use tabtrack_extract::{FieldExtractor, NormalizedRow, RecordValidator, RowRejection};

use crate::error::IoError;
use crate::table::{read_sheets, TableKind};

/// Source columns in write order.
pub const COLUMNS: [&str; 18] = [
    field::SLIP_ID,
    field::REGION,
    field::WAREHOUSE_CODE,
    field::JOBSITE_ID,
    field::COST_CENTER,
    field::RETURN_DATE,
    field::INVOICE_START_DATE,
    field::INVOICE_END_DATE,
    field::COUNTED_DATE,
    field::CUSTOMER_NAME,
    field::JOB_SITE_NAME,
    field::DEFINITIVE_FLAG,
    field::TABLETS,
    field::TOTAL_TABLETS,
    field::OPEN_TABLETS,
    field::TOTAL_OPEN,
    field::COUNTING_DELAY_DAYS,
    field::VALIDATION_DELAY_DAYS,
];

/// Written for readers of the file; ignored when reading it back.
pub const DERIVED_COLUMNS: [&str; 6] = [
    "days_since_return",
    "priority_score",
    "priority_bucket",
    "urgency",
    "confidence",
    "issues",
];

const NUMERIC: [&str; 6] = [
    field::TOTAL_TABLETS,
    field::TOTAL_OPEN,
    field::COUNTING_DELAY_DAYS,
    field::VALIDATION_DELAY_DAYS,
    "days_since_return",
    "priority_score",
];

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Records read from a file, before they are assembled into a snapshot.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    pub records: Vec<Record>,
    pub rejected: Vec<RowRejection>,
    /// Slips seen more than once; the first row wins.
    pub duplicates: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub snapshot: Snapshot,
    pub rejected: Vec<RowRejection>,
    pub duplicates: Vec<String>,
}

/// Column name for a snapshot header cell. `None` for empty or derived columns.
fn column_name(header: &str) -> Option<String> {
    let header = header.trim();
    if is_canonical(header) {
        return Some(header.to_string());
    }
    match canonicalize(header) {
        HeaderMatch::Field(name) => Some(name.to_string()),
        HeaderMatch::Fused(shape) => Some(shape.opaque_name()),
        HeaderMatch::Unknown(name) if DERIVED_COLUMNS.contains(&name.as_str()) => None,
        HeaderMatch::Unknown(name) => Some(name),
        HeaderMatch::Empty => None,
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

pub fn read_records(path: &Path) -> Result<RecordTable, IoError> {
    let sheets = read_sheets(path)?;
    // Workbooks may carry summary sheets; take the first one keyed by slip.
    let sheet = sheets
        .iter()
        .find(|s| {
            s.rows
                .iter()
                .find(|r| !is_blank(r))
                .is_some_and(|r| r.iter().any(|c| column_name(c).as_deref() == Some(field::SLIP_ID)))
        })
        .ok_or_else(|| IoError::format(path, "no sheet has a slip_id column"))?;

    let mut rows = sheet.rows.iter().enumerate().filter(|(_, r)| !is_blank(r));
    let Some((_, header)) = rows.next() else {
        return Ok(RecordTable::default());
    };
    let mut names: Vec<Option<String>> = Vec::with_capacity(header.len());
    for h in header {
        let name = column_name(h).map(|n| {
            let repeats = names.iter().flatten().filter(|p| **p == n).count();
            match (repeats, sequel(&n)) {
                (0, _) => n,
                (1, Some(next)) => next.to_string(),
                _ => format!("{n}_{}", repeats + 1),
            }
        });
        names.push(name);
    }

    let extractor = FieldExtractor::new();
    let mut table = RecordTable::default();
    let mut seen = HashSet::new();

    for (i, cells) in rows {
        let mut row = NormalizedRow {
            page: 1,
            row: i + 1,
            fields: Default::default(),
            issues: Vec::new(),
        };
        for (name, cell) in names.iter().zip(cells) {
            let (Some(name), value) = (name, cell.trim()) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if name.starts_with("fused_") {
                row.issues.push(FieldIssue {
                    field: name.clone(),
                    kind: IssueKind::Unsplit,
                    raw: Some(value.to_string()),
                });
            }
            row.fields.insert(name.clone(), value.to_string());
        }

        match extractor.extract(&row) {
            Ok(record) => {
                if seen.insert(record.slip_id.clone()) {
                    table.records.push(record);
                } else {
                    log::warn!("{}: row {}: duplicate slip {}", path.display(), i + 1, record.slip_id);
                    table.duplicates.push(record.slip_id);
                }
            }
            Err(rejection) => table.rejected.push(rejection),
        }
    }
    Ok(table)
}

/// Read, classify and score a snapshot file as of `date`.
pub fn load_snapshot(
    path: &Path,
    date: NaiveDate,
    settings: &Settings,
) -> Result<LoadedSnapshot, IoError> {
    let mut table = read_records(path)?;
    let validator = RecordValidator::new(settings.validation.clone());
    let scorer = PriorityScorer::new(settings.priority.clone());
    for r in &mut table.records {
        validator.classify(r);
        r.refresh_age(date);
        scorer.apply(r);
    }
    log::debug!(
        "{}: {} records, {} rejected",
        path.display(),
        table.records.len(),
        table.rejected.len()
    );
    Ok(LoadedSnapshot {
        snapshot: Snapshot::new(date, table.records)?,
        rejected: table.rejected,
        duplicates: table.duplicates,
    })
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(T::to_string).unwrap_or_default()
}

fn record_row(r: &Record) -> Vec<String> {
    vec![
        r.slip_id.clone(),
        opt(&r.region),
        opt(&r.warehouse_code),
        opt(&r.jobsite_id),
        opt(&r.cost_center),
        opt(&r.return_date),
        opt(&r.invoice_start_date),
        opt(&r.invoice_end_date),
        opt(&r.counted_date),
        opt(&r.customer_name),
        opt(&r.job_site_name),
        if r.definitive_flag { "Yes" } else { "No" }.to_string(),
        r.tablet_ids.join(", "),
        opt(&r.total_tablets),
        r.open_tablet_ids.join(", "),
        opt(&r.total_open),
        opt(&r.counting_delay_days),
        opt(&r.validation_delay_days),
        opt(&r.days_since_return),
        format!("{:.2}", r.priority_score),
        r.priority_bucket.to_string(),
        r.urgency.to_string(),
        r.confidence.to_string(),
        r.issues
            .iter()
            .map(|i| format!("{}:{}", i.field, i.kind.as_str()))
            .collect::<Vec<_>>()
            .join("; "),
    ]
}

fn header_row() -> Vec<String> {
    COLUMNS
        .iter()
        .chain(DERIVED_COLUMNS.iter())
        .map(|c| c.to_string())
        .collect()
}

/// Write as CSV, or as an Excel workbook for `.xlsx`.
pub fn write_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), IoError> {
    let mut rows = vec![header_row()];
    rows.extend(snapshot.records().map(record_row));

    match TableKind::of(path) {
        Some(TableKind::Workbook) => write_xlsx(&rows, path),
        _ => write_csv(&rows, path),
    }
}

fn write_csv(rows: &[Vec<String>], path: &Path) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| IoError::file(path, e))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| IoError::file(path, e))?;
    }
    writer.flush().map_err(|e| IoError::file(path, e))?;
    Ok(())
}

fn write_xlsx(rows: &[Vec<String>], path: &Path) -> Result<(), IoError> {
    let columns = header_row();
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let sheet = workbook
        .add_worksheet()
        .set_name("snapshot")
        .map_err(|e| IoError::file(path, e))?;

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            let (row32, col16) = (r as u32, c as u16);
            let numeric = NUMERIC.contains(&columns[c].as_str());
            let written = if r == 0 {
                sheet.write_string_with_format(row32, col16, value, &bold)
            } else if value.is_empty() {
                continue;
            } else if let (true, Ok(n)) = (numeric, value.parse::<f64>()) {
                sheet.write_number(row32, col16, n)
            } else {
                sheet.write_string(row32, col16, value)
            };
            written.map_err(|e| IoError::file(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| IoError::file(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tabtrack_core::Confidence;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn sample() -> Snapshot {
        let mut a = Record::new("729000018669");
        a.region = Some("FL".into());
        a.warehouse_code = Some("61D".into());
        a.return_date = Some(day(2));
        a.customer_name = Some("3c Construction Corp".into());
        a.tablet_ids = vec!["81".into(), "134".into(), "1666".into(), "1708".into()];
        a.open_tablet_ids = vec!["1666M".into(), "1708M".into()];
        a.total_tablets = Some(4);
        a.total_open = Some(2);
        a.counting_delay_days = Some(15);

        let mut b = Record::new("729000018670");
        b.definitive_flag = true;
        b.counted_date = Some(day(17));
        b.tablet_ids = vec!["1662".into(), "1674".into(), "1718".into()];
        b.total_tablets = Some(3);
        Snapshot::new(day(22), vec![a, b]).unwrap()
    }

    fn assert_same_source_fields(a: &Snapshot, b: &Snapshot) {
        let d = tabtrack_recon::diff(a, b);
        assert_eq!(d.summary.unchanged, a.len(), "{:?}", d.modified);
        assert!(d.new_keys.is_empty() && d.closed_keys.is_empty());
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&sample(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("slip_id,region,warehouse_code"));
        assert!(content.contains("\"81, 134, 1666, 1708\""));

        let loaded = load_snapshot(&path, day(22), &Settings::default()).unwrap();
        assert!(loaded.rejected.is_empty());
        assert_same_source_fields(&sample(), &loaded.snapshot);

        let a = loaded.snapshot.get("729000018669").unwrap();
        assert_eq!(a.confidence, Confidence::Perfect);
        assert_eq!(a.days_since_return, Some(20));
        assert!(a.issues.is_empty(), "{:?}", a.issues);
    }

    #[test]
    fn test_xlsx_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tablillas_20250922_0800.xlsx");
        write_snapshot(&sample(), &path).unwrap();

        let loaded = load_snapshot(&path, day(22), &Settings::default()).unwrap();
        assert_same_source_fields(&sample(), &loaded.snapshot);
    }

    #[test]
    fn test_report_headers_and_bad_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.csv");
        fs::write(
            &path,
            "Return Packing Slip;Tablets;Total;Open Tablets;Total;Definitive Dev;Driver Notes\n\
             729000018669;1662, 1674, 1718;3;1718M;1;Ye s;gate 4\n\
             ;5, 6;2;;0;No;\n\
             729000018669;1;1;;0;No;\n\
             \n\
             729000018671;1700;x;;0;Yes;\n",
        )
        .unwrap();

        let table = read_records(&path).unwrap();
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.rejected.len(), 1);
        assert_eq!(table.rejected[0].row, 3);
        assert_eq!(table.duplicates, vec!["729000018669"]);

        let first = &table.records[0];
        assert!(first.definitive_flag);
        assert_eq!(first.tablet_ids, vec!["1662", "1674", "1718"]);
        assert_eq!(first.open_tablet_ids, vec!["1718M"]);
        assert_eq!(first.total_open, Some(1));
        assert!(first.is_flagged("driver_notes"));

        let last = &table.records[1];
        assert!(last.is_flagged(field::TOTAL_TABLETS));
    }

    #[test]
    fn test_missing_slip_column_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "name,value\na,1\n").unwrap();
        assert!(matches!(read_records(&path), Err(IoError::Format { .. })));
    }
}
