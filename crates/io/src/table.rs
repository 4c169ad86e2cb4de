// Tabular file reading: CSV/TSV and Excel workbooks as plain text cells

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};

use crate::error::IoError;

/// One sheet of text cells. CSV files yield a single sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Delimited,
    Workbook,
    Json,
}

impl TableKind {
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn read_sheets(path: &Path) -> Result<Vec<Sheet>, IoError> {
    match TableKind::of(path) {
        Some(TableKind::Delimited) => {
            let content = read_file_as_utf8(path)?;
            let rows = parse_delimited(&content, sniff_delimiter(&content))
                .map_err(|e| IoError::format(path, e))?;
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("sheet")
                .to_string();
            Ok(vec![Sheet { name, rows }])
        }
        Some(TableKind::Workbook) => read_workbook(path),
        _ => Err(IoError::Unsupported {
            path: path.to_path_buf(),
        }),
    }
}

/// File contents as UTF-8, BOM stripped. Non-UTF-8 input is decoded as Windows-1252.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let raw = std::fs::read(path).map_err(|e| IoError::file(path, e))?;
    let text = match String::from_utf8(raw) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            encoding_rs::WINDOWS_1252.decode(e.as_bytes()).0.into_owned()
        }
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Delimiter of a text export: the candidate whose header width (more than one
/// column) is repeated by the most leading records. Comma wins ties.
pub fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
    let sample: String = content.lines().take(10).collect::<Vec<_>>().join("\n");

    let mut chosen = (b',', 0usize);
    for delimiter in CANDIDATES {
        let widths: Vec<usize> = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(sample.as_bytes())
            .records()
            .map_while(Result::ok)
            .map(|r| r.len())
            .collect();
        let Some(&header) = widths.first() else {
            continue;
        };
        if header < 2 {
            continue;
        }
        let score = header * widths.iter().filter(|&&w| w == header).count();
        if score > chosen.1 {
            chosen = (delimiter, score);
        }
    }
    chosen.0
}

fn parse_delimited(content: &str, delimiter: u8) -> Result<Vec<Vec<String>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_workbook(path: &Path) -> Result<Vec<Sheet>, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::format(path, e))?;
    let names: Vec<String> = workbook.sheet_names().to_vec();
    if names.is_empty() {
        return Err(IoError::format(path, "workbook contains no sheets"));
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IoError::format(path, format!("sheet '{name}': {e}")))?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push(Sheet { name, rows });
    }
    Ok(sheets)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        // Integers without decimals: slip numbers and counts are stored as floats
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => n.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "Yes" } else { "No" }.to_string(),
        Data::DateTime(dt) => excel_serial_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
    }
}

/// 1900 date system serial to date.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
