//! Table geometry normalization.
//!
//! Turns detector pages (jagged rows of cells) into rows keyed by canonical
//! field name. Per page:
//!
//! 1. Rows are classified: blank, ignored footer, Total, data, wrapped
//!    continuation, or other.
//! 2. The rows before the first data row (at most `header_window`) form the
//!    header block; each column's header is the concatenation of its cells.
//!    Pages without a header block inherit the previous page's schema.
//! 3. Duplicate names are resolved positionally; phantom duplicates merged.
//! 4. Continuations are folded into the row above, then fused cells split.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use regex::Regex;
use serde::Serialize;
use tabtrack_config::NormalizerSettings;
use tabtrack_core::{FieldIssue, IssueKind};

use crate::error::ExtractError;
use crate::fields::parse_count;
use crate::fused::{FusedSplitter, Shape};
use crate::grid::PageGrid;
use crate::headers::{self, canonicalize, field, HeaderMatch};

/// A data row keyed by field name. Empty cells are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub page: usize,
    /// 1-based physical row on the page.
    pub row: usize,
    pub fields: BTreeMap<String, String>,
    /// Flags raised during normalization (unsplit cells).
    pub issues: Vec<FieldIssue>,
}

impl NormalizedRow {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedDocument {
    pub pages: usize,
    pub rows: Vec<NormalizedRow>,
    /// Count fields declared on a Total row. A later Total row overrides.
    pub declared_totals: BTreeMap<String, u64>,
    pub unknown_columns: BTreeSet<String>,
    pub merged_columns: BTreeSet<String>,
    pub header_missing_pages: Vec<usize>,
    /// Rows that were neither data nor header (titles, footers, noise).
    pub skipped_rows: usize,
}

impl NormalizedDocument {
    /// True when no page contributed any row at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.declared_totals.is_empty()
    }
}

/// What one physical column feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Field(String),
    Fused(Shape),
    /// Phantom column, merged away.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Blank,
    Ignored,
    Data,
    Header,
    Total,
    Continuation,
    Other,
}

pub struct Normalizer {
    slip: Regex,
    ignore: Vec<Regex>,
    total: Regex,
    header_window: usize,
    continuation_max_cells: usize,
    splitter: FusedSplitter,
}

impl Normalizer {
    pub fn new(settings: &NormalizerSettings) -> Result<Self, ExtractError> {
        let slip = Regex::new(&settings.slip_pattern)
            .map_err(|e| ExtractError::pattern("slip_pattern", e))?;
        let ignore = settings
            .ignore_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ExtractError::pattern(p, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let total = Regex::new(r"(?i)^\s*T\s*o\s*t\s*a\s*l(?:\s|:|$)")
            .map_err(|e| ExtractError::pattern("total", e))?;
        Ok(Self {
            slip,
            ignore,
            total,
            header_window: settings.header_window.max(1),
            continuation_max_cells: settings.continuation_max_cells,
            splitter: FusedSplitter::new()?,
        })
    }

    pub fn normalize(&self, pages: &[PageGrid]) -> NormalizedDocument {
        self.normalize_with_window(pages, self.header_window)
    }

    /// Normalize with a header window other than the configured one.
    pub fn normalize_with_window(&self, pages: &[PageGrid], window: usize) -> NormalizedDocument {
        let window = window.max(1);
        let mut doc = NormalizedDocument {
            pages: pages.len(),
            ..NormalizedDocument::default()
        };
        let mut previous: Option<Vec<Slot>> = None;

        for (index, page) in pages.iter().enumerate() {
            let number = if page.number == 0 { index + 1 } else { page.number };
            let rows: Vec<Vec<String>> = page
                .rows
                .iter()
                .map(|r| r.iter().map(|c| c.trim().to_string()).collect())
                .collect();
            self.normalize_page(number, &rows, window, &mut previous, &mut doc);
        }
        doc
    }

    fn normalize_page(
        &self,
        page: usize,
        rows: &[Vec<String>],
        window: usize,
        previous: &mut Option<Vec<Slot>>,
        doc: &mut NormalizedDocument,
    ) {
        let roles = self.classify(rows);
        let Some(first_data) = roles.iter().position(|r| *r == Role::Data) else {
            log::debug!("page {page}: no data rows");
            for (i, row) in rows.iter().enumerate() {
                if roles[i] == Role::Total {
                    if let Some(schema) = previous.as_deref() {
                        self.read_totals(row, schema, doc);
                    }
                }
            }
            return;
        };

        // Data rows and continuations, physical index kept for diagnostics.
        let mut pending: Vec<(usize, Vec<String>)> = Vec::new();
        for (i, row) in rows.iter().enumerate().skip(first_data) {
            match roles[i] {
                Role::Data => pending.push((i, row.clone())),
                Role::Continuation => {
                    if let Some((_, last)) = pending.last_mut() {
                        merge_continuation(last, row);
                    }
                }
                Role::Total => {}
                Role::Blank | Role::Ignored | Role::Header | Role::Other => {
                    doc.skipped_rows += usize::from(roles[i] != Role::Blank);
                }
            }
        }

        let width = rows
            .iter()
            .map(Vec::len)
            .chain(pending.iter().map(|(_, r)| r.len()))
            .max()
            .unwrap_or(0);

        let header_rows: Vec<&Vec<String>> = rows[..first_data]
            .iter()
            .zip(&roles[..first_data])
            .filter(|(_, role)| matches!(role, Role::Header | Role::Other))
            .map(|(row, _)| row)
            .collect();
        let window_start = header_rows.len().saturating_sub(window);
        doc.skipped_rows += window_start;
        let header_rows = &header_rows[window_start..];

        let data_cells: Vec<&Vec<String>> = pending.iter().map(|(_, r)| r).collect();
        let schema = if header_rows.is_empty() {
            match previous.as_ref() {
                Some(prev) if width <= prev.len() => {
                    log::debug!("page {page}: no header, inheriting previous schema");
                    prev.clone()
                }
                _ => {
                    log::warn!("page {page}: no header and no compatible schema");
                    doc.header_missing_pages.push(page);
                    (0..width)
                        .map(|c| Slot::Field(format!("column_{}", c + 1)))
                        .collect()
                }
            }
        } else {
            self.build_schema(header_rows, width, &data_cells, doc)
        };

        for (i, row) in rows.iter().enumerate().skip(first_data) {
            if roles[i] == Role::Total {
                self.read_totals(row, &schema, doc);
            }
        }

        for (i, cells) in pending {
            let row = self.map_row(page, i + 1, &cells, &schema, doc);
            doc.rows.push(row);
        }
        *previous = Some(schema);
    }

    fn classify(&self, rows: &[Vec<String>]) -> Vec<Role> {
        let mut roles = Vec::with_capacity(rows.len());
        let mut seen_data = false;
        for row in rows {
            let non_empty = row.iter().filter(|c| !c.is_empty()).count();
            let joined = row
                .iter()
                .filter(|c| !c.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");

            let role = if non_empty == 0 {
                Role::Blank
            } else if self.ignore.iter().any(|re| re.is_match(&joined)) {
                Role::Ignored
            } else if row.iter().any(|c| self.slip.is_match(c)) {
                Role::Data
            } else if looks_like_header(row) {
                Role::Header
            } else if self.total.is_match(&joined) {
                Role::Total
            } else if seen_data
                && row.first().map_or(true, |c| c.is_empty())
                && non_empty <= self.continuation_max_cells
                && matches!(roles.last(), Some(Role::Data | Role::Continuation))
            {
                Role::Continuation
            } else if seen_data && non_empty > self.continuation_max_cells {
                // Garbled key column: still handed on so the rejection is logged.
                Role::Data
            } else {
                Role::Other
            };
            seen_data |= role == Role::Data;
            roles.push(role);
        }
        roles
    }

    fn build_schema(
        &self,
        header_rows: &[&Vec<String>],
        width: usize,
        data: &[&Vec<String>],
        doc: &mut NormalizedDocument,
    ) -> Vec<Slot> {
        let matches: Vec<HeaderMatch> = (0..width)
            .map(|c| {
                let stack: Vec<&str> = header_rows
                    .iter()
                    .filter_map(|r| r.get(c).map(String::as_str))
                    .filter(|s| !s.is_empty())
                    .collect();
                header_for(&stack)
            })
            .collect();

        let present: BTreeSet<&str> = matches
            .iter()
            .filter_map(|m| match m {
                HeaderMatch::Field(name) => Some(*name),
                _ => None,
            })
            .collect();

        let column_empty = |c: usize| {
            data.iter()
                .all(|row| row.get(c).map_or(true, |cell| cell.is_empty()))
        };

        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut taken: BTreeSet<String> = BTreeSet::new();
        let mut schema = Vec::with_capacity(width);

        for (c, m) in matches.iter().enumerate() {
            let (base, known) = match m {
                HeaderMatch::Field(name) => (name.to_string(), true),
                HeaderMatch::Fused(shape) => (shape.name().to_string(), true),
                HeaderMatch::Unknown(name) => (name.clone(), false),
                HeaderMatch::Empty => (format!("column_{}", c + 1), false),
            };
            let n = {
                let entry = occurrences.entry(base.clone()).or_insert(0);
                *entry += 1;
                *entry
            };

            if n == 1 && !taken.contains(&base) {
                if !known {
                    if column_empty(c) {
                        doc.merged_columns.insert(base);
                        schema.push(Slot::Skip);
                        continue;
                    }
                    doc.unknown_columns.insert(base.clone());
                }
                taken.insert(base.clone());
                schema.push(match m {
                    HeaderMatch::Fused(shape) => Slot::Fused(*shape),
                    _ => Slot::Field(base),
                });
                continue;
            }

            if let Some(next) = headers::sequel(&base) {
                if n == 2 && !present.contains(next) && !taken.contains(next) {
                    log::debug!("column {}: second '{base}' read as '{next}'", c + 1);
                    taken.insert(next.to_string());
                    schema.push(Slot::Field(next.to_string()));
                    continue;
                }
            }

            let suffixed = format!("{base}_{n}");
            if column_empty(c) {
                log::debug!("column {}: empty duplicate '{base}' merged", c + 1);
                doc.merged_columns.insert(suffixed);
                schema.push(Slot::Skip);
            } else {
                doc.unknown_columns.insert(suffixed.clone());
                taken.insert(suffixed.clone());
                schema.push(Slot::Field(suffixed));
            }
        }
        schema
    }

    fn read_totals(&self, row: &[String], schema: &[Slot], doc: &mut NormalizedDocument) {
        for (c, cell) in row.iter().enumerate() {
            let Some(Slot::Field(name)) = schema.get(c) else {
                continue;
            };
            if !field::COUNTS.contains(&name.as_str()) {
                continue;
            }
            if let Ok(Some(value)) = parse_count(cell) {
                doc.declared_totals.insert(name.clone(), u64::from(value));
            }
        }
    }

    fn map_row(
        &self,
        page: usize,
        row: usize,
        cells: &[String],
        schema: &[Slot],
        doc: &mut NormalizedDocument,
    ) -> NormalizedRow {
        let mut fields: BTreeMap<String, String> = BTreeMap::new();
        let mut fused: Vec<(Shape, &str)> = Vec::new();

        for (c, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            match schema.get(c) {
                Some(Slot::Field(name)) => append(&mut fields, name, cell),
                Some(Slot::Fused(shape)) => fused.push((*shape, cell.as_str())),
                Some(Slot::Skip) => {}
                None => {
                    let name = format!("column_{}", c + 1);
                    doc.unknown_columns.insert(name.clone());
                    append(&mut fields, &name, cell);
                }
            }
        }

        let mut issues = Vec::new();

        // Cells under a composite header.
        for (shape, text) in fused {
            match self.splitter.split(shape, text) {
                Some(parts) => fill_parts(&mut fields, shape, parts),
                None => {
                    log::debug!("page {page} row {row}: cannot split {} '{text}'", shape.name());
                    fields.insert(shape.opaque_name(), text.to_string());
                    issues.push(FieldIssue {
                        field: shape.opaque_name(),
                        kind: IssueKind::Unsplit,
                        raw: Some(text.to_string()),
                    });
                }
            }
        }

        // Lead columns that swallowed their empty neighbours.
        for shape in Shape::ALL {
            let Some(text) = fields.get(shape.lead()) else {
                continue;
            };
            let siblings_absent = shape.parts()[1..]
                .iter()
                .all(|p| fields.get(*p).map_or(true, |v| v.is_empty()));
            if !siblings_absent {
                continue;
            }
            if let Some(parts) = self.splitter.split_confirmed(shape, text) {
                log::debug!("page {page} row {row}: split fused {}", shape.name());
                fields.remove(shape.lead());
                fill_parts(&mut fields, shape, parts);
            }
        }

        NormalizedRow {
            page,
            row,
            fields,
            issues,
        }
    }
}

/// Header text for one column. The full stack is tried first, then shorter
/// suffixes closest to the data, so a title line above the header does not
/// hide a known name.
fn header_for(stack: &[&str]) -> HeaderMatch {
    if stack.is_empty() {
        return HeaderMatch::Empty;
    }
    let full = canonicalize(&stack.join(" "));
    if full.is_known() {
        return full;
    }
    for start in 1..stack.len() {
        let m = canonicalize(&stack[start..].join(" "));
        if m.is_known() {
            return m;
        }
    }
    full
}

/// Repeated header rows: two or more cells naming known columns.
fn looks_like_header(row: &[String]) -> bool {
    row.iter()
        .filter(|c| !c.is_empty())
        .filter(|c| canonicalize(c).is_known())
        .count()
        >= 2
}

fn merge_continuation(target: &mut Vec<String>, row: &[String]) {
    if target.len() < row.len() {
        target.resize(row.len(), String::new());
    }
    for (c, cell) in row.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        if target[c].is_empty() {
            target[c] = cell.clone();
        } else {
            target[c] = format!("{} {}", target[c], cell);
        }
    }
}

fn append(fields: &mut BTreeMap<String, String>, name: &str, text: &str) {
    fields
        .entry(name.to_string())
        .and_modify(|v| {
            v.push(' ');
            v.push_str(text);
        })
        .or_insert_with(|| text.to_string());
}

/// Split parts never overwrite a value the row already has.
fn fill_parts(fields: &mut BTreeMap<String, String>, shape: Shape, parts: Vec<String>) {
    for (name, value) in shape.parts().iter().zip(parts) {
        if value.is_empty() {
            continue;
        }
        let slot = fields.entry(name.to_string()).or_default();
        if slot.is_empty() {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::page;

    fn normalizer() -> Normalizer {
        Normalizer::new(&NormalizerSettings::default()).unwrap()
    }

    #[test]
    fn split_header_joins_to_canonical_field() {
        let pages = vec![page(
            1,
            &[
                &["Return Packing", "Counting"],
                &["Slip", "delay"],
                &["729000018669", "15"],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0].get(field::COUNTING_DELAY_DAYS), Some("15"));
        assert_eq!(doc.rows[0].get(field::SLIP_ID), Some("729000018669"));
        assert!(doc.unknown_columns.is_empty());
    }

    #[test]
    fn narrow_window_drops_upper_header_rows() {
        let pages = vec![page(
            1,
            &[
                &["Return Packing", "Counting"],
                &["Slip", "delay"],
                &["729000018669", "15"],
            ],
        )];
        let doc = normalizer().normalize_with_window(&pages, 1);
        assert_eq!(doc.rows[0].get(field::SLIP_ID), Some("729000018669"));
        assert_eq!(doc.rows[0].get("delay"), Some("15"));
        assert_eq!(doc.skipped_rows, 1);
    }

    #[test]
    fn title_line_above_header_is_ignored() {
        let pages = vec![page(
            1,
            &[
                &["Alsina Forms Co., Inc.", ""],
                &["WH", "Return Packing Slip"],
                &["FL", "729000018669"],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.rows[0].get(field::REGION), Some("FL"));
    }

    #[test]
    fn duplicate_headers_take_ordinal_sequels() {
        let pages = vec![page(
            1,
            &[
                &["Slip", "Next Invoice Date", "Next Invoice Date", "Total", "Total"],
                &["729000018669", "8/31/2025", "9/30/2025", "4", "2"],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        let row = &doc.rows[0];
        assert_eq!(row.get(field::INVOICE_START_DATE), Some("8/31/2025"));
        assert_eq!(row.get(field::INVOICE_END_DATE), Some("9/30/2025"));
        assert_eq!(row.get(field::TOTAL_TABLETS), Some("4"));
        assert_eq!(row.get(field::TOTAL_OPEN), Some("2"));
    }

    #[test]
    fn other_duplicates_get_suffix_or_merge() {
        let pages = vec![page(
            1,
            &[
                &["Slip", "Customer Name", "Customer Name", "Cost Center", "Cost Center"],
                &["729000018669", "Acme", "Acme Two", "FL053", ""],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        let row = &doc.rows[0];
        assert_eq!(row.get("customer_name_2"), Some("Acme Two"));
        assert!(doc.unknown_columns.contains("customer_name_2"));
        assert!(doc.merged_columns.contains("cost_center_2"));
        assert_eq!(row.get(field::COST_CENTER), Some("FL053"));
    }

    #[test]
    fn unknown_header_retained() {
        let pages = vec![page(
            1,
            &[&["Slip", "Driver Notes"], &["729000018669", "gate code 12"]],
        )];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.rows[0].get("driver_notes"), Some("gate code 12"));
        assert!(doc.unknown_columns.contains("driver_notes"));
    }

    #[test]
    fn next_page_inherits_schema() {
        let pages = vec![
            page(1, &[&["Slip", "Tablets"], &["729000018669", "1, 2"]]),
            page(2, &[&["729000018670", "3"]]),
        ];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(doc.rows[1].page, 2);
        assert_eq!(doc.rows[1].get(field::TABLETS), Some("3"));
        assert!(doc.header_missing_pages.is_empty());
    }

    #[test]
    fn headerless_first_page_is_flagged() {
        let pages = vec![page(1, &[&["729000018669", "3"]])];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.header_missing_pages, vec![1]);
        assert_eq!(doc.rows[0].get("column_1"), Some("729000018669"));
    }

    #[test]
    fn continuation_rows_merge_cellwise() {
        let pages = vec![page(
            1,
            &[
                &["Slip", "Definitive", "Job Site Name"],
                &["729000018669", "Ye", "Biscayne Bay"],
                &["", "s", "Tower"],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.rows[0].get(field::DEFINITIVE_FLAG), Some("Ye s"));
        assert_eq!(doc.rows[0].get(field::JOB_SITE_NAME), Some("Biscayne Bay Tower"));
    }

    #[test]
    fn total_row_declares_counts() {
        let pages = vec![page(
            1,
            &[
                &["Slip", "Tablets", "Total"],
                &["729000018669", "1, 2", "2"],
                &["T o t a l", "", "2"],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.declared_totals.get(field::TOTAL_TABLETS), Some(&2));
    }

    #[test]
    fn footer_and_blank_rows_skipped() {
        let pages = vec![page(
            1,
            &[
                &["Slip", "Tablets"],
                &["729000018669", "1"],
                &["", ""],
                &["Page 1 of 3", ""],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        assert_eq!(doc.rows.len(), 1);
        assert_eq!(doc.skipped_rows, 1);
    }

    #[test]
    fn composite_header_split() {
        let pages = vec![page(
            1,
            &[
                &["WH Return Packing Slip", "Customer Name Job Site Name"],
                &["FL 61D 729000018669", "Caribbean Building Corp   Modena 22"],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        let row = &doc.rows[0];
        assert_eq!(row.get(field::REGION), Some("FL"));
        assert_eq!(row.get(field::WAREHOUSE_CODE), Some("61D"));
        assert_eq!(row.get(field::SLIP_ID), Some("729000018669"));
        assert_eq!(row.get(field::CUSTOMER_NAME), Some("Caribbean Building Corp"));
        assert_eq!(row.get(field::JOB_SITE_NAME), Some("Modena 22"));
        assert!(row.issues.is_empty());
    }

    #[test]
    fn unsplittable_composite_kept_opaque() {
        let pages = vec![page(
            1,
            &[
                &["Slip", "Tablets Total"],
                &["729000018669", "lots of them"],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        let row = &doc.rows[0];
        assert_eq!(row.get("fused_tablets_total"), Some("lots of them"));
        assert_eq!(row.issues[0].kind, IssueKind::Unsplit);
    }

    #[test]
    fn lead_column_swallowing_neighbour_is_split() {
        let pages = vec![page(
            1,
            &[
                &["Slip", "Tablets", "Total"],
                &["729000018669", "1662, 1674, 1718 3", ""],
            ],
        )];
        let doc = normalizer().normalize(&pages);
        let row = &doc.rows[0];
        assert_eq!(row.get(field::TABLETS), Some("1662, 1674, 1718"));
        assert_eq!(row.get(field::TOTAL_TABLETS), Some("3"));
    }

    fn single_row(header: &[&str], cells: &[&str]) -> NormalizedRow {
        let doc = normalizer().normalize(&[page(1, &[header, cells])]);
        assert_eq!(doc.rows.len(), 1);
        doc.rows.into_iter().next().unwrap()
    }

    #[test]
    fn tablet_list_with_empty_total_is_left_whole() {
        let row = single_row(&["Slip", "Tablets", "Total"], &["729000018669", "1662, 1674 1718", ""]);
        assert_eq!(row.get(field::TABLETS), Some("1662, 1674 1718"));
        assert_eq!(row.get(field::TOTAL_TABLETS), None);

        let row = single_row(&["Slip", "Tablets"], &["729000018669", "1662 1674 1718"]);
        assert_eq!(row.get(field::TABLETS), Some("1662 1674 1718"));
        assert_eq!(row.get(field::TOTAL_TABLETS), None);
    }

    #[test]
    fn open_list_with_mismatched_count_is_left_whole() {
        let row = single_row(
            &["Slip", "Open Tablets", "Total Open"],
            &["729000018669", "1666M, 1708M 5", ""],
        );
        assert_eq!(row.get(field::OPEN_TABLETS), Some("1666M, 1708M 5"));
        assert_eq!(row.get(field::TOTAL_OPEN), None);
    }

    #[test]
    fn customer_name_with_empty_site_is_not_split() {
        for name in ["Delta Construction Group Holdings", "Acme  Builders", "Caribbean Building Corp"] {
            let row = single_row(
                &["Slip", "Customer Name", "Job Site Name"],
                &["729000018669", name, ""],
            );
            assert_eq!(row.get(field::CUSTOMER_NAME), Some(name));
            assert_eq!(row.get(field::JOB_SITE_NAME), None);
            assert!(row.issues.is_empty());
        }
    }

    #[test]
    fn definitive_flag_without_date_is_not_split() {
        let row = single_row(
            &["Slip", "Definitive", "Counted Date"],
            &["729000018669", "Yes pending", ""],
        );
        assert_eq!(row.get(field::DEFINITIVE_FLAG), Some("Yes pending"));
        assert_eq!(row.get(field::COUNTED_DATE), None);

        let row = single_row(
            &["Slip", "Definitive", "Counted Date"],
            &["729000018669", "Yes 9/17/2025", ""],
        );
        assert_eq!(row.get(field::DEFINITIVE_FLAG), Some("Yes"));
        assert_eq!(row.get(field::COUNTED_DATE), Some("9/17/2025"));
    }

    #[test]
    fn unshaped_lead_cells_stay_put() {
        let row = single_row(
            &["WH", "WH Code", "Slip"],
            &["Florida", "", "729000018669"],
        );
        assert_eq!(row.get(field::REGION), Some("Florida"));
        assert_eq!(row.get(field::WAREHOUSE_CODE), None);

        let row = single_row(
            &["Slip", "Next Invoice Date", "Invoice End Date"],
            &["729000018669", "8/31/2025 pending", ""],
        );
        assert_eq!(row.get(field::INVOICE_START_DATE), Some("8/31/2025 pending"));
        assert_eq!(row.get(field::INVOICE_END_DATE), None);
    }
}
