//! Normalized row → candidate [`Record`].

use chrono::NaiveDate;
use serde::Serialize;
use tabtrack_core::{IssueKind, Record};

use crate::fields::{
    base_code, collapse_whitespace, is_open_code, normalize_code, parse_count, parse_date,
    parse_flag, parse_tablets, CountError, Parsed,
};
use crate::headers::field::*;
use crate::headers::is_canonical;
use crate::normalize::NormalizedRow;

/// A row that could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub page: usize,
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Only a missing key rejects the row; every other problem becomes a
    /// null field plus a flag on the record.
    pub fn extract(&self, row: &NormalizedRow) -> Result<Record, RowRejection> {
        let slip_id = row.get(SLIP_ID).and_then(normalize_code).ok_or_else(|| {
            log::warn!("page {} row {}: missing slip_id, row dropped", row.page, row.row);
            RowRejection {
                page: row.page,
                row: row.row,
                reason: "missing slip_id".into(),
            }
        })?;

        let mut r = Record::new(slip_id);
        r.issues.extend(row.issues.iter().cloned());

        for (name, raw) in &row.fields {
            match name.as_str() {
                SLIP_ID | TABLETS | OPEN_TABLETS => {}
                REGION => r.region = normalize_code(raw),
                WAREHOUSE_CODE => r.warehouse_code = normalize_code(raw),
                JOBSITE_ID => r.jobsite_id = normalize_code(raw),
                COST_CENTER => r.cost_center = normalize_code(raw),
                RETURN_DATE => r.return_date = date(&mut r, name, raw),
                INVOICE_START_DATE => r.invoice_start_date = date(&mut r, name, raw),
                INVOICE_END_DATE => r.invoice_end_date = date(&mut r, name, raw),
                COUNTED_DATE => r.counted_date = date(&mut r, name, raw),
                CUSTOMER_NAME => r.customer_name = collapse_whitespace(raw),
                JOB_SITE_NAME => r.job_site_name = collapse_whitespace(raw),
                DEFINITIVE_FLAG => {
                    r.definitive_flag = match parse_flag(raw) {
                        Parsed::Value(v) => v,
                        Parsed::Absent => false,
                        Parsed::Invalid => {
                            r.flag(name, IssueKind::Unparseable, Some(raw));
                            false
                        }
                    }
                }
                TOTAL_TABLETS => r.total_tablets = count(&mut r, name, raw),
                TOTAL_OPEN => r.total_open = count(&mut r, name, raw),
                COUNTING_DELAY_DAYS => r.counting_delay_days = count(&mut r, name, raw),
                VALIDATION_DELAY_DAYS => r.validation_delay_days = count(&mut r, name, raw),
                // Already flagged as unsplit by the normalizer.
                other if other.starts_with("fused_") => {}
                other => {
                    debug_assert!(!is_canonical(other));
                    r.flag(other, IssueKind::UnknownColumn, Some(raw));
                }
            }
        }

        self.tablets(row, &mut r);
        flag_missing_critical(&mut r);
        check_date_order(&mut r);
        Ok(r)
    }

    /// `tablet_ids` holds base codes from both lists in first-seen order;
    /// `open_tablet_ids` keeps the suffixed codes.
    fn tablets(&self, row: &NormalizedRow, r: &mut Record) {
        let listed = row.get(TABLETS).map(parse_tablets).unwrap_or_default();
        let open = row.get(OPEN_TABLETS).map(parse_tablets).unwrap_or_default();

        for bad in &listed.rejected {
            r.flag(TABLETS, IssueKind::Unparseable, Some(bad));
        }
        for bad in &open.rejected {
            r.flag(OPEN_TABLETS, IssueKind::Unparseable, Some(bad));
        }

        for code in &listed.codes {
            push_unique(&mut r.tablet_ids, base_code(code));
            if is_open_code(code) {
                push_unique(&mut r.open_tablet_ids, code);
            }
        }
        for code in &open.codes {
            push_unique(&mut r.open_tablet_ids, code);
            push_unique(&mut r.tablet_ids, base_code(code));
        }
    }
}

fn push_unique(list: &mut Vec<String>, code: &str) {
    if !list.iter().any(|c| c == code) {
        list.push(code.to_string());
    }
}

fn date(r: &mut Record, name: &str, raw: &str) -> Option<NaiveDate> {
    match parse_date(raw) {
        Parsed::Value(d) => Some(d),
        Parsed::Absent => None,
        Parsed::Invalid => {
            r.flag(name, IssueKind::Unparseable, Some(raw));
            None
        }
    }
}

fn count(r: &mut Record, name: &str, raw: &str) -> Option<u32> {
    match parse_count(raw) {
        Ok(v) => v,
        Err(CountError::Negative) => {
            r.flag(name, IssueKind::Negative, Some(raw));
            None
        }
        Err(CountError::NotNumeric) => {
            r.flag(name, IssueKind::NotNumeric, Some(raw));
            None
        }
    }
}

/// A declared total of 0 with no listed tablets is consistent.
fn flag_missing_critical(r: &mut Record) {
    if r.total_tablets.is_none() && !r.is_flagged(TOTAL_TABLETS) {
        r.flag(TOTAL_TABLETS, IssueKind::Missing, None);
    }
    if r.tablet_ids.is_empty() && r.total_tablets != Some(0) && !r.is_flagged(TABLETS) {
        r.flag(TABLETS, IssueKind::Missing, None);
    }
}

fn check_date_order(r: &mut Record) {
    if let (Some(ret), Some(end)) = (r.return_date, r.invoice_end_date) {
        if ret > end {
            log::warn!(
                "slip {}: return date {ret} is after invoice end {end}",
                r.slip_id
            );
            r.flag(RETURN_DATE, IssueKind::DateOrder, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(cells: &[(&str, &str)]) -> NormalizedRow {
        NormalizedRow {
            page: 1,
            row: 4,
            fields: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            issues: Vec::new(),
        }
    }

    fn full_row() -> NormalizedRow {
        row(&[
            (REGION, "FL"),
            (WAREHOUSE_CODE, "61d"),
            (SLIP_ID, "729000018669"),
            (RETURN_DATE, "9/2/2025"),
            (JOBSITE_ID, "40037739"),
            (COST_CENTER, "fl053"),
            (INVOICE_START_DATE, "8/31/2025"),
            (INVOICE_END_DATE, "9/30/2025"),
            (CUSTOMER_NAME, "3c Construction   Corp"),
            (JOB_SITE_NAME, "Biscayne Bay"),
            (DEFINITIVE_FLAG, "No"),
            (TABLETS, "81, 134, 1666, 1708"),
            (TOTAL_TABLETS, "4"),
            (OPEN_TABLETS, "1666M, 1708M"),
            (TOTAL_OPEN, "2"),
            (COUNTING_DELAY_DAYS, "15"),
            (VALIDATION_DELAY_DAYS, "0"),
        ])
    }

    #[test]
    fn full_row_extracts_every_field() {
        let r = FieldExtractor::new().extract(&full_row()).unwrap();
        assert_eq!(r.slip_id, "729000018669");
        assert_eq!(r.region.as_deref(), Some("FL"));
        assert_eq!(r.warehouse_code.as_deref(), Some("61D"));
        assert_eq!(r.cost_center.as_deref(), Some("FL053"));
        assert_eq!(r.return_date, NaiveDate::from_ymd_opt(2025, 9, 2));
        assert_eq!(r.invoice_end_date, NaiveDate::from_ymd_opt(2025, 9, 30));
        assert_eq!(r.customer_name.as_deref(), Some("3c Construction Corp"));
        assert!(!r.definitive_flag);
        assert_eq!(r.tablet_ids, vec!["81", "134", "1666", "1708"]);
        assert_eq!(r.open_tablet_ids, vec!["1666M", "1708M"]);
        assert_eq!(r.total_tablets, Some(4));
        assert_eq!(r.total_open, Some(2));
        assert_eq!(r.counting_delay_days, Some(15));
        assert_eq!(r.validation_delay_days, Some(0));
        assert!(r.issues.is_empty(), "{:?}", r.issues);
    }

    #[test]
    fn missing_slip_rejects_row() {
        let err = FieldExtractor::new()
            .extract(&row(&[(TABLETS, "1"), (SLIP_ID, "  ")]))
            .unwrap_err();
        assert_eq!(err.row, 4);
        assert_eq!(err.reason, "missing slip_id");
    }

    #[test]
    fn bad_values_degrade_to_null_and_flag() {
        let r = FieldExtractor::new()
            .extract(&row(&[
                (SLIP_ID, "729000018670"),
                (RETURN_DATE, "someday"),
                (COUNTING_DELAY_DAYS, "-3"),
                (VALIDATION_DELAY_DAYS, "n/a days"),
                (TABLETS, "1662"),
                (TOTAL_TABLETS, "1"),
                ("driver_notes", "gate"),
            ]))
            .unwrap();
        assert_eq!(r.return_date, None);
        assert_eq!(r.counting_delay_days, None);
        let kinds: Vec<(&str, IssueKind)> =
            r.issues.iter().map(|i| (i.field.as_str(), i.kind)).collect();
        assert!(kinds.contains(&(RETURN_DATE, IssueKind::Unparseable)));
        assert!(kinds.contains(&(COUNTING_DELAY_DAYS, IssueKind::Negative)));
        assert!(kinds.contains(&(VALIDATION_DELAY_DAYS, IssueKind::NotNumeric)));
        assert!(kinds.contains(&("driver_notes", IssueKind::UnknownColumn)));
        assert!(!r.has_critical_issue());
    }

    #[test]
    fn missing_totals_are_critical() {
        let r = FieldExtractor::new()
            .extract(&row(&[(SLIP_ID, "729000018671")]))
            .unwrap();
        assert!(r.is_flagged(TOTAL_TABLETS));
        assert!(r.is_flagged(TABLETS));
        assert!(r.has_critical_issue());
    }

    #[test]
    fn zero_total_with_no_tablets_is_consistent() {
        let r = FieldExtractor::new()
            .extract(&row(&[(SLIP_ID, "729000018672"), (TOTAL_TABLETS, "0")]))
            .unwrap();
        assert!(r.issues.is_empty());
    }

    #[test]
    fn open_codes_in_tablet_list() {
        let r = FieldExtractor::new()
            .extract(&row(&[
                (SLIP_ID, "729000018673"),
                (TABLETS, "1662, 1674M"),
                (TOTAL_TABLETS, "2"),
            ]))
            .unwrap();
        assert_eq!(r.tablet_ids, vec!["1662", "1674"]);
        assert_eq!(r.open_tablet_ids, vec!["1674M"]);
    }

    #[test]
    fn return_after_invoice_end_is_flagged_not_fatal() {
        let r = FieldExtractor::new()
            .extract(&row(&[
                (SLIP_ID, "729000018674"),
                (RETURN_DATE, "10/5/2025"),
                (INVOICE_END_DATE, "9/30/2025"),
                (TABLETS, "1"),
                (TOTAL_TABLETS, "1"),
            ]))
            .unwrap();
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].kind, IssueKind::DateOrder);
        assert!(!r.needs_review());
    }

    #[test]
    fn wrapped_yes_reads_true() {
        let r = FieldExtractor::new()
            .extract(&row(&[(SLIP_ID, "729000018675"), (DEFINITIVE_FLAG, "Ye s")]))
            .unwrap();
        assert!(r.definitive_flag);
    }
}
