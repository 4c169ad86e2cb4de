//! Confidence at two levels: each record against its own declared totals,
//! and the document against slip continuity and Total-row sums.

use std::collections::BTreeMap;

use serde::Serialize;
use tabtrack_config::ValidationSettings;
use tabtrack_core::{Confidence, IssueKind, Record};

use crate::extractor::RowRejection;
use crate::headers::field::*;
use crate::normalize::NormalizedDocument;

/// A hole in the numeric slip sequence small enough to mean lost rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceGap {
    pub after: u64,
    pub before: u64,
    pub missing: u64,
}

/// A Total-row figure against the sum over extracted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalCheck {
    pub field: String,
    pub declared: u64,
    pub extracted: u64,
    pub reconciled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDiagnostic {
    pub strategy: String,
    pub pages: usize,
    /// Data rows handed to the extractor.
    pub rows_seen: usize,
    pub records: usize,
    pub rejected_rows: Vec<RowRejection>,
    pub duplicate_slips: Vec<String>,
    pub sequence_gaps: Vec<SequenceGap>,
    /// Jumps wider than the gap span; treated as separate slip ranges.
    pub range_breaks: usize,
    pub estimated_missing: u64,
    pub extraction_rate: f64,
    pub totals: Vec<TotalCheck>,
    pub unknown_columns: Vec<String>,
    pub merged_columns: Vec<String>,
    pub header_missing_pages: Vec<usize>,
    pub by_confidence: BTreeMap<String, usize>,
    pub confidence: Confidence,
    pub adequate: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    settings: ValidationSettings,
}

impl RecordValidator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    /// Raise count mismatches and set `record.confidence`.
    pub fn classify(&self, record: &mut Record) -> Confidence {
        let listed = record.tablet_ids.len() as u64;
        let declared = record.total_tablets.map(u64::from);

        if let Some(total) = declared {
            if total != listed {
                record.flag(
                    TOTAL_TABLETS,
                    IssueKind::TotalMismatch,
                    Some(&format!("declared {total}, listed {listed}")),
                );
            }
        }
        if let Some(open_total) = record.total_open {
            let open_listed = record.open_tablet_ids.len() as u64;
            if open_listed > 0
                && !self
                    .settings
                    .within_tolerance(u64::from(open_total), open_listed)
            {
                record.flag(
                    OPEN_TABLETS,
                    IssueKind::OpenCountMismatch,
                    Some(&format!("declared {open_total}, listed {open_listed}")),
                );
            }
        }

        let confidence = match declared {
            _ if record.has_critical_issue() => Confidence::Failed,
            None => Confidence::Failed,
            Some(total) if total == listed && !record.needs_review() => Confidence::Perfect,
            Some(total) if self.settings.within_tolerance(total, listed) => Confidence::Partial,
            Some(_) => Confidence::Failed,
        };
        record.confidence = confidence;
        confidence
    }

    pub fn diagnose(
        &self,
        doc: &NormalizedDocument,
        records: &[Record],
        rejected_rows: Vec<RowRejection>,
        duplicate_slips: Vec<String>,
    ) -> DocumentDiagnostic {
        let (sequence_gaps, range_breaks) = self.sequence_gaps(records);
        let estimated_missing: u64 = sequence_gaps.iter().map(|g| g.missing).sum();
        let rows_seen = records.len() + rejected_rows.len() + duplicate_slips.len();

        let expected = rows_seen as f64 + estimated_missing as f64;
        let extraction_rate = if expected > 0.0 {
            records.len() as f64 / expected
        } else {
            0.0
        };

        let totals: Vec<TotalCheck> = doc
            .declared_totals
            .iter()
            .map(|(field, &declared)| {
                let extracted = extracted_total(records, field);
                TotalCheck {
                    field: field.clone(),
                    declared,
                    extracted,
                    reconciled: self.settings.within_tolerance(declared, extracted),
                }
            })
            .collect();

        let mut by_confidence = BTreeMap::new();
        for r in records {
            *by_confidence.entry(r.confidence.to_string()).or_insert(0) += 1;
        }

        let adequate = !records.is_empty()
            && estimated_missing <= self.settings.max_missing_rows as u64
            && totals.iter().all(|t| t.reconciled);
        let exact = estimated_missing == 0
            && rejected_rows.is_empty()
            && totals.iter().all(|t| t.declared == t.extracted);
        let confidence = match (adequate, exact) {
            (false, _) => Confidence::Failed,
            (true, true) => Confidence::Perfect,
            (true, false) => Confidence::Partial,
        };

        DocumentDiagnostic {
            strategy: String::new(),
            pages: doc.pages,
            rows_seen,
            records: records.len(),
            rejected_rows,
            duplicate_slips,
            sequence_gaps,
            range_breaks,
            estimated_missing,
            extraction_rate,
            totals,
            unknown_columns: doc.unknown_columns.iter().cloned().collect(),
            merged_columns: doc.merged_columns.iter().cloned().collect(),
            header_missing_pages: doc.header_missing_pages.clone(),
            by_confidence,
            confidence,
            adequate,
        }
    }

    /// Gaps among numeric slip ids. Non-numeric slips do not take part.
    fn sequence_gaps(&self, records: &[Record]) -> (Vec<SequenceGap>, usize) {
        let mut slips: Vec<u64> = records
            .iter()
            .filter_map(|r| r.slip_id.parse::<u64>().ok())
            .collect();
        slips.sort_unstable();
        slips.dedup();

        let mut gaps = Vec::new();
        let mut breaks = 0;
        for pair in slips.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let span = b - a;
            if span <= 1 {
                continue;
            }
            if span > self.settings.max_gap_span {
                breaks += 1;
                continue;
            }
            gaps.push(SequenceGap {
                after: a,
                before: b,
                missing: span - 1,
            });
        }
        (gaps, breaks)
    }
}

fn extracted_total(records: &[Record], field: &str) -> u64 {
    records
        .iter()
        .filter_map(|r| match field {
            TOTAL_TABLETS => r.total_tablets,
            TOTAL_OPEN => r.total_open,
            COUNTING_DELAY_DAYS => r.counting_delay_days,
            VALIDATION_DELAY_DAYS => r.validation_delay_days,
            _ => None,
        })
        .map(u64::from)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slip: &str, tablets: &[&str], total: Option<u32>) -> Record {
        let mut r = Record::new(slip);
        r.tablet_ids = tablets.iter().map(|t| t.to_string()).collect();
        r.total_tablets = total;
        r
    }

    fn validator() -> RecordValidator {
        RecordValidator::default()
    }

    #[test]
    fn exact_totals_are_perfect() {
        let mut r = record("1", &["1662", "1674", "1718"], Some(3));
        assert_eq!(validator().classify(&mut r), Confidence::Perfect);
        assert!(r.issues.is_empty());
    }

    #[test]
    fn off_by_tolerance_is_partial() {
        let mut r = record("1", &["1662", "1674"], Some(3));
        assert_eq!(validator().classify(&mut r), Confidence::Partial);
        assert_eq!(r.issues[0].kind, IssueKind::TotalMismatch);
    }

    #[test]
    fn beyond_tolerance_is_failed() {
        let mut r = record("1", &["1662"], Some(3));
        assert_eq!(validator().classify(&mut r), Confidence::Failed);
    }

    #[test]
    fn percentage_tolerance() {
        let v = RecordValidator::new(ValidationSettings {
            tolerance_units: 0,
            tolerance_pct: 0.5,
            ..ValidationSettings::default()
        });
        let mut r = record("1", &["1", "2"], Some(3));
        assert_eq!(v.classify(&mut r), Confidence::Partial);
    }

    #[test]
    fn non_critical_flag_is_partial_even_when_totals_match() {
        let mut r = record("1", &["1662"], Some(1));
        r.flag(COUNTING_DELAY_DAYS, IssueKind::NotNumeric, Some("x"));
        assert_eq!(validator().classify(&mut r), Confidence::Partial);
    }

    #[test]
    fn warnings_keep_perfect() {
        let mut r = record("1", &["1662"], Some(1));
        r.flag(RETURN_DATE, IssueKind::DateOrder, None);
        assert_eq!(validator().classify(&mut r), Confidence::Perfect);
    }

    #[test]
    fn critical_flag_is_failed() {
        let mut r = record("1", &["1662"], Some(1));
        r.flag(TABLETS, IssueKind::Unparseable, Some("1-2"));
        assert_eq!(validator().classify(&mut r), Confidence::Failed);
    }

    #[test]
    fn open_count_mismatch_flagged() {
        let mut r = record("1", &["1", "2", "3"], Some(3));
        r.open_tablet_ids = vec!["1M".into()];
        r.total_open = Some(3);
        assert_eq!(validator().classify(&mut r), Confidence::Partial);
        assert!(r.is_flagged(OPEN_TABLETS));
    }

    fn doc_with_totals(totals: &[(&str, u64)]) -> NormalizedDocument {
        NormalizedDocument {
            pages: 1,
            declared_totals: totals.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..NormalizedDocument::default()
        }
    }

    fn classified(slips: &[&str]) -> Vec<Record> {
        slips
            .iter()
            .map(|s| {
                let mut r = record(s, &["1"], Some(1));
                validator().classify(&mut r);
                r
            })
            .collect()
    }

    #[test]
    fn contiguous_document_is_perfect() {
        let records = classified(&["729000018669", "729000018670", "729000018671"]);
        let d = validator().diagnose(
            &doc_with_totals(&[(TOTAL_TABLETS, 3)]),
            &records,
            vec![],
            vec![],
        );
        assert!(d.adequate);
        assert_eq!(d.confidence, Confidence::Perfect);
        assert_eq!(d.extraction_rate, 1.0);
        assert!(d.totals[0].reconciled);
        assert_eq!(d.by_confidence["PERFECT"], 3);
    }

    #[test]
    fn small_gaps_estimate_missing_rows() {
        let records = classified(&["100", "101", "104", "105", "900"]);
        let d = validator().diagnose(&doc_with_totals(&[]), &records, vec![], vec![]);
        assert_eq!(
            d.sequence_gaps,
            vec![SequenceGap {
                after: 101,
                before: 104,
                missing: 2
            }]
        );
        assert_eq!(d.range_breaks, 1);
        assert_eq!(d.estimated_missing, 2);
        assert!(d.adequate);
        assert_eq!(d.confidence, Confidence::Partial);
        assert!((d.extraction_rate - 5.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn too_many_missing_is_inadequate() {
        let records = classified(&["100", "104", "108"]);
        let d = validator().diagnose(&doc_with_totals(&[]), &records, vec![], vec![]);
        assert_eq!(d.estimated_missing, 6);
        assert!(!d.adequate);
        assert_eq!(d.confidence, Confidence::Failed);
    }

    #[test]
    fn declared_total_mismatch_is_inadequate() {
        let records = classified(&["100", "101"]);
        let d = validator().diagnose(
            &doc_with_totals(&[(TOTAL_TABLETS, 9)]),
            &records,
            vec![],
            vec![],
        );
        assert!(!d.totals[0].reconciled);
        assert_eq!(d.totals[0].extracted, 2);
        assert!(!d.adequate);
    }

    #[test]
    fn rejected_rows_lower_rate() {
        let records = classified(&["100"]);
        let rejected = vec![RowRejection {
            page: 1,
            row: 3,
            reason: "missing slip_id".into(),
        }];
        let d = validator().diagnose(&doc_with_totals(&[]), &records, rejected, vec![]);
        assert_eq!(d.rows_seen, 2);
        assert_eq!(d.extraction_rate, 0.5);
        assert_eq!(d.confidence, Confidence::Partial);
    }

    #[test]
    fn empty_document_is_inadequate() {
        let d = validator().diagnose(&doc_with_totals(&[]), &[], vec![], vec![]);
        assert!(!d.adequate);
        assert_eq!(d.extraction_rate, 0.0);
    }
}
