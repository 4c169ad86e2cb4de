//! Strategy fallback around normalize → extract → validate → score.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tabtrack_config::{Settings, StrategyParams};
use tabtrack_core::{Confidence, PriorityScorer, Record, Snapshot};

use crate::error::{ExtractError, PipelineError};
use crate::extractor::FieldExtractor;
use crate::grid::PageGrid;
use crate::normalize::Normalizer;
use crate::strategy::GridSource;
use crate::validate::{DocumentDiagnostic, RecordValidator};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    DetectFailed { error: String },
    NoTables,
    Inadequate {
        records: usize,
        extraction_rate: f64,
    },
    Accepted {
        records: usize,
        extraction_rate: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub strategy: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Result of one document: the snapshot plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub snapshot: Snapshot,
    pub diagnostic: DocumentDiagnostic,
    pub attempts: Vec<Attempt>,
}

/// Records and diagnostic from one strategy.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub records: Vec<Record>,
    pub diagnostic: DocumentDiagnostic,
}

impl Candidate {
    fn rank(&self) -> (f64, usize) {
        (self.diagnostic.extraction_rate, self.records.len())
    }

    fn beats(&self, other: &Candidate) -> bool {
        let (a_rate, a_n) = self.rank();
        let (b_rate, b_n) = other.rank();
        a_rate > b_rate || (a_rate == b_rate && a_n > b_n)
    }

    /// Record confidence never exceeds the document's.
    fn cap_confidence(&mut self) {
        let cap = self.diagnostic.confidence;
        for r in &mut self.records {
            r.confidence = r.confidence.min(cap);
        }
        self.diagnostic.by_confidence.clear();
        for r in &self.records {
            *self
                .diagnostic
                .by_confidence
                .entry(r.confidence.to_string())
                .or_insert(0) += 1;
        }
    }
}

pub struct Pipeline {
    normalizer: Normalizer,
    default_window: usize,
    extractor: FieldExtractor,
    validator: RecordValidator,
    scorer: PriorityScorer,
    strategies: Vec<StrategyParams>,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Result<Self, ExtractError> {
        Ok(Self {
            normalizer: Normalizer::new(&settings.normalizer)?,
            default_window: settings.normalizer.header_window,
            extractor: FieldExtractor::new(),
            validator: RecordValidator::new(settings.validation.clone()),
            scorer: PriorityScorer::new(settings.priority.clone()),
            strategies: settings.strategies.clone(),
        })
    }

    /// Replace the configured strategy list.
    pub fn with_strategies(mut self, strategies: Vec<StrategyParams>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &[StrategyParams] {
        &self.strategies
    }

    /// One pass over already-detected pages. `date` is the snapshot date
    /// that ages are measured against.
    pub fn process(&self, pages: &[PageGrid], header_window: usize, date: NaiveDate) -> Candidate {
        let doc = self.normalizer.normalize_with_window(pages, header_window);

        let mut records = Vec::with_capacity(doc.rows.len());
        let mut rejected = Vec::new();
        let mut duplicates = Vec::new();
        let mut seen = HashSet::new();

        for row in &doc.rows {
            match self.extractor.extract(row) {
                Ok(record) => {
                    if !seen.insert(record.slip_id.clone()) {
                        log::warn!(
                            "page {} row {}: duplicate slip {}, keeping the first",
                            row.page,
                            row.row,
                            record.slip_id
                        );
                        duplicates.push(record.slip_id);
                        continue;
                    }
                    records.push(record);
                }
                Err(rejection) => rejected.push(rejection),
            }
        }

        for r in &mut records {
            self.validator.classify(r);
            r.refresh_age(date);
            self.scorer.apply(r);
        }

        let diagnostic = self.validator.diagnose(&doc, &records, rejected, duplicates);
        let mut candidate = Candidate {
            records,
            diagnostic,
        };
        candidate.cap_confidence();
        candidate
    }

    /// Try each strategy in order; the first adequate document wins. When
    /// none is adequate the best attempt is returned marked FAILED.
    pub fn run(&self, source: &dyn GridSource, date: NaiveDate) -> Result<Extraction, PipelineError> {
        let mut attempts = Vec::new();
        let mut best: Option<(String, Candidate)> = None;

        for params in &self.strategies {
            let name = params.name.clone();
            let pages = match source.detect(params) {
                Ok(pages) => pages,
                Err(e) => {
                    log::warn!("strategy '{name}': {e}");
                    attempts.push(Attempt {
                        strategy: name,
                        outcome: AttemptOutcome::DetectFailed {
                            error: e.to_string(),
                        },
                    });
                    continue;
                }
            };
            if pages.iter().all(PageGrid::is_blank) {
                log::warn!("strategy '{name}': no tables detected");
                attempts.push(Attempt {
                    strategy: name,
                    outcome: AttemptOutcome::NoTables,
                });
                continue;
            }

            let window = params.header_window.unwrap_or(self.default_window);
            let mut candidate = self.process(&pages, window, date);
            candidate.diagnostic.strategy = name.clone();
            let records = candidate.records.len();
            let extraction_rate = candidate.diagnostic.extraction_rate;

            if candidate.diagnostic.adequate {
                log::info!(
                    "strategy '{name}' accepted: {records} records, extraction rate {:.1}%",
                    extraction_rate * 100.0
                );
                attempts.push(Attempt {
                    strategy: name,
                    outcome: AttemptOutcome::Accepted {
                        records,
                        extraction_rate,
                    },
                });
                return finish(candidate, attempts, date);
            }

            log::warn!(
                "strategy '{name}' inadequate: {records} records, {} estimated missing",
                candidate.diagnostic.estimated_missing
            );
            attempts.push(Attempt {
                strategy: name.clone(),
                outcome: AttemptOutcome::Inadequate {
                    records,
                    extraction_rate,
                },
            });
            let better = match &best {
                Some((_, current)) => candidate.beats(current),
                None => true,
            };
            if better {
                best = Some((name, candidate));
            }
        }

        match best {
            Some((name, mut candidate)) => {
                log::warn!("no strategy was adequate, keeping best effort from '{name}'");
                candidate.diagnostic.confidence = Confidence::Failed;
                candidate.cap_confidence();
                finish(candidate, attempts, date)
            }
            None => Err(PipelineError::NoTablesDetected {
                attempts: attempts
                    .iter()
                    .map(|a| match &a.outcome {
                        AttemptOutcome::DetectFailed { error } => format!("{}: {error}", a.strategy),
                        _ => format!("{}: no tables", a.strategy),
                    })
                    .collect(),
            }),
        }
    }
}

fn finish(
    candidate: Candidate,
    attempts: Vec<Attempt>,
    date: NaiveDate,
) -> Result<Extraction, PipelineError> {
    let snapshot = Snapshot::new(date, candidate.records).map_err(PipelineError::Snapshot)?;
    Ok(Extraction {
        snapshot,
        diagnostic: candidate.diagnostic,
        attempts,
    })
}
