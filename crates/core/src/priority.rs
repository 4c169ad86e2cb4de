//! Weighted urgency score per record.
//!
//! `score = Σ weight[f] × normalized(value[f])` over four factors. Normalization
//! clamps to non-negative and applies an optional per-factor cap, so raising
//! one factor under a non-negative weight never lowers the score.

use serde::{Deserialize, Serialize};

use crate::record::{PriorityBucket, Record, Urgency};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    DaysSinceReturn,
    CountingDelay,
    ValidationDelay,
    OpenTablets,
}

impl Factor {
    pub const ALL: [Factor; 4] = [
        Factor::DaysSinceReturn,
        Factor::CountingDelay,
        Factor::ValidationDelay,
        Factor::OpenTablets,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DaysSinceReturn => "days_since_return",
            Self::CountingDelay => "counting_delay",
            Self::ValidationDelay => "validation_delay",
            Self::OpenTablets => "open_tablets",
        }
    }
}

/// Factor weights. Need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityWeights {
    pub days_since_return: f64,
    pub counting_delay: f64,
    pub validation_delay: f64,
    pub open_tablets: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            days_since_return: 0.4,
            counting_delay: 0.3,
            validation_delay: 0.2,
            open_tablets: 0.1,
        }
    }
}

impl PriorityWeights {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::DaysSinceReturn => self.days_since_return,
            Factor::CountingDelay => self.counting_delay,
            Factor::ValidationDelay => self.validation_delay,
            Factor::OpenTablets => self.open_tablets,
        }
    }
}

/// Optional upper bound per factor before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactorCaps {
    pub days_since_return: Option<f64>,
    pub counting_delay: Option<f64>,
    pub validation_delay: Option<f64>,
    pub open_tablets: Option<f64>,
}

impl FactorCaps {
    pub fn get(&self, factor: Factor) -> Option<f64> {
        match factor {
            Factor::DaysSinceReturn => self.days_since_return,
            Factor::CountingDelay => self.counting_delay,
            Factor::ValidationDelay => self.validation_delay,
            Factor::OpenTablets => self.open_tablets,
        }
    }
}

/// Score → bucket boundaries (inclusive lower bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        Self {
            high: 60.0,
            medium: 30.0,
        }
    }
}

/// Urgency thresholds: a level is reached by score OR by days since return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertThresholds {
    pub urgent_score: f64,
    pub urgent_days: u32,
    pub attention_score: f64,
    pub attention_days: u32,
    pub normal_score: f64,
    pub normal_days: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            urgent_score: 35.0,
            urgent_days: 30,
            attention_score: 20.0,
            attention_days: 15,
            normal_score: 10.0,
            normal_days: 7,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriorityConfig {
    pub weights: PriorityWeights,
    pub caps: FactorCaps,
    pub buckets: BucketThresholds,
    pub alerts: AlertThresholds,
}

impl PriorityConfig {
    pub fn validate(&self) -> Result<(), String> {
        for factor in Factor::ALL {
            let w = self.weights.get(factor);
            if !w.is_finite() {
                return Err(format!("weight '{}' must be finite", factor.name()));
            }
            if let Some(cap) = self.caps.get(factor) {
                if !(cap.is_finite() && cap >= 0.0) {
                    return Err(format!("cap '{}' must be a non-negative number", factor.name()));
                }
            }
        }
        if self.buckets.high < self.buckets.medium {
            return Err(format!(
                "bucket threshold high ({}) is below medium ({})",
                self.buckets.high, self.buckets.medium
            ));
        }
        let a = &self.alerts;
        if a.urgent_score < a.attention_score || a.attention_score < a.normal_score {
            return Err("alert score thresholds must satisfy urgent >= attention >= normal".into());
        }
        if a.urgent_days < a.attention_days || a.attention_days < a.normal_days {
            return Err("alert day thresholds must satisfy urgent >= attention >= normal".into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    config: PriorityConfig,
}

impl PriorityScorer {
    pub fn new(config: PriorityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PriorityConfig {
        &self.config
    }

    /// Raw factor value read off a record. Null inputs count as 0.
    pub fn factor_value(record: &Record, factor: Factor) -> f64 {
        match factor {
            Factor::DaysSinceReturn => record.days_since_return.unwrap_or(0) as f64,
            Factor::CountingDelay => record.counting_delay_days.unwrap_or(0) as f64,
            Factor::ValidationDelay => record.validation_delay_days.unwrap_or(0) as f64,
            Factor::OpenTablets => record.open_count() as f64,
        }
    }

    fn normalized(&self, value: f64, factor: Factor) -> f64 {
        let v = value.max(0.0);
        match self.config.caps.get(factor) {
            Some(cap) => v.min(cap),
            None => v,
        }
    }

    pub fn score(&self, record: &Record) -> f64 {
        Factor::ALL
            .iter()
            .map(|&f| self.config.weights.get(f) * self.normalized(Self::factor_value(record, f), f))
            .sum()
    }

    pub fn bucket(&self, score: f64) -> PriorityBucket {
        if score >= self.config.buckets.high {
            PriorityBucket::High
        } else if score >= self.config.buckets.medium {
            PriorityBucket::Medium
        } else {
            PriorityBucket::Low
        }
    }

    pub fn urgency(&self, record: &Record, score: f64) -> Urgency {
        let a = &self.config.alerts;
        let days = match record.days_since_return {
            Some(d) => d,
            None if score < a.normal_score => return Urgency::NoData,
            None => 0,
        };
        if score >= a.urgent_score || days >= a.urgent_days {
            Urgency::Urgent
        } else if score >= a.attention_score || days >= a.attention_days {
            Urgency::Attention
        } else {
            Urgency::Normal
        }
    }

    /// Write score, bucket and urgency onto the record.
    pub fn apply(&self, record: &mut Record) {
        let score = self.score(record);
        record.priority_score = score;
        record.priority_bucket = self.bucket(score);
        record.urgency = self.urgency(record, score);
    }
}
