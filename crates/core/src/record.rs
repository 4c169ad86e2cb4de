use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fields whose loss makes totals impossible to reconcile.
pub const CRITICAL_FIELDS: &[&str] = &["slip_id", "tablets", "total_tablets"];

// ---------------------------------------------------------------------------
// Classifications
// ---------------------------------------------------------------------------

/// How far an extracted record (or document) can be trusted.
///
/// Ordered from least to most trustworthy so `min` caps a record by its
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Failed,
    Partial,
    Perfect,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed => write!(f, "FAILED"),
            Self::Partial => write!(f, "PARTIAL"),
            Self::Perfect => write!(f, "PERFECT"),
        }
    }
}

impl std::str::FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERFECT" => Ok(Self::Perfect),
            "PARTIAL" => Ok(Self::Partial),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown confidence: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBucket {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for PriorityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for PriorityBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority bucket: {other}")),
        }
    }
}

/// Dashboard-style urgency, derived from score and age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    NoData,
    Normal,
    Attention,
    Urgent,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "no_data"),
            Self::Normal => write!(f, "normal"),
            Self::Attention => write!(f, "attention"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    Unparseable,
    NotNumeric,
    Negative,
    UnknownColumn,
    Unsplit,
    TotalMismatch,
    OpenCountMismatch,
    DateOrder,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Unparseable => "unparseable",
            Self::NotNumeric => "not_numeric",
            Self::Negative => "negative",
            Self::UnknownColumn => "unknown_column",
            Self::Unsplit => "unsplit",
            Self::TotalMismatch => "total_mismatch",
            Self::OpenCountMismatch => "open_count_mismatch",
            Self::DateOrder => "date_order",
        }
    }

    /// The raw value was there but could not be turned into a typed value.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            Self::Missing | Self::Unparseable | Self::NotNumeric | Self::Negative | Self::Unsplit
        )
    }

    /// Informational only; never lowers a record below PERFECT.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::UnknownColumn | Self::DateOrder)
    }
}

/// A flag raised against one field of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub kind: IssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One tracked return line item, keyed by `slip_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub slip_id: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub warehouse_code: Option<String>,
    #[serde(default)]
    pub jobsite_id: Option<String>,
    #[serde(default)]
    pub cost_center: Option<String>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub counted_date: Option<NaiveDate>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub job_site_name: Option<String>,
    #[serde(default)]
    pub definitive_flag: bool,
    #[serde(default)]
    pub tablet_ids: Vec<String>,
    #[serde(default)]
    pub open_tablet_ids: Vec<String>,
    #[serde(default)]
    pub total_tablets: Option<u32>,
    #[serde(default)]
    pub total_open: Option<u32>,
    #[serde(default)]
    pub counting_delay_days: Option<u32>,
    #[serde(default)]
    pub validation_delay_days: Option<u32>,

    // Derived
    #[serde(default)]
    pub days_since_return: Option<u32>,
    #[serde(default)]
    pub priority_score: f64,
    #[serde(default)]
    pub priority_bucket: PriorityBucket,
    #[serde(default)]
    pub urgency: Urgency,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldIssue>,
}

impl Record {
    /// A record carrying only its key. Everything else starts null.
    pub fn new(slip_id: impl Into<String>) -> Self {
        Self {
            slip_id: slip_id.into(),
            region: None,
            warehouse_code: None,
            jobsite_id: None,
            cost_center: None,
            return_date: None,
            invoice_start_date: None,
            invoice_end_date: None,
            counted_date: None,
            customer_name: None,
            job_site_name: None,
            definitive_flag: false,
            tablet_ids: Vec::new(),
            open_tablet_ids: Vec::new(),
            total_tablets: None,
            total_open: None,
            counting_delay_days: None,
            validation_delay_days: None,
            days_since_return: None,
            priority_score: 0.0,
            priority_bucket: PriorityBucket::Low,
            urgency: Urgency::NoData,
            confidence: Confidence::Failed,
            issues: Vec::new(),
        }
    }

    pub fn flag(&mut self, field: &str, kind: IssueKind, raw: Option<&str>) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            kind,
            raw: raw.map(str::to_string),
        });
    }

    pub fn is_flagged(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    /// True when a critical field failed to parse or is absent.
    pub fn has_critical_issue(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.kind.is_parse_failure() && CRITICAL_FIELDS.contains(&i.field.as_str()))
    }

    /// True when any field failed to parse.
    pub fn has_parse_issue(&self) -> bool {
        self.issues.iter().any(|i| i.kind.is_parse_failure())
    }

    /// True when some issue other than a warning was raised.
    pub fn needs_review(&self) -> bool {
        self.issues.iter().any(|i| !i.kind.is_warning())
    }

    /// Outstanding tablets: the declared count when present, else the listed open codes.
    pub fn open_count(&self) -> u32 {
        self.total_open
            .unwrap_or(self.open_tablet_ids.len() as u32)
    }

    /// Recompute `days_since_return` against a reference date. Future dates clamp to 0.
    pub fn refresh_age(&mut self, reference: NaiveDate) {
        self.days_since_return = self
            .return_date
            .map(|d| u32::try_from((reference - d).num_days().max(0)).unwrap_or(u32::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_orders_failed_lowest() {
        assert!(Confidence::Failed < Confidence::Partial);
        assert!(Confidence::Partial < Confidence::Perfect);
        assert_eq!(Confidence::Perfect.min(Confidence::Partial), Confidence::Partial);
    }

    #[test]
    fn confidence_display_and_parse() {
        assert_eq!(Confidence::Perfect.to_string(), "PERFECT");
        assert_eq!("partial".parse::<Confidence>().unwrap(), Confidence::Partial);
        assert!("maybe".parse::<Confidence>().is_err());
    }

    #[test]
    fn critical_issue_only_for_critical_fields() {
        let mut r = Record::new("729000018669");
        r.flag("customer_name", IssueKind::Missing, None);
        assert!(!r.has_critical_issue());
        assert!(r.has_parse_issue());

        r.flag("total_tablets", IssueKind::NotNumeric, Some("x"));
        assert!(r.has_critical_issue());
    }

    #[test]
    fn total_mismatch_is_not_a_parse_failure() {
        let mut r = Record::new("1");
        r.flag("total_tablets", IssueKind::TotalMismatch, None);
        assert!(!r.has_critical_issue());
        assert!(r.is_flagged("total_tablets"));
    }

    #[test]
    fn warnings_do_not_need_review() {
        let mut r = Record::new("1");
        r.flag("extra_notes", IssueKind::UnknownColumn, Some("x"));
        r.flag("return_date", IssueKind::DateOrder, None);
        assert!(!r.needs_review());
        r.flag("open_tablets", IssueKind::OpenCountMismatch, None);
        assert!(r.needs_review());
    }

    #[test]
    fn open_count_prefers_declared_total() {
        let mut r = Record::new("1");
        r.open_tablet_ids = vec!["1666M".into(), "1708M".into()];
        assert_eq!(r.open_count(), 2);
        r.total_open = Some(5);
        assert_eq!(r.open_count(), 5);
    }

    #[test]
    fn refresh_age_clamps_future_dates() {
        let mut r = Record::new("1");
        let reference = NaiveDate::from_ymd_opt(2025, 9, 22).unwrap();
        r.return_date = NaiveDate::from_ymd_opt(2025, 9, 2);
        r.refresh_age(reference);
        assert_eq!(r.days_since_return, Some(20));

        r.return_date = NaiveDate::from_ymd_opt(2025, 10, 1);
        r.refresh_age(reference);
        assert_eq!(r.days_since_return, Some(0));

        r.return_date = None;
        r.refresh_age(reference);
        assert_eq!(r.days_since_return, None);
    }

    #[test]
    fn refresh_age_spans_the_whole_calendar() {
        let mut r = Record::new("1");
        r.return_date = Some(NaiveDate::MIN);
        r.refresh_age(NaiveDate::MAX);
        let span = (NaiveDate::MAX - NaiveDate::MIN).num_days();
        assert_eq!(r.days_since_return.map(i64::from), Some(span));

        r.return_date = Some(NaiveDate::MAX);
        r.refresh_age(NaiveDate::MIN);
        assert_eq!(r.days_since_return, Some(0));
    }
}
