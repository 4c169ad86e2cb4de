// Application settings
// Loaded from ~/.config/tabtrack/tabtrack.toml (or --config)

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabtrack_core::PriorityConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read.
    Io { path: PathBuf, message: String },
    /// TOML parse / deserialization error.
    Parse(String),
    /// Values parsed but are inconsistent.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Confidence tolerances and document-level adequacy limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSettings {
    /// Absolute slack between declared and listed tablet counts.
    pub tolerance_units: u32,
    /// Relative slack, as a fraction of the declared total.
    pub tolerance_pct: f64,
    /// Most rows a document may be missing (by slip sequence) and still be adequate.
    pub max_missing_rows: usize,
    /// Slip jumps wider than this are range breaks, not missing rows.
    pub max_gap_span: u64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            tolerance_units: 1,
            tolerance_pct: 0.0,
            max_missing_rows: 2,
            max_gap_span: 5,
        }
    }
}

impl ValidationSettings {
    /// Whether `declared` and `found` agree within either tolerance.
    pub fn within_tolerance(&self, declared: u64, found: u64) -> bool {
        let diff = declared.abs_diff(found);
        if diff <= self.tolerance_units as u64 {
            return true;
        }
        self.tolerance_pct > 0.0 && (diff as f64) <= self.tolerance_pct * declared as f64
    }
}

/// Page geometry handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerSettings {
    /// Leading physical rows that may hold (split) headers.
    pub header_window: usize,
    /// Regex for a slip-shaped token; marks a row as data.
    pub slip_pattern: String,
    /// A wrapped continuation row has at most this many non-empty cells.
    pub continuation_max_cells: usize,
    /// Rows whose joined text matches any of these are skipped.
    pub ignore_patterns: Vec<String>,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            header_window: 3,
            slip_pattern: r"\d{9,}".into(),
            continuation_max_cells: 2,
            ignore_patterns: vec![
                r"(?i)^\s*page\s+\d+(\s+of\s+\d+)?\s*$".into(),
                r"(?i)^\s*printed\s+(on|by)\b".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendSettings {
    /// Most recent intervals considered for the label.
    pub window: usize,
    /// Pending change per interval must exceed this to count as movement.
    pub stability_threshold: f64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            window: 3,
            stability_threshold: 0.0,
        }
    }
}

/// One grid-detection attempt. Values are opaque tuning for the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyParams {
    pub name: String,
    /// Minimum run of spaces that separates two columns in layout text.
    #[serde(default = "default_column_gap")]
    pub column_gap: usize,
    /// Overrides `normalizer.header_window` for this strategy.
    #[serde(default)]
    pub header_window: Option<usize>,
    /// Callers abandon the detector after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Free-form parameters for external detectors.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

fn default_column_gap() -> usize {
    2
}

impl StrategyParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_gap: default_column_gap(),
            header_window: None,
            timeout_secs: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_column_gap(mut self, gap: usize) -> Self {
        self.column_gap = gap;
        self
    }
}

fn default_strategies() -> Vec<StrategyParams> {
    vec![
        StrategyParams {
            timeout_secs: Some(60),
            ..StrategyParams::named("tight").with_column_gap(2)
        },
        StrategyParams {
            timeout_secs: Some(60),
            ..StrategyParams::named("loose").with_column_gap(3)
        },
    ]
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub priority: PriorityConfig,
    pub validation: ValidationSettings,
    pub normalizer: NormalizerSettings,
    pub trend: TrendSettings,
    pub strategies: Vec<StrategyParams>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            priority: PriorityConfig::default(),
            validation: ValidationSettings::default(),
            normalizer: NormalizerSettings::default(),
            trend: TrendSettings::default(),
            strategies: default_strategies(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabtrack")
            .join("tabtrack.toml")
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&input)
    }

    /// An explicit path must exist. Without one, the default path is tried
    /// and built-in defaults are used when it is absent.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = Self::default_path();
        if path.exists() {
            log::debug!("loading settings from {}", path.display());
            Self::load(&path)
        } else {
            log::debug!("no settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.priority.validate().map_err(ConfigError::Validation)?;

        let v = &self.validation;
        if !(0.0..=1.0).contains(&v.tolerance_pct) {
            return Err(ConfigError::Validation(format!(
                "validation.tolerance_pct must be within 0..=1, got {}",
                v.tolerance_pct
            )));
        }
        if v.max_gap_span < 2 {
            return Err(ConfigError::Validation(
                "validation.max_gap_span must be at least 2".into(),
            ));
        }

        if self.normalizer.header_window == 0 {
            return Err(ConfigError::Validation(
                "normalizer.header_window must be at least 1".into(),
            ));
        }
        if self.normalizer.slip_pattern.trim().is_empty() {
            return Err(ConfigError::Validation(
                "normalizer.slip_pattern must not be empty".into(),
            ));
        }

        if self.trend.window == 0 {
            return Err(ConfigError::Validation("trend.window must be at least 1".into()));
        }
        if !(self.trend.stability_threshold.is_finite() && self.trend.stability_threshold >= 0.0) {
            return Err(ConfigError::Validation(
                "trend.stability_threshold must be a non-negative number".into(),
            ));
        }

        if self.strategies.is_empty() {
            return Err(ConfigError::Validation(
                "at least one extraction strategy is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for s in &self.strategies {
            if !seen.insert(s.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate strategy name '{}'",
                    s.name
                )));
            }
            if s.column_gap == 0 {
                return Err(ConfigError::Validation(format!(
                    "strategy '{}': column_gap must be at least 1",
                    s.name
                )));
            }
            if s.header_window == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "strategy '{}': header_window must be at least 1",
                    s.name
                )));
            }
        }
        Ok(())
    }

    /// Header window for one strategy, falling back to the normalizer default.
    pub fn header_window_for(&self, strategy: &StrategyParams) -> usize {
        strategy.header_window.unwrap_or(self.normalizer.header_window)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
