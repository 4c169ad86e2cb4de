use std::fmt;

use tabtrack_core::SnapshotError;

/// Construction-time failure: a configured pattern does not compile.
#[derive(Debug)]
pub enum ExtractError {
    Pattern { name: String, message: String },
}

impl ExtractError {
    pub(crate) fn pattern(name: &str, err: regex::Error) -> Self {
        Self::Pattern {
            name: name.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { name, message } => write!(f, "invalid pattern '{name}': {message}"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// A grid detector could not produce pages for one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// The caller-imposed deadline elapsed.
    Timeout { secs: u64 },
    /// The detector ran but failed.
    Failed(String),
    /// No input for the requested strategy.
    Unavailable(String),
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { secs } => write!(f, "detection timed out after {secs}s"),
            Self::Failed(msg) => write!(f, "detection failed: {msg}"),
            Self::Unavailable(msg) => write!(f, "detection unavailable: {msg}"),
        }
    }
}

impl std::error::Error for DetectError {}

#[derive(Debug)]
pub enum PipelineError {
    /// No strategy produced a page with any rows.
    NoTablesDetected { attempts: Vec<String> },
    /// The pipeline could not be built from the settings.
    Setup(ExtractError),
    /// Extracted records did not form a valid snapshot.
    Snapshot(SnapshotError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTablesDetected { attempts } => {
                write!(f, "no tables detected")?;
                if !attempts.is_empty() {
                    write!(f, " ({})", attempts.join("; "))?;
                }
                Ok(())
            }
            Self::Setup(e) => write!(f, "{e}"),
            Self::Snapshot(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ExtractError> for PipelineError {
    fn from(e: ExtractError) -> Self {
        Self::Setup(e)
    }
}

impl From<SnapshotError> for PipelineError {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}
