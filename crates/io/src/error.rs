use std::fmt;
use std::path::{Path, PathBuf};

use tabtrack_core::SnapshotError;

#[derive(Debug)]
pub enum IoError {
    /// Reading or writing a file failed.
    File { path: PathBuf, message: String },
    /// The file exists but its contents are not what was expected.
    Format { path: PathBuf, message: String },
    /// File type not recognized from its extension.
    Unsupported { path: PathBuf },
    /// Rows read from a file did not form a snapshot.
    Snapshot(SnapshotError),
    /// No snapshot date could be determined.
    NoDate { path: PathBuf },
}

impl IoError {
    pub(crate) fn file(path: &Path, err: impl fmt::Display) -> Self {
        Self::File {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn format(path: &Path, err: impl fmt::Display) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Format { path, message } => {
                write!(f, "{}: invalid contents: {message}", path.display())
            }
            Self::Unsupported { path } => {
                write!(f, "{}: unsupported file type", path.display())
            }
            Self::Snapshot(e) => write!(f, "{e}"),
            Self::NoDate { path } => {
                write!(f, "{}: cannot determine snapshot date", path.display())
            }
        }
    }
}

impl std::error::Error for IoError {}

impl From<SnapshotError> for IoError {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}
