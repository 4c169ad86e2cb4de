//! PDF grid detection through `pdftotext -layout`.
//!
//! The text layer is extracted once and cached; every strategy then splits the
//! same text with its own column gap. A strategy's `timeout_secs` bounds the
//! external call, and an expired deadline becomes [`DetectError::Timeout`] so
//! the pipeline moves on to the next strategy.

use std::cell::OnceCell;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tabtrack_config::StrategyParams;
use tabtrack_extract::{DetectError, GridSource, LayoutTextSource, PageGrid};

use crate::exit_codes::EXIT_EXTRACT_TOOL;
use crate::CliError;

const POLL: Duration = Duration::from_millis(50);

pub struct PdfSource {
    path: PathBuf,
    text: OnceCell<LayoutTextSource>,
}

impl PdfSource {
    /// Fails early when `pdftotext` is not on PATH.
    pub fn new(path: &Path) -> Result<Self, CliError> {
        which::which("pdftotext").map_err(|_| CliError {
            code: EXIT_EXTRACT_TOOL,
            message: "pdftotext not installed (poppler-utils)".to_string(),
            hint: Some("Install with: apt install poppler-utils / brew install poppler".to_string()),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            text: OnceCell::new(),
        })
    }

    fn layout(&self, timeout: Option<Duration>) -> Result<&LayoutTextSource, DetectError> {
        if let Some(source) = self.text.get() {
            return Ok(source);
        }
        let mut cmd = Command::new("pdftotext");
        cmd.arg("-layout").arg(&self.path).arg("-");
        let stdout = run_captured(cmd, timeout)?;
        let text = String::from_utf8_lossy(&stdout).into_owned();
        log::debug!("{}: {} bytes of text", self.path.display(), text.len());
        Ok(self.text.get_or_init(|| LayoutTextSource::new(text)))
    }
}

impl GridSource for PdfSource {
    fn detect(&self, params: &StrategyParams) -> Result<Vec<PageGrid>, DetectError> {
        let timeout = params.timeout_secs.map(Duration::from_secs);
        self.layout(timeout)?.detect(params)
    }
}

fn drain<R: Read + Send + 'static>(reader: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut r) = reader {
            let _ = r.read_to_end(&mut buf);
        }
        buf
    })
}

/// Run `cmd` to completion and return its stdout. A non-zero exit is
/// `Failed` with the child's stderr; an expired deadline kills the child.
pub(crate) fn run_captured(mut cmd: Command, timeout: Option<Duration>) -> Result<Vec<u8>, DetectError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DetectError::Failed(format!("failed to run {program}: {e}")))?;

    // Drained on threads: a full pipe would stall the child.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if let Some(limit) = timeout {
                    if started.elapsed() > limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        log::warn!("{program} killed after {}s", limit.as_secs());
                        return Err(DetectError::Timeout {
                            secs: limit.as_secs(),
                        });
                    }
                }
                thread::sleep(POLL);
            }
            Err(e) => return Err(DetectError::Failed(format!("wait for {program} failed: {e}"))),
        }
    };

    let out = stdout.join().unwrap_or_default();
    let err = stderr.join().unwrap_or_default();
    if !status.success() {
        return Err(DetectError::Failed(format!(
            "{program} failed (exit {}): {}",
            status.code().unwrap_or(-1),
            String::from_utf8_lossy(&err).trim()
        )));
    }
    Ok(out)
}
