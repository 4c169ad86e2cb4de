//! CLI Exit Code Registry
//!
//! Single source of truth for `tabtrack` exit codes. Scripts rely on them.
//!
//! | Range   | Domain     | Description                                   |
//! |---------|------------|-----------------------------------------------|
//! | 0       | Universal  | Success                                       |
//! | 1       | Universal  | General error / `diff --exit-code` found changes |
//! | 2       | Universal  | CLI usage error (bad args)                    |
//! | 3-9     | Input      | Files, snapshot tables, configuration         |
//! | 10-19   | extract    | Grid detection and extraction outcome         |
//! | 20-29   | history    | Snapshot history and trend                    |

// =============================================================================
// Universal (0-2)
// =============================================================================

pub const EXIT_SUCCESS: u8 = 0;

/// General error. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Like `diff(1)`: the snapshots differ (only with `--exit-code`).
pub const EXIT_DIFF_CHANGES: u8 = 1;

/// Bad arguments or missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-9)
// =============================================================================

/// A file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// A file was read but its content is malformed (bad grid JSON, no slip column,
/// duplicate slip keys in a snapshot).
pub const EXIT_INPUT: u8 = 4;

/// Settings file missing, unparseable or inconsistent.
pub const EXIT_CONFIG: u8 = 5;

// =============================================================================
// Extract (10-19)
// =============================================================================

/// No strategy detected any table in the document.
pub const EXIT_EXTRACT_NO_TABLES: u8 = 10;

/// No strategy was adequate; the best effort was kept (only with `--strict`).
pub const EXIT_EXTRACT_FAILED: u8 = 11;

/// `pdftotext` is not installed.
pub const EXIT_EXTRACT_TOOL: u8 = 12;

// =============================================================================
// History (20-29)
// =============================================================================

/// Snapshot date not strictly after the last history entry.
pub const EXIT_HISTORY_ORDER: u8 = 20;

/// History file unreadable or corrupt.
pub const EXIT_HISTORY_STORE: u8 = 21;

/// Trend needs at least two snapshots.
pub const EXIT_TREND_INSUFFICIENT: u8 = 22;
