//! Per-field grammars. Each takes the raw cell text and reports what it
//! found; none of them fail the row.

use chrono::NaiveDate;

/// Accepted date spellings, tried in order.
pub const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y", "%d-%b-%Y", "%d.%m.%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed<T> {
    /// Empty cell, or a placeholder meaning "no value".
    Absent,
    Value(T),
    /// Text present but not in any accepted shape.
    Invalid,
}

impl<T> Parsed<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

pub fn parse_date(raw: &str) -> Parsed<NaiveDate> {
    let text = raw.trim();
    if is_placeholder(text) {
        return Parsed::Absent;
    }
    for fmt in DATE_FORMATS {
        if !year_width_fits(text, fmt) {
            continue;
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Parsed::Value(d);
        }
    }
    Parsed::Invalid
}

/// `%Y` would read `25` as year 25, so the year digit count is checked first.
fn year_width_fits(text: &str, fmt: &str) -> bool {
    let leading = text.chars().take_while(|c| c.is_ascii_digit()).count();
    let trailing = text.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if fmt.starts_with("%Y") {
        leading == 4
    } else if fmt.ends_with("%Y") {
        trailing == 4
    } else if fmt.ends_with("%y") {
        trailing == 2
    } else {
        true
    }
}

fn is_placeholder(text: &str) -> bool {
    matches!(
        text.to_ascii_lowercase().as_str(),
        "" | "-" | "--" | "n/a" | "na" | "yes" | "no"
    )
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountError {
    Negative,
    NotNumeric,
}

/// Non-negative integer. Thousands separators and a trailing `.0` are accepted.
pub fn parse_count(raw: &str) -> Result<Option<u32>, CountError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(None);
    }
    let digits = cleaned
        .strip_suffix(".00")
        .or_else(|| cleaned.strip_suffix(".0"))
        .unwrap_or(&cleaned);
    if let Ok(n) = digits.parse::<i64>() {
        if n < 0 {
            return Err(CountError::Negative);
        }
        return u32::try_from(n).map(Some).map_err(|_| CountError::NotNumeric);
    }
    Err(CountError::NotNumeric)
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// `Ye s` is the wrapped spelling of `Yes`.
pub fn parse_flag(raw: &str) -> Parsed<bool> {
    let squeezed: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    match squeezed.as_str() {
        "" => Parsed::Absent,
        "yes" | "y" | "true" | "1" | "si" | "sí" => Parsed::Value(true),
        "no" | "n" | "false" | "0" => Parsed::Value(false),
        _ => Parsed::Invalid,
    }
}

// ---------------------------------------------------------------------------
// Tablet lists
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabletList {
    /// Every code as listed, upper-cased, duplicates removed.
    pub codes: Vec<String>,
    /// Tokens that are not alphanumeric codes.
    pub rejected: Vec<String>,
}

/// Split a delimited list on `,` `;` `/` and whitespace.
pub fn parse_tablets(raw: &str) -> TabletList {
    let mut list = TabletList::default();
    for token in raw
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/'))
        .filter(|t| !t.is_empty())
    {
        if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            list.rejected.push(token.to_string());
            continue;
        }
        let code = token.to_ascii_uppercase();
        if !list.codes.contains(&code) {
            list.codes.push(code);
        }
    }
    list
}

/// `1666M` is open: digits followed by a letter suffix.
pub fn is_open_code(code: &str) -> bool {
    let digits = code.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0
        && digits < code.len()
        && code[digits..].chars().all(|c| c.is_ascii_alphabetic())
}

/// `1666M` → `1666`. Codes without an open suffix are their own base.
pub fn base_code(code: &str) -> &str {
    if is_open_code(code) {
        code.trim_end_matches(|c: char| c.is_ascii_alphabetic())
    } else {
        code
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Short identifiers: whitespace removed, upper-cased.
pub fn normalize_code(raw: &str) -> Option<String> {
    let code: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    (!code.is_empty()).then_some(code)
}

/// Free text: runs of whitespace collapsed to one space.
pub fn collapse_whitespace(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
