//! Splitting cells that carry several fields.
//!
//! Each shape has a pattern split on token boundaries and a positional
//! fallback for when the detector also swallowed the separating spaces.

use regex::Regex;

use crate::error::ExtractError;
use crate::headers::field::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `FL 61D 729000018669`
    RegionWarehouseSlip,
    /// `FL 61D`
    RegionWarehouse,
    /// `8/31/2025 9/30/2025`
    InvoiceDates,
    /// `Caribbean Building Corp  Modena 22`
    CustomerSite,
    /// `Yes 9/17/2025`
    DefinitiveCounted,
    /// `1662, 1674, 1718 3`
    TabletsTotal,
    /// `1666M, 1708M 2`
    OpenTotal,
}

impl Shape {
    /// Detection order: wider shapes before the shapes they contain.
    pub const ALL: [Shape; 7] = [
        Shape::RegionWarehouseSlip,
        Shape::RegionWarehouse,
        Shape::InvoiceDates,
        Shape::CustomerSite,
        Shape::DefinitiveCounted,
        Shape::TabletsTotal,
        Shape::OpenTotal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RegionWarehouseSlip => "region_warehouse_slip",
            Self::RegionWarehouse => "region_warehouse",
            Self::InvoiceDates => "invoice_dates",
            Self::CustomerSite => "customer_site",
            Self::DefinitiveCounted => "definitive_counted",
            Self::TabletsTotal => "tablets_total",
            Self::OpenTotal => "open_total",
        }
    }

    /// Fields in print order. The first is the lead column.
    pub fn parts(&self) -> &'static [&'static str] {
        match self {
            Self::RegionWarehouseSlip => &[REGION, WAREHOUSE_CODE, SLIP_ID],
            Self::RegionWarehouse => &[REGION, WAREHOUSE_CODE],
            Self::InvoiceDates => &[INVOICE_START_DATE, INVOICE_END_DATE],
            Self::CustomerSite => &[CUSTOMER_NAME, JOB_SITE_NAME],
            Self::DefinitiveCounted => &[DEFINITIVE_FLAG, COUNTED_DATE],
            Self::TabletsTotal => &[TABLETS, TOTAL_TABLETS],
            Self::OpenTotal => &[OPEN_TABLETS, TOTAL_OPEN],
        }
    }

    pub fn lead(&self) -> &'static str {
        self.parts()[0]
    }

    /// Field name used when the cell cannot be split.
    pub fn opaque_name(&self) -> String {
        format!("fused_{}", self.name())
    }
}

/// Fixed slip width used by the positional fallback.
const SLIP_WIDTH: usize = 12;

pub struct FusedSplitter {
    region_warehouse_slip: Regex,
    region_warehouse: Regex,
    invoice_dates: Regex,
    invoice_dates_packed: Regex,
    wide_gap: Regex,
    company_suffix: Regex,
    definitive_counted: Regex,
    definitive_packed: Regex,
    list_then_count: Regex,
    date: Regex,
}

impl FusedSplitter {
    pub fn new() -> Result<Self, ExtractError> {
        let re = |name: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| ExtractError::pattern(name, e))
        };
        const DATE: &str = r"\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2}";
        Ok(Self {
            region_warehouse_slip: re(
                "region_warehouse_slip",
                r"^([A-Za-z]{2})\s+([0-9A-Za-z]{1,6})\s+(\d{9,})$",
            )?,
            region_warehouse: re("region_warehouse", r"^([A-Za-z]{2})\s+([0-9A-Za-z]{1,6})$")?,
            invoice_dates: re(
                "invoice_dates",
                &format!(r"^({DATE})\s+({DATE})$"),
            )?,
            invoice_dates_packed: re(
                "invoice_dates_packed",
                r"^(\d{1,2}/\d{1,2}/\d{4})(\d{1,2}/\d{1,2}/\d{4})$",
            )?,
            wide_gap: re("wide_gap", r"\s{2,}")?,
            company_suffix: re(
                "company_suffix",
                r"(?i)^(.+\b(?:corp|corporation|inc|llc|ltd|co|company|group)\b\.?),?\s+(.+)$",
            )?,
            definitive_counted: re(
                "definitive_counted",
                r"(?i)^(yes|no|ye\s+s|y|n|si|sí)\s+(\S+)$",
            )?,
            definitive_packed: re("definitive_packed", r"(?i)^(yes|no)(\d\S*)$")?,
            list_then_count: re("list_then_count", r"^(.*[,;/]\s*[0-9A-Za-z]+)\s+(\d+)$")?,
            date: re("date", &format!(r"^(?:{DATE})$"))?,
        })
    }

    /// Split `text` into the shape's parts, or `None` when neither the
    /// pattern nor the fallback applies.
    pub fn split(&self, shape: Shape, text: &str) -> Option<Vec<String>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let parts = match shape {
            Shape::RegionWarehouseSlip => captures(&self.region_warehouse_slip, text)
                .or_else(|| region_warehouse_slip_fixed(text)),
            Shape::RegionWarehouse => {
                captures(&self.region_warehouse, text).or_else(|| region_warehouse_fixed(text))
            }
            Shape::InvoiceDates => captures(&self.invoice_dates, text)
                .or_else(|| captures(&self.invoice_dates_packed, &squeeze(text))),
            Shape::CustomerSite => self.customer_site(text),
            Shape::DefinitiveCounted => captures(&self.definitive_counted, text)
                .or_else(|| captures(&self.definitive_packed, &squeeze(text))),
            Shape::TabletsTotal | Shape::OpenTotal => {
                captures(&self.list_then_count, text).or_else(|| list_then_count_by_length(text))
            }
        }?;
        debug_assert_eq!(parts.len(), shape.parts().len());
        Some(parts)
    }

    /// Split a lead-column cell whose neighbouring columns are empty.
    ///
    /// The split is kept only when its parts check out: a count matching the
    /// list before it, or a date after the definitive flag. Customer names
    /// are never split here.
    pub fn split_confirmed(&self, shape: Shape, text: &str) -> Option<Vec<String>> {
        match shape {
            Shape::CustomerSite => None,
            Shape::DefinitiveCounted => self
                .split(shape, text)
                .filter(|parts| self.date.is_match(&parts[1])),
            Shape::TabletsTotal | Shape::OpenTotal => self.split(shape, text).filter(|parts| {
                parts[1].parse::<usize>().ok() == Some(list_codes(&parts[0]).len())
            }),
            Shape::RegionWarehouseSlip | Shape::RegionWarehouse | Shape::InvoiceDates => {
                self.split(shape, text)
            }
        }
    }

    fn customer_site(&self, text: &str) -> Option<Vec<String>> {
        let pieces: Vec<&str> = self
            .wide_gap
            .split(text)
            .filter(|p| !p.trim().is_empty())
            .collect();
        if pieces.len() == 2 {
            return Some(pieces.iter().map(|p| p.trim().to_string()).collect());
        }
        captures(&self.company_suffix, text)
    }
}

fn captures(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().trim().to_string()).unwrap_or_default())
            .collect(),
    )
}

fn squeeze(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `FL61D729000018669` → region (2), warehouse (middle), slip (last 12).
fn region_warehouse_slip_fixed(text: &str) -> Option<Vec<String>> {
    let packed = squeeze(text);
    if !packed.is_ascii() || packed.len() < 2 + 1 + SLIP_WIDTH {
        return None;
    }
    let (region, rest) = packed.split_at(2);
    let (warehouse, slip) = rest.split_at(rest.len() - SLIP_WIDTH);
    let ok = region.chars().all(|c| c.is_ascii_alphabetic())
        && warehouse.chars().all(|c| c.is_ascii_alphanumeric())
        && slip.chars().all(|c| c.is_ascii_digit());
    ok.then(|| vec![region.to_string(), warehouse.to_string(), slip.to_string()])
}

/// `FL61D` → `FL`, `61D`. The warehouse must start with a digit.
fn region_warehouse_fixed(text: &str) -> Option<Vec<String>> {
    let packed = squeeze(text);
    if !packed.is_ascii() || packed.len() < 3 || packed.len() > 8 {
        return None;
    }
    let (region, warehouse) = packed.split_at(2);
    let ok = region.chars().all(|c| c.is_ascii_alphabetic())
        && warehouse.starts_with(|c: char| c.is_ascii_digit())
        && warehouse.chars().all(|c| c.is_ascii_alphanumeric());
    ok.then(|| vec![region.to_string(), warehouse.to_string()])
}

fn list_codes(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '/'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// `1662 1674 1718 3`: accepted only when the trailing number equals the
/// count of codes before it.
fn list_then_count_by_length(text: &str) -> Option<Vec<String>> {
    let tokens = list_codes(text);
    let (last, codes) = tokens.split_last()?;
    let count: usize = last.parse().ok()?;
    if codes.is_empty() || count != codes.len() {
        return None;
    }
    let cut = text.rfind(last)?;
    Some(vec![text[..cut].trim().to_string(), last.to_string()])
}
