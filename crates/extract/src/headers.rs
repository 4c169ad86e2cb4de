//! Canonical header lookup.
//!
//! Headers are compared in compact form (lower-case ASCII letters and digits
//! only) so wrapped or kerned words ("Countin" / "g delay", "Definiti ve De v")
//! land on the same key as the clean spelling.

use crate::fused::Shape;

/// Canonical field names.
pub mod field {
    pub const REGION: &str = "region";
    pub const WAREHOUSE_CODE: &str = "warehouse_code";
    pub const SLIP_ID: &str = "slip_id";
    pub const RETURN_DATE: &str = "return_date";
    pub const JOBSITE_ID: &str = "jobsite_id";
    pub const COST_CENTER: &str = "cost_center";
    pub const INVOICE_START_DATE: &str = "invoice_start_date";
    pub const INVOICE_END_DATE: &str = "invoice_end_date";
    pub const CUSTOMER_NAME: &str = "customer_name";
    pub const JOB_SITE_NAME: &str = "job_site_name";
    pub const DEFINITIVE_FLAG: &str = "definitive_flag";
    pub const COUNTED_DATE: &str = "counted_date";
    pub const TABLETS: &str = "tablets";
    pub const TOTAL_TABLETS: &str = "total_tablets";
    pub const OPEN_TABLETS: &str = "open_tablets";
    pub const TOTAL_OPEN: &str = "total_open";
    pub const COUNTING_DELAY_DAYS: &str = "counting_delay_days";
    pub const VALIDATION_DELAY_DAYS: &str = "validation_delay_days";

    /// Integer columns a Total row may declare.
    pub const COUNTS: &[&str] = &[
        TOTAL_TABLETS,
        TOTAL_OPEN,
        COUNTING_DELAY_DAYS,
        VALIDATION_DELAY_DAYS,
    ];
}

use field::*;

/// Known header spellings, compact form → canonical field.
const KNOWN: &[(&str, &str)] = &[
    ("wh", REGION),
    ("region", REGION),
    ("whcode", WAREHOUSE_CODE),
    ("warehouse", WAREHOUSE_CODE),
    ("warehousecode", WAREHOUSE_CODE),
    ("returnpackingslip", SLIP_ID),
    ("packingslip", SLIP_ID),
    ("returnslip", SLIP_ID),
    ("slip", SLIP_ID),
    ("slipid", SLIP_ID),
    ("returnpslipdate", RETURN_DATE),
    ("returnpackingslipdate", RETURN_DATE),
    ("returnslipdate", RETURN_DATE),
    ("returndate", RETURN_DATE),
    ("jobsite", JOBSITE_ID),
    ("jobsiteid", JOBSITE_ID),
    ("costcenter", COST_CENTER),
    ("costcentre", COST_CENTER),
    ("nextinvoicedate", INVOICE_START_DATE),
    ("invoicedate", INVOICE_START_DATE),
    ("invoicestartdate", INVOICE_START_DATE),
    ("invoiceenddate", INVOICE_END_DATE),
    ("customername", CUSTOMER_NAME),
    ("customer", CUSTOMER_NAME),
    ("jobsitename", JOB_SITE_NAME),
    ("sitename", JOB_SITE_NAME),
    ("definitivedev", DEFINITIVE_FLAG),
    ("definitive", DEFINITIVE_FLAG),
    ("definitiveflag", DEFINITIVE_FLAG),
    ("counteddate", COUNTED_DATE),
    ("tablets", TABLETS),
    ("tablillas", TABLETS),
    ("total", TOTAL_TABLETS),
    ("totaltablets", TOTAL_TABLETS),
    ("opentablets", OPEN_TABLETS),
    ("totalopentablets", OPEN_TABLETS),
    ("totalopen", TOTAL_OPEN),
    ("totalcountingdelay", COUNTING_DELAY_DAYS),
    ("countingdelay", COUNTING_DELAY_DAYS),
    ("countingdelaydays", COUNTING_DELAY_DAYS),
    ("totalvalidationdelay", VALIDATION_DELAY_DAYS),
    ("validationdelay", VALIDATION_DELAY_DAYS),
    ("validationdelaydays", VALIDATION_DELAY_DAYS),
];

/// Headers that name several fields printed in one cell.
const COMPOSITE: &[(&str, Shape)] = &[
    ("whreturnpackingslip", Shape::RegionWarehouseSlip),
    ("whwhcodereturnpackingslip", Shape::RegionWarehouseSlip),
    ("whwhcode", Shape::RegionWarehouse),
    ("nextinvoicedatenextinvoicedate", Shape::InvoiceDates),
    ("invoicedates", Shape::InvoiceDates),
    ("customernamejobsitename", Shape::CustomerSite),
    ("definitivedevcounteddate", Shape::DefinitiveCounted),
    ("definitivecounteddate", Shape::DefinitiveCounted),
    ("tabletstotal", Shape::TabletsTotal),
    ("opentabletstotal", Shape::OpenTotal),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMatch {
    /// A known single field.
    Field(&'static str),
    /// A known multi-field cell.
    Fused(Shape),
    /// Retained under its normalized spelling.
    Unknown(String),
    /// No header text at all.
    Empty,
}

impl HeaderMatch {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Field(_) | Self::Fused(_))
    }
}

pub fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Lower-cased, underscored spelling used for unmatched headers.
pub fn snake(text: &str) -> String {
    let mut out = String::new();
    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push('_');
        }
        out.push_str(&word.to_ascii_lowercase());
    }
    out
}

pub fn canonicalize(header: &str) -> HeaderMatch {
    let key = compact(header);
    if key.is_empty() {
        return HeaderMatch::Empty;
    }
    if let Some((_, name)) = KNOWN.iter().find(|(k, _)| *k == key) {
        return HeaderMatch::Field(name);
    }
    if let Some((_, shape)) = COMPOSITE.iter().find(|(k, _)| *k == key) {
        return HeaderMatch::Fused(*shape);
    }
    HeaderMatch::Unknown(snake(header))
}

/// Field a repeated header stands for on its second appearance.
pub fn sequel(name: &str) -> Option<&'static str> {
    match name {
        INVOICE_START_DATE => Some(INVOICE_END_DATE),
        TOTAL_TABLETS => Some(TOTAL_OPEN),
        _ => None,
    }
}

/// True for names the extractor understands.
pub fn is_canonical(name: &str) -> bool {
    KNOWN.iter().any(|(_, f)| *f == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_words_match() {
        assert_eq!(canonicalize("Counting delay"), HeaderMatch::Field(COUNTING_DELAY_DAYS));
        assert_eq!(
            canonicalize("Total Countin g delay"),
            HeaderMatch::Field(COUNTING_DELAY_DAYS)
        );
        assert_eq!(canonicalize("Definiti ve De v"), HeaderMatch::Field(DEFINITIVE_FLAG));
        assert_eq!(canonicalize("Validatio n delay"), HeaderMatch::Field(VALIDATION_DELAY_DAYS));
        assert_eq!(canonicalize("Return P.Slip Date"), HeaderMatch::Field(RETURN_DATE));
        assert_eq!(canonicalize("  WH "), HeaderMatch::Field(REGION));
    }

    #[test]
    fn composite_headers() {
        assert_eq!(
            canonicalize("WH Return Packing Slip"),
            HeaderMatch::Fused(Shape::RegionWarehouseSlip)
        );
        assert_eq!(
            canonicalize("Customer Name / Job Site Name"),
            HeaderMatch::Fused(Shape::CustomerSite)
        );
    }

    #[test]
    fn unknown_header_is_snake_cased() {
        assert_eq!(
            canonicalize("Driver  Notes (ext.)"),
            HeaderMatch::Unknown("driver_notes_ext".into())
        );
        assert_eq!(canonicalize("   "), HeaderMatch::Empty);
        assert!(!canonicalize("Driver").is_known());
    }

    #[test]
    fn sequels() {
        assert_eq!(sequel(INVOICE_START_DATE), Some(INVOICE_END_DATE));
        assert_eq!(sequel(TOTAL_TABLETS), Some(TOTAL_OPEN));
        assert_eq!(sequel(CUSTOMER_NAME), None);
    }

    #[test]
    fn canonical_names_map_to_themselves() {
        for name in [
            REGION,
            WAREHOUSE_CODE,
            SLIP_ID,
            RETURN_DATE,
            JOBSITE_ID,
            COST_CENTER,
            INVOICE_START_DATE,
            INVOICE_END_DATE,
            CUSTOMER_NAME,
            JOB_SITE_NAME,
            DEFINITIVE_FLAG,
            COUNTED_DATE,
            TABLETS,
            TOTAL_TABLETS,
            OPEN_TABLETS,
            TOTAL_OPEN,
            COUNTING_DELAY_DAYS,
            VALIDATION_DELAY_DAYS,
        ] {
            assert_eq!(canonicalize(name), HeaderMatch::Field(name), "{name}");
        }
    }

    #[test]
    fn every_known_entry_is_already_compact() {
        for (key, _) in KNOWN {
            assert_eq!(compact(key), *key);
        }
        for (key, _) in COMPOSITE {
            assert_eq!(compact(key), *key);
        }
    }
}
