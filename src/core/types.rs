use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category label written into every ledger row (fixed, per the ledger layout).
pub const CATEGORY_LABEL: &str = "Compras generales (declarantes)";

/// One normalized invoice, as extracted from an embedded DIAN/UBL document.
///
/// Immutable once extracted: the extractor produces it, the ledger engine
/// consumes it exactly once, then it is discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Supplier tax id (NIT, `cbc:CompanyID`).
    pub supplier_tax_id: String,
    /// Supplier legal name (`cbc:RegistrationName`).
    pub supplier_name: String,
    /// Invoice number (root-level `cbc:ID`).
    pub invoice_number: String,
    /// Issue date (`cbc:IssueDate`). The only field permitted to degrade:
    /// an unparsable date is carried as raw text and written as text.
    pub issue_date: DateValue,
    /// Total payable amount (`cbc:PayableAmount`).
    pub total_amount: Decimal,
    /// Taxable base (`cbc:LineExtensionAmount`).
    pub taxable_base: Decimal,
    /// Income-tax withholding ("RENTA" scheme), zero when absent.
    pub withheld_income_tax: Decimal,
    /// Local-tax withholding ("ICA" scheme), zero when absent.
    pub withheld_local_tax: Decimal,
    /// Fixed purchase-category label.
    pub category_label: String,
}

/// An issue date that either parsed cleanly or degraded to its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateValue {
    /// Parsed calendar date, written to the ledger as a real date cell.
    Date(NaiveDate),
    /// Unparsable source text, written verbatim as a text cell.
    Text(String),
}

impl DateValue {
    /// Parse an ISO `yyyy-mm-dd` date, falling back to the raw text.
    pub fn parse(raw: &str) -> Self {
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => DateValue::Date(date),
            Err(_) => DateValue::Text(raw.trim().to_string()),
        }
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateValue::Date(d) => write!(f, "{d}"),
            DateValue::Text(t) => write!(f, "{t}"),
        }
    }
}
