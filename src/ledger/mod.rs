//! Withholding-ledger editing: locating the totals row, inserting invoice
//! rows into the sheet's table region, and the single-commit file session.
//!
//! The ledger sheet is a fixed layout: a header row, one table object spanning
//! the data region, and a sentinel row labelled `TOTALES` directly below the
//! last data row. Every insertion lands in the row directly above the
//! sentinel; two strategies exist for making that room (see
//! [`InsertStrategy`]).

mod engine;
mod session;

pub use engine::{find_sentinel, insert_record};
pub use session::{LedgerSession, SessionError};

use serde::{Deserialize, Serialize};

/// Sheet the ledger lives on.
pub const SHEET_NAME: &str = "RETENCION 2025";

/// Label of the sentinel row closing the data region.
pub const TOTALS_LABEL: &str = "TOTALES";

/// Operation-type label written by the wide (legacy) layout.
pub const OPERATION_TYPE_LABEL: &str = "Factura de venta";

/// 1-based column offsets of the ledger layout.
pub const COL_SUPPLIER_NAME: u32 = 2; // B
pub const COL_SUPPLIER_NIT: u32 = 3; // C
pub const COL_OPERATION_TYPE: u32 = 4; // D (wide layout only)
pub const COL_ISSUE_DATE: u32 = 5; // E
pub const COL_INVOICE_NUMBER: u32 = 6; // F
pub const COL_TOTAL_AMOUNT: u32 = 7; // G
pub const COL_TAXABLE_BASE: u32 = 8; // H
pub const COL_CATEGORY: u32 = 9; // I
pub const COL_LOCAL_TAX: u32 = 10; // J (wide layout only)
pub const COL_INCOME_TAX: u32 = 11; // K (wide layout only)

/// How an insertion makes room above the sentinel row.
///
/// Selected once per session and applied to every insertion in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertStrategy {
    /// Copy the sentinel row one row down (values, formulas, styles), clear
    /// the original cells, and write the record into the vacated row. The
    /// table's end row advances to the old sentinel index and its column
    /// list is rebuilt from the header row.
    #[default]
    Swap,
    /// Bulk-shift every row from the sentinel down by one and write the
    /// record (wide layout, including the operation type and withheld tax
    /// columns) into the vacated row. Only the table's range ref is extended.
    Shift,
}
