//! # retenciones
//!
//! Ingests Colombian DIAN e-invoices (UBL `AttachedDocument` envelopes carrying
//! the commercial invoice embedded as text) and appends one normalized row per
//! invoice into the withholding ledger table of an XLSX workbook.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! The ledger table is a real OOXML table object; every insertion keeps its
//! declared range, autofilter, and column list consistent while preserving the
//! `TOTALES` row's formulas and styling directly below the data.
//!
//! ## Quick Start
//!
//! ```no_run
//! use retenciones::convert::{ConvertError, convert};
//!
//! fn run() -> Result<(), ConvertError> {
//!     let summary = convert("facturas/".as_ref(), "retenciones.xlsx".as_ref())?;
//!     println!("{} invoices appended", summary.rows_inserted);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Record types, error taxonomy, auth session state |
//! | `dian` | AttachedDocument envelope + embedded UBL invoice extraction |
//! | `ledger` | XLSX workbook model, ledger table engine, document session |
//! | `convert` (default) | Batch orchestrator tying extraction to the ledger |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "dian")]
pub mod dian;

#[cfg(feature = "ledger")]
pub mod xlsx;

#[cfg(feature = "ledger")]
pub mod ledger;

#[cfg(feature = "convert")]
pub mod convert;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
