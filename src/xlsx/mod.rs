//! Minimal in-memory XLSX workbook model for table-aware editing.
//!
//! This is not a general spreadsheet library: it opens a workbook zip fully
//! into memory, parses just enough structure to edit worksheet cells and
//! table objects (`xl/tables/*.xml`), and writes everything back in a single
//! full rewrite. Entries that were not edited round-trip byte-for-byte; for
//! edited parts, only the relevant XML subtrees are rewritten and the rest of
//! each file streams through verbatim.
//!
//! Conventions:
//! - Rows and columns are 1-based, matching A1-style references.
//! - Shared strings are resolved to owned text at load; text cells are written
//!   back as inline strings, so the shared-string table is never rewritten.
//! - Table ids and counts are plain `u32`.

mod cell;
mod reference;
mod styles;
mod table;
mod workbook;
mod worksheet;

pub use cell::{Cell, CellValue};
pub use reference::{CellRef, Range, column_index, column_letters};
pub use table::{Table, TableColumn};
pub use workbook::Workbook;
pub use worksheet::{Row, Worksheet};

use thiserror::Error;

/// Errors from reading, editing, or writing a workbook.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum XlsxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid cell reference: {0:?}")]
    InvalidReference(String),

    #[error("workbook structure error: {0}")]
    Structure(String),
}
