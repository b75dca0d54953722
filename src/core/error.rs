use std::path::PathBuf;
use thiserror::Error;

/// Errors caused by an invalid run configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The input path does not exist or is not a directory.
    #[error("input path is not a directory: {0}")]
    InvalidInputDir(PathBuf),

    /// The workbook has no sheet with the configured name.
    #[error("workbook has no sheet named {0:?}")]
    MissingSheet(String),

    /// The output workbook does not exist and no template is available.
    #[error("output workbook missing and template not found: {0}")]
    MissingTemplate(PathBuf),
}

/// Errors raised while extracting fields from a nested invoice document.
///
/// Extraction is best-effort and tolerant of document noise, but a missing or
/// unparsable *required* field is fatal for that file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// A designated node is absent (e.g. the envelope's embedded-description node).
    #[error("required node not found: {0}")]
    MissingNode(&'static str),

    /// A required scalar field is absent from the embedded document.
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    /// A required scalar field is present but unparsable.
    #[error("field {field}: unparsable value {value:?}")]
    InvalidField {
        /// Name of the source node.
        field: &'static str,
        /// Offending raw text.
        value: String,
    },

    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(String),
}

/// Errors raised when the ledger sheet's structure does not match expectations.
///
/// Both variants are checked before any mutation, so a failing insertion
/// leaves the sheet untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StructuralError {
    /// No cell on the sheet carries the sentinel label.
    #[error("sentinel row {0:?} not found on sheet")]
    SentinelNotFound(String),

    /// The target sheet has zero table objects.
    #[error("sheet {0:?} has no table defined")]
    NoTableDefined(String),
}
