//! Batch conversion: a directory of DIAN envelope XML files into ledger rows.
//!
//! One [`LedgerSession`] serves the whole batch. Each input file is extracted,
//! parsed, and inserted in turn; the first failure of any kind aborts the
//! batch before commit, so the ledger file on disk is either fully updated or
//! untouched.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::{ConfigurationError, DateValue, ExtractionError, StructuralError};
use crate::dian::{extract_embedded_invoice, parse_invoice};
use crate::ledger::{InsertStrategy, LedgerSession, SHEET_NAME, SessionError, insert_record};
use crate::xlsx::XlsxError;

/// Any failure of a conversion run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Extraction failed for one input file; the batch stops there.
    #[error("extraction failed for {file:?}: {source}")]
    Extraction {
        file: PathBuf,
        source: ExtractionError,
    },

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Workbook(#[from] XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SessionError> for ConvertError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Configuration(e) => ConvertError::Configuration(e),
            SessionError::Workbook(e) => ConvertError::Workbook(e),
        }
    }
}

/// Settings for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Name of the ledger sheet inside the workbook.
    pub sheet_name: String,
    /// Row-insertion strategy, applied to every file of the batch.
    pub strategy: InsertStrategy,
    /// Template workbook cloned into place when the output does not exist.
    pub template: Option<PathBuf>,
    /// Process inputs sorted by file name instead of directory order.
    /// Defaults to `true` for a deterministic ledger.
    pub sort_inputs: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            sheet_name: SHEET_NAME.to_string(),
            strategy: InsertStrategy::default(),
            template: None,
            sort_inputs: true,
        }
    }
}

/// Outcome of a successful conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Input files read.
    pub files_processed: usize,
    /// Ledger rows appended (one per file).
    pub rows_inserted: usize,
}

/// A configured batch converter.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Convert every `.xml` file in `xml_dir` into one ledger row of the
    /// workbook at `output`, committing once at the end.
    pub fn convert(&self, xml_dir: &Path, output: &Path) -> Result<ConvertSummary, ConvertError> {
        let inputs = self.collect_inputs(xml_dir)?;

        let mut session = match &self.options.template {
            Some(template) => LedgerSession::open_or_clone(output, template)?,
            None => LedgerSession::open(output)?,
        };
        if session.workbook().sheet(&self.options.sheet_name).is_none() {
            return Err(ConfigurationError::MissingSheet(self.options.sheet_name.clone()).into());
        }

        let mut rows_inserted = 0usize;
        for file in &inputs {
            let envelope = std::fs::read_to_string(file)?;
            let record = extract_embedded_invoice(&envelope)
                .and_then(|invoice| parse_invoice(&invoice))
                .map_err(|source| ConvertError::Extraction {
                    file: file.clone(),
                    source,
                })?;

            // Style registration needs the workbook; fetch it before the sheet.
            let date_style = match record.issue_date {
                DateValue::Date(_) => Some(session.workbook_mut().date_style_id()?),
                DateValue::Text(_) => None,
            };
            let sheet = session
                .workbook_mut()
                .sheet_mut(&self.options.sheet_name)
                .ok_or_else(|| {
                    ConfigurationError::MissingSheet(self.options.sheet_name.clone())
                })?;
            insert_record(sheet, &record, self.options.strategy, date_style)?;
            rows_inserted += 1;
        }

        session.commit()?;
        Ok(ConvertSummary {
            files_processed: inputs.len(),
            rows_inserted,
        })
    }

    fn collect_inputs(&self, xml_dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        if !xml_dir.is_dir() {
            return Err(ConfigurationError::InvalidInputDir(xml_dir.to_path_buf()).into());
        }
        let mut inputs = Vec::new();
        for entry in std::fs::read_dir(xml_dir)? {
            let path = entry?.path();
            let is_xml = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
            if path.is_file() && is_xml {
                inputs.push(path);
            }
        }
        if self.options.sort_inputs {
            inputs.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
        }
        Ok(inputs)
    }
}

/// Convert with default options: sheet `RETENCION 2025`, swap strategy,
/// no template, sorted inputs.
pub fn convert(xml_dir: &Path, output: &Path) -> Result<ConvertSummary, ConvertError> {
    Converter::default().convert(xml_dir, output)
}
