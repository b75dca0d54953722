use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::ConfigurationError;
use crate::xlsx::{Workbook, XlsxError};

/// Failure opening a ledger session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Workbook(#[from] XlsxError),
}

/// An open ledger file with all edits buffered in memory.
///
/// The session holds the whole workbook; nothing touches the file until
/// [`commit`](Self::commit), which consumes the session and performs exactly
/// one full rewrite. Dropping the session without committing discards every
/// edit, including rows inserted for earlier files of an aborted batch. Not
/// safe for concurrent writers; callers serialize access to the file.
#[derive(Debug)]
pub struct LedgerSession {
    workbook: Workbook,
    path: PathBuf,
}

impl LedgerSession {
    /// Open an existing ledger workbook.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, XlsxError> {
        let path = path.into();
        let workbook = Workbook::open(&path)?;
        Ok(Self { workbook, path })
    }

    /// Open the ledger at `path`, first cloning `template` into place when the
    /// file does not exist yet.
    pub fn open_or_clone(
        path: impl Into<PathBuf>,
        template: &Path,
    ) -> Result<Self, SessionError> {
        let path = path.into();
        if !path.exists() {
            if !template.is_file() {
                return Err(ConfigurationError::MissingTemplate(template.to_path_buf()).into());
            }
            std::fs::copy(template, &path).map_err(XlsxError::from)?;
        }
        Ok(Self::open(path)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    /// Write the workbook back to its path. Consumes the session: one commit
    /// per session, ever.
    pub fn commit(self) -> Result<(), XlsxError> {
        self.workbook.save(&self.path)
    }
}
