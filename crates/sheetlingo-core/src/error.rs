//! Error types for sheetlingo-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetlingo-core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Cell or range reference that does not follow `<letters><digits>` syntax
    /// or lies past the sheet limits
    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    /// Range gesture whose two corners live on different sheets
    #[error("Range spans two sheets: {anchor} and {target}")]
    CrossSheetRange { anchor: String, target: String },

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),
}

impl Error {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedReference(msg.into())
    }
}
