//! XLS error types

use thiserror::Error;

/// Result type for XLS operations
pub type XlsResult<T> = std::result::Result<T, XlsError>;

/// Errors that can occur while reading an XLS file
#[derive(Debug, Error)]
pub enum XlsError {
    /// IO error (the compound-file layer reports through std::io::Error too)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Not a BIFF8 workbook
    #[error("Invalid XLS format: {0}")]
    InvalidFormat(String),

    /// BIFF5 and older
    #[error("Unsupported XLS version: {0}")]
    UnsupportedVersion(String),

    /// Truncated or inconsistent record
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Core error: {0}")]
    Core(#[from] sheetlingo_core::Error),
}
