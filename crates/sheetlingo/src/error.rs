//! Engine error type

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine
///
/// Rewrite failures for single cells never show up here; they are
/// recovered by the local fallback and counted in the run statistics.
#[derive(Debug, Error)]
pub enum Error {
    /// Input is not a workbook container this build can read
    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),

    /// Addressing, selection or sheet naming error
    #[error(transparent)]
    Core(#[from] sheetlingo_core::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] sheetlingo_xlsx::XlsxError),

    #[cfg(feature = "xls")]
    #[error("XLS error: {0}")]
    Xls(#[from] sheetlingo_xls::XlsError),

    /// Setting up a rewrite or job client failed
    #[error("Rewrite service error: {0}")]
    Rewrite(#[from] sheetlingo_rewrite::RewriteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
