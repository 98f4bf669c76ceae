//! # sheetlingo-xls
//!
//! Reader for the legacy Excel binary format (.xls, BIFF8 inside an OLE2
//! compound file).
//!
//! Cell values, cached formula results, merges and row/column sizing are
//! read into the core model, and the FONT, FORMAT and XF records are
//! rendered as an xlsx style sheet whose `cellXfs` positions match the XF
//! indices on cells. Formula source text is not decompiled: formula
//! cells carry an empty formula so later passes leave them untouched.

pub mod biff;
pub mod error;
pub mod reader;
pub mod styles;

pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
