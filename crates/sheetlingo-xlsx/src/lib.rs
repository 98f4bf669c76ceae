//! # sheetlingo-xlsx
//!
//! XLSX (Office Open XML) reader and writer for sheetlingo.
//!
//! The reader keeps everything a translation pass must not disturb: cell
//! types, formulas (including shared and array groups), style indices, merged
//! regions, row and column sizing, rich-text runs and defined names. The
//! style sheet and theme are carried as opaque parts and written back byte
//! for byte; sheet-level elements the grid does not model (views,
//! conditional formats, validations, hyperlinks, page setup) travel as
//! captured XML fragments.

pub mod error;
pub mod reader;
pub mod writer;

mod escapes;
mod fragments;
mod parts;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
