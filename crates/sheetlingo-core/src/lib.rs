//! # sheetlingo-core
//!
//! Core data structures for the sheetlingo workbook translator.
//!
//! This crate provides the fundamental types used throughout sheetlingo:
//! - [`CellAddress`] and [`CellRange`] - A1-style addressing and ranges
//! - [`Cell`] and [`CellValue`] - Typed cell values with formula, style and display side-channels
//! - [`SparseGrid`] - Sparse storage of one sheet plus its structural metadata
//! - [`Workbook`], [`Worksheet`] - The document structures
//! - [`SelectionModel`] - Which sheets, cells and patterns a run must leave alone
//!
//! ## Example
//!
//! ```rust
//! use sheetlingo_core::{Cell, CellAddress, QualifiedRef, SelectionModel, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.grid_mut().set(CellAddress::parse("A1").unwrap(), Cell::new("발주서"));
//!
//! let mut selection = SelectionModel::new();
//! selection.toggle_cell(QualifiedRef::parse("Sheet1!A1").unwrap());
//! assert!(selection.is_excluded("Sheet1", CellAddress::new(0, 0), None));
//! ```

pub mod cell;
pub mod error;
pub mod grid;
pub mod selection;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{
    decode_cell, decode_column, decode_range, encode_cell, encode_column, Cell, CellAddress,
    CellRange, CellType, CellValue, Formula, FormulaKind, QualifiedRange, QualifiedRef, StyleRef,
    TextRun,
};
pub use error::{Error, Result};
pub use grid::{ColumnInfo, RangeCells, RowInfo, SheetFormat, SparseGrid};
pub use selection::{ExclusionSummary, SelectionModel, SheetCells};
pub use workbook::{validate_sheet_name_syntax, DefinedName, Workbook};
pub use worksheet::{RawFragment, RawRelationship, RawSheetXml, SheetState, Worksheet};

/// Maximum number of rows in a worksheet (container limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (container limit)
pub const MAX_COLS: u16 = 16_384;

/// Largest number of cells a single range gesture or exclusion list may name
///
/// The selection stores excluded cells one by one, so a whole-sheet
/// rectangle would not fit in memory.
pub const MAX_GESTURE_CELLS: u64 = 100_000;

/// Maximum length of a sheet name, in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;
