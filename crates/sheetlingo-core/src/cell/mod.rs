//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] / [`CellRange`] - A cell's location and rectangles of cells
//! - [`QualifiedRef`] / [`QualifiedRange`] - The same, qualified by sheet name
//! - [`CellValue`] and [`Cell`] - What a cell holds

mod address;
mod value;

pub use address::{
    decode_cell, decode_column, decode_range, encode_cell, encode_column, CellAddress, CellRange,
    CellRangeIterator, QualifiedRange, QualifiedRef,
};
pub use value::{Cell, CellType, CellValue, Formula, FormulaKind, StyleRef, TextRun};
