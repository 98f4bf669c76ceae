//! # sheetlingo
//!
//! Translate spreadsheet workbooks between Korean and Chinese while keeping
//! everything else intact.
//!
//! ## Features
//!
//! - Read XLSX and legacy XLS (optional `xls` feature, on by default), write XLSX
//! - Styles, formulas, merged regions and row/column sizing carried through
//! - Exclude sheets, single cells, rectangles or text patterns from translation
//! - Remote translation with a glossary fallback per cell
//! - Optional whole-file job service with local fallback
//! - Progress events through closures or channels
//! - Hand-off lists for translating cells outside the tool, and applying the answers
//!
//! ## Example
//!
//! ```rust
//! use sheetlingo::prelude::*;
//!
//! let mut source = Workbook::empty();
//! let idx = source.add_worksheet_with_name("Sheet1").unwrap();
//! let grid = source.worksheet_mut(idx).unwrap().grid_mut();
//! grid.set(CellAddress::parse("A1").unwrap(), Cell::new("발주서"));
//!
//! let translator = Translator::offline(AssembleOptions {
//!     keep_originals: true,
//!     ..Default::default()
//! });
//! let out = translator
//!     .translate_workbook(&source, &SelectionModel::new(), &mut NoProgress)
//!     .unwrap();
//!
//! assert_eq!(out.workbook.sheet_names(), vec!["Sheet1", "Sheet1_中文"]);
//! // out.workbook.save("order_중문번역.xlsx").unwrap();
//! ```

pub mod assemble;
pub mod error;
pub mod io;
pub mod manual;
pub mod naming;
pub mod prelude;
pub mod progress;
pub mod transform;
pub mod workflow;

pub use assemble::{Assembled, AssembleOptions, SheetReport, WorkbookAssembler};
pub use error::{Error, Result};
pub use io::{read_workbook, write_workbook, Container, WorkbookExt};
pub use manual::{collect_items, prompt, CellOverrides, WorkItem};
pub use naming::{derive_sheet_name, output_path, retarget_sheet_refs};
pub use progress::{NoProgress, Progress, ProgressSink, Stage};
pub use transform::{PreserveRule, TransformOptions, TransformStats, WorksheetTransformer};
pub use workflow::{job_request, FileReport, Route, Translator};

// Re-export core types
pub use sheetlingo_core::{
    Cell, CellAddress, CellRange, CellType, CellValue, DefinedName, ExclusionSummary, Formula,
    FormulaKind, QualifiedRange, QualifiedRef, SelectionModel, SheetState, SparseGrid, TextRun,
    Workbook, Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export rewrite types
pub use sheetlingo_rewrite::{
    Direction, FallbackRewriter, Glossary, JobClient, JobClientConfig, LocalRewrite, Offline,
    Outcome, RemoteConfig, RemoteRewriter, RewriteError, TextRewriter,
};

// Re-export I/O types
pub use sheetlingo_xlsx::{XlsxError, XlsxReader, XlsxWriter};
#[cfg(feature = "xls")]
pub use sheetlingo_xls::{XlsError, XlsReader};
