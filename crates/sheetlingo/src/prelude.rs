//! Prelude module - common imports for sheetlingo users
//!
//! ```rust
//! use sheetlingo::prelude::*;
//! ```

pub use crate::{
    // Orchestration
    AssembleOptions,
    // Model
    Cell,
    CellAddress,
    CellRange,
    CellValue,
    Direction,
    // Errors
    Error,
    FallbackRewriter,
    Formula,
    Glossary,
    NoProgress,
    Progress,
    ProgressSink,
    QualifiedRef,
    RemoteConfig,
    RemoteRewriter,
    Result,
    SelectionModel,
    TextRewriter,
    TransformOptions,
    TransformStats,
    Translator,
    Workbook,
    WorkbookAssembler,
    // Extension traits
    WorkbookExt,
    Worksheet,
    WorksheetTransformer,
};
