//! Per-sheet copy-and-rewrite
//!
//! The transformer deep-copies a worksheet and rewrites the string cells
//! the selection leaves in play. Styles, formulas, merges and sizing come
//! across untouched.
//!
//! # Example
//!
//! ```rust
//! use sheetlingo::prelude::*;
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.grid_mut().set(CellAddress::new(0, 0), Cell::new("발주서"));
//!
//! let rewriter = FallbackRewriter::local(Glossary::builtin());
//! let selection = SelectionModel::new();
//! let transformer = WorksheetTransformer::new(&rewriter, &selection, TransformOptions::default());
//!
//! let (out, stats) = transformer.transform(&sheet);
//! assert_eq!(out.grid().get(&CellAddress::new(0, 0)).unwrap().value, CellValue::string("订单书"));
//! assert_eq!(stats.rewritten, 1);
//! ```

use std::fmt;
use std::ops::AddAssign;

use sheetlingo_core::{Cell, CellAddress, CellValue, SelectionModel, Worksheet};
use sheetlingo_rewrite::{
    looks_english, Direction, FallbackRewriter, LocalRewrite, Outcome, TextRewriter,
};

use crate::manual::CellOverrides;

/// Text that is copied as is even when nothing excludes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreserveRule {
    /// Every eligible string is rewritten
    Nothing,
    /// Plain ASCII text (codes, e-mail addresses, URLs) is kept
    #[default]
    English,
}

impl PreserveRule {
    pub fn matches(self, text: &str) -> bool {
        match self {
            PreserveRule::Nothing => false,
            PreserveRule::English => looks_english(text),
        }
    }
}

/// Options for a transformation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformOptions {
    pub direction: Direction,
    pub preserve: PreserveRule,
}

impl TransformOptions {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Default::default()
        }
    }

    /// Keep or rewrite English-looking text
    pub fn preserve_english(mut self, preserve: bool) -> Self {
        self.preserve = if preserve {
            PreserveRule::English
        } else {
            PreserveRule::Nothing
        };
        self
    }
}

/// Counters from a transformation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Cells whose value changed
    pub rewritten: usize,
    /// String cells skipped by the selection
    pub excluded: usize,
    /// String cells kept by the preserve rule
    pub preserved: usize,
    /// Formula cells, never rewritten
    pub formulas_skipped: usize,
    /// Cells where the primary rewriter failed and the glossary was used
    pub fallbacks: usize,
}

impl AddAssign for TransformStats {
    fn add_assign(&mut self, other: Self) {
        self.rewritten += other.rewritten;
        self.excluded += other.excluded;
        self.preserved += other.preserved;
        self.formulas_skipped += other.formulas_skipped;
        self.fallbacks += other.fallbacks;
    }
}

impl fmt::Display for TransformStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rewritten, {} excluded, {} preserved, {} formulas skipped, {} fallbacks",
            self.rewritten, self.excluded, self.preserved, self.formulas_skipped, self.fallbacks
        )
    }
}

/// Copies worksheets, rewriting eligible string cells
pub struct WorksheetTransformer<'a, P, F> {
    rewriter: &'a FallbackRewriter<P, F>,
    selection: &'a SelectionModel,
    options: TransformOptions,
    overrides: Option<&'a CellOverrides>,
}

impl<'a, P, F> WorksheetTransformer<'a, P, F>
where
    P: TextRewriter,
    F: LocalRewrite,
{
    pub fn new(
        rewriter: &'a FallbackRewriter<P, F>,
        selection: &'a SelectionModel,
        options: TransformOptions,
    ) -> Self {
        Self {
            rewriter,
            selection,
            options,
            overrides: None,
        }
    }

    /// Write the given translations instead of calling the rewriter.
    /// String cells without an entry are copied unchanged.
    pub fn with_overrides(mut self, overrides: &'a CellOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transform `source` into a new sheet with the same name.
    ///
    /// Selection lookups use the source sheet's name. `source` is never
    /// modified.
    pub fn transform(&self, source: &Worksheet) -> (Worksheet, TransformStats) {
        let name = source.name();
        let mut out = source.copy_as(name);
        let mut stats = TransformStats::default();

        for (addr, cell) in source.grid().iter() {
            if cell.has_formula() {
                stats.formulas_skipped += 1;
                continue;
            }
            let text = match &cell.value {
                CellValue::String(s) if !s.trim().is_empty() => s.as_str(),
                _ => continue,
            };

            if self.selection.is_excluded(name, addr, Some(text)) {
                stats.excluded += 1;
                continue;
            }
            if let Some(overrides) = self.overrides {
                if let (Some(text), Some(target)) =
                    (overrides.get(name, addr), out.grid_mut().get_mut(&addr))
                {
                    apply(target, addr, text.to_string());
                    stats.rewritten += 1;
                }
                continue;
            }
            if self.options.preserve.matches(text) {
                stats.preserved += 1;
                continue;
            }

            let rewritten = self
                .rewriter
                .rewrite_with_outcome(text, self.options.direction);
            if let Outcome::Fallback(e) = &rewritten.outcome {
                log::warn!("{}!{}: rewrite failed, used glossary: {}", name, addr, e);
                stats.fallbacks += 1;
            }
            if rewritten.text == text {
                continue;
            }

            if let Some(target) = out.grid_mut().get_mut(&addr) {
                apply(target, addr, rewritten.text);
                stats.rewritten += 1;
            }
        }

        log::debug!("Sheet '{}': {}", name, stats);
        (out, stats)
    }
}

fn apply(cell: &mut Cell, addr: CellAddress, text: String) {
    log::trace!("{} -> {:?}", addr, text);
    if cell.display.is_some() {
        cell.display = Some(text.clone());
    }
    cell.set_text(text);
}
