//! Workbook-level orchestration

use sheetlingo_core::{DefinedName, Error as CoreError, SelectionModel, Workbook};
use sheetlingo_rewrite::{FallbackRewriter, LocalRewrite, TextRewriter};

use crate::error::Result;
use crate::manual::CellOverrides;
use crate::naming::{derive_sheet_name, retarget_sheet_refs};
use crate::progress::{Progress, ProgressSink};
use crate::transform::{TransformOptions, TransformStats, WorksheetTransformer};

/// Options for assembling a translated workbook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssembleOptions {
    /// Keep each original sheet and add the translation after it
    pub keep_originals: bool,
    pub transform: TransformOptions,
}

/// Statistics for one output sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    pub source: String,
    pub output: String,
    pub stats: TransformStats,
}

/// Result of a successful assembly
#[derive(Debug, Clone)]
pub struct Assembled {
    pub workbook: Workbook,
    pub sheets: Vec<SheetReport>,
}

impl Assembled {
    /// Counters summed over every sheet
    pub fn stats(&self) -> TransformStats {
        let mut total = TransformStats::default();
        for sheet in &self.sheets {
            total += sheet.stats;
        }
        total
    }
}

/// Builds a translated workbook sheet by sheet
pub struct WorkbookAssembler<'a, P, F> {
    transformer: WorksheetTransformer<'a, P, F>,
    keep_originals: bool,
}

impl<'a, P, F> WorkbookAssembler<'a, P, F>
where
    P: TextRewriter,
    F: LocalRewrite,
{
    pub fn new(
        rewriter: &'a FallbackRewriter<P, F>,
        selection: &'a SelectionModel,
        options: AssembleOptions,
    ) -> Self {
        Self {
            transformer: WorksheetTransformer::new(rewriter, selection, options.transform),
            keep_originals: options.keep_originals,
        }
    }

    /// Apply fixed per-cell translations instead of rewriting
    pub fn with_overrides(mut self, overrides: &'a CellOverrides) -> Self {
        self.transformer = self.transformer.with_overrides(overrides);
        self
    }

    /// Output sheet names in order, checked for collisions up front
    fn plan(&self, source: &Workbook) -> Result<Vec<(usize, Option<String>)>> {
        let direction = self.transformer.options().direction;
        let mut names: Vec<String> = Vec::new();
        let mut plan = Vec::with_capacity(source.sheet_count());

        for (index, sheet) in source.worksheets().enumerate() {
            let derived = self
                .keep_originals
                .then(|| derive_sheet_name(sheet.name(), direction));
            names.push(sheet.name().to_lowercase());
            plan.push((index, derived));
        }
        for (_, derived) in &plan {
            if let Some(name) = derived {
                let lower = name.to_lowercase();
                if names.contains(&lower) {
                    return Err(CoreError::DuplicateSheetName(name.clone()).into());
                }
                names.push(lower);
            }
        }
        Ok(plan)
    }

    /// Transform every sheet of `source` into a new workbook.
    ///
    /// Progress is reported before each sheet and once more at 100% when
    /// done. On error nothing partial is returned.
    pub fn assemble<S: ProgressSink + ?Sized>(
        &self,
        source: &Workbook,
        sink: &mut S,
    ) -> Result<Assembled> {
        let plan = self.plan(source)?;
        let total = plan.len();

        let mut workbook = Workbook::empty();
        workbook.inherit_raw_parts(source);
        for name in source.defined_names() {
            workbook.add_defined_name(name.clone());
        }
        let mut sheets = Vec::with_capacity(total);

        log::info!(
            "Translating {} sheets ({}, keep originals: {})",
            total,
            self.transformer.options().direction,
            self.keep_originals
        );

        for (completed, (index, derived)) in plan.into_iter().enumerate() {
            let original = match source.worksheet(index) {
                Some(sheet) => sheet,
                None => continue,
            };
            sink.report(Progress::sheet(completed, total, original.name()));

            let (mut translated, stats) = self.transformer.transform(original);
            if let Some(name) = derived {
                // Names scoped to the original get a twin on the translation
                for scoped in source.names_scoped_to(original.name()) {
                    workbook.add_defined_name(DefinedName {
                        value: retarget_sheet_refs(&scoped.value, original.name(), &name),
                        local_sheet: Some(name.clone()),
                        ..scoped.clone()
                    });
                }
                workbook.add_existing_worksheet(original.copy_as(original.name()))?;
                translated.set_name(name);
            }
            let output = translated.name().to_string();
            workbook.add_existing_worksheet(translated)?;

            sheets.push(SheetReport {
                source: original.name().to_string(),
                output,
                stats,
            });
        }

        sink.report(Progress::done(total));

        let assembled = Assembled { workbook, sheets };
        log::info!("Translation finished: {}", assembled.stats());
        Ok(assembled)
    }
}
