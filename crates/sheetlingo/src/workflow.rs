//! File-to-file translation: remote job first, local engine as fallback

use std::path::{Path, PathBuf};

use sheetlingo_core::{SelectionModel, Workbook};
use sheetlingo_rewrite::{
    FallbackRewriter, Glossary, JobClient, JobRequest, LocalRewrite, Offline, RewriteError,
    TextRewriter,
};

use crate::assemble::{AssembleOptions, Assembled, WorkbookAssembler};
use crate::error::{Error, Result};
use crate::io::{read_workbook, Container, WorkbookExt};
use crate::manual::CellOverrides;
use crate::naming::output_path;
use crate::progress::{Progress, ProgressSink, Resumed};
use crate::transform::{PreserveRule, TransformStats};

/// Which path produced the output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The job service translated the whole file
    Job { id: String },
    /// Translated in-process
    Local,
}

/// Outcome of [`Translator::translate_file`]
#[derive(Debug, Clone)]
pub struct FileReport {
    pub output: PathBuf,
    pub route: Route,
    /// Output sheet names in order
    pub sheets: Vec<String>,
    /// Only known for local runs
    pub stats: Option<TransformStats>,
}

/// Ties the rewrite capability, optional job service and options together
pub struct Translator<P, F> {
    rewriter: FallbackRewriter<P, F>,
    jobs: Option<JobClient>,
    options: AssembleOptions,
}

impl Translator<Offline, Glossary> {
    /// Glossary-only translation, no network
    pub fn offline(options: AssembleOptions) -> Self {
        Self::new(FallbackRewriter::local(Glossary::builtin()), options)
    }
}

impl<P, F> Translator<P, F>
where
    P: TextRewriter,
    F: LocalRewrite,
{
    pub fn new(rewriter: FallbackRewriter<P, F>, options: AssembleOptions) -> Self {
        Self {
            rewriter,
            jobs: None,
            options,
        }
    }

    /// Try the job service before translating locally
    pub fn with_job_client(mut self, jobs: JobClient) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn options(&self) -> &AssembleOptions {
        &self.options
    }

    pub fn rewriter(&self) -> &FallbackRewriter<P, F> {
        &self.rewriter
    }

    /// Translate an in-memory workbook
    pub fn translate_workbook<S: ProgressSink + ?Sized>(
        &self,
        source: &Workbook,
        selection: &SelectionModel,
        sink: &mut S,
    ) -> Result<Assembled> {
        WorkbookAssembler::new(&self.rewriter, selection, self.options).assemble(source, sink)
    }

    /// Write hand-made translations into a copy of `source`.
    ///
    /// Only cells listed in `overrides` change; the rewriter is never
    /// called. Sheet layout follows the same options as a translation run.
    pub fn apply_overrides<S: ProgressSink + ?Sized>(
        &self,
        source: &Workbook,
        selection: &SelectionModel,
        overrides: &CellOverrides,
        sink: &mut S,
    ) -> Result<Assembled> {
        for cell in overrides.unmatched(source) {
            log::warn!("{} is not a text cell of this workbook, ignored", cell);
        }
        WorkbookAssembler::new(&self.rewriter, selection, self.options)
            .with_overrides(overrides)
            .assemble(source, sink)
    }

    /// Translate `input` and write the result.
    ///
    /// The input is parsed before anything else so an unreadable file fails
    /// fast. With a job client the file is sent to the service; any failure
    /// there falls back to the local engine, whose progress continues from
    /// wherever the job left off. `output` defaults to [`output_path`].
    /// Nothing is written unless the run succeeds.
    pub fn translate_file<S: ProgressSink + ?Sized>(
        &self,
        input: &Path,
        output: Option<&Path>,
        selection: &SelectionModel,
        sink: &mut S,
    ) -> Result<FileReport> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output_path(input, self.options.transform.direction));
        let bytes = std::fs::read(input)?;
        let source = read_workbook(&bytes).map_err(|e| match e {
            Error::UnsupportedContainer(msg) => {
                Error::UnsupportedContainer(format!("{}: {}", input.display(), msg))
            }
            other => other,
        })?;

        let mut floor = 0u8;
        if let Some(jobs) = &self.jobs {
            let file_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "workbook.xlsx".to_string());

            match self.run_job(jobs, &file_name, bytes, selection, &mut floor, sink) {
                Ok((id, translated)) => {
                    std::fs::write(&output, translated.bytes)?;
                    log::info!("Job {} wrote {}", id, output.display());
                    return Ok(FileReport {
                        output,
                        route: Route::Job { id },
                        sheets: translated.sheets,
                        stats: None,
                    });
                }
                Err(e) => log::warn!("Translation job failed, translating locally: {}", e),
            }
        }

        let mut resumed = Resumed::new(sink, floor);
        let assembled = self.translate_workbook(&source, selection, &mut resumed)?;
        assembled.workbook.save(&output)?;
        log::info!("Wrote {}", output.display());

        Ok(FileReport {
            output,
            route: Route::Local,
            sheets: assembled
                .workbook
                .sheet_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            stats: Some(assembled.stats()),
        })
    }

    fn run_job<S: ProgressSink + ?Sized>(
        &self,
        jobs: &JobClient,
        file_name: &str,
        bytes: Vec<u8>,
        selection: &SelectionModel,
        reached: &mut u8,
        sink: &mut S,
    ) -> std::result::Result<(String, JobResult), RewriteError> {
        let request = job_request(&self.options, selection);
        let handle = jobs.submit(file_name, bytes, &request)?;

        let output = jobs.wait(&handle, |percent, message| {
            *reached = (*reached).max(percent);
            sink.report(Progress::remote(*reached, message));
        })?;
        let translated = jobs.download(&output)?;

        // Never hand back something we could not open ourselves
        let workbook = match Container::sniff(&translated) {
            Some(Container::Xlsx) => read_workbook(&translated)
                .map_err(|e| RewriteError::Parse(format!("downloaded workbook: {}", e)))?,
            _ => {
                return Err(RewriteError::Parse(
                    "downloaded file is not an xlsx workbook".into(),
                ))
            }
        };

        let sheets = workbook
            .sheet_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok((
            handle.id,
            JobResult {
                bytes: translated,
                sheets,
            },
        ))
    }
}

struct JobResult {
    bytes: Vec<u8>,
    sheets: Vec<String>,
}

/// The selection and options in the job service's vocabulary
pub fn job_request(options: &AssembleOptions, selection: &SelectionModel) -> JobRequest {
    JobRequest {
        direction: options.transform.direction,
        preserve_english: options.transform.preserve == PreserveRule::English,
        add_new_sheet: options.keep_originals,
        exclude_sheets: selection
            .excluded_sheets()
            .into_iter()
            .map(str::to_string)
            .collect(),
        exclude_cells: selection
            .excluded_cells()
            .into_iter()
            .map(|r| r.to_string())
            .collect(),
        exclude_patterns: selection.patterns().to_vec(),
    }
}
