//! Sheetlingo CLI - workbook translation tool

mod config;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetlingo::prelude::*;
use sheetlingo::{
    collect_items, output_path, prompt, CellOverrides, JobClient, JobClientConfig, Route, Stage,
};
use std::path::{Path, PathBuf};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "lingo")]
#[command(
    author,
    version,
    about = "Translate spreadsheet workbooks between Korean and Chinese"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a workbook and write the result as xlsx
    Translate {
        /// Input workbook (xlsx or xls)
        input: PathBuf,

        /// Output file (default: <input>_중문번역.xlsx or <input>_한국어번역.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Translation direction
        #[arg(short, long, default_value = "ko-zh")]
        direction: Direction,

        /// Keep original sheets and add translated copies after them
        #[arg(short, long)]
        keep_originals: bool,

        /// Translate English-looking text too
        #[arg(long)]
        no_preserve_english: bool,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Extra glossary (TOML or JSON), applied before the built-in terms
        #[arg(short, long)]
        glossary: Option<PathBuf>,

        /// Use the glossary only; no network calls
        #[arg(long)]
        offline: bool,

        /// Whole-file job service to try first
        #[arg(long)]
        job_server: Option<String>,

        /// Config file (default: <config dir>/sheetlingo/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the cells to translate as a prompt for a chat assistant
    Extract {
        /// Input workbook (xlsx or xls)
        input: PathBuf,

        /// Write the prompt here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Translation direction
        #[arg(short, long, default_value = "ko-zh")]
        direction: Direction,

        /// List English-looking text too
        #[arg(long)]
        no_preserve_english: bool,

        /// Print only the `<Sheet!A1, text>` lines
        #[arg(long)]
        list_only: bool,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Write an assistant's `<Sheet!A1, text> -> translation` answer into a copy of the workbook
    Apply {
        /// Input workbook (xlsx or xls)
        input: PathBuf,

        /// File holding the answer
        answer: PathBuf,

        /// Output file (default: <input>_중문번역.xlsx or <input>_한국어번역.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Translation direction, used for sheet and file names
        #[arg(short, long, default_value = "ko-zh")]
        direction: Direction,

        /// Keep original sheets and add translated copies after them
        #[arg(short, long)]
        keep_originals: bool,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Input workbook
        input: PathBuf,
    },

    /// Show information about a workbook
    Info {
        /// Input workbook
        input: PathBuf,
    },

    /// Print the exclusion summary for a set of flags
    Selection {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Exclusion flags, applied in the order listed here
#[derive(Args, Debug, Default)]
struct SelectionArgs {
    /// Skip a whole sheet (repeatable)
    #[arg(long = "exclude-sheet", value_name = "SHEET")]
    sheets: Vec<String>,

    /// Skip cells or ranges, e.g. Sheet1!A1 or 'My Sheet'!B2:C4 (repeatable, comma lists allowed)
    #[arg(long = "exclude-cell", value_name = "REF")]
    cells: Vec<String>,

    /// Flip every cell between two corners, e.g. Sheet1!A1:B3 (repeatable)
    #[arg(long = "toggle-range", value_name = "REF:REF")]
    toggles: Vec<String>,

    /// Skip cells whose text contains this, ignoring case (repeatable)
    #[arg(long = "exclude-pattern", value_name = "TEXT")]
    patterns: Vec<String>,
}

impl SelectionArgs {
    fn build(&self) -> Result<SelectionModel> {
        let mut selection = SelectionModel::new();
        for sheet in &self.sheets {
            if !selection.is_sheet_excluded(sheet) {
                selection.toggle_sheet(sheet);
            }
        }
        for cells in &self.cells {
            selection
                .exclude_ranges(cells)
                .with_context(|| format!("Invalid --exclude-cell '{}'", cells))?;
        }
        for toggle in &self.toggles {
            let (anchor, target) = parse_toggle(toggle)
                .with_context(|| format!("Invalid --toggle-range '{}'", toggle))?;
            selection
                .toggle_range(&anchor, &target)
                .with_context(|| format!("Invalid --toggle-range '{}'", toggle))?;
        }
        for pattern in &self.patterns {
            selection.add_pattern(pattern);
        }
        Ok(selection)
    }
}

/// `Sheet!A1:B3` or `Sheet!A1:Other!B3`; a bare target cell uses the anchor's sheet
fn parse_toggle(s: &str) -> Result<(QualifiedRef, QualifiedRef)> {
    let (anchor, target) = match s.rsplit_once(':') {
        Some(parts) => parts,
        None => bail!("expected two corners separated by ':'"),
    };
    let anchor = QualifiedRef::parse(anchor)?;
    let target = if target.contains('!') {
        QualifiedRef::parse(target)?
    } else {
        QualifiedRef::new(anchor.sheet.clone(), CellAddress::parse(target)?)
    };
    Ok((anchor, target))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            input,
            output,
            direction,
            keep_originals,
            no_preserve_english,
            selection,
            glossary,
            offline,
            job_server,
            config,
        } => {
            let config = Config::load(config.as_deref())?;
            let request = TranslateRequest {
                output,
                direction,
                keep_originals,
                no_preserve_english,
                glossary,
                offline,
                job_server,
            };
            translate(&input, &request, &selection, &config)
        }
        Commands::Extract {
            input,
            output,
            direction,
            no_preserve_english,
            list_only,
            selection,
        } => {
            let options = TransformOptions::new(direction).preserve_english(!no_preserve_english);
            extract(&input, output.as_deref(), options, list_only, &selection)
        }
        Commands::Apply {
            input,
            answer,
            output,
            direction,
            keep_originals,
            selection,
        } => {
            let options = AssembleOptions {
                keep_originals,
                transform: TransformOptions::new(direction),
            };
            apply(&input, &answer, output.as_deref(), options, &selection)
        }
        Commands::Sheets { input } => list_sheets(&input),
        Commands::Info { input } => show_info(&input),
        Commands::Selection { selection, json } => show_selection(&selection, json),
    }
}

struct TranslateRequest {
    output: Option<PathBuf>,
    direction: Direction,
    keep_originals: bool,
    no_preserve_english: bool,
    glossary: Option<PathBuf>,
    offline: bool,
    job_server: Option<String>,
}

fn build_glossary(path: Option<&Path>) -> Result<Glossary> {
    let mut glossary = match path {
        Some(path) => Glossary::load(path)
            .with_context(|| format!("Failed to load glossary '{}'", path.display()))?,
        None => Glossary::new(),
    };
    let builtin = Glossary::builtin();
    glossary.extend(
        builtin
            .terms()
            .iter()
            .map(|t| (t.source.clone(), t.target.clone())),
    );
    Ok(glossary)
}

fn translate(
    input: &Path,
    request: &TranslateRequest,
    selection: &SelectionArgs,
    config: &Config,
) -> Result<()> {
    let selection = selection.build()?;
    let preserve_english = !request.no_preserve_english && config.preserve_english.unwrap_or(true);
    let options = AssembleOptions {
        keep_originals: request.keep_originals || config.keep_originals.unwrap_or(false),
        transform: TransformOptions::new(request.direction).preserve_english(preserve_english),
    };

    let glossary = build_glossary(request.glossary.as_deref().or(config.glossary.as_deref()))?;

    let primary: Option<Box<dyn TextRewriter>> = if request.offline {
        None
    } else {
        let mut remote = RemoteConfig::default();
        if let Some(endpoints) = &config.endpoints {
            remote.endpoints = endpoints.clone();
        }
        if let Some(timeout) = config.timeout() {
            remote.timeout = timeout;
        }
        let remote = RemoteRewriter::new(remote).context("Failed to set up translation client")?;
        Some(Box::new(remote))
    };

    let mut translator = Translator::new(FallbackRewriter::new(primary, glossary), options);

    let job_server = request.job_server.clone().or_else(|| config.job_server.clone());
    if let (false, Some(base_url)) = (request.offline, job_server) {
        let mut jobs = JobClientConfig::new(base_url);
        if let Some(interval) = config.poll_interval() {
            jobs.poll_interval = interval;
        }
        let client = JobClient::new(jobs).context("Failed to set up job client")?;
        translator = translator.with_job_client(client);
    }

    let summary = selection.summarize();
    if !summary.is_empty() {
        eprint!("Exclusions:\n{}", summary);
    }

    let mut progress = |p: Progress| match p.stage {
        Stage::Sheet => eprintln!(
            "[{:>3}%] {} ({}/{})",
            p.percent,
            p.sheet.unwrap_or_default(),
            p.completed + 1,
            p.total
        ),
        Stage::Remote(message) => eprintln!("[{:>3}%] {}", p.percent, message),
        Stage::Done => eprintln!("[100%] done"),
    };

    let report = translator
        .translate_file(input, request.output.as_deref(), &selection, &mut progress)
        .with_context(|| format!("Failed to translate '{}'", input.display()))?;

    match &report.route {
        Route::Job { id } => eprintln!("Translated by job service (job {})", id),
        Route::Local => {}
    }
    if let Some(stats) = report.stats {
        eprintln!("{}", stats);
    }
    eprintln!(
        "Wrote {} sheets to '{}'",
        report.sheets.len(),
        report.output.display()
    );

    Ok(())
}

fn open(input: &Path) -> Result<Workbook> {
    Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn extract(
    input: &Path,
    output: Option<&Path>,
    options: TransformOptions,
    list_only: bool,
    selection: &SelectionArgs,
) -> Result<()> {
    let workbook = open(input)?;
    let items = collect_items(&workbook, &selection.build()?, options);

    let text: String = if list_only {
        items.iter().map(|item| format!("{}\n", item)).collect()
    } else {
        prompt(&items, options.direction)
    };
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!("Wrote {} cells to '{}'", items.len(), path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn apply(
    input: &Path,
    answer: &Path,
    output: Option<&Path>,
    options: AssembleOptions,
    selection: &SelectionArgs,
) -> Result<()> {
    let workbook = open(input)?;
    let text = std::fs::read_to_string(answer)
        .with_context(|| format!("Failed to read '{}'", answer.display()))?;
    let overrides = CellOverrides::parse(&text);
    if overrides.is_empty() {
        bail!("No `<Sheet!A1, text> -> translation` lines in '{}'", answer.display());
    }
    for cell in overrides.unmatched(&workbook) {
        eprintln!("Ignoring {}: not a text cell", cell);
    }

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_path(input, options.transform.direction));
    let assembled = Translator::offline(options)
        .apply_overrides(&workbook, &selection.build()?, &overrides, &mut NoProgress)
        .with_context(|| format!("Failed to apply '{}'", answer.display()))?;
    assembled
        .workbook
        .save(&output)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;

    eprintln!(
        "Applied {} of {} translations, wrote '{}'",
        assembled.stats().rewritten,
        overrides.len(),
        output.display()
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook = open(input)?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.worksheets().enumerate() {
        let grid = sheet.grid();
        let formula_count = grid.iter().filter(|(_, cell)| cell.has_formula()).count();

        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());
        println!("    Used range: {}", grid.used_range());
        println!("    Cells: {}", grid.cell_count());
        println!("    Formulas: {}", formula_count);
        println!("    Merged regions: {}", grid.merged_regions().len());
    }

    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let workbook = open(input)?;

    for (i, name) in workbook.sheet_names().into_iter().enumerate() {
        println!("{}\t{}", i, name);
    }

    Ok(())
}

fn show_selection(args: &SelectionArgs, json: bool) -> Result<()> {
    let summary = args.build()?.summarize();
    if json {
        let text = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
        println!("{}", text);
    } else {
        print!("{}", summary);
    }
    Ok(())
}
