//! XLSX reader

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::escapes::decode_excel_escapes;
use crate::fragments::{self, Capture};
use crate::parts;
use sheetlingo_core::{
    Cell, CellAddress, CellRange, CellValue, ColumnInfo, DefinedName, Formula, FormulaKind,
    RawRelationship, RawSheetXml, RowInfo, SheetState, SparseGrid, TextRun, Workbook, Worksheet,
};

/// Targets of the workbook part's relationships
#[derive(Debug, Default)]
struct WorkbookRels {
    /// rId → worksheet part path
    worksheets: HashMap<String, String>,
    styles: Option<String>,
    theme: Option<String>,
    shared_strings: Option<String>,
}

/// A `<sheet>` entry of workbook.xml
#[derive(Debug)]
struct SheetEntry {
    name: String,
    r_id: String,
    state: SheetState,
}

/// A `<definedName>` entry of workbook.xml, scope still as a sheet position
#[derive(Debug, Default)]
struct NameEntry {
    name: String,
    value: String,
    local_sheet_id: Option<usize>,
    hidden: bool,
}

/// One `<si>` of the shared string table
#[derive(Debug, Clone, Default, PartialEq)]
struct SharedString {
    text: String,
    runs: Option<Vec<TextRun>>,
}

/// Decoded runs, or `None` for a plain string
fn finish_runs(runs: Vec<TextRun>) -> Option<Vec<TextRun>> {
    if runs.is_empty() {
        return None;
    }
    Some(
        runs.into_iter()
            .map(|run| TextRun {
                text: decode_excel_escapes(&run.text),
                properties: run.properties,
            })
            .collect(),
    )
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

fn attr_parse<T: std::str::FromStr>(e: &BytesStart<'_>, key: &[u8]) -> Option<T> {
    attr_value(e, key).and_then(|s| s.parse().ok())
}

fn attr_bool(e: &BytesStart<'_>, key: &[u8]) -> bool {
    attr_value(e, key).map_or(false, |s| s == "1" || s == "true")
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name(parts::CONTENT_TYPES).is_err() {
            return Err(XlsxError::InvalidFormat(format!(
                "Missing {}",
                parts::CONTENT_TYPES
            )));
        }

        let rels = Self::read_workbook_rels(&mut archive)?;

        let shared_strings_path = rels
            .shared_strings
            .clone()
            .unwrap_or_else(|| parts::SHARED_STRINGS.to_string());
        let shared_strings = Self::read_shared_strings(&mut archive, &shared_strings_path)?;

        let (entries, names) = Self::read_workbook_xml(&mut archive)?;

        let mut workbook = Workbook::empty();
        for name in names {
            let local_sheet = match name.local_sheet_id {
                Some(id) => match entries.get(id) {
                    Some(entry) => Some(entry.name.clone()),
                    None => {
                        warn!("dropping name '{}': no sheet at position {}", name.name, id);
                        continue;
                    }
                },
                None => None,
            };
            workbook.add_defined_name(DefinedName {
                name: name.name,
                value: name.value,
                local_sheet,
                hidden: name.hidden,
            });
        }

        for entry in entries {
            let Some(path) = rels.worksheets.get(&entry.r_id) else {
                // Chart sheets and dialog sheets have no grid to carry
                warn!("skipping sheet '{}': {} is not a worksheet", entry.name, entry.r_id);
                continue;
            };

            let (grid, raw) = Self::read_worksheet(&mut archive, path, &shared_strings)?;
            debug!(
                "read sheet '{}' from {}: {} cells, {} merges, {} carried elements",
                entry.name,
                path,
                grid.cell_count(),
                grid.merged_regions().len(),
                raw.fragments.len()
            );

            let mut sheet = Worksheet::with_grid(entry.name, grid);
            sheet.set_state(entry.state);
            sheet.set_raw(raw);
            workbook.add_existing_worksheet(sheet)?;
        }

        // The style table and theme travel as opaque parts
        for (source, target) in [
            (rels.styles.as_deref(), parts::STYLES),
            (rels.theme.as_deref(), parts::THEME),
        ] {
            if let Some(source) = source {
                if let Some(bytes) = Self::read_part_bytes(&mut archive, source)? {
                    workbook.set_raw_part(target, bytes);
                }
            }
        }

        Ok(workbook)
    }

    fn read_part_bytes<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
    ) -> XlsxResult<Option<Vec<u8>>> {
        let mut file = match archive.by_name(path) {
            Ok(f) => f,
            Err(_) => {
                warn!("relationship points at missing part {}", path);
                return Ok(None);
            }
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    /// Read the shared strings table
    ///
    /// The string value is the concatenated run text; runs keep their
    /// `<rPr>` markup. Phonetic guides (`<rPh>`) are not part of the cell
    /// text and are skipped.
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
    ) -> XlsxResult<Vec<SharedString>> {
        let mut strings = Vec::new();

        let file = match archive.by_name(path) {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        // Leading and trailing spaces inside <t> are content
        xml_reader.trim_text(false);

        let no_ids = HashSet::new();
        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut runs: Vec<TextRun> = Vec::new();
        let mut properties: Option<Capture> = None;
        let mut in_si = false;
        let mut in_run = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            let event = xml_reader.read_event_into(&mut buf)?;

            if properties.is_none() && in_run {
                if let Event::Start(e) | Event::Empty(e) = &event {
                    if e.local_name().as_ref() == b"rPr" {
                        properties = Some(Capture::new(e));
                    }
                }
            }
            if let Some(capture) = properties.as_mut() {
                if capture.feed(&event, &no_ids)? {
                    if let (Some(done), Some(run)) = (properties.take(), runs.last_mut()) {
                        run.properties = Some(done.finish()?.xml);
                    }
                }
                buf.clear();
                continue;
            }

            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                        runs.clear();
                    }
                    b"r" if in_si && !in_phonetic => {
                        in_run = true;
                        runs.push(TextRun::plain(""));
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                    strings.push(SharedString::default());
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(SharedString {
                            text: decode_excel_escapes(&current_string),
                            runs: finish_runs(std::mem::take(&mut runs)),
                        });
                        current_string.clear();
                        in_si = false;
                    }
                    b"r" => in_run = false,
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Event::Text(e) if in_t => {
                    let text = e.unescape()?;
                    current_string.push_str(&text);
                    if in_run {
                        if let Some(run) = runs.last_mut() {
                            run.text.push_str(&text);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names, rIds, visibility and defined names
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<(Vec<SheetEntry>, Vec<NameEntry>)> {
        let file = archive
            .by_name(parts::WORKBOOK)
            .map_err(|_| XlsxError::MissingPart(parts::WORKBOOK.into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut names = Vec::new();
        let mut current_name: Option<NameEntry> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"definedName" => {
                    current_name = attr_value(&e, b"name").map(|name| NameEntry {
                        name,
                        local_sheet_id: attr_parse(&e, b"localSheetId"),
                        hidden: attr_bool(&e, b"hidden"),
                        ..Default::default()
                    });
                }
                Ok(Event::Text(e)) if current_name.is_some() => {
                    if let Some(name) = current_name.as_mut() {
                        name.value.push_str(&e.unescape()?);
                    }
                }
                Ok(Event::End(e)) if e.local_name().as_ref() == b"definedName" => {
                    names.extend(current_name.take());
                }
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"sheet" =>
                {
                    let mut name = None;
                    let mut r_id = None;
                    let mut state = SheetState::Visible;

                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"name" => name = value,
                            b"state" => {
                                state = match value.as_deref() {
                                    Some("hidden") => SheetState::Hidden,
                                    Some("veryHidden") => SheetState::VeryHidden,
                                    _ => SheetState::Visible,
                                }
                            }
                            // r:id, whatever the prefix
                            _ if attr.key.local_name().as_ref() == b"id" => r_id = value,
                            _ => {}
                        }
                    }

                    match (name, r_id) {
                        (Some(name), Some(r_id)) => sheets.push(SheetEntry { name, r_id, state }),
                        _ => {
                            return Err(XlsxError::Parse(
                                "<sheet> without name or r:id".into(),
                            ))
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, names))
    }

    /// External relationships of a sheet part; other targets are not carried
    fn read_sheet_relationships<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        sheet_path: &str,
    ) -> XlsxResult<Vec<RawRelationship>> {
        let mut relationships = Vec::new();
        let file = match archive.by_name(&parts::rels_path(sheet_path)) {
            Ok(f) => f,
            Err(_) => return Ok(relationships),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);
        let mut buf = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                    if attr_value(&e, b"TargetMode").as_deref() != Some("External") {
                        buf.clear();
                        continue;
                    }
                    if let (Some(id), Some(rel_type), Some(target)) = (
                        attr_value(&e, b"Id"),
                        attr_value(&e, b"Type"),
                        attr_value(&e, b"Target"),
                    ) {
                        relationships.push(RawRelationship {
                            id,
                            rel_type,
                            target,
                        });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(relationships)
    }

    /// Read workbook.xml.rels to find worksheets, styles, theme and shared strings
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<WorkbookRels> {
        let file = archive
            .by_name(parts::WORKBOOK_RELS)
            .map_err(|_| XlsxError::MissingPart(parts::WORKBOOK_RELS.into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = WorkbookRels::default();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    if attr_value(&e, b"TargetMode").as_deref() == Some("External") {
                        buf.clear();
                        continue;
                    }

                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        let path = parts::resolve_target(&target);
                        if rel_type.ends_with(parts::REL_WORKSHEET) {
                            rels.worksheets.insert(id, path);
                        } else if rel_type.ends_with(parts::REL_STYLES) {
                            rels.styles = Some(path);
                        } else if rel_type.ends_with(parts::REL_THEME) {
                            rels.theme = Some(path);
                        } else if rel_type.ends_with(parts::REL_SHARED_STRINGS) {
                            rels.shared_strings = Some(path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet part into a grid plus the elements carried verbatim
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        shared_strings: &[SharedString],
    ) -> XlsxResult<(SparseGrid, RawSheetXml)> {
        let mut raw = RawSheetXml {
            relationships: Self::read_sheet_relationships(archive, path)?,
            ..Default::default()
        };
        let keep_ids: HashSet<String> = raw.relationships.iter().map(|r| r.id.clone()).collect();

        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut parser = SheetParser::new(shared_strings);
        let mut capture: Option<(CaptureTarget, Capture)> = None;
        let mut depth = 0usize;

        loop {
            let event = xml_reader.read_event_into(&mut buf)?;
            let outer = depth;
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }

            if capture.is_none() {
                if let Event::Start(e) | Event::Empty(e) = &event {
                    let name = e.local_name();
                    if outer == 1 && fragments::is_carried(name.as_ref()) {
                        capture = Some((CaptureTarget::Fragment, Capture::new(e)));
                    } else if name.as_ref() == b"rPr" && parser.in_inline_run() {
                        capture = Some((CaptureTarget::RunProperties, Capture::new(e)));
                    }
                }
            }
            if let Some((_, active)) = capture.as_mut() {
                if active.feed(&event, &keep_ids)? {
                    if let Some((target, done)) = capture.take() {
                        let fragment = done.finish()?;
                        match target {
                            CaptureTarget::Fragment => raw.fragments.push(fragment),
                            CaptureTarget::RunProperties => parser.set_run_properties(fragment.xml),
                        }
                    }
                }
                buf.clear();
                continue;
            }

            match event {
                Event::Start(e) => {
                    if outer == 0 {
                        raw.root_attributes = root_attributes(&e);
                    }
                    parser.start(&e)?;
                }
                Event::Empty(e) => {
                    parser.start(&e)?;
                    parser.end(e.local_name().as_ref())?;
                }
                Event::End(e) => parser.end(e.local_name().as_ref())?,
                Event::Text(e) if parser.wants_text() => {
                    parser.text(&e.unescape()?);
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok((parser.grid, raw))
    }
}

/// Namespace declarations (and `mc:Ignorable`) of the worksheet root
fn root_attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .filter(|attr| {
            let key = attr.key.as_ref();
            key.starts_with(b"xmlns:") || key.ends_with(b":Ignorable")
        })
        .filter_map(|attr| {
            let key = std::str::from_utf8(attr.key.as_ref()).ok()?.to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}

/// What a finished capture belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureTarget {
    Fragment,
    RunProperties,
}

/// Which element's text is being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

#[derive(Debug, Default)]
struct PendingFormula {
    text: String,
    kind: Option<String>,
    reference: Option<String>,
    shared_index: Option<u32>,
}

#[derive(Debug)]
struct PendingCell {
    addr: CellAddress,
    cell_type: Option<String>,
    style: Option<u32>,
    value: Option<String>,
    inline: Option<String>,
    runs: Vec<TextRun>,
    formula: Option<PendingFormula>,
}

/// Event-driven state for one worksheet part
struct SheetParser<'a> {
    shared_strings: &'a [SharedString],
    grid: SparseGrid,
    /// Current row (0-based); cells without `r` are placed by position
    row: u32,
    next_col: u16,
    seen_row: bool,
    cell: Option<PendingCell>,
    text: TextTarget,
    in_inline: bool,
    in_run: bool,
    in_phonetic: bool,
}

impl<'a> SheetParser<'a> {
    fn new(shared_strings: &'a [SharedString]) -> Self {
        Self {
            shared_strings,
            grid: SparseGrid::new(),
            row: 0,
            next_col: 0,
            seen_row: false,
            cell: None,
            text: TextTarget::None,
            in_inline: false,
            in_run: false,
            in_phonetic: false,
        }
    }

    fn wants_text(&self) -> bool {
        self.text != TextTarget::None
    }

    fn in_inline_run(&self) -> bool {
        self.in_run
    }

    fn set_run_properties(&mut self, xml: String) {
        if let Some(run) = self.cell.as_mut().and_then(|c| c.runs.last_mut()) {
            run.properties = Some(xml);
        }
    }

    fn start(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        match e.local_name().as_ref() {
            b"dimension" => {
                if let Some(range) = attr_value(e, b"ref").and_then(|r| CellRange::parse(&r).ok()) {
                    self.grid.set_dimension(Some(range));
                }
            }
            b"sheetFormatPr" => {
                let format = self.grid.format_mut();
                format.default_row_height = attr_parse(e, b"defaultRowHeight");
                format.default_col_width = attr_parse(e, b"defaultColWidth");
                format.base_col_width = attr_parse(e, b"baseColWidth");
            }
            b"col" => {
                // min/max are 1-based in XLSX
                let min: Option<u32> = attr_parse(e, b"min");
                let max: Option<u32> = attr_parse(e, b"max");
                match (min, max) {
                    (Some(min), Some(max)) if min >= 1 && min <= max && max <= 16_384 => {
                        self.grid.add_column(ColumnInfo {
                            min: (min - 1) as u16,
                            max: (max - 1) as u16,
                            width: attr_parse(e, b"width"),
                            custom_width: attr_bool(e, b"customWidth"),
                            hidden: attr_bool(e, b"hidden"),
                            style: attr_parse(e, b"style"),
                            outline_level: attr_parse(e, b"outlineLevel").unwrap_or(0),
                        });
                    }
                    _ => warn!("ignoring <col> with bad span {:?}..{:?}", min, max),
                }
            }
            b"row" => {
                self.row = match attr_parse::<u32>(e, b"r") {
                    Some(r) if r >= 1 => r - 1,
                    _ if self.seen_row => self.row + 1,
                    _ => 0,
                };
                self.seen_row = true;
                self.next_col = 0;

                self.grid.set_row_info(
                    self.row,
                    RowInfo {
                        height: attr_parse(e, b"ht"),
                        custom_height: attr_bool(e, b"customHeight"),
                        hidden: attr_bool(e, b"hidden"),
                        style: attr_parse(e, b"s"),
                        custom_format: attr_bool(e, b"customFormat"),
                        outline_level: attr_parse(e, b"outlineLevel").unwrap_or(0),
                    },
                );
            }
            b"c" => {
                let addr = match attr_value(e, b"r") {
                    Some(r) => CellAddress::parse(&r).map_err(|err| {
                        XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, err))
                    })?,
                    None => CellAddress::new(self.row, self.next_col),
                };
                self.next_col = addr.col.saturating_add(1);
                self.cell = Some(PendingCell {
                    addr,
                    cell_type: attr_value(e, b"t"),
                    style: attr_parse(e, b"s"),
                    value: None,
                    inline: None,
                    runs: Vec::new(),
                    formula: None,
                });
            }
            b"v" if self.cell.is_some() => self.text = TextTarget::Value,
            b"f" => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.formula = Some(PendingFormula {
                        text: String::new(),
                        kind: attr_value(e, b"t"),
                        reference: attr_value(e, b"ref"),
                        shared_index: attr_parse(e, b"si"),
                    });
                    self.text = TextTarget::Formula;
                }
            }
            b"is" if self.cell.is_some() => self.in_inline = true,
            b"r" if self.in_inline && !self.in_phonetic => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.runs.push(TextRun::plain(""));
                    self.in_run = true;
                }
            }
            b"rPh" => self.in_phonetic = true,
            b"t" if self.in_inline && !self.in_phonetic => self.text = TextTarget::Inline,
            b"mergeCell" => {
                if let Some(r) = attr_value(e, b"ref") {
                    match CellRange::parse(&r) {
                        Ok(range) => self.grid.add_merged_region(range),
                        Err(err) => warn!("ignoring merge '{}': {}", r, err),
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> XlsxResult<()> {
        match name {
            b"c" => self.finish_cell()?,
            b"v" | b"f" | b"t" => self.text = TextTarget::None,
            b"is" => self.in_inline = false,
            b"r" => self.in_run = false,
            b"rPh" => self.in_phonetic = false,
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let Some(cell) = self.cell.as_mut() else {
            return;
        };
        match self.text {
            TextTarget::Value => cell.value.get_or_insert_with(String::new).push_str(text),
            TextTarget::Inline => {
                cell.inline.get_or_insert_with(String::new).push_str(text);
                if self.in_run {
                    if let Some(run) = cell.runs.last_mut() {
                        run.text.push_str(text);
                    }
                }
            }
            TextTarget::Formula => {
                if let Some(formula) = cell.formula.as_mut() {
                    formula.text.push_str(text);
                }
            }
            TextTarget::None => {}
        }
    }

    fn finish_cell(&mut self) -> XlsxResult<()> {
        let Some(pending) = self.cell.take() else {
            return Ok(());
        };

        let mut runs = None;
        let value = match (pending.cell_type.as_deref(), pending.value) {
            // Inline string lives in <is>, not <v>
            (Some("inlineStr"), _) => {
                runs = finish_runs(pending.runs);
                pending
                    .inline
                    .map(|s| CellValue::String(decode_excel_escapes(&s)))
                    .unwrap_or(CellValue::Empty)
            }
            (_, None) => CellValue::Empty,
            // Shared string
            (Some("s"), Some(v)) => {
                let idx: usize = v.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", v))
                })?;
                let s = self.shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                runs = s.runs.clone();
                CellValue::String(s.text.clone())
            }
            (Some("b"), Some(v)) => {
                CellValue::Boolean(v == "1" || v.eq_ignore_ascii_case("true"))
            }
            (Some("e"), Some(v)) => CellValue::Error(v),
            (Some("str"), Some(v)) => CellValue::String(decode_excel_escapes(&v)),
            // Number (default type or explicit "n")
            (None, Some(v)) | (Some("n"), Some(v)) => match v.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::String(v),
            },
            (Some("d"), Some(v)) => CellValue::Date(v.trim().to_string()),
            // Unknown types stay as their text
            (Some(_), Some(v)) => CellValue::String(v),
        };

        let formula = pending.formula.map(|f| {
            let reference = f.reference.as_deref().and_then(|r| CellRange::parse(r).ok());
            let kind = match (f.kind.as_deref(), reference) {
                (Some("shared"), range) => FormulaKind::Shared {
                    index: f.shared_index.unwrap_or(0),
                    range,
                },
                (Some("array"), Some(range)) => FormulaKind::Array { range },
                _ => FormulaKind::Normal,
            };
            Formula { text: f.text, kind }
        });

        self.grid.set(
            pending.addr,
            Cell {
                value,
                formula,
                display: None,
                style: pending.style,
                runs,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const WORKBOOK_XML: &str = r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/><sheet name="Hidden &amp; Co" sheetId="2" state="hidden" r:id="rId2"/></sheets></workbook>"#;

    fn package(sheet_xml: &str, shared_strings: Option<&str>) -> Vec<u8> {
        package_with(sheet_xml, shared_strings, WORKBOOK_XML, &[])
    }

    fn package_with(
        sheet_xml: &str,
        shared_strings: Option<&str>,
        workbook_xml: &str,
        extra: &[(&str, &str)],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();

            zip.start_file("[Content_Types].xml", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#).unwrap();

            zip.start_file("xl/workbook.xml", options).unwrap();
            zip.write_all(workbook_xml.as_bytes()).unwrap();

            zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
            zip.write_all(br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#).unwrap();

            zip.start_file("xl/styles.xml", options).unwrap();
            zip.write_all(b"<styleSheet>custom</styleSheet>").unwrap();

            if let Some(sst) = shared_strings {
                zip.start_file("xl/sharedStrings.xml", options).unwrap();
                zip.write_all(sst.as_bytes()).unwrap();
            }

            zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
            zip.write_all(sheet_xml.as_bytes()).unwrap();

            zip.start_file("xl/worksheets/sheet2.xml", options).unwrap();
            zip.write_all(br#"<worksheet><sheetData/></worksheet>"#).unwrap();

            for (path, content) in extra {
                zip.start_file(*path, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }

            zip.finish().unwrap();
        }
        buf
    }

    fn cell<'a>(wb: &'a Workbook, a1: &str) -> &'a Cell {
        wb.worksheet(0)
            .unwrap()
            .grid()
            .get_a1(a1)
            .unwrap()
            .unwrap_or_else(|| panic!("{a1} missing"))
    }

    #[test]
    fn test_rejects_zip_without_content_types() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            zip.start_file("hello.txt", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"hi").unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(
            XlsxReader::read(Cursor::new(buf)),
            Err(XlsxError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_reads_sheets_and_opaque_parts() {
        let bytes = package("<worksheet><sheetData/></worksheet>", None);
        let wb = XlsxReader::read(Cursor::new(bytes)).unwrap();

        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Hidden & Co"]);
        assert_eq!(wb.worksheet(1).unwrap().state(), SheetState::Hidden);
        assert_eq!(
            wb.raw_part("xl/styles.xml"),
            Some(&b"<styleSheet>custom</styleSheet>"[..])
        );
        assert!(wb.raw_part("xl/theme/theme1.xml").is_none());
    }

    #[test]
    fn test_reads_cell_types() {
        let sst = r#"<sst><si><t xml:space="preserve"> 발주서 </t></si><si><r><t>합</t></r><r><rPr><b/></rPr><t>계</t></r><rPh sb="0" eb="1"><t>ハ</t></rPh></si></sst>"#;
        let sheet = r#"<worksheet><dimension ref="A1:D4"/><sheetData>
            <row r="1"><c r="A1" t="s" s="2"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1"><v>3.5</v></c><c r="D1" t="b"><v>1</v></c></row>
            <row r="2"><c r="A2" t="inlineStr"><is><t>line_x000a_break</t></is></c><c r="B2" t="e"><v>#N/A</v></c><c r="C2" s="4"/></row>
        </sheetData></worksheet>"#;
        let wb = XlsxReader::read(Cursor::new(package(sheet, Some(sst)))).unwrap();

        assert_eq!(cell(&wb, "A1").value, CellValue::string(" 발주서 "));
        assert_eq!(cell(&wb, "A1").style, Some(2));
        assert_eq!(cell(&wb, "B1").value, CellValue::string("합계"));
        assert_eq!(cell(&wb, "C1").value, CellValue::Number(3.5));
        assert_eq!(cell(&wb, "D1").value, CellValue::Boolean(true));
        assert_eq!(cell(&wb, "A2").value, CellValue::string("line\nbreak"));
        assert_eq!(cell(&wb, "B2").value, CellValue::Error("#N/A".into()));
        assert_eq!(cell(&wb, "C2").value, CellValue::Empty);
        assert_eq!(cell(&wb, "C2").style, Some(4));

        let grid = wb.worksheet(0).unwrap().grid();
        assert_eq!(grid.used_range().to_string(), "A1:D4");
    }

    #[test]
    fn test_reads_formulas() {
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1"><f>1+1</f><v>2</v></c><c r="B1" t="str"><f>"a"&amp;"b"</f><v>ab</v></c></row>
            <row r="2"><c r="A2"><f t="shared" ref="A2:A3" si="0">A1*2</f><v>4</v></c></row>
            <row r="3"><c r="A3"><f t="shared" si="0"/><v>8</v></c><c r="B3"><f t="array" ref="B3:B4">SUM(A1:A2*2)</f><v>12</v></c></row>
        </sheetData></worksheet>"#;
        let wb = XlsxReader::read(Cursor::new(package(sheet, None))).unwrap();

        let a1 = cell(&wb, "A1");
        assert_eq!(a1.formula.as_ref().unwrap().text, "1+1");
        assert_eq!(a1.value, CellValue::Number(2.0));

        let b1 = cell(&wb, "B1");
        assert_eq!(b1.formula.as_ref().unwrap().text, r#""a"&"b""#);
        assert_eq!(b1.value, CellValue::string("ab"));

        assert_eq!(
            cell(&wb, "A2").formula.as_ref().unwrap().kind,
            FormulaKind::Shared {
                index: 0,
                range: Some(CellRange::parse("A2:A3").unwrap())
            }
        );
        let follower = cell(&wb, "A3").formula.as_ref().unwrap();
        assert_eq!(follower.text, "");
        assert_eq!(follower.kind, FormulaKind::Shared { index: 0, range: None });
        assert_eq!(
            cell(&wb, "B3").formula.as_ref().unwrap().kind,
            FormulaKind::Array {
                range: CellRange::parse("B3:B4").unwrap()
            }
        );
    }

    #[test]
    fn test_reads_structure() {
        let sheet = r#"<worksheet>
            <sheetFormatPr defaultRowHeight="16.5"/>
            <cols><col min="1" max="2" width="20.5" customWidth="1"/><col min="4" max="4" width="9" hidden="1"/></cols>
            <sheetData>
                <row r="1" ht="30" customHeight="1"><c r="A1"><v>1</v></c></row>
                <row r="3" hidden="1"/>
                <row><c><v>5</v></c><c><v>6</v></c></row>
            </sheetData>
            <mergeCells count="1"><mergeCell ref="A1:B1"/></mergeCells>
        </worksheet>"#;
        let wb = XlsxReader::read(Cursor::new(package(sheet, None))).unwrap();
        let grid = wb.worksheet(0).unwrap().grid();

        assert_eq!(grid.format().default_row_height, Some(16.5));
        assert_eq!(grid.columns().len(), 2);
        assert_eq!(grid.column_width(1), Some(20.5));
        assert!(grid.columns()[1].hidden);
        assert_eq!(grid.row_info(0).unwrap().height, Some(30.0));
        assert!(grid.row_info(2).unwrap().hidden);
        assert_eq!(grid.merged_regions(), &[CellRange::parse("A1:B1").unwrap()]);

        // Positional cells follow the previous row
        assert_eq!(grid.get_a1("A4").unwrap().unwrap().value, CellValue::Number(5.0));
        assert_eq!(grid.get_a1("B4").unwrap().unwrap().value, CellValue::Number(6.0));
    }

    #[test]
    fn test_bad_shared_string_index() {
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>7</v></c></row></sheetData></worksheet>"#;
        assert!(matches!(
            XlsxReader::read(Cursor::new(package(sheet, None))),
            Err(XlsxError::Parse(_))
        ));
    }

    #[test]
    fn test_date_cells_keep_their_type() {
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1" t="d"><v>2024-03-01T00:00:00</v></c><c r="B1" t="d" s="5"><f>TODAY()</f><v>2024-03-02</v></c></row></sheetData></worksheet>"#;
        let wb = XlsxReader::read(Cursor::new(package(sheet, None))).unwrap();

        assert_eq!(cell(&wb, "A1").value, CellValue::Date("2024-03-01T00:00:00".into()));
        assert_eq!(cell(&wb, "B1").value, CellValue::Date("2024-03-02".into()));
        assert!(cell(&wb, "B1").has_formula());
    }

    #[test]
    fn test_reads_rich_text_runs() {
        let sst = r#"<sst><si><r><t>합</t></r><r><rPr><b/><sz val="11"/></rPr><t>계</t></r><rPh sb="0" eb="1"><t>ハ</t></rPh></si><si><t>plain</t></si></sst>"#;
        let sheet = r#"<worksheet><sheetData><row r="1">
            <c r="A1" t="s"><v>0</v></c>
            <c r="B1" t="s"><v>1</v></c>
            <c r="C1" t="inlineStr"><is><r><rPr><i/></rPr><t xml:space="preserve">품목 </t></r><r><t>코드</t></r></is></c>
        </row></sheetData></worksheet>"#;
        let wb = XlsxReader::read(Cursor::new(package(sheet, Some(sst)))).unwrap();

        let a1 = cell(&wb, "A1");
        assert_eq!(a1.value, CellValue::string("합계"));
        assert_eq!(
            a1.rich_runs().unwrap(),
            &[
                TextRun::plain("합"),
                TextRun {
                    text: "계".into(),
                    properties: Some(r#"<rPr><b/><sz val="11"/></rPr>"#.into()),
                },
            ]
        );
        assert!(cell(&wb, "B1").runs.is_none());

        let c1 = cell(&wb, "C1");
        assert_eq!(c1.value, CellValue::string("품목 코드"));
        let runs = c1.rich_runs().unwrap();
        assert_eq!(runs[0].properties.as_deref(), Some("<rPr><i/></rPr>"));
        assert_eq!(runs[1], TextRun::plain("코드"));
    }

    #[test]
    fn test_reads_defined_names() {
        let workbook = r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/><sheet name="Hidden &amp; Co" sheetId="2" state="hidden" r:id="rId2"/></sheets><definedNames><definedName name="_xlnm._FilterDatabase" localSheetId="0" hidden="1">Sheet1!$A$1:$C$9</definedName><definedName name="Rate">'Hidden &amp; Co'!$B$2</definedName><definedName name="Orphan" localSheetId="7">Sheet1!$A$1</definedName></definedNames></workbook>"#;
        let bytes = package_with("<worksheet><sheetData/></worksheet>", None, workbook, &[]);
        let wb = XlsxReader::read(Cursor::new(bytes)).unwrap();

        assert_eq!(
            wb.defined_names(),
            &[
                DefinedName {
                    name: "_xlnm._FilterDatabase".into(),
                    value: "Sheet1!$A$1:$C$9".into(),
                    local_sheet: Some("Sheet1".into()),
                    hidden: true,
                },
                DefinedName::new("Rate", "'Hidden & Co'!$B$2"),
            ]
        );
    }

    #[test]
    fn test_carries_sheet_level_elements() {
        let sheet = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="x14ac" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac">
            <sheetPr><tabColor rgb="FFFF0000"/></sheetPr>
            <dimension ref="A1:B2"/>
            <sheetViews><sheetView tabSelected="1" workbookViewId="0"><pane ySplit="1" topLeftCell="A2" state="frozen"/></sheetView></sheetViews>
            <sheetData><row r="1"><c r="A1"><v>1</v></c></row></sheetData>
            <conditionalFormatting sqref="A1:A9"><cfRule type="cellIs" dxfId="0" priority="1" operator="lessThan"><formula>0</formula></cfRule></conditionalFormatting>
            <dataValidations count="1"><dataValidation type="list" sqref="B1:B9"><formula1>"가,나"</formula1></dataValidation></dataValidations>
            <hyperlinks><hyperlink ref="A1" r:id="rId1"/><hyperlink ref="A2" location="Sheet1!B2"/></hyperlinks>
            <pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
            <pageSetup paperSize="9" orientation="landscape" r:id="rId2"/>
            <drawing r:id="rId3"/>
        </worksheet>"#;
        let rels = r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/po?id=1&amp;x=2" TargetMode="External"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/printerSettings" Target="../printerSettings/printerSettings1.bin"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/></Relationships>"#;
        let bytes = package_with(
            sheet,
            None,
            WORKBOOK_XML,
            &[("xl/worksheets/_rels/sheet1.xml.rels", rels)],
        );
        let wb = XlsxReader::read(Cursor::new(bytes)).unwrap();
        let raw = wb.worksheet(0).unwrap().raw();

        let elements: Vec<&str> = raw.fragments.iter().map(|f| f.element.as_str()).collect();
        assert_eq!(
            elements,
            vec![
                "sheetPr",
                "sheetViews",
                "conditionalFormatting",
                "dataValidations",
                "hyperlinks",
                "pageMargins",
                "pageSetup"
            ]
        );
        assert!(!raw.fragments[1].xml.contains("tabSelected"));
        assert!(raw.fragments[1].xml.contains(r#"state="frozen""#));
        assert!(raw.fragments[4].xml.contains(r#"r:id="rId1""#));
        assert_eq!(raw.fragments[6].xml, r#"<pageSetup paperSize="9" orientation="landscape"/>"#);

        assert_eq!(
            raw.relationships,
            vec![RawRelationship {
                id: "rId1".into(),
                rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink".into(),
                target: "https://example.com/po?id=1&x=2".into(),
            }]
        );
        assert!(raw
            .root_attributes
            .contains(&("xmlns:r".to_string(), "http://schemas.openxmlformats.org/officeDocument/2006/relationships".to_string())));
        assert!(raw.root_attributes.contains(&("mc:Ignorable".to_string(), "x14ac".to_string())));

        // The grid is still read around the captured elements
        assert_eq!(cell(&wb, "A1").value, CellValue::Number(1.0));
    }
}
