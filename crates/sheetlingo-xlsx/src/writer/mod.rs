//! XLSX writer

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use log::{debug, warn};

use crate::error::{XlsxError, XlsxResult};
use crate::escapes::{escape_cell_text, escape_xml};
use crate::fragments::{self, Slot};
use crate::parts;
use sheetlingo_core::{
    Cell, CellAddress, CellValue, FormulaKind, RawSheetXml, RowInfo, SheetState, SparseGrid,
    TextRun, Workbook, Worksheet,
};

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    ///
    /// The style table read from the source travels through untouched, so
    /// cell style indices stay valid. Without one, a minimal table is written
    /// and style references are dropped.
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "A workbook needs at least one sheet".into(),
            ));
        }

        let mut zip = zip::ZipWriter::new(writer);

        let styles = workbook.raw_part(parts::STYLES);
        let theme = workbook.raw_part(parts::THEME);
        let keep_styles = styles.is_some();

        // Write [Content_Types].xml
        Self::write_content_types(&mut zip, workbook, theme.is_some())?;

        // Write _rels/.rels
        Self::write_root_rels(&mut zip)?;

        // Write xl/workbook.xml
        Self::write_workbook_xml(&mut zip, workbook)?;

        // Write xl/_rels/workbook.xml.rels
        Self::write_workbook_rels(&mut zip, workbook, theme.is_some())?;

        // Write xl/styles.xml
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(parts::STYLES, options)?;
        zip.write_all(styles.unwrap_or(parts::DEFAULT_STYLES_XML.as_bytes()))?;

        if let Some(theme) = theme {
            zip.start_file(parts::THEME, options)?;
            zip.write_all(theme)?;
        }

        // Write worksheets
        for (i, sheet) in workbook.worksheets().enumerate() {
            Self::write_worksheet(&mut zip, sheet, i, keep_styles)?;
        }

        zip.finish()?;
        debug!("wrote {} sheets", workbook.sheet_count());
        Ok(())
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        with_theme: bool,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(parts::CONTENT_TYPES, options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        if with_theme {
            content.push_str(
                r#"
    <Override PartName="/xl/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            );
        }

        // Add an override for each worksheet
        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("_rels/.rels", options)?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(parts::WORKBOOK, options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <sheets>"#,
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            let state = match sheet.state() {
                SheetState::Visible => "",
                SheetState::Hidden => r#" state="hidden""#,
                SheetState::VeryHidden => r#" state="veryHidden""#,
            };
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                state,
                i + 1
            ));
        }

        content.push_str("\n    </sheets>");
        Self::write_defined_names(&mut content, workbook);
        content.push_str("\n</workbook>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Sheet-scoped names point at the sheet's output position; a name whose
    /// sheet is gone is dropped
    fn write_defined_names(content: &mut String, workbook: &Workbook) {
        let mut entries = Vec::new();
        for name in workbook.defined_names() {
            let scope = match &name.local_sheet {
                Some(sheet) => match workbook.worksheets().position(|ws| ws.name() == sheet) {
                    Some(index) => format!(" localSheetId=\"{}\"", index),
                    None => {
                        warn!("dropping name '{}': sheet '{}' is not in the workbook", name.name, sheet);
                        continue;
                    }
                },
                None => String::new(),
            };
            let hidden = if name.hidden { " hidden=\"1\"" } else { "" };
            entries.push(format!(
                "\n        <definedName name=\"{}\"{}{}>{}</definedName>",
                escape_xml(&name.name),
                scope,
                hidden,
                escape_xml(&name.value)
            ));
        }

        if entries.is_empty() {
            return;
        }
        content.push_str("\n    <definedNames>");
        content.push_str(&entries.concat());
        content.push_str("\n    </definedNames>");
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
        with_theme: bool,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(parts::WORKBOOK_RELS, options)?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        // Styles (and theme) follow the sheets
        let styles_rid = workbook.sheet_count() + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            styles_rid
        ));
        if with_theme {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>"#,
                styles_rid + 1
            ));
        }

        content.push_str("\n</Relationships>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        index: usize,
        keep_styles: bool,
    ) -> XlsxResult<()> {
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options)?;

        let grid = sheet.grid();
        let raw = sheet.raw();
        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main""#,
        );
        for (key, value) in &raw.root_attributes {
            content.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
        }
        content.push('>');

        write_fragments(&mut content, raw, Slot::BeforeDimension);
        content.push_str(&format!(
            "\n    <dimension ref=\"{}\"/>",
            grid.used_range()
        ));
        write_fragments(&mut content, raw, Slot::AfterDimension);

        Self::write_sheet_format(&mut content, grid);
        Self::write_columns(&mut content, grid, keep_styles);

        content.push_str("\n    <sheetData>");
        for row in grid.row_indices() {
            let attrs = grid
                .row_info(row)
                .map(|info| row_attributes(info, keep_styles))
                .unwrap_or_default();

            let mut cells = grid.iter_row(row).peekable();
            if cells.peek().is_none() {
                content.push_str(&format!("\n        <row r=\"{}\"{}/>", row + 1, attrs));
                continue;
            }

            content.push_str(&format!("\n        <row r=\"{}\"{}>", row + 1, attrs));
            for (col, cell) in cells {
                content.push_str("\n            ");
                content.push_str(&cell_xml(CellAddress::new(row, col), cell, keep_styles));
            }
            content.push_str("\n        </row>");
        }
        content.push_str("\n    </sheetData>");
        write_fragments(&mut content, raw, Slot::AfterSheetData);

        // Write merged cells (if any)
        let merged_regions = grid.merged_regions();
        if !merged_regions.is_empty() {
            content.push_str(&format!(
                "\n    <mergeCells count=\"{}\">",
                merged_regions.len()
            ));
            for range in merged_regions {
                content.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", range));
            }
            content.push_str("\n    </mergeCells>");
        }
        write_fragments(&mut content, raw, Slot::AfterMerges);

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;

        if !raw.relationships.is_empty() {
            let part = format!("xl/worksheets/sheet{}.xml", index + 1);
            zip.start_file(parts::rels_path(&part), options)?;
            zip.write_all(sheet_rels_xml(raw).as_bytes())?;
        }
        Ok(())
    }

    fn write_sheet_format(content: &mut String, grid: &SparseGrid) {
        let format = grid.format();
        if format.default_row_height.is_none()
            && format.default_col_width.is_none()
            && format.base_col_width.is_none()
        {
            return;
        }

        content.push_str("\n    <sheetFormatPr");
        if let Some(base) = format.base_col_width {
            content.push_str(&format!(" baseColWidth=\"{}\"", base));
        }
        if let Some(width) = format.default_col_width {
            content.push_str(&format!(" defaultColWidth=\"{}\"", width));
        }
        // Required by the schema
        content.push_str(&format!(
            " defaultRowHeight=\"{}\"/>",
            format.default_row_height.unwrap_or(15.0)
        ));
    }

    fn write_columns(content: &mut String, grid: &SparseGrid, keep_styles: bool) {
        let columns = grid.columns();
        if columns.is_empty() {
            return;
        }

        content.push_str("\n    <cols>");
        for col in columns {
            content.push_str(&format!(
                "\n        <col min=\"{}\" max=\"{}\"",
                col.min + 1,
                col.max + 1
            ));
            if let Some(width) = col.width {
                content.push_str(&format!(" width=\"{}\"", width));
            }
            if col.custom_width {
                content.push_str(" customWidth=\"1\"");
            }
            if col.hidden {
                content.push_str(" hidden=\"1\"");
            }
            if let Some(style) = col.style.filter(|_| keep_styles) {
                content.push_str(&format!(" style=\"{}\"", style));
            }
            if col.outline_level > 0 {
                content.push_str(&format!(" outlineLevel=\"{}\"", col.outline_level));
            }
            content.push_str("/>");
        }
        content.push_str("\n    </cols>");
    }
}

fn write_fragments(content: &mut String, raw: &RawSheetXml, slot: Slot) {
    for fragment in fragments::in_slot(&raw.fragments, slot) {
        content.push_str("\n    ");
        content.push_str(&fragment.xml);
    }
}

fn sheet_rels_xml(raw: &RawSheetXml) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in &raw.relationships {
        xml.push_str(&format!(
            "\n    <Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\" TargetMode=\"External\"/>",
            escape_xml(&rel.id),
            escape_xml(&rel.rel_type),
            escape_xml(&rel.target)
        ));
    }
    xml.push_str("\n</Relationships>");
    xml
}

fn row_attributes(info: &RowInfo, keep_styles: bool) -> String {
    let mut attrs = String::new();
    if let Some(height) = info.height {
        attrs.push_str(&format!(" ht=\"{}\"", height));
    }
    if info.custom_height {
        attrs.push_str(" customHeight=\"1\"");
    }
    if info.hidden {
        attrs.push_str(" hidden=\"1\"");
    }
    if keep_styles {
        if let Some(style) = info.style {
            attrs.push_str(&format!(" s=\"{}\"", style));
        }
        if info.custom_format {
            attrs.push_str(" customFormat=\"1\"");
        }
    }
    if info.outline_level > 0 {
        attrs.push_str(&format!(" outlineLevel=\"{}\"", info.outline_level));
    }
    attrs
}

/// `xml:space` is needed whenever the text has edge whitespace
fn text_element(text: &str) -> String {
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        format!("<t xml:space=\"preserve\">{}</t>", escape_cell_text(text))
    } else {
        format!("<t>{}</t>", escape_cell_text(text))
    }
}

fn runs_xml(runs: &[TextRun]) -> String {
    runs.iter()
        .map(|run| {
            format!(
                "<r>{}{}</r>",
                run.properties.as_deref().unwrap_or_default(),
                text_element(&run.text)
            )
        })
        .collect()
}

fn number_text(n: f64) -> Option<String> {
    n.is_finite().then(|| n.to_string())
}

fn cell_xml(addr: CellAddress, cell: &Cell, keep_styles: bool) -> String {
    let cell_ref = addr.to_a1_string();
    let style_attr = match cell.style {
        Some(s) if keep_styles => format!(" s=\"{}\"", s),
        _ => String::new(),
    };

    // A formula whose text was not recovered (legacy binary sources) keeps
    // only its cached result
    let formula = cell
        .formula
        .as_ref()
        .filter(|f| !(f.text.is_empty() && f.kind == FormulaKind::Normal));

    let Some(formula) = formula else {
        return match &cell.value {
            CellValue::String(s) => {
                let body = match cell.rich_runs() {
                    Some(runs) => runs_xml(runs),
                    None => text_element(s),
                };
                format!(
                    "<c r=\"{}\"{} t=\"inlineStr\"><is>{}</is></c>",
                    cell_ref, style_attr, body
                )
            }
            CellValue::Number(n) => match number_text(*n) {
                Some(v) => format!("<c r=\"{}\"{}><v>{}</v></c>", cell_ref, style_attr, v),
                None => format!("<c r=\"{}\"{} t=\"e\"><v>#NUM!</v></c>", cell_ref, style_attr),
            },
            CellValue::Boolean(b) => format!(
                "<c r=\"{}\"{} t=\"b\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                if *b { 1 } else { 0 }
            ),
            CellValue::Error(e) => format!(
                "<c r=\"{}\"{} t=\"e\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                escape_xml(e)
            ),
            CellValue::Date(d) => format!(
                "<c r=\"{}\"{} t=\"d\"><v>{}</v></c>",
                cell_ref,
                style_attr,
                escape_xml(d)
            ),
            // Preserve style-only cells
            CellValue::Empty => format!("<c r=\"{}\"{}/>", cell_ref, style_attr),
        };
    };

    let (type_attr, cached) = match &cell.value {
        CellValue::String(s) => (" t=\"str\"", Some(escape_cell_text(s))),
        CellValue::Number(n) => ("", number_text(*n)),
        CellValue::Boolean(b) => (" t=\"b\"", Some(if *b { "1" } else { "0" }.to_string())),
        CellValue::Error(e) => (" t=\"e\"", Some(escape_xml(e))),
        CellValue::Date(d) => (" t=\"d\"", Some(escape_xml(d))),
        CellValue::Empty => ("", None),
    };

    let formula_attrs = match &formula.kind {
        FormulaKind::Normal => String::new(),
        FormulaKind::Shared { index, range } => match range {
            Some(range) => format!(" t=\"shared\" ref=\"{}\" si=\"{}\"", range, index),
            None => format!(" t=\"shared\" si=\"{}\"", index),
        },
        FormulaKind::Array { range } => format!(" t=\"array\" ref=\"{}\"", range),
    };
    let formula_xml = if formula.text.is_empty() {
        format!("<f{}/>", formula_attrs)
    } else {
        format!("<f{}>{}</f>", formula_attrs, escape_xml(&formula.text))
    };

    match cached {
        Some(v) => format!(
            "<c r=\"{}\"{}{}>{}<v>{}</v></c>",
            cell_ref, style_attr, type_attr, formula_xml, v
        ),
        None => format!("<c r=\"{}\"{}>{}</c>", cell_ref, style_attr, formula_xml),
    }
}
