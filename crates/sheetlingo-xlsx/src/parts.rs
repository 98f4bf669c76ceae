//! Package part names and relationship types

pub(crate) const CONTENT_TYPES: &str = "[Content_Types].xml";
pub(crate) const WORKBOOK: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

/// Where opaque parts are stored on the core [`Workbook`](sheetlingo_core::Workbook)
pub(crate) const STYLES: &str = "xl/styles.xml";
pub(crate) const THEME: &str = "xl/theme/theme1.xml";

pub(crate) const REL_WORKSHEET: &str = "/worksheet";
pub(crate) const REL_STYLES: &str = "/styles";
pub(crate) const REL_THEME: &str = "/theme";
pub(crate) const REL_SHARED_STRINGS: &str = "/sharedStrings";

/// Smallest style sheet Excel accepts: one font, the two mandatory fills,
/// one border, one cell format
pub(crate) const DEFAULT_STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>
    <fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
    <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
    <cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

/// Resolve a relationship target against the `xl/` folder
pub(crate) fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

/// Relationships part of a package part (`xl/worksheets/_rels/sheet1.xml.rels`)
pub(crate) fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}
