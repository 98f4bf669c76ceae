//! BIFF8 style records.
//!
//! FONT, FORMAT, XF and PALETTE records from the globals substream are
//! collected into a [`StyleTable`] and rendered as an Office Open XML style
//! sheet. Every XF record becomes one `cellXfs` entry at the same index, so
//! the XF indices kept on cells stay valid once the workbook is written as
//! xlsx.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::biff::cursor::ByteCursor;
use crate::biff::strings::{read_short_string, read_unicode_string};
use crate::error::{XlsError, XlsResult};

/// Part path under which the rendered style sheet is attached to the workbook
pub const STYLES_PART: &str = "xl/styles.xml";

/// Standard BIFF8 palette; workbook color indices 8..=63 map onto it
const DEFAULT_PALETTE: [(u8, u8, u8); 56] = [
    (0, 0, 0),
    (255, 255, 255),
    (255, 0, 0),
    (0, 255, 0),
    (0, 0, 255),
    (255, 255, 0),
    (255, 0, 255),
    (0, 255, 255),
    (128, 0, 0),
    (0, 128, 0),
    (0, 0, 128),
    (128, 128, 0),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (153, 153, 255),
    (153, 51, 102),
    (255, 255, 204),
    (204, 255, 255),
    (102, 0, 102),
    (255, 128, 128),
    (0, 102, 204),
    (204, 204, 255),
    (0, 0, 128),
    (255, 0, 255),
    (255, 255, 0),
    (0, 255, 255),
    (128, 0, 128),
    (128, 0, 0),
    (0, 128, 128),
    (0, 0, 255),
    (0, 204, 255),
    (204, 255, 255),
    (204, 255, 204),
    (255, 255, 153),
    (153, 204, 255),
    (255, 153, 204),
    (204, 153, 255),
    (255, 204, 153),
    (51, 102, 255),
    (51, 204, 204),
    (153, 204, 0),
    (255, 204, 0),
    (255, 153, 0),
    (255, 102, 0),
    (102, 102, 153),
    (150, 150, 150),
    (0, 51, 102),
    (51, 153, 102),
    (0, 51, 0),
    (51, 51, 0),
    (153, 51, 0),
    (153, 51, 51),
    (51, 51, 153),
    (51, 51, 51),
];

/// EGA colors some writers reference below index 8
const EGA: [(u8, u8, u8); 8] = [
    (0, 0, 0),
    (255, 255, 255),
    (255, 0, 0),
    (0, 255, 0),
    (0, 0, 255),
    (255, 255, 0),
    (255, 0, 255),
    (0, 255, 255),
];

/// FONT record
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BiffFont {
    /// Height in twips (1/20 pt)
    pub height: u16,
    pub italic: bool,
    pub strike: bool,
    pub color: u16,
    pub bold: bool,
    /// 0 = baseline, 1 = superscript, 2 = subscript
    pub script: u16,
    pub underline: u8,
    pub name: String,
}

/// XF record (20 bytes in BIFF8)
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BiffXf {
    pub font: u16,
    pub format: u16,
    pub locked: bool,
    pub hidden: bool,
    pub halign: u8,
    pub wrap: bool,
    pub valign: u8,
    pub rotation: u8,
    pub indent: u8,
    pub shrink: bool,
    pub reading_order: u8,
    /// left, right, top, bottom, diagonal line styles
    pub lines: [u8; 5],
    /// left, right, top, bottom, diagonal color indices
    pub line_colors: [u16; 5],
    /// 1 = down, 2 = up, 3 = both
    pub diagonal: u8,
    pub pattern: u8,
    pub fore: u16,
    pub back: u16,
}

/// FONT: height(2) + flags(2) + color(2) + weight(2) + script(2) +
/// underline(1) + family(1) + charset(1) + reserved(1) + short string
pub(crate) fn parse_font(body: &[u8]) -> XlsResult<BiffFont> {
    let mut cur = ByteCursor::new(body);
    let height = cur.u16()?;
    let flags = cur.u16()?;
    let color = cur.u16()?;
    let weight = cur.u16()?;
    let script = cur.u16()?;
    let underline = cur.u8()?;
    cur.skip(3)?;
    let name = if cur.remaining() > 0 {
        read_short_string(&mut cur)?
    } else {
        String::new()
    };

    Ok(BiffFont {
        height,
        italic: flags & 0x0002 != 0,
        strike: flags & 0x0008 != 0,
        color,
        bold: weight >= 700,
        script,
        underline,
        name,
    })
}

/// FORMAT: format id(2) + unicode string
pub(crate) fn parse_format(body: &[u8]) -> XlsResult<(u16, String)> {
    let mut cur = ByteCursor::new(body);
    let id = cur.u16()?;
    let code = read_unicode_string(&mut cur)?;
    Ok((id, code))
}

/// XF: font(2) + format(2) + type/protection(2) + alignment(1) + rotation(1)
/// + indent/shrink/order(1) + used attributes(1) + borders(4) + borders and
/// pattern(4) + pattern colors(2)
pub(crate) fn parse_xf(body: &[u8]) -> XlsResult<BiffXf> {
    if body.len() < 20 {
        return Err(XlsError::Parse(format!(
            "XF record is {} bytes, expected 20",
            body.len()
        )));
    }

    let mut cur = ByteCursor::new(body);
    let font = cur.u16()?;
    let format = cur.u16()?;
    let protection = cur.u16()?;
    let align = cur.u8()?;
    let rotation = cur.u8()?;
    let indent = cur.u8()?;
    cur.skip(1)?;
    let border1 = cur.u32()?;
    let border2 = cur.u32()?;
    let colors = cur.u16()?;

    Ok(BiffXf {
        font,
        format,
        locked: protection & 0x0001 != 0,
        hidden: protection & 0x0002 != 0,
        halign: align & 0x07,
        wrap: align & 0x08 != 0,
        valign: (align >> 4) & 0x07,
        rotation,
        indent: indent & 0x0F,
        shrink: indent & 0x10 != 0,
        reading_order: (indent >> 6) & 0x03,
        lines: [
            (border1 & 0x0F) as u8,
            ((border1 >> 4) & 0x0F) as u8,
            ((border1 >> 8) & 0x0F) as u8,
            ((border1 >> 12) & 0x0F) as u8,
            ((border2 >> 21) & 0x0F) as u8,
        ],
        line_colors: [
            ((border1 >> 16) & 0x7F) as u16,
            ((border1 >> 23) & 0x7F) as u16,
            (border2 & 0x7F) as u16,
            ((border2 >> 7) & 0x7F) as u16,
            ((border2 >> 14) & 0x7F) as u16,
        ],
        diagonal: ((border1 >> 30) & 0x03) as u8,
        pattern: ((border2 >> 26) & 0x3F) as u8,
        fore: colors & 0x7F,
        back: (colors >> 7) & 0x7F,
    })
}

/// Style records of one workbook, in file order
#[derive(Debug, Clone)]
pub(crate) struct StyleTable {
    pub fonts: Vec<BiffFont>,
    pub formats: BTreeMap<u16, String>,
    pub xfs: Vec<BiffXf>,
    pub palette: [(u8, u8, u8); 56],
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            fonts: Vec::new(),
            formats: BTreeMap::new(),
            xfs: Vec::new(),
            palette: DEFAULT_PALETTE,
        }
    }
}

impl StyleTable {
    pub fn is_empty(&self) -> bool {
        self.xfs.is_empty()
    }

    /// PALETTE: count(2) + count x (r, g, b, reserved)
    pub fn apply_palette(&mut self, body: &[u8]) -> XlsResult<()> {
        let mut cur = ByteCursor::new(body);
        let count = (cur.u16()? as usize).min(self.palette.len());
        for entry in self.palette.iter_mut().take(count) {
            let rgb = cur.bytes(4)?;
            *entry = (rgb[0], rgb[1], rgb[2]);
        }
        Ok(())
    }

    /// `FFRRGGBB` for a color index; automatic and system colors have none
    fn rgb(&self, icv: u16) -> Option<String> {
        let (r, g, b) = match icv {
            0..=7 => EGA[icv as usize],
            8..=63 => self.palette[(icv - 8) as usize],
            _ => return None,
        };
        Some(format!("FF{:02X}{:02X}{:02X}", r, g, b))
    }

    /// Position in the font list; the file never stores font index 4
    fn font_id(&self, index: u16) -> usize {
        let actual = if index >= 5 { index - 1 } else { index } as usize;
        if actual < self.fonts.len() {
            actual
        } else {
            0
        }
    }

    /// Render the table as `xl/styles.xml`
    pub fn to_styles_xml(&self) -> String {
        let mut fills = vec![
            r#"<fill><patternFill patternType="none"/></fill>"#.to_string(),
            r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string(),
        ];
        let mut borders =
            vec!["<border><left/><right/><top/><bottom/><diagonal/></border>".to_string()];

        let mut cell_xfs = String::new();
        for xf in &self.xfs {
            let fill_id = intern(&mut fills, self.fill_xml(xf));
            let border_id = intern(&mut borders, self.border_xml(xf));
            cell_xfs.push_str(&self.xf_xml(xf, fill_id, border_id));
        }

        let mut out = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !self.formats.is_empty() {
            let _ = write!(out, "\n    <numFmts count=\"{}\">", self.formats.len());
            for (id, code) in &self.formats {
                let _ = write!(
                    out,
                    "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape(code.as_str())
                );
            }
            out.push_str("</numFmts>");
        }

        if self.fonts.is_empty() {
            out.push_str(
                r#"
    <fonts count="1"><font><sz val="10"/><name val="Arial"/></font></fonts>"#,
            );
        } else {
            let _ = write!(out, "\n    <fonts count=\"{}\">", self.fonts.len());
            for font in &self.fonts {
                out.push_str(&self.font_xml(font));
            }
            out.push_str("</fonts>");
        }

        let _ = write!(out, "\n    <fills count=\"{}\">{}</fills>", fills.len(), fills.concat());
        let _ = write!(
            out,
            "\n    <borders count=\"{}\">{}</borders>",
            borders.len(),
            borders.concat()
        );
        out.push_str(
            r#"
    <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        );
        let _ = write!(out, "\n    <cellXfs count=\"{}\">{}</cellXfs>", self.xfs.len(), cell_xfs);
        out.push_str(
            r#"
    <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#,
        );
        out
    }

    fn font_xml(&self, font: &BiffFont) -> String {
        let mut xml = String::from("<font>");
        if font.bold {
            xml.push_str("<b/>");
        }
        if font.italic {
            xml.push_str("<i/>");
        }
        if font.strike {
            xml.push_str("<strike/>");
        }
        match font.underline {
            0x01 => xml.push_str("<u/>"),
            0x02 => xml.push_str(r#"<u val="double"/>"#),
            0x21 => xml.push_str(r#"<u val="singleAccounting"/>"#),
            0x22 => xml.push_str(r#"<u val="doubleAccounting"/>"#),
            _ => {}
        }
        match font.script {
            1 => xml.push_str(r#"<vertAlign val="superscript"/>"#),
            2 => xml.push_str(r#"<vertAlign val="subscript"/>"#),
            _ => {}
        }
        let _ = write!(xml, "<sz val=\"{}\"/>", font.height as f64 / 20.0);
        if let Some(rgb) = self.rgb(font.color) {
            let _ = write!(xml, "<color rgb=\"{}\"/>", rgb);
        }
        if !font.name.is_empty() {
            let _ = write!(xml, "<name val=\"{}\"/>", escape(font.name.as_str()));
        }
        xml.push_str("</font>");
        xml
    }

    fn fill_xml(&self, xf: &BiffXf) -> String {
        let Some(pattern) = pattern_name(xf.pattern) else {
            return r#"<fill><patternFill patternType="none"/></fill>"#.to_string();
        };
        let mut xml = format!("<fill><patternFill patternType=\"{}\">", pattern);
        if let Some(rgb) = self.rgb(xf.fore) {
            let _ = write!(xml, "<fgColor rgb=\"{}\"/>", rgb);
        }
        match self.rgb(xf.back) {
            Some(rgb) => {
                let _ = write!(xml, "<bgColor rgb=\"{}\"/>", rgb);
            }
            None => xml.push_str(r#"<bgColor indexed="64"/>"#),
        }
        xml.push_str("</patternFill></fill>");
        xml
    }

    fn border_xml(&self, xf: &BiffXf) -> String {
        let mut xml = String::from("<border");
        if xf.lines[4] != 0 {
            if xf.diagonal & 0x01 != 0 {
                xml.push_str(r#" diagonalDown="1""#);
            }
            if xf.diagonal & 0x02 != 0 {
                xml.push_str(r#" diagonalUp="1""#);
            }
        }
        xml.push('>');
        for (edge, (line, color)) in ["left", "right", "top", "bottom", "diagonal"]
            .iter()
            .zip(xf.lines.iter().zip(xf.line_colors))
        {
            match line_name(*line) {
                Some(style) => {
                    let _ = write!(xml, "<{} style=\"{}\">", edge, style);
                    match self.rgb(color) {
                        Some(rgb) => {
                            let _ = write!(xml, "<color rgb=\"{}\"/>", rgb);
                        }
                        None => xml.push_str(r#"<color auto="1"/>"#),
                    }
                    let _ = write!(xml, "</{}>", edge);
                }
                None => {
                    let _ = write!(xml, "<{}/>", edge);
                }
            }
        }
        xml.push_str("</border>");
        xml
    }

    fn xf_xml(&self, xf: &BiffXf, fill_id: usize, border_id: usize) -> String {
        let mut xml = format!(
            "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"",
            xf.format,
            self.font_id(xf.font),
            fill_id,
            border_id
        );
        if xf.format != 0 {
            xml.push_str(r#" applyNumberFormat="1""#);
        }
        if xf.font != 0 {
            xml.push_str(r#" applyFont="1""#);
        }
        if fill_id != 0 {
            xml.push_str(r#" applyFill="1""#);
        }
        if border_id != 0 {
            xml.push_str(r#" applyBorder="1""#);
        }

        let alignment = alignment_attributes(xf);
        let protection = protection_attributes(xf);
        if !alignment.is_empty() {
            xml.push_str(r#" applyAlignment="1""#);
        }
        if !protection.is_empty() {
            xml.push_str(r#" applyProtection="1""#);
        }
        if alignment.is_empty() && protection.is_empty() {
            xml.push_str("/>");
            return xml;
        }

        xml.push('>');
        if !alignment.is_empty() {
            let _ = write!(xml, "<alignment{}/>", alignment);
        }
        if !protection.is_empty() {
            let _ = write!(xml, "<protection{}/>", protection);
        }
        xml.push_str("</xf>");
        xml
    }
}

/// Index of `item` in `list`, appending it when new
fn intern(list: &mut Vec<String>, item: String) -> usize {
    match list.iter().position(|existing| *existing == item) {
        Some(index) => index,
        None => {
            list.push(item);
            list.len() - 1
        }
    }
}

fn alignment_attributes(xf: &BiffXf) -> String {
    let mut attrs = String::new();
    let horizontal = match xf.halign {
        1 => Some("left"),
        2 => Some("center"),
        3 => Some("right"),
        4 => Some("fill"),
        5 => Some("justify"),
        6 => Some("centerContinuous"),
        7 => Some("distributed"),
        _ => None,
    };
    if let Some(h) = horizontal {
        let _ = write!(attrs, " horizontal=\"{}\"", h);
    }
    // Bottom is the default
    let vertical = match xf.valign {
        0 => Some("top"),
        1 => Some("center"),
        3 => Some("justify"),
        4 => Some("distributed"),
        _ => None,
    };
    if let Some(v) = vertical {
        let _ = write!(attrs, " vertical=\"{}\"", v);
    }
    // Both formats encode rotation the same way (91..=180 clockwise, 255 stacked)
    if xf.rotation != 0 {
        let _ = write!(attrs, " textRotation=\"{}\"", xf.rotation);
    }
    if xf.wrap {
        attrs.push_str(r#" wrapText="1""#);
    }
    if xf.indent != 0 {
        let _ = write!(attrs, " indent=\"{}\"", xf.indent);
    }
    if xf.shrink {
        attrs.push_str(r#" shrinkToFit="1""#);
    }
    if xf.reading_order != 0 {
        let _ = write!(attrs, " readingOrder=\"{}\"", xf.reading_order);
    }
    attrs
}

fn protection_attributes(xf: &BiffXf) -> String {
    let mut attrs = String::new();
    if !xf.locked {
        attrs.push_str(r#" locked="0""#);
    }
    if xf.hidden {
        attrs.push_str(r#" hidden="1""#);
    }
    attrs
}

fn line_name(code: u8) -> Option<&'static str> {
    Some(match code {
        1 => "thin",
        2 => "medium",
        3 => "dashed",
        4 => "dotted",
        5 => "thick",
        6 => "double",
        7 => "hair",
        8 => "mediumDashed",
        9 => "dashDot",
        10 => "mediumDashDot",
        11 => "dashDotDot",
        12 => "mediumDashDotDot",
        13 => "slantDashDot",
        _ => return None,
    })
}

fn pattern_name(code: u8) -> Option<&'static str> {
    Some(match code {
        1 => "solid",
        2 => "mediumGray",
        3 => "darkGray",
        4 => "lightGray",
        5 => "darkHorizontal",
        6 => "darkVertical",
        7 => "darkDown",
        8 => "darkUp",
        9 => "darkGrid",
        10 => "darkTrellis",
        11 => "lightHorizontal",
        12 => "lightVertical",
        13 => "lightDown",
        14 => "lightUp",
        15 => "lightGrid",
        16 => "lightTrellis",
        17 => "gray125",
        18 => "gray0625",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn font_body(height: u16, flags: u16, color: u16, weight: u16, name: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for v in [height, flags, color, weight, 0] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        body.extend_from_slice(&[0x01, 0, 0, 0]);
        body.push(name.len() as u8);
        body.push(0x00);
        body.extend_from_slice(name.as_bytes());
        body
    }

    #[test]
    fn test_parse_font() {
        let font = parse_font(&font_body(240, 0x0002, 10, 700, "Gulim")).unwrap();
        assert_eq!(font.height, 240);
        assert!(font.bold);
        assert!(font.italic);
        assert!(!font.strike);
        assert_eq!(font.underline, 0x01);
        assert_eq!(font.color, 10);
        assert_eq!(font.name, "Gulim");
    }

    #[test]
    fn test_parse_xf() {
        let mut body = [0u8; 20];
        body[0] = 5; // font
        body[2] = 164; // format
        body[4] = 0x01; // locked
        body[6] = 0x02 | 0x08 | (1 << 4); // center, wrap, vertical center
        // left thin, bottom medium
        let border1: u32 = 0x01 | (0x02 << 12) | (10 << 16);
        body[10..14].copy_from_slice(&border1.to_le_bytes());
        let border2: u32 = 1 << 26; // solid
        body[14..18].copy_from_slice(&border2.to_le_bytes());
        body[18..20].copy_from_slice(&(13u16 | (64 << 7)).to_le_bytes());

        let xf = parse_xf(&body).unwrap();
        assert_eq!((xf.font, xf.format), (5, 164));
        assert!(xf.locked);
        assert_eq!((xf.halign, xf.valign, xf.wrap), (2, 1, true));
        assert_eq!(xf.lines, [1, 0, 0, 2, 0]);
        assert_eq!(xf.line_colors[0], 10);
        assert_eq!((xf.pattern, xf.fore, xf.back), (1, 13, 64));

        assert!(parse_xf(&body[..12]).is_err());
    }

    #[test]
    fn test_parse_format() {
        let mut body = 164u16.to_le_bytes().to_vec();
        let code = "yyyy\"년\" m\"월\"";
        body.extend_from_slice(&(code.encode_utf16().count() as u16).to_le_bytes());
        body.push(0x01);
        body.extend(code.encode_utf16().flat_map(|u| u.to_le_bytes()));
        assert_eq!(parse_format(&body).unwrap(), (164, code.to_string()));
    }

    #[test]
    fn test_palette_override() {
        let mut table = StyleTable::default();
        let mut body = 1u16.to_le_bytes().to_vec();
        body.extend_from_slice(&[0x12, 0x34, 0x56, 0]);
        table.apply_palette(&body).unwrap();
        assert_eq!(table.rgb(8).as_deref(), Some("FF123456"));
        assert_eq!(table.rgb(10).as_deref(), Some("FFFF0000"));
        assert_eq!(table.rgb(0x7FFF), None);
    }

    #[test]
    fn test_font_index_four_is_skipped() {
        let mut table = StyleTable::default();
        for name in ["a", "b", "c", "d", "e"] {
            table.fonts.push(parse_font(&font_body(200, 0, 0x7FFF, 400, name)).unwrap());
        }
        assert_eq!(table.font_id(3), 3);
        assert_eq!(table.font_id(5), 4);
        assert_eq!(table.font_id(40), 0);
    }

    #[test]
    fn test_styles_xml_keeps_xf_positions() {
        let mut table = StyleTable::default();
        table.fonts.push(parse_font(&font_body(200, 0, 0x7FFF, 400, "Arial")).unwrap());
        table.fonts.push(parse_font(&font_body(280, 0, 10, 700, "R&D Sans")).unwrap());
        table.formats.insert(164, "0.0\"개\"".into());
        table.xfs.push(BiffXf {
            locked: true,
            ..Default::default()
        });
        table.xfs.push(BiffXf {
            font: 1,
            format: 164,
            locked: true,
            pattern: 1,
            fore: 13,
            back: 64,
            ..Default::default()
        });
        table.xfs.push(BiffXf {
            font: 1,
            format: 14,
            halign: 2,
            ..Default::default()
        });

        let xml = table.to_styles_xml();
        assert!(xml.contains(r#"<numFmt numFmtId="164" formatCode="0.0&quot;개&quot;"/>"#));
        assert!(xml.contains(r#"<name val="R&amp;D Sans"/>"#));
        assert!(xml.contains(r#"<b/><sz val="14"/><color rgb="FFFF0000"/>"#));
        assert!(xml.contains(r#"<fills count="3">"#));
        assert!(xml.contains(r#"<patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/>"#));
        assert!(xml.contains(r#"<cellXfs count="3">"#));
        assert!(xml.contains(
            r#"<xf numFmtId="164" fontId="1" fillId="2" borderId="0" xfId="0" applyNumberFormat="1" applyFont="1" applyFill="1"/>"#
        ));
        assert!(xml.contains(r#"<alignment horizontal="center"/><protection locked="0"/>"#));
    }
}
