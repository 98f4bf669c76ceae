//! XLS (BIFF8) reader.
//!
//! Opens the OLE2 compound file, pulls the `Workbook` stream, splits it into
//! records and builds a core [`Workbook`] from the globals substream and one
//! substream per sheet.

use std::io::{Read, Seek};
use std::path::Path;

use log::{debug, warn};

use sheetlingo_core::{
    Cell, CellAddress, CellRange, CellValue, ColumnInfo, Formula, RowInfo, SheetState,
    SparseGrid, Workbook, Worksheet,
};

use crate::biff::cursor::ByteCursor;
use crate::biff::records;
use crate::biff::strings::{parse_sst, read_short_string, read_unicode_string};
use crate::biff::{self, Record};
use crate::error::{XlsError, XlsResult};
use crate::styles::{self, StyleTable, STYLES_PART};

/// XLS file reader
pub struct XlsReader;

/// What the globals substream holds
#[derive(Debug, Default)]
struct Globals {
    sst: Vec<String>,
    sheets: Vec<BoundSheet>,
    styles: StyleTable,
}

/// A BOUNDSHEET entry of the globals substream
#[derive(Debug)]
struct BoundSheet {
    name: String,
    state: SheetState,
    /// 0 = worksheet, 2 = chart, 6 = VBA module
    sheet_type: u8,
}

impl XlsReader {
    /// Read an XLS file from a filesystem path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsResult<Workbook> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file)
    }

    /// Read an XLS file from any `Read + Seek` source
    pub fn read<R: Read + Seek>(reader: R) -> XlsResult<Workbook> {
        let mut compound = cfb::CompoundFile::open(reader)?;

        // BIFF5 files name the stream "Book"; the version check rejects them below
        let stream_path = ["/Workbook", "/Book"]
            .into_iter()
            .find(|path| compound.exists(path))
            .ok_or_else(|| {
                XlsError::InvalidFormat("no Workbook or Book stream in compound file".into())
            })?;

        let mut stream = Vec::new();
        compound.open_stream(stream_path)?.read_to_end(&mut stream)?;

        let all_records = biff::read_records(&stream)?;
        let (globals, rest) = Self::read_globals(&all_records)?;
        let groups = Self::split_substreams(rest);
        let xf_count = globals.styles.xfs.len();

        let mut workbook = Workbook::empty();
        for (index, info) in globals.sheets.into_iter().enumerate() {
            if info.sheet_type != records::SHEET_TYPE_WORKSHEET {
                debug!("skipping non-worksheet '{}' (type {})", info.name, info.sheet_type);
                continue;
            }

            let grid = match groups.get(index) {
                Some(group) => Self::read_sheet(group, &globals.sst, xf_count)?,
                None => {
                    warn!("sheet '{}' has no substream", info.name);
                    SparseGrid::new()
                }
            };
            debug!("read sheet '{}': {} cells", info.name, grid.cell_count());

            let mut sheet = Worksheet::with_grid(info.name, grid);
            sheet.set_state(info.state);
            workbook.add_existing_worksheet(sheet)?;
        }

        if !globals.styles.is_empty() {
            debug!(
                "synthesized styles: {} fonts, {} formats, {} XFs",
                globals.styles.fonts.len(),
                globals.styles.formats.len(),
                xf_count
            );
            workbook.set_raw_part(STYLES_PART, globals.styles.to_styles_xml().into_bytes());
        }

        Ok(workbook)
    }

    /// Walk the globals substream; returns the string table, the sheet
    /// directory, the style records and the records after the globals EOF
    fn read_globals(all_records: &[Record]) -> XlsResult<(Globals, &[Record])> {
        let first = all_records
            .first()
            .filter(|rec| rec.kind == records::BOF)
            .ok_or_else(|| XlsError::InvalidFormat("stream does not open with BOF".into()))?;

        let (version, substream) = biff::parse_bof(&first.body)?;
        if version != records::BIFF8_VERSION {
            return Err(XlsError::UnsupportedVersion(format!(
                "expected BIFF8 (0x0600), got 0x{version:04X}"
            )));
        }
        if substream != records::BOF_WORKBOOK_GLOBALS {
            return Err(XlsError::InvalidFormat(format!(
                "first substream is 0x{substream:04X}, not workbook globals"
            )));
        }

        let mut globals = Globals::default();

        for (idx, rec) in all_records.iter().enumerate().skip(1) {
            match rec.kind {
                records::EOF => return Ok((globals, &all_records[idx + 1..])),
                records::SST => globals.sst = parse_sst(rec)?,
                records::BOUNDSHEET => globals.sheets.push(Self::parse_boundsheet(&rec.body)?),
                records::FONT => globals.styles.fonts.push(styles::parse_font(&rec.body)?),
                records::FORMAT => {
                    let (id, code) = styles::parse_format(&rec.body)?;
                    globals.styles.formats.insert(id, code);
                }
                records::XF => globals.styles.xfs.push(styles::parse_xf(&rec.body)?),
                records::PALETTE => globals.styles.apply_palette(&rec.body)?,
                _ => {}
            }
        }

        Err(XlsError::InvalidFormat("workbook globals never end".into()))
    }

    /// BOUNDSHEET: stream offset(4) + visibility(1) + type(1) + short string
    fn parse_boundsheet(body: &[u8]) -> XlsResult<BoundSheet> {
        let mut cur = ByteCursor::new(body);
        let _offset = cur.u32()?;
        let state = match cur.u8()? & 0x03 {
            1 => SheetState::Hidden,
            2 => SheetState::VeryHidden,
            _ => SheetState::Visible,
        };
        let sheet_type = cur.u8()?;
        let name = read_short_string(&mut cur)?;
        Ok(BoundSheet {
            name,
            state,
            sheet_type,
        })
    }

    /// Group records into BOF..EOF substreams, one per BOUNDSHEET in order
    fn split_substreams(rest: &[Record]) -> Vec<Vec<&Record>> {
        let mut groups = Vec::new();
        let mut current: Option<Vec<&Record>> = None;
        let mut depth = 0usize;

        for rec in rest {
            match rec.kind {
                records::BOF => {
                    if depth == 0 {
                        current = Some(Vec::new());
                    }
                    depth += 1;
                }
                records::EOF => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                    }
                }
                // Records of embedded substreams (charts) are not ours
                _ if depth == 1 => {
                    if let Some(group) = current.as_mut() {
                        group.push(rec);
                    }
                }
                _ => {}
            }
        }

        groups
    }

    fn read_sheet(group: &[&Record], sst: &[String], xf_count: usize) -> XlsResult<SparseGrid> {
        let mut builder = SheetBuilder::new(sst, xf_count);
        for rec in group {
            builder.apply(rec)?;
        }
        Ok(builder.grid)
    }
}

/// Text of a BIFF error code
fn error_text(code: u8) -> &'static str {
    match code {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        _ => "#VALUE!",
    }
}

/// Accumulates one worksheet substream into a grid
struct SheetBuilder<'a> {
    sst: &'a [String],
    /// XF records in the globals; indices past it have no style to point at
    xf_count: usize,
    grid: SparseGrid,
    /// FORMULA cell waiting for its STRING record
    pending_string: Option<CellAddress>,
}

impl<'a> SheetBuilder<'a> {
    fn new(sst: &'a [String], xf_count: usize) -> Self {
        Self {
            sst,
            xf_count,
            grid: SparseGrid::new(),
            pending_string: None,
        }
    }

    fn apply(&mut self, rec: &Record) -> XlsResult<()> {
        let mut cur = ByteCursor::new(&rec.body);

        if rec.kind != records::STRING {
            self.pending_string = None;
        }

        match rec.kind {
            records::DIMENSIONS => {
                // first row(4) + last row + 1(4) + first col(2) + last col + 1(2)
                let first_row = cur.u32()?;
                let end_row = cur.u32()?;
                let first_col = cur.u16()?;
                let end_col = cur.u16()?;
                if end_row > first_row && end_col > first_col {
                    self.grid.set_dimension(Some(CellRange::from_indices(
                        first_row,
                        first_col,
                        end_row - 1,
                        end_col - 1,
                    )));
                }
            }
            records::LABELSST => {
                let (addr, xf) = Self::cell_header(&mut cur)?;
                let index = cur.u32()? as usize;
                match self.sst.get(index) {
                    Some(s) => self.put(addr, CellValue::string(s.as_str()), xf),
                    None => warn!("{} points past the string table ({})", addr, index),
                }
            }
            records::LABEL => {
                let (addr, xf) = Self::cell_header(&mut cur)?;
                let text = read_unicode_string(&mut cur)?;
                self.put(addr, CellValue::String(text), xf);
            }
            records::NUMBER => {
                let (addr, xf) = Self::cell_header(&mut cur)?;
                let value = cur.f64()?;
                self.put(addr, CellValue::Number(value), xf);
            }
            records::RK => {
                let (addr, xf) = Self::cell_header(&mut cur)?;
                let value = cur.rk()?;
                self.put(addr, CellValue::Number(value), xf);
            }
            records::MULRK => {
                // row(2) + first col(2) + [xf(2) + rk(4)]* + last col(2)
                let row = cur.u16()? as u32;
                let mut col = cur.u16()?;
                while cur.remaining() >= 6 + 2 {
                    let xf = cur.u16()?;
                    let value = cur.rk()?;
                    self.put(CellAddress::new(row, col), CellValue::Number(value), xf);
                    col = col.saturating_add(1);
                }
            }
            records::BLANK => {
                let (addr, xf) = Self::cell_header(&mut cur)?;
                self.put(addr, CellValue::Empty, xf);
            }
            records::MULBLANK => {
                // row(2) + first col(2) + [xf(2)]* + last col(2)
                let row = cur.u16()? as u32;
                let mut col = cur.u16()?;
                while cur.remaining() >= 2 + 2 {
                    let xf = cur.u16()?;
                    self.put(CellAddress::new(row, col), CellValue::Empty, xf);
                    col = col.saturating_add(1);
                }
            }
            records::BOOLERR => {
                let (addr, xf) = Self::cell_header(&mut cur)?;
                let value = cur.u8()?;
                let is_error = cur.u8()? != 0;
                let value = if is_error {
                    CellValue::Error(error_text(value).to_string())
                } else {
                    CellValue::Boolean(value != 0)
                };
                self.put(addr, value, xf);
            }
            records::FORMULA => self.apply_formula(&mut cur)?,
            records::STRING => {
                if let Some(addr) = self.pending_string.take() {
                    let text = read_unicode_string(&mut cur)?;
                    if let Some(cell) = self.grid.get_mut(&addr) {
                        cell.value = CellValue::String(text);
                    }
                }
            }
            records::MERGECELLS => {
                // count(2) + [first row(2) + last row(2) + first col(2) + last col(2)]*
                let count = cur.u16()?;
                for _ in 0..count {
                    if cur.remaining() < 8 {
                        break;
                    }
                    let first_row = cur.u16()? as u32;
                    let last_row = cur.u16()? as u32;
                    let first_col = cur.u16()?;
                    let last_col = cur.u16()?;
                    self.grid.add_merged_region(CellRange::from_indices(
                        first_row, first_col, last_row, last_col,
                    ));
                }
            }
            records::ROW => self.apply_row(&mut cur)?,
            records::COLINFO => {
                // first(2) + last(2) + width in 1/256 char(2) + xf(2) + options(2)
                let first = cur.u16()?;
                let last = cur.u16()?.min(255);
                let width = cur.u16()?;
                let xf = cur.u16()?;
                let options = cur.u16()?;
                if first <= last {
                    let style = self.style_ref(xf);
                    self.grid.add_column(ColumnInfo {
                        min: first,
                        max: last,
                        width: Some(width as f64 / 256.0),
                        custom_width: true,
                        hidden: options & 0x0001 != 0,
                        style,
                        outline_level: ((options >> 8) & 0x07) as u8,
                    });
                }
            }
            records::DEFAULTROWHEIGHT => {
                let _options = cur.u16()?;
                let twips = cur.u16()?;
                self.grid.format_mut().default_row_height = Some(twips as f64 / 20.0);
            }
            records::DEFCOLWIDTH => {
                self.grid.format_mut().base_col_width = Some(cur.u16()? as u32);
            }
            _ => {}
        }
        Ok(())
    }

    fn style_ref(&self, xf: u16) -> Option<u32> {
        (xf != records::DEFAULT_CELL_XF && (xf as usize) < self.xf_count).then_some(xf as u32)
    }

    /// row(2) + col(2) + xf(2)
    fn cell_header(cur: &mut ByteCursor<'_>) -> XlsResult<(CellAddress, u16)> {
        let row = cur.u16()? as u32;
        let col = cur.u16()?;
        let xf = cur.u16()?;
        Ok((CellAddress::new(row, col), xf))
    }

    fn put(&mut self, addr: CellAddress, value: CellValue, xf: u16) {
        let style = self.style_ref(xf);
        self.grid.set(
            addr,
            Cell {
                value,
                formula: None,
                display: None,
                style,
                runs: None,
            },
        );
    }

    /// FORMULA: header(6) + cached result(8) + options(2) + reserved(4) + parsed tokens
    ///
    /// Only the cached result is kept. The formula itself is marked with empty
    /// text: present, so the cell is treated as computed, but not decompiled.
    fn apply_formula(&mut self, cur: &mut ByteCursor<'_>) -> XlsResult<()> {
        let (addr, xf) = Self::cell_header(cur)?;
        let result = cur.bytes(8)?;

        // 0xFFFF in the top two bytes flags a non-numeric result
        let value = if result[6] == 0xFF && result[7] == 0xFF {
            match result[0] {
                0x00 => {
                    self.pending_string = Some(addr);
                    CellValue::Empty
                }
                0x01 => CellValue::Boolean(result[2] != 0),
                0x02 => CellValue::Error(error_text(result[2]).to_string()),
                0x03 => CellValue::string(""),
                _ => CellValue::Empty,
            }
        } else {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(result);
            CellValue::Number(f64::from_le_bytes(raw))
        };

        let style = self.style_ref(xf);
        self.grid.set(
            addr,
            Cell {
                value,
                formula: Some(Formula {
                    text: String::new(),
                    kind: Default::default(),
                }),
                display: None,
                style,
                runs: None,
            },
        );
        Ok(())
    }

    /// ROW: row(2) + first col(2) + last col + 1(2) + height(2) + reserved(4) + options(4)
    fn apply_row(&mut self, cur: &mut ByteCursor<'_>) -> XlsResult<()> {
        let row = cur.u16()? as u32;
        let _first_col = cur.u16()?;
        let _end_col = cur.u16()?;
        let height = cur.u16()? & 0x7FFF;
        if cur.remaining() < 8 {
            return Ok(());
        }
        cur.skip(4)?;
        let options = cur.u32()?;

        let custom_height = options & 0x40 != 0;
        let custom_format = options & 0x80 != 0;
        let info = RowInfo {
            height: custom_height.then_some(height as f64 / 20.0),
            custom_height,
            hidden: options & 0x20 != 0,
            style: if custom_format {
                self.style_ref(((options >> 16) & 0x0FFF) as u16)
            } else {
                None
            },
            custom_format,
            outline_level: (options & 0x07) as u8,
        };
        self.grid.set_row_info(row, info);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    fn rec(kind: u16, body: &[u8]) -> Vec<u8> {
        let mut out = kind.to_le_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn bof(substream: u16) -> Vec<u8> {
        let mut body = 0x0600u16.to_le_bytes().to_vec();
        body.extend_from_slice(&substream.to_le_bytes());
        body.extend_from_slice(&[0; 12]);
        rec(records::BOF, &body)
    }

    fn eof() -> Vec<u8> {
        rec(records::EOF, &[])
    }

    fn boundsheet(name: &str, visibility: u8, sheet_type: u8) -> Vec<u8> {
        let mut body = 0u32.to_le_bytes().to_vec();
        body.push(visibility);
        body.push(sheet_type);
        body.push(name.encode_utf16().count() as u8);
        body.push(0x01);
        body.extend(name.encode_utf16().flat_map(|u| u.to_le_bytes()));
        rec(records::BOUNDSHEET, &body)
    }

    fn sst(strings: &[&str]) -> Vec<u8> {
        let mut body = (strings.len() as u32).to_le_bytes().to_vec();
        body.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        for s in strings {
            body.extend_from_slice(&(s.encode_utf16().count() as u16).to_le_bytes());
            body.push(0x01);
            body.extend(s.encode_utf16().flat_map(|u| u.to_le_bytes()));
        }
        rec(records::SST, &body)
    }

    fn header(row: u16, col: u16, xf: u16) -> Vec<u8> {
        [row.to_le_bytes(), col.to_le_bytes(), xf.to_le_bytes()].concat()
    }

    fn compound(stream_name: &str, stream: &[u8]) -> Vec<u8> {
        let mut ole = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        {
            let mut s = ole.create_stream(stream_name).unwrap();
            s.write_all(stream).unwrap();
            s.flush().unwrap();
        }
        ole.flush().unwrap();
        ole.into_inner().into_inner()
    }

    fn font(height: u16, weight: u16, name: &str) -> Vec<u8> {
        let mut body = Vec::new();
        for v in [height, 0, 0x7FFF, weight, 0] {
            body.extend_from_slice(&v.to_le_bytes());
        }
        body.extend_from_slice(&[0; 4]);
        body.push(name.len() as u8);
        body.push(0x00);
        body.extend_from_slice(name.as_bytes());
        rec(records::FONT, &body)
    }

    /// Cell XF with a font, a number format and an optional solid fill
    fn xf(font: u16, format: u16, fill: Option<u16>) -> Vec<u8> {
        let mut body = [0u8; 20];
        body[0..2].copy_from_slice(&font.to_le_bytes());
        body[2..4].copy_from_slice(&format.to_le_bytes());
        body[4] = 0x01;
        body[6] = 0x20; // bottom
        if let Some(color) = fill {
            body[14..18].copy_from_slice(&(1u32 << 26).to_le_bytes());
            body[18..20].copy_from_slice(&(color | (64 << 7)).to_le_bytes());
        }
        rec(records::XF, &body)
    }

    fn order_workbook() -> Vec<u8> {
        let mut stream = bof(records::BOF_WORKBOOK_GLOBALS);
        stream.extend(font(200, 400, "Arial"));
        stream.extend(font(280, 700, "Dotum"));
        let mut format = 164u16.to_le_bytes().to_vec();
        format.extend_from_slice(&[4, 0, 0x00, b'0', b'.', b'0', b'0']);
        stream.extend(rec(records::FORMAT, &format));
        for _ in 0..21 {
            stream.extend(xf(0, 0, None));
        }
        // XF 21: bold heading, yellow fill
        stream.extend(xf(1, 164, Some(13)));
        stream.extend(boundsheet("발주서", 0, 0));
        stream.extend(boundsheet("Chart1", 0, 2));
        stream.extend(boundsheet("숨김", 1, 0));
        stream.extend(sst(&["발주서", "품목"]));
        stream.extend(eof());

        // Sheet 1
        stream.extend(bof(0x0010));
        let mut dims = 0u32.to_le_bytes().to_vec();
        dims.extend_from_slice(&5u32.to_le_bytes());
        dims.extend_from_slice(&0u16.to_le_bytes());
        dims.extend_from_slice(&4u16.to_le_bytes());
        dims.extend_from_slice(&0u16.to_le_bytes());
        stream.extend(rec(records::DIMENSIONS, &dims));

        let mut row = [0u16.to_le_bytes(), 0u16.to_le_bytes(), 2u16.to_le_bytes()].concat();
        row.extend_from_slice(&600u16.to_le_bytes()); // 30pt
        row.extend_from_slice(&[0; 4]);
        row.extend_from_slice(&0x0000_0140u32.to_le_bytes()); // customHeight
        stream.extend(rec(records::ROW, &row));

        let mut col = [1u16.to_le_bytes(), 2u16.to_le_bytes()].concat();
        col.extend_from_slice(&(20 * 256u16).to_le_bytes());
        col.extend_from_slice(&15u16.to_le_bytes());
        col.extend_from_slice(&1u16.to_le_bytes()); // hidden
        col.extend_from_slice(&[0, 0]);
        stream.extend(rec(records::COLINFO, &col));

        let mut labelsst = header(0, 0, 21);
        labelsst.extend_from_slice(&0u32.to_le_bytes());
        stream.extend(rec(records::LABELSST, &labelsst));

        let mut number = header(1, 0, 15);
        number.extend_from_slice(&42.5f64.to_le_bytes());
        stream.extend(rec(records::NUMBER, &number));

        let mut mulrk = [1u16.to_le_bytes(), 1u16.to_le_bytes()].concat();
        for value in [7u32, 8] {
            mulrk.extend_from_slice(&15u16.to_le_bytes());
            mulrk.extend_from_slice(&((value << 2) | 0x02).to_le_bytes());
        }
        mulrk.extend_from_slice(&2u16.to_le_bytes());
        stream.extend(rec(records::MULRK, &mulrk));

        let mut boolerr = header(2, 0, 15);
        boolerr.extend_from_slice(&[0x07, 0x01]);
        stream.extend(rec(records::BOOLERR, &boolerr));

        // B3 = formula with a numeric result
        let mut formula = header(2, 1, 15);
        formula.extend_from_slice(&84.0f64.to_le_bytes());
        formula.extend_from_slice(&[0; 6]);
        stream.extend(rec(records::FORMULA, &formula));

        // C3 = formula with a string result carried by STRING
        let mut formula = header(2, 2, 15);
        formula.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
        formula.extend_from_slice(&[0; 6]);
        stream.extend(rec(records::FORMULA, &formula));
        let mut string = 2u16.to_le_bytes().to_vec();
        string.push(0x01);
        string.extend("합계".encode_utf16().flat_map(|u| u.to_le_bytes()));
        stream.extend(rec(records::STRING, &string));

        let mut label = header(3, 0, 15);
        label.extend_from_slice(&[0x03, 0x00, 0x00, b'S', b'K', b'U']);
        stream.extend(rec(records::LABEL, &label));

        let mut merge = 1u16.to_le_bytes().to_vec();
        for v in [0u16, 0, 0, 2] {
            merge.extend_from_slice(&v.to_le_bytes());
        }
        stream.extend(rec(records::MERGECELLS, &merge));
        stream.extend(eof());

        // Chart substream
        stream.extend(bof(0x0020));
        stream.extend(eof());

        // Sheet 3
        stream.extend(bof(0x0010));
        let mut labelsst = header(0, 0, 15);
        labelsst.extend_from_slice(&1u32.to_le_bytes());
        stream.extend(rec(records::LABELSST, &labelsst));
        stream.extend(eof());

        compound("Workbook", &stream)
    }

    fn value_at(wb: &Workbook, sheet: usize, a1: &str) -> CellValue {
        wb.worksheet(sheet)
            .unwrap()
            .grid()
            .get_a1(a1)
            .unwrap()
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_reads_sheet_directory() {
        let wb = XlsReader::read(Cursor::new(order_workbook())).unwrap();
        assert_eq!(wb.sheet_names(), vec!["발주서", "숨김"]);
        assert_eq!(wb.worksheet(1).unwrap().state(), SheetState::Hidden);
    }

    #[test]
    fn test_reads_cell_values() {
        let wb = XlsReader::read(Cursor::new(order_workbook())).unwrap();

        assert_eq!(value_at(&wb, 0, "A1"), CellValue::string("발주서"));
        assert_eq!(value_at(&wb, 0, "A2"), CellValue::Number(42.5));
        assert_eq!(value_at(&wb, 0, "B2"), CellValue::Number(7.0));
        assert_eq!(value_at(&wb, 0, "C2"), CellValue::Number(8.0));
        assert_eq!(value_at(&wb, 0, "A3"), CellValue::Error("#DIV/0!".into()));
        assert_eq!(value_at(&wb, 0, "A4"), CellValue::string("SKU"));
        assert_eq!(value_at(&wb, 1, "A1"), CellValue::string("품목"));

        let grid = wb.worksheet(0).unwrap().grid();
        assert_eq!(grid.get_a1("A1").unwrap().unwrap().style, Some(21));
        assert_eq!(grid.get_a1("A2").unwrap().unwrap().style, None);
    }

    #[test]
    fn test_style_records_become_styles_part() {
        let wb = XlsReader::read(Cursor::new(order_workbook())).unwrap();
        let xml = std::str::from_utf8(wb.raw_part(STYLES_PART).unwrap()).unwrap();

        assert!(xml.contains(r#"<numFmt numFmtId="164" formatCode="0.00"/>"#));
        assert!(xml.contains(r#"<name val="Dotum"/>"#));
        assert!(xml.contains(r#"<cellXfs count="22">"#));
        assert!(xml.contains(r#"<xf numFmtId="164" fontId="1" fillId="2""#));
    }

    #[test]
    fn test_xf_indices_survive_xlsx_conversion() {
        let wb = XlsReader::read(Cursor::new(order_workbook())).unwrap();

        let mut out = Cursor::new(Vec::new());
        sheetlingo_xlsx::XlsxWriter::write(&wb, &mut out).unwrap();
        out.set_position(0);
        let back = sheetlingo_xlsx::XlsxReader::read(out).unwrap();

        let a1 = back.worksheet(0).unwrap().grid().get_a1("A1").unwrap().unwrap();
        assert_eq!(a1.style, Some(21));
        assert_eq!(back.raw_part(STYLES_PART), wb.raw_part(STYLES_PART));
    }

    #[test]
    fn test_xf_index_without_record_is_dropped() {
        // A cell pointing past the XF table keeps no style
        let mut stream = bof(records::BOF_WORKBOOK_GLOBALS);
        stream.extend(boundsheet("Sheet1", 0, 0));
        stream.extend(xf(0, 0, None));
        stream.extend(eof());
        stream.extend(bof(0x0010));
        let mut number = header(0, 0, 40);
        number.extend_from_slice(&1.0f64.to_le_bytes());
        stream.extend(rec(records::NUMBER, &number));
        stream.extend(eof());

        let wb = XlsReader::read(Cursor::new(compound("Workbook", &stream))).unwrap();
        let a1 = wb.worksheet(0).unwrap().grid().get_a1("A1").unwrap().unwrap();
        assert_eq!(a1.style, None);
        assert!(wb.raw_part(STYLES_PART).is_some());
    }

    #[test]
    fn test_formulas_keep_cached_results_only() {
        let wb = XlsReader::read(Cursor::new(order_workbook())).unwrap();
        let grid = wb.worksheet(0).unwrap().grid();

        let b3 = grid.get_a1("B3").unwrap().unwrap();
        assert_eq!(b3.value, CellValue::Number(84.0));
        assert_eq!(b3.formula.as_ref().unwrap().text, "");

        let c3 = grid.get_a1("C3").unwrap().unwrap();
        assert_eq!(c3.value, CellValue::string("합계"));
        assert!(c3.has_formula());
    }

    #[test]
    fn test_reads_structure() {
        let wb = XlsReader::read(Cursor::new(order_workbook())).unwrap();
        let grid = wb.worksheet(0).unwrap().grid();

        assert_eq!(grid.used_range().to_string(), "A1:D5");
        assert_eq!(grid.merged_regions(), &[CellRange::parse("A1:C1").unwrap()]);
        assert_eq!(grid.row_info(0).unwrap().height, Some(30.0));
        assert_eq!(grid.column_width(2), Some(20.0));
        assert!(grid.columns()[0].hidden);
    }

    #[test]
    fn test_rejects_missing_workbook_stream() {
        let bytes = compound("WordDocument", b"nothing");
        assert!(matches!(
            XlsReader::read(Cursor::new(bytes)),
            Err(XlsError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_biff5() {
        let mut body = 0x0500u16.to_le_bytes().to_vec();
        body.extend_from_slice(&records::BOF_WORKBOOK_GLOBALS.to_le_bytes());
        let mut stream = rec(records::BOF, &body);
        stream.extend(eof());

        let bytes = compound("Book", &stream);
        assert!(matches!(
            XlsReader::read(Cursor::new(bytes)),
            Err(XlsError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_rejects_non_compound_input() {
        assert!(matches!(
            XlsReader::read(Cursor::new(b"PK\x03\x04 not ole".to_vec())),
            Err(XlsError::Io(_))
        ));
    }
}
