//! BIFF8 Unicode strings
//!
//! Header: character count (1 or 2 bytes), then an option byte. Bit 0 picks
//! UTF-16LE over compressed 8-bit characters, bit 3 announces a rich-text run
//! count, bit 2 an extended (phonetic) block size. Runs and the extended
//! block follow the characters and are skipped.
//!
//! Inside the shared string table a string may cross into a CONTINUE record.
//! The continuation then opens with a fresh option byte, which may switch
//! the character width mid-string.

use super::cursor::ByteCursor;
use super::Record;
use crate::error::{XlsError, XlsResult};

/// String with a 1-byte character count (sheet names)
pub fn read_short_string(cur: &mut ByteCursor<'_>) -> XlsResult<String> {
    let count = cur.u8()? as usize;
    let options = cur.u8()?;
    read_chars(cur, &[], count, options & 0x01 != 0)
}

/// String with a 2-byte character count (LABEL, STRING)
pub fn read_unicode_string(cur: &mut ByteCursor<'_>) -> XlsResult<String> {
    read_string(cur, &[])
}

fn read_string(cur: &mut ByteCursor<'_>, boundaries: &[usize]) -> XlsResult<String> {
    let count = cur.u16()? as usize;
    let options = cur.u8()?;

    let runs = if options & 0x08 != 0 { cur.u16()? as usize } else { 0 };
    let ext_len = if options & 0x04 != 0 { cur.u32()? as usize } else { 0 };

    let text = read_chars(cur, boundaries, count, options & 0x01 != 0)?;

    // Formatting runs are 4 bytes each
    cur.skip(runs * 4)?;
    cur.skip(ext_len)?;
    Ok(text)
}

fn read_chars(
    cur: &mut ByteCursor<'_>,
    boundaries: &[usize],
    count: usize,
    mut wide: bool,
) -> XlsResult<String> {
    let mut units: Vec<u16> = Vec::with_capacity(count);
    let mut left = count;

    if left > 0 && boundaries.contains(&cur.position()) {
        wide = cur.u8()? & 0x01 != 0;
    }

    while left > 0 {
        let pos = cur.position();
        let limit = boundaries
            .iter()
            .copied()
            .find(|&b| b > pos)
            .unwrap_or(pos + cur.remaining());
        let width = if wide { 2 } else { 1 };
        let take = left.min((limit - pos) / width);

        let bytes = cur.bytes(take * width)?;
        if wide {
            units.extend(
                bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
            );
        } else {
            units.extend(bytes.iter().map(|&b| b as u16));
        }
        left -= take;

        if left == 0 {
            break;
        }
        if cur.position() != limit || cur.remaining() == 0 {
            return Err(XlsError::Parse(format!(
                "string of {} characters runs past the end of its record",
                count
            )));
        }
        wide = cur.u8()? & 0x01 != 0;
    }

    String::from_utf16(&units).map_err(|e| XlsError::Parse(format!("invalid UTF-16 string: {e}")))
}

/// Parse the shared string table.
///
/// Body: total reference count (u32), unique count (u32), then the strings.
/// A damaged tail is logged and the strings read so far are kept.
pub fn parse_sst(record: &Record) -> XlsResult<Vec<String>> {
    let mut cur = ByteCursor::new(&record.body);
    let _total = cur.u32()?;
    let unique = cur.u32()? as usize;

    // The declared count is untrusted
    let mut strings = Vec::with_capacity(unique.min(record.body.len()));
    for i in 0..unique {
        match read_string(&mut cur, &record.boundaries) {
            Ok(s) => strings.push(s),
            Err(e) => {
                log::warn!("SST parse error at string {i}/{unique}: {e}");
                break;
            }
        }
    }

    Ok(strings)
}
