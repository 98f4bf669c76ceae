//! BIFF8 record stream
//!
//! A stream is a run of records: a 2-byte type, a 2-byte body length, then
//! the body. Bodies longer than 8224 bytes spill into CONTINUE records,
//! which are folded into the record they extend.

pub mod cursor;
pub mod records;
pub mod strings;

use crate::error::{XlsError, XlsResult};
use cursor::ByteCursor;

/// One logical record with its CONTINUE bodies appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: u16,
    pub body: Vec<u8>,
    /// Offsets in `body` where each folded CONTINUE body starts
    pub boundaries: Vec<usize>,
}

/// Split a workbook stream into records
pub fn read_records(stream: &[u8]) -> XlsResult<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();
    let mut cur = ByteCursor::new(stream);

    while cur.remaining() >= 4 {
        let kind = cur.u16()?;
        let len = cur.u16()? as usize;
        let body = cur.bytes(len)?;

        if kind == records::CONTINUE {
            match records.last_mut() {
                Some(prev) => {
                    prev.boundaries.push(prev.body.len());
                    prev.body.extend_from_slice(body);
                }
                None => log::warn!("dropping CONTINUE record with nothing to extend"),
            }
            continue;
        }

        records.push(Record {
            kind,
            body: body.to_vec(),
            boundaries: Vec::new(),
        });
    }

    if cur.remaining() > 0 {
        log::debug!("ignoring {} trailing bytes after last record", cur.remaining());
    }

    Ok(records)
}

/// `(version, substream type)` of a BOF record
pub fn parse_bof(body: &[u8]) -> XlsResult<(u16, u16)> {
    if body.len() < 4 {
        return Err(XlsError::InvalidFormat("BOF record too short".into()));
    }
    let mut cur = ByteCursor::new(body);
    Ok((cur.u16()?, cur.u16()?))
}
