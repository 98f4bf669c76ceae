//! Little-endian reads over a record body

use crate::error::{XlsError, XlsResult};

/// Forward-only reader over a byte slice
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Take the next `n` bytes
    pub fn bytes(&mut self, n: usize) -> XlsResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(XlsError::Parse(format!(
                "unexpected end of record at offset {}, need {} bytes, have {}",
                self.pos,
                n,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> XlsResult<()> {
        self.bytes(n).map(|_| ())
    }

    pub fn u8(&mut self) -> XlsResult<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> XlsResult<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> XlsResult<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn f64(&mut self) -> XlsResult<f64> {
        let b = self.bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(f64::from_le_bytes(raw))
    }

    /// RK-compressed number
    pub fn rk(&mut self) -> XlsResult<f64> {
        self.u32().map(decode_rk)
    }
}

/// Decode an RK value.
///
/// Bit 0 asks for a division by 100. Bit 1 selects a signed 30-bit integer
/// in bits 2..31; otherwise bits 2..31 are the top of an IEEE double whose
/// low 34 bits are zero.
pub fn decode_rk(rk: u32) -> f64 {
    let value = if rk & 0x02 != 0 {
        ((rk as i32) >> 2) as f64
    } else {
        f64::from_bits(((rk & 0xFFFF_FFFC) as u64) << 32)
    };

    if rk & 0x01 != 0 {
        value / 100.0
    } else {
        value
    }
}
