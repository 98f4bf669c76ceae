//! Cell address and range types
//!
//! Columns use bijective base-26 letters (A=0, Z=25, AA=26, ...), rows are
//! 0-based internally and 1-based in text. Decoding accepts `<letters><digits>`
//! with lowercase letters and surrounding whitespace tolerated; absolute
//! markers (`$`), leading zeros and positions past the sheet limits are
//! rejected as malformed. Encoding always produces the canonical uppercase
//! form, so an accepted string re-encodes to its trimmed, uppercased self.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// Encode a 0-based column index as letters (0 = A, 25 = Z, 26 = AA, ...)
pub fn encode_column(col: u16) -> String {
    let mut result = String::new();
    let mut n = col as u32 + 1; // 1-based for calculation

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Decode column letters to a 0-based index (A = 0, Z = 25, AA = 26, ...)
///
/// Letters are case-insensitive.
pub fn decode_column(letters: &str) -> Result<u16> {
    if letters.is_empty() {
        return Err(Error::malformed("empty column letters"));
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::malformed(format!("invalid column letter '{}'", c)));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if col > MAX_COLS as u32 {
            return Err(Error::malformed(format!(
                "column '{}' is past the last column XFD",
                letters
            )));
        }
    }

    Ok((col - 1) as u16)
}

/// Encode a (row, col) pair as an A1-style reference
///
/// Total over every `u32`/`u16` pair. Positions past [`MAX_ROWS`] or
/// [`MAX_COLS`] still encode, but lie outside any sheet and will not decode;
/// use [`CellAddress::checked`] where the input is not already a valid
/// address.
pub fn encode_cell(row: u32, col: u16) -> String {
    format!("{}{}", encode_column(col), row as u64 + 1)
}

/// Decode an A1-style reference into a 0-based (row, col) pair
pub fn decode_cell(s: &str) -> Result<(u32, u16)> {
    let addr = CellAddress::parse(s)?;
    Ok((addr.row, addr.col))
}

/// Decode `start:end` or a single cell into a normalized range
pub fn decode_range(s: &str) -> Result<CellRange> {
    CellRange::parse(s)
}

/// A cell address (e.g., "A1", "C100")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Create an address only if it lies within the sheet limits
    pub fn checked(row: u32, col: u16) -> Result<Self> {
        if row >= MAX_ROWS || col >= MAX_COLS {
            return Err(Error::malformed(format!(
                "{} is outside the sheet",
                encode_cell(row, col)
            )));
        }
        Ok(Self { row, col })
    }

    /// Parse a cell address from A1-style notation
    ///
    /// # Examples
    /// ```
    /// use sheetlingo_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B2").unwrap();
    /// assert_eq!(addr.row, 1);
    /// assert_eq!(addr.col, 1);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::malformed("empty address"));
        }

        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        if split == 0 {
            return Err(Error::malformed(format!("no column letters in '{}'", s)));
        }

        let col = decode_column(&s[..split])?;

        let row_str = &s[split..];
        if row_str.is_empty() {
            return Err(Error::malformed(format!("no row number in '{}'", s)));
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::malformed(format!("invalid row number in '{}'", s)));
        }
        if row_str.starts_with('0') {
            return Err(Error::malformed(format!(
                "row number must be >= 1 without leading zeros in '{}'",
                s
            )));
        }

        let row: u64 = row_str
            .parse()
            .map_err(|_| Error::malformed(format!("invalid row number in '{}'", s)))?;

        if row > MAX_ROWS as u64 {
            return Err(Error::malformed(format!(
                "row {} is past the last row {} in '{}'",
                row, MAX_ROWS, s
            )));
        }

        Ok(Self {
            row: row as u32 - 1,
            col,
        })
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        encode_cell(self.row, self.col)
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A closed rectangle of cells (e.g., "A1:B10"), always normalized so that
/// `start` is the top-left and `end` the bottom-right corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range from two corners in any order
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse a range from A1:B10 notation, or a single cell as a 1x1 range
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        match s.split_once(':') {
            Some((start, end)) => {
                let start = CellAddress::parse(start)?;
                let end = CellAddress::parse(end)?;
                Ok(Self::new(start, end))
            }
            None => Ok(Self::single(CellAddress::parse(s)?)),
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Smallest range covering both `self` and `other`
    pub fn union(&self, other: &CellRange) -> CellRange {
        CellRange::from_indices(
            self.start.row.min(other.start.row),
            self.start.col.min(other.start.col),
            self.end.row.max(other.end.row),
            self.end.col.max(other.end.col),
        )
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            remaining: self.cell_count(),
        }
    }

    /// Format as A1:B10 string (a single cell prints without the colon)
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
#[derive(Debug, Clone)]
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u16,
    remaining: u64,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let addr = CellAddress::new(self.current_row, self.current_col);
        self.remaining -= 1;

        // Move to next cell
        if self.current_col == self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row = self.current_row.saturating_add(1);
        } else {
            self.current_col += 1;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

/// A cell reference qualified by its sheet, written `Sheet1!A1`
///
/// Sheet names that would be ambiguous unquoted are written `'My Sheet'!A1`,
/// with embedded quotes doubled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedRef {
    pub sheet: String,
    pub cell: CellAddress,
}

impl QualifiedRef {
    pub fn new<S: Into<String>>(sheet: S, cell: CellAddress) -> Self {
        Self {
            sheet: sheet.into(),
            cell,
        }
    }

    /// Parse `Sheet!A1` or `'Sheet name'!A1`
    pub fn parse(s: &str) -> Result<Self> {
        let (sheet, rest) = split_sheet_prefix(s.trim())?;
        Ok(Self {
            sheet,
            cell: CellAddress::parse(rest)?,
        })
    }
}

impl fmt::Display for QualifiedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", quote_sheet_name(&self.sheet), self.cell)
    }
}

impl FromStr for QualifiedRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A range qualified by its sheet, written `Sheet1!A1:C3`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedRange {
    pub sheet: String,
    pub range: CellRange,
}

impl QualifiedRange {
    /// Parse `Sheet!A1:B2` or `Sheet!A1`
    pub fn parse(s: &str) -> Result<Self> {
        let (sheet, rest) = split_sheet_prefix(s.trim())?;
        Ok(Self {
            sheet,
            range: CellRange::parse(rest)?,
        })
    }
}

impl fmt::Display for QualifiedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", quote_sheet_name(&self.sheet), self.range)
    }
}

fn split_sheet_prefix(s: &str) -> Result<(String, &str)> {
    if let Some(quoted) = s.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                name.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                name.push('\'');
                continue;
            }
            let rest = &quoted[i + 1..];
            return match rest.strip_prefix('!') {
                Some(cell) if !name.is_empty() => Ok((name, cell)),
                _ => Err(Error::malformed(format!("expected 'Sheet'!A1, got '{}'", s))),
            };
        }
        return Err(Error::malformed(format!("unterminated sheet quote in '{}'", s)));
    }

    match s.rsplit_once('!') {
        Some((sheet, cell)) if !sheet.is_empty() => Ok((sheet.to_string(), cell)),
        _ => Err(Error::malformed(format!("expected Sheet!A1, got '{}'", s))),
    }
}

fn quote_sheet_name(name: &str) -> String {
    let needs_quotes = name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '\'' | '!' | '-' | ',' | ';' | '(' | ')'));
    if needs_quotes {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_column() {
        assert_eq!(encode_column(0), "A");
        assert_eq!(encode_column(1), "B");
        assert_eq!(encode_column(25), "Z");
        assert_eq!(encode_column(26), "AA");
        assert_eq!(encode_column(27), "AB");
        assert_eq!(encode_column(701), "ZZ");
        assert_eq!(encode_column(702), "AAA");
        assert_eq!(encode_column(16383), "XFD");
    }

    #[test]
    fn test_decode_column() {
        assert_eq!(decode_column("A").unwrap(), 0);
        assert_eq!(decode_column("Z").unwrap(), 25);
        assert_eq!(decode_column("AA").unwrap(), 26);
        assert_eq!(decode_column("ZZ").unwrap(), 701);
        assert_eq!(decode_column("AAA").unwrap(), 702);
        assert_eq!(decode_column("XFD").unwrap(), 16383);

        // Case insensitive
        assert_eq!(decode_column("aa").unwrap(), 26);

        assert!(decode_column("").is_err());
        assert!(decode_column("XFE").is_err());
        assert!(decode_column("A1").is_err());
    }

    #[test]
    fn test_cell_address_parse() {
        let addr = CellAddress::parse("A1").unwrap();
        assert_eq!((addr.row, addr.col), (0, 0));

        let addr = CellAddress::parse("B12").unwrap();
        assert_eq!((addr.row, addr.col), (11, 1));

        let addr = CellAddress::parse("XFD1048576").unwrap();
        assert_eq!((addr.row, addr.col), (1_048_575, 16_383));
    }

    #[test]
    fn test_cell_address_parse_errors() {
        for bad in ["", "A", "1", "A0", "A01", "$A$1", "A1B", "A-1", "A1048577", "XFE1", "!A1"] {
            assert!(
                matches!(CellAddress::parse(bad), Err(Error::MalformedReference(_))),
                "{bad:?} should be rejected as malformed"
            );
        }
    }

    #[test]
    fn test_decode_past_limits_is_malformed() {
        assert!(matches!(
            decode_cell("A1048577"),
            Err(Error::MalformedReference(_))
        ));
        assert!(matches!(
            decode_column("XFE"),
            Err(Error::MalformedReference(_))
        ));
        assert!(matches!(
            decode_range("A1:XFE2"),
            Err(Error::MalformedReference(_))
        ));
        assert_eq!(decode_cell("XFD1048576").unwrap(), (1_048_575, 16_383));
    }

    #[test]
    fn test_encode_past_limits_does_not_decode() {
        let text = encode_cell(2_000_000, 0);
        assert_eq!(text, "A2000001");
        assert!(matches!(
            decode_cell(&text),
            Err(Error::MalformedReference(_))
        ));
        assert!(CellAddress::checked(2_000_000, 0).is_err());
        assert!(CellAddress::checked(0, MAX_COLS).is_err());
        assert_eq!(
            CellAddress::checked(1_048_575, 16_383).unwrap(),
            CellAddress::new(1_048_575, 16_383)
        );
    }

    #[test]
    fn test_decode_normalizes_case_and_whitespace() {
        let (row, col) = decode_cell("  b12 ").unwrap();
        assert_eq!(encode_cell(row, col), "B12");
    }

    #[test]
    fn test_cell_address_display() {
        assert_eq!(CellAddress::new(0, 0).to_string(), "A1");
        assert_eq!(CellAddress::new(99, 2).to_string(), "C100");
        assert_eq!(encode_cell(11, 1), "B12");
    }

    #[test]
    fn test_cell_address_orders_row_major() {
        let mut addrs = vec![
            CellAddress::new(1, 0),
            CellAddress::new(0, 5),
            CellAddress::new(0, 1),
        ];
        addrs.sort();
        assert_eq!(
            addrs,
            vec![
                CellAddress::new(0, 1),
                CellAddress::new(0, 5),
                CellAddress::new(1, 0)
            ]
        );
    }

    #[test]
    fn test_cell_range_parse() {
        let range = CellRange::parse("A1:B2").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(1, 1));

        // Single cell
        let range = CellRange::parse("C3").unwrap();
        assert_eq!(range.start, CellAddress::new(2, 2));
        assert_eq!(range.end, CellAddress::new(2, 2));

        // Corners in any order
        let range = CellRange::parse("C1:A3").unwrap();
        assert_eq!(range, CellRange::from_indices(0, 0, 2, 2));

        assert!(CellRange::parse("A1:").is_err());
        assert!(CellRange::parse("A1:B2:C3").is_err());
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::parse("B2:D4").unwrap();

        assert!(range.contains(&CellAddress::new(1, 1))); // B2
        assert!(range.contains(&CellAddress::new(3, 3))); // D4
        assert!(!range.contains(&CellAddress::new(0, 0))); // A1
        assert!(!range.contains(&CellAddress::new(4, 1))); // B5
    }

    #[test]
    fn test_cell_range_iterator() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<_> = range.cells().collect();

        assert_eq!(range.cells().len(), 4);
        assert_eq!(cells[0], CellAddress::new(0, 0)); // A1
        assert_eq!(cells[1], CellAddress::new(0, 1)); // B1
        assert_eq!(cells[2], CellAddress::new(1, 0)); // A2
        assert_eq!(cells[3], CellAddress::new(1, 1)); // B2
    }

    #[test]
    fn test_qualified_ref() {
        let r = QualifiedRef::parse("Sheet1!B2").unwrap();
        assert_eq!(r.sheet, "Sheet1");
        assert_eq!(r.cell, CellAddress::new(1, 1));
        assert_eq!(r.to_string(), "Sheet1!B2");

        let r = QualifiedRef::parse("'Q1 ''plan'''!A1").unwrap();
        assert_eq!(r.sheet, "Q1 'plan'");
        assert_eq!(r.to_string(), "'Q1 ''plan'''!A1");

        let r = QualifiedRef::parse("발주서!C3").unwrap();
        assert_eq!(r.sheet, "발주서");

        assert!(QualifiedRef::parse("A1").is_err());
        assert!(QualifiedRef::parse("!A1").is_err());
        assert!(QualifiedRef::parse("'open!A1").is_err());
    }

    #[test]
    fn test_qualified_range() {
        let r = QualifiedRange::parse("Sheet1!C3:A1").unwrap();
        assert_eq!(r.sheet, "Sheet1");
        assert_eq!(r.range, CellRange::from_indices(0, 0, 2, 2));
        assert_eq!(r.to_string(), "Sheet1!A1:C3");
    }

    proptest! {
        #[test]
        fn encode_then_decode_is_identity(row in 0u32..1_048_576, col in 0u16..16_384) {
            prop_assert_eq!(decode_cell(&encode_cell(row, col)).unwrap(), (row, col));
        }

        #[test]
        fn decode_then_encode_is_identity(s in "[A-Z]{1,2}[1-9][0-9]{0,5}") {
            if let Ok((row, col)) = decode_cell(&s) {
                prop_assert_eq!(encode_cell(row, col), s);
            }
        }

        #[test]
        fn decoded_ranges_are_normalized(
            r1 in 0u32..5000, c1 in 0u16..800,
            r2 in 0u32..5000, c2 in 0u16..800,
        ) {
            let text = format!("{}:{}", encode_cell(r1, c1), encode_cell(r2, c2));
            let range = decode_range(&text).unwrap();
            prop_assert!(range.start.row <= range.end.row);
            prop_assert!(range.start.col <= range.end.col);
            prop_assert_eq!(range, decode_range(&format!(
                "{}:{}", encode_cell(r2, c2), encode_cell(r1, c1)
            )).unwrap());
        }
    }
}
