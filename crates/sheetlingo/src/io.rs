//! Container detection and file I/O

use std::io::Cursor;
use std::path::Path;

use sheetlingo_core::Workbook;
use sheetlingo_xlsx::{XlsxReader, XlsxWriter};

use crate::error::{Error, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Workbook container kinds recognised by their leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Office Open XML package (zip)
    Xlsx,
    /// Legacy binary workbook inside an OLE2 compound file
    Xls,
}

impl Container {
    /// Identify a container from its first bytes; extensions are ignored
    pub fn sniff(bytes: &[u8]) -> Option<Container> {
        if bytes.starts_with(ZIP_MAGIC) {
            Some(Container::Xlsx)
        } else if bytes.starts_with(CFB_MAGIC) {
            Some(Container::Xls)
        } else {
            None
        }
    }
}

/// Parse a workbook from memory
pub fn read_workbook(bytes: &[u8]) -> Result<Workbook> {
    match Container::sniff(bytes) {
        Some(Container::Xlsx) => Ok(XlsxReader::read(Cursor::new(bytes))?),
        #[cfg(feature = "xls")]
        Some(Container::Xls) => Ok(sheetlingo_xls::XlsReader::read(Cursor::new(bytes))?),
        #[cfg(not(feature = "xls"))]
        Some(Container::Xls) => Err(Error::UnsupportedContainer(
            "legacy .xls support is not enabled".into(),
        )),
        None => Err(Error::UnsupportedContainer(
            "not a spreadsheet workbook (expected xlsx or xls)".into(),
        )),
    }
}

/// Serialise a workbook as xlsx into memory
pub fn write_workbook(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    XlsxWriter::write(workbook, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt: Sized {
    /// Open a workbook file, choosing the reader by content
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;

    /// Save as xlsx
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        read_workbook(&bytes).map_err(|e| match e {
            Error::UnsupportedContainer(msg) => {
                Error::UnsupportedContainer(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        XlsxWriter::write_file(self, path)?;
        Ok(())
    }
}
