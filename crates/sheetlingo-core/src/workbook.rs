//! Workbook type - an ordered, name-unique sequence of worksheets

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A named formula or range (`definedName` in the container)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    /// Formula text without the leading `=`
    pub value: String,
    /// Name of the sheet the name is scoped to; `None` for workbook scope
    pub local_sheet: Option<String>,
    pub hidden: bool,
}

impl DefinedName {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            local_sheet: None,
            hidden: false,
        }
    }

    pub fn scoped_to<S: Into<String>>(mut self, sheet: S) -> Self {
        self.local_sheet = Some(sheet.into());
        self
    }
}

/// A workbook (spreadsheet document)
///
/// Besides its sheets, a workbook carries container parts the engine does
/// not model (the style table, the theme) as raw bytes keyed by part name,
/// so a writer can emit them back unchanged.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// Worksheets in the workbook, in tab order
    worksheets: Vec<Worksheet>,
    /// Opaque container parts, keyed by part path
    raw_parts: BTreeMap<String, Vec<u8>>,
    /// Defined names in container order
    defined_names: Vec<DefinedName>,
}

impl Workbook {
    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Get a worksheet by name, failing when absent
    pub fn require_worksheet(&self, name: &str) -> Result<&Worksheet> {
        self.worksheet_by_name(name)
            .ok_or_else(|| Error::SheetNotFound(name.into()))
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Sheet names in tab order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|ws| ws.name()).collect()
    }

    /// Add a new empty worksheet with specified name
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.add_existing_worksheet(Worksheet::new(name))
    }

    /// Add an existing worksheet to the end of the workbook
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        let index = self.worksheets.len();
        self.worksheets.push(worksheet);
        Ok(index)
    }

    /// Opaque container part by path
    pub fn raw_part(&self, path: &str) -> Option<&[u8]> {
        self.raw_parts.get(path).map(Vec::as_slice)
    }

    /// Attach an opaque container part
    pub fn set_raw_part<S: Into<String>>(&mut self, path: S, bytes: Vec<u8>) {
        self.raw_parts.insert(path.into(), bytes);
    }

    /// All opaque parts
    pub fn raw_parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.raw_parts
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Copy the opaque parts of another workbook into this one
    pub fn inherit_raw_parts(&mut self, other: &Workbook) {
        self.raw_parts.extend(
            other
                .raw_parts
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    pub fn add_defined_name(&mut self, name: DefinedName) {
        self.defined_names.push(name);
    }

    /// Names scoped to `sheet`
    pub fn names_scoped_to<'a>(&'a self, sheet: &'a str) -> impl Iterator<Item = &'a DefinedName> {
        self.defined_names
            .iter()
            .filter(move |n| n.local_sheet.as_deref() == Some(sheet))
    }

    /// Check that `name` is a legal, unused sheet name
    pub fn validate_sheet_name(&self, name: &str) -> Result<()> {
        validate_sheet_name_syntax(name)?;

        // Check for duplicate names (case-insensitive)
        let name_lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == name_lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}

/// Length and character rules for a sheet name, independent of any workbook
pub fn validate_sheet_name_syntax(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(Error::InvalidSheetName(format!(
            "'{}' is longer than {} characters",
            name, MAX_SHEET_NAME_LEN
        )));
    }

    const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
    if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Err(Error::InvalidSheetName(format!(
            "'{}' cannot contain '{}'",
            name, c
        )));
    }

    Ok(())
}
