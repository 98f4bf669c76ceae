//! Worksheet type

use crate::grid::SparseGrid;

/// Visibility of a sheet tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// One top-level element of a sheet part, kept as serialized XML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFragment {
    /// Local element name (`conditionalFormatting`, `sheetViews`, ...)
    pub element: String,
    pub xml: String,
}

/// An external relationship of a sheet part (hyperlink targets)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Sheet-level container content the engine carries without interpreting
///
/// Fragments are emitted back in container order; the root attributes hold
/// the namespace prefixes they were written with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSheetXml {
    pub root_attributes: Vec<(String, String)>,
    pub fragments: Vec<RawFragment>,
    pub relationships: Vec<RawRelationship>,
}

impl RawSheetXml {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty() && self.relationships.is_empty()
    }

    /// Fragments with the given element name, in order
    pub fn fragments_named<'a>(&'a self, element: &'a str) -> impl Iterator<Item = &'a RawFragment> {
        self.fragments.iter().filter(move |f| f.element == element)
    }
}

/// A named worksheet and its grid
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    name: String,
    state: SheetState,
    grid: SparseGrid,
    raw: RawSheetXml,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_grid(name, SparseGrid::new())
    }

    /// Create a worksheet around an existing grid
    pub fn with_grid<S: Into<String>>(name: S, grid: SparseGrid) -> Self {
        Self {
            name: name.into(),
            state: SheetState::Visible,
            grid,
            raw: RawSheetXml::default(),
        }
    }

    /// Get the worksheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the worksheet name (the owning workbook validates uniqueness)
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn state(&self) -> SheetState {
        self.state
    }

    pub fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }

    pub fn grid(&self) -> &SparseGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut SparseGrid {
        &mut self.grid
    }

    pub fn raw(&self) -> &RawSheetXml {
        &self.raw
    }

    pub fn set_raw(&mut self, raw: RawSheetXml) {
        self.raw = raw;
    }

    /// Deep copy of this sheet under another name
    pub fn copy_as<S: Into<String>>(&self, name: S) -> Worksheet {
        Worksheet {
            name: name.into(),
            state: self.state,
            grid: self.grid.clone(),
            raw: self.raw.clone(),
        }
    }
}
