//! Sparse worksheet grid
//!
//! Only populated cells are stored, keyed row-major in a
//! `BTreeMap<row, BTreeMap<col, Cell>>`. Absence means an empty cell. Sheet
//! metadata that the engine never interprets (column and row sizing, default
//! formats) is carried as plain records so it survives a copy unchanged.

use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellRange, CellRangeIterator, StyleRef};
use crate::error::Result;

/// A `<col>`-style span of columns sharing width, style and visibility
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnInfo {
    /// First column (0-based, inclusive)
    pub min: u16,
    /// Last column (0-based, inclusive)
    pub max: u16,
    /// Width in characters
    pub width: Option<f64>,
    pub custom_width: bool,
    pub hidden: bool,
    pub style: Option<StyleRef>,
    pub outline_level: u8,
}

/// Per-row sizing and formatting
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowInfo {
    /// Height in points
    pub height: Option<f64>,
    pub custom_height: bool,
    pub hidden: bool,
    /// Row-level style, applied when `custom_format` is set
    pub style: Option<StyleRef>,
    pub custom_format: bool,
    pub outline_level: u8,
}

impl RowInfo {
    /// Nothing here differs from a default row
    pub fn is_default(&self) -> bool {
        *self == RowInfo::default()
    }
}

/// Sheet-wide sizing defaults
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetFormat {
    pub default_row_height: Option<f64>,
    pub default_col_width: Option<f64>,
    pub base_col_width: Option<u32>,
}

/// One worksheet's cells plus its structural metadata
///
/// `Clone` is a deep copy: every record is owned, so mutating a clone never
/// reaches back into its source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseGrid {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u16, Cell>>,

    /// Declared used range; grows to cover every stored cell
    dimension: Option<CellRange>,

    /// Merged cell regions, in document order
    merged_regions: Vec<CellRange>,

    /// Column spans, in document order
    columns: Vec<ColumnInfo>,

    /// Rows with non-default metadata
    row_info: BTreeMap<u32, RowInfo>,

    format: SheetFormat,
}

impl SparseGrid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a stored cell; `None` means the cell is empty
    pub fn get(&self, addr: &CellAddress) -> Option<&Cell> {
        self.rows.get(&addr.row).and_then(|r| r.get(&addr.col))
    }

    /// Get a stored cell by A1 reference
    pub fn get_a1(&self, reference: &str) -> Result<Option<&Cell>> {
        let addr = CellAddress::parse(reference)?;
        Ok(self.get(&addr))
    }

    /// Get a mutable stored cell
    pub fn get_mut(&mut self, addr: &CellAddress) -> Option<&mut Cell> {
        self.rows.get_mut(&addr.row).and_then(|r| r.get_mut(&addr.col))
    }

    /// Store a cell, or remove it when it carries nothing
    pub fn set(&mut self, addr: CellAddress, cell: Cell) {
        if cell.is_blank() {
            self.remove(&addr);
            return;
        }

        self.rows.entry(addr.row).or_default().insert(addr.col, cell);

        let single = CellRange::single(addr);
        self.dimension = Some(match self.dimension {
            Some(dim) => dim.union(&single),
            None => single,
        });
    }

    /// Remove a cell and return it
    pub fn remove(&mut self, addr: &CellAddress) -> Option<Cell> {
        let row = self.rows.get_mut(&addr.row)?;
        let removed = row.remove(&addr.col);
        if row.is_empty() {
            self.rows.remove(&addr.row);
        }
        removed
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if no cells are stored
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over stored cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.rows.iter().flat_map(|(&row, cols)| {
            cols.iter()
                .map(move |(&col, cell)| (CellAddress::new(row, col), cell))
        })
    }

    /// Iterate over the stored cells of one row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &Cell)> {
        self.rows
            .get(&row)
            .into_iter()
            .flat_map(|r| r.iter().map(|(&col, cell)| (col, cell)))
    }

    /// Indices of rows that hold cells or row metadata, ascending
    pub fn row_indices(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self
            .rows
            .keys()
            .chain(self.row_info.keys())
            .copied()
            .collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    /// Declared bounds, or A1 when the sheet reports none
    pub fn used_range(&self) -> CellRange {
        self.dimension
            .unwrap_or_else(|| CellRange::single(CellAddress::new(0, 0)))
    }

    /// Declared bounds as read from the container, if any
    pub fn dimension(&self) -> Option<CellRange> {
        self.dimension
    }

    /// Override the declared bounds
    pub fn set_dimension(&mut self, dimension: Option<CellRange>) {
        self.dimension = dimension;
    }

    /// Smallest rectangle covering the stored cells
    pub fn populated_bounds(&self) -> Option<CellRange> {
        let (&min_row, _) = self.rows.first_key_value()?;
        let (&max_row, _) = self.rows.last_key_value()?;
        let min_col = self.rows.values().filter_map(|r| r.keys().next()).min()?;
        let max_col = self.rows.values().filter_map(|r| r.keys().next_back()).max()?;
        Some(CellRange::from_indices(min_row, *min_col, max_row, *max_col))
    }

    /// Lazily walk a rectangle row-major, yielding empty positions as `None`
    pub fn iterate_range(&self, range: CellRange) -> RangeCells<'_> {
        RangeCells {
            grid: self,
            addrs: range.cells(),
        }
    }

    /// Merged cell regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Add a merged cell region
    pub fn add_merged_region(&mut self, range: CellRange) {
        self.merged_regions.push(range);
    }

    /// Column spans
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Append a column span
    pub fn add_column(&mut self, info: ColumnInfo) {
        self.columns.push(info);
    }

    /// Width of a column, if a span sets one
    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.min <= col && col <= c.max)
            .and_then(|c| c.width)
    }

    /// Metadata of one row
    pub fn row_info(&self, row: u32) -> Option<&RowInfo> {
        self.row_info.get(&row)
    }

    /// Set metadata of one row; default metadata is not stored
    pub fn set_row_info(&mut self, row: u32, info: RowInfo) {
        if info.is_default() {
            self.row_info.remove(&row);
        } else {
            self.row_info.insert(row, info);
        }
    }

    /// All rows with non-default metadata
    pub fn rows_info(&self) -> impl Iterator<Item = (u32, &RowInfo)> {
        self.row_info.iter().map(|(&row, info)| (row, info))
    }

    pub fn format(&self) -> &SheetFormat {
        &self.format
    }

    pub fn format_mut(&mut self) -> &mut SheetFormat {
        &mut self.format
    }
}

/// Row-major walk over a rectangle of a [`SparseGrid`], empties included
///
/// Cloning forks the walk at its current position; call
/// [`SparseGrid::iterate_range`] again for a fresh pass.
#[derive(Debug, Clone)]
pub struct RangeCells<'a> {
    grid: &'a SparseGrid,
    addrs: CellRangeIterator,
}

impl<'a> Iterator for RangeCells<'a> {
    type Item = (CellAddress, Option<&'a Cell>);

    fn next(&mut self) -> Option<Self::Item> {
        let addr = self.addrs.next()?;
        Some((addr, self.grid.get(&addr)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.addrs.size_hint()
    }
}

impl ExactSizeIterator for RangeCells<'_> {}
