//! Exclusion selection
//!
//! Tracks which sheets, cells and text patterns are skipped by a
//! transformation run. The model is a plain value owned by whoever drives
//! the session and is only read while a run is in progress.

use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;

use crate::cell::{CellAddress, CellRange, QualifiedRange, QualifiedRef};
use crate::error::{Error, Result};
use crate::MAX_GESTURE_CELLS;

fn check_gesture_size(sheet: &str, range: &CellRange) -> Result<()> {
    if range.cell_count() > MAX_GESTURE_CELLS {
        return Err(Error::MalformedReference(format!(
            "range {}!{} covers {} cells, more than the {} a selection can hold",
            sheet,
            range,
            range.cell_count(),
            MAX_GESTURE_CELLS
        )));
    }
    Ok(())
}

/// Hash set that remembers insertion order
///
/// Re-inserting a removed member places it at the end again.
#[derive(Debug, Clone)]
struct InsertionSet<T> {
    members: AHashMap<T, u64>,
    next_seq: u64,
}

impl<T: Hash + Eq + Clone> InsertionSet<T> {
    fn new() -> Self {
        Self {
            members: AHashMap::new(),
            next_seq: 0,
        }
    }

    fn contains(&self, item: &T) -> bool {
        self.members.contains_key(item)
    }

    fn insert(&mut self, item: T) -> bool {
        if self.members.contains_key(&item) {
            return false;
        }
        self.members.insert(item, self.next_seq);
        self.next_seq += 1;
        true
    }

    fn remove(&mut self, item: &T) -> bool {
        self.members.remove(item).is_some()
    }

    /// Flip membership; returns the new state
    fn toggle(&mut self, item: T) -> bool {
        if self.remove(&item) {
            false
        } else {
            self.insert(item)
        }
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn clear(&mut self) {
        self.members.clear();
        self.next_seq = 0;
    }

    fn ordered(&self) -> Vec<&T> {
        let mut items: Vec<(&T, u64)> = self.members.iter().map(|(k, &v)| (k, v)).collect();
        items.sort_unstable_by_key(|&(_, seq)| seq);
        items.into_iter().map(|(k, _)| k).collect()
    }
}

impl<T: Hash + Eq + Clone> Default for InsertionSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Excluded sheets, cells and patterns, plus the anchor of the last cell toggle
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    excluded_sheets: InsertionSet<String>,
    excluded_cells: InsertionSet<QualifiedRef>,
    patterns: Vec<String>,
    anchor: Option<QualifiedRef>,
}

impl SelectionModel {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one cell and make it the anchor for range gestures
    ///
    /// Returns whether the cell is excluded afterwards.
    pub fn toggle_cell(&mut self, cell: QualifiedRef) -> bool {
        self.anchor = Some(cell.clone());
        self.excluded_cells.toggle(cell)
    }

    /// Flip every cell of the rectangle spanned by `anchor` and `target`
    ///
    /// Each cell flips on its own, so a rectangle that is partly excluded
    /// comes out with the opposite pattern rather than uniformly excluded.
    /// The anchor is left where it was. Rectangles larger than
    /// [`MAX_GESTURE_CELLS`] are rejected as malformed.
    pub fn toggle_range(&mut self, anchor: &QualifiedRef, target: &QualifiedRef) -> Result<()> {
        if anchor.sheet != target.sheet {
            return Err(Error::CrossSheetRange {
                anchor: anchor.to_string(),
                target: target.to_string(),
            });
        }

        let range = anchor.cell.to(target.cell);
        check_gesture_size(&anchor.sheet, &range)?;
        for addr in range.cells() {
            self.excluded_cells
                .toggle(QualifiedRef::new(anchor.sheet.clone(), addr));
        }
        Ok(())
    }

    /// Range gesture from the current anchor, or a plain toggle when there is none
    pub fn toggle_to(&mut self, target: QualifiedRef) -> Result<()> {
        match self.anchor.clone() {
            Some(anchor) => self.toggle_range(&anchor, &target),
            None => {
                self.toggle_cell(target);
                Ok(())
            }
        }
    }

    /// Flip a whole sheet; returns whether it is excluded afterwards
    pub fn toggle_sheet(&mut self, name: &str) -> bool {
        self.excluded_sheets.toggle(name.to_string())
    }

    /// Mark every cell named by a comma-separated list of `Sheet!A1` or
    /// `Sheet!A1:B2` items as excluded
    ///
    /// Unlike the toggles this only ever adds. The list is validated in full
    /// before anything changes, and the list as a whole may not name more
    /// than [`MAX_GESTURE_CELLS`] cells.
    pub fn exclude_ranges(&mut self, list: &str) -> Result<()> {
        let ranges = list
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(QualifiedRange::parse)
            .collect::<Result<Vec<_>>>()?;

        let mut count = 0u64;
        for QualifiedRange { sheet, range } in &ranges {
            check_gesture_size(sheet, range)?;
            count += range.cell_count();
        }
        if count > MAX_GESTURE_CELLS {
            return Err(Error::MalformedReference(format!(
                "exclusion list covers {} cells, more than the {} a selection can hold",
                count, MAX_GESTURE_CELLS
            )));
        }

        for QualifiedRange { sheet, range } in ranges {
            for addr in range.cells() {
                self.excluded_cells.insert(QualifiedRef::new(sheet.clone(), addr));
            }
        }
        Ok(())
    }

    /// Register a text pattern; blank patterns are ignored
    ///
    /// Returns whether the pattern was newly added.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        let pattern = pattern.trim();
        if pattern.is_empty() || self.has_pattern(pattern) {
            return false;
        }
        self.patterns.push(pattern.to_string());
        true
    }

    /// Remove a text pattern (case-insensitive)
    pub fn remove_pattern(&mut self, pattern: &str) -> bool {
        let needle = pattern.trim().to_lowercase();
        let before = self.patterns.len();
        self.patterns.retain(|p| p.to_lowercase() != needle);
        self.patterns.len() != before
    }

    /// Flip a text pattern; returns whether it is registered afterwards
    pub fn toggle_pattern(&mut self, pattern: &str) -> bool {
        if self.remove_pattern(pattern) {
            false
        } else {
            self.add_pattern(pattern)
        }
    }

    fn has_pattern(&self, pattern: &str) -> bool {
        let needle = pattern.to_lowercase();
        self.patterns.iter().any(|p| p.to_lowercase() == needle)
    }

    /// Whether the sheet as a whole is excluded
    pub fn is_sheet_excluded(&self, sheet: &str) -> bool {
        self.excluded_sheets.contains(&sheet.to_string())
    }

    /// Whether a single cell is in the excluded-cells set
    pub fn is_cell_excluded(&self, sheet: &str, addr: CellAddress) -> bool {
        self.excluded_cells
            .contains(&QualifiedRef::new(sheet.to_string(), addr))
    }

    /// Whether `text` contains any registered pattern, ignoring case
    pub fn matches_pattern(&self, text: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let haystack = text.to_lowercase();
        self.patterns
            .iter()
            .any(|p| haystack.contains(&p.to_lowercase()))
    }

    /// A cell is skipped when its sheet is excluded, the cell itself is
    /// excluded, or its value (when supplied) matches a pattern
    pub fn is_excluded(&self, sheet: &str, addr: CellAddress, value: Option<&str>) -> bool {
        self.is_sheet_excluded(sheet)
            || self.is_cell_excluded(sheet, addr)
            || value.map_or(false, |v| self.matches_pattern(v))
    }

    /// Anchor for the next range gesture
    pub fn anchor(&self) -> Option<&QualifiedRef> {
        self.anchor.as_ref()
    }

    /// Nothing is excluded
    pub fn is_empty(&self) -> bool {
        self.excluded_sheets.len() == 0 && self.excluded_cells.len() == 0 && self.patterns.is_empty()
    }

    /// Number of individually excluded cells
    pub fn excluded_cell_count(&self) -> usize {
        self.excluded_cells.len()
    }

    /// Excluded sheet names in the order they were excluded
    pub fn excluded_sheets(&self) -> Vec<&str> {
        self.excluded_sheets
            .ordered()
            .into_iter()
            .map(String::as_str)
            .collect()
    }

    /// Excluded cells in the order they were excluded
    pub fn excluded_cells(&self) -> Vec<&QualifiedRef> {
        self.excluded_cells.ordered()
    }

    /// Registered patterns in registration order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Forget every exclusion and the anchor
    pub fn clear(&mut self) {
        self.excluded_sheets.clear();
        self.excluded_cells.clear();
        self.patterns.clear();
        self.anchor = None;
    }

    /// Report for display: sheets, cells grouped by sheet, patterns
    pub fn summarize(&self) -> ExclusionSummary {
        let mut cells: Vec<SheetCells> = Vec::new();
        for r in self.excluded_cells.ordered() {
            let cell = r.cell.to_string();
            match cells.iter_mut().find(|group| group.sheet == r.sheet) {
                Some(group) => group.cells.push(cell),
                None => cells.push(SheetCells {
                    sheet: r.sheet.clone(),
                    cells: vec![cell],
                }),
            }
        }

        ExclusionSummary {
            sheets: self
                .excluded_sheets
                .ordered()
                .into_iter()
                .cloned()
                .collect(),
            cells,
            patterns: self.patterns.clone(),
        }
    }
}

/// Excluded cells of one sheet, in the order they were excluded
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetCells {
    pub sheet: String,
    pub cells: Vec<String>,
}

/// Display-only snapshot of a [`SelectionModel`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExclusionSummary {
    pub sheets: Vec<String>,
    /// Groups ordered by the first exclusion in each sheet
    pub cells: Vec<SheetCells>,
    pub patterns: Vec<String>,
}

impl ExclusionSummary {
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty() && self.cells.is_empty() && self.patterns.is_empty()
    }
}

impl fmt::Display for ExclusionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "(none)");
        }
        if !self.sheets.is_empty() {
            writeln!(f, "Excluded sheets: {}", self.sheets.join(", "))?;
        }
        for group in &self.cells {
            writeln!(f, "{} excluded cells: {}", group.sheet, group.cells.join(", "))?;
        }
        if !self.patterns.is_empty() {
            writeln!(f, "Excluded patterns: {}", self.patterns.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn q(s: &str) -> QualifiedRef {
        QualifiedRef::parse(s).unwrap()
    }

    fn a(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_toggle_cell_sets_anchor() {
        let mut sel = SelectionModel::new();
        assert!(sel.toggle_cell(q("Sheet1!B2")));
        assert!(sel.is_excluded("Sheet1", a("B2"), None));
        assert_eq!(sel.anchor(), Some(&q("Sheet1!B2")));

        assert!(!sel.toggle_cell(q("Sheet1!B2")));
        assert!(!sel.is_excluded("Sheet1", a("B2"), None));
        assert_eq!(sel.anchor(), Some(&q("Sheet1!B2")));
    }

    #[test]
    fn test_toggle_range_flips_each_cell() {
        let mut sel = SelectionModel::new();
        sel.toggle_cell(q("Sheet1!A1"));

        sel.toggle_range(&q("Sheet1!B2"), &q("Sheet1!A1")).unwrap();

        // A1 was excluded before the gesture, so it flips back
        assert!(!sel.is_cell_excluded("Sheet1", a("A1")));
        assert!(sel.is_cell_excluded("Sheet1", a("B1")));
        assert!(sel.is_cell_excluded("Sheet1", a("A2")));
        assert!(sel.is_cell_excluded("Sheet1", a("B2")));
        // Anchor stays on the last single toggle
        assert_eq!(sel.anchor(), Some(&q("Sheet1!A1")));
    }

    #[test]
    fn test_cross_sheet_range_is_rejected() {
        let mut sel = SelectionModel::new();
        let err = sel
            .toggle_range(&q("Sheet1!A1"), &q("Sheet2!B2"))
            .unwrap_err();
        assert!(matches!(err, Error::CrossSheetRange { .. }));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_toggle_to_uses_anchor() {
        let mut sel = SelectionModel::new();
        sel.toggle_to(q("Sheet1!A1")).unwrap();
        assert_eq!(sel.excluded_cell_count(), 1);

        sel.toggle_to(q("Sheet1!A3")).unwrap();
        // A1 flips back off, A2 and A3 go on
        assert_eq!(
            sel.excluded_cells(),
            vec![&q("Sheet1!A2"), &q("Sheet1!A3")]
        );
    }

    #[test]
    fn test_sheet_and_pattern_exclusion() {
        let mut sel = SelectionModel::new();
        assert!(sel.toggle_sheet("Notes"));
        assert!(sel.is_excluded("Notes", a("Z99"), None));
        assert!(!sel.toggle_sheet("Notes"));

        assert!(sel.add_pattern("  TabletPC "));
        assert!(!sel.add_pattern("tabletpc"));
        assert!(!sel.add_pattern("   "));
        assert!(sel.is_excluded("Sheet1", a("A1"), Some("model: tabletpc-10")));
        assert!(!sel.is_excluded("Sheet1", a("A1"), None));
        assert!(!sel.toggle_pattern("TABLETPC"));
        assert!(sel.patterns().is_empty());
    }

    #[test]
    fn test_exclude_ranges_is_all_or_nothing() {
        let mut sel = SelectionModel::new();
        assert!(sel.exclude_ranges("Sheet1!A1:B2, Sheet1!Q0").is_err());
        assert!(sel.is_empty());

        sel.exclude_ranges("Sheet1!A1:B2,Sheet2!C3,").unwrap();
        assert_eq!(sel.excluded_cell_count(), 5);
        // Adding again does not flip anything back
        sel.exclude_ranges("Sheet1!A1").unwrap();
        assert!(sel.is_cell_excluded("Sheet1", a("A1")));
    }

    #[test]
    fn test_oversized_ranges_are_rejected() {
        let mut sel = SelectionModel::new();
        let err = sel
            .toggle_range(&q("Sheet1!A1"), &q("Sheet1!XFD1048576"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedReference(_)));
        assert!(sel.is_empty());

        assert!(matches!(
            sel.exclude_ranges("Sheet1!A1:XFD1048576"),
            Err(Error::MalformedReference(_))
        ));
        // Each item fits but the list as a whole does not
        assert!(sel
            .exclude_ranges("Sheet1!A1:A100000,Sheet2!A1:A100000")
            .is_err());
        assert!(sel.is_empty());

        // Exactly at the cap is fine
        sel.exclude_ranges("Sheet1!A1:A100000").unwrap();
        assert_eq!(sel.excluded_cell_count() as u64, MAX_GESTURE_CELLS);
    }

    #[test]
    fn test_clear() {
        let mut sel = SelectionModel::new();
        sel.toggle_cell(q("Sheet1!A1"));
        sel.toggle_sheet("Sheet2");
        sel.add_pattern("x");
        sel.clear();
        assert!(sel.is_empty());
        assert!(sel.anchor().is_none());
        assert_eq!(sel.summarize().to_string(), "(none)\n");
    }

    #[test]
    fn test_summary_groups_cells_by_sheet_in_insertion_order() {
        let mut sel = SelectionModel::new();
        sel.toggle_cell(q("Sheet2!C3"));
        sel.toggle_cell(q("Sheet1!B1"));
        sel.toggle_cell(q("Sheet2!A1"));
        sel.toggle_sheet("Memo");
        sel.add_pattern("TEL");

        let summary = sel.summarize();
        assert_eq!(
            summary,
            ExclusionSummary {
                sheets: vec!["Memo".into()],
                cells: vec![
                    SheetCells {
                        sheet: "Sheet2".into(),
                        cells: vec!["C3".into(), "A1".into()],
                    },
                    SheetCells {
                        sheet: "Sheet1".into(),
                        cells: vec!["B1".into()],
                    },
                ],
                patterns: vec!["TEL".into()],
            }
        );
        assert_eq!(
            summary.to_string(),
            "Excluded sheets: Memo\n\
             Sheet2 excluded cells: C3, A1\n\
             Sheet1 excluded cells: B1\n\
             Excluded patterns: TEL\n"
        );
    }

    #[test]
    fn test_retoggled_cell_moves_to_end() {
        let mut sel = SelectionModel::new();
        sel.toggle_cell(q("S!A1"));
        sel.toggle_cell(q("S!B1"));
        sel.toggle_cell(q("S!A1"));
        sel.toggle_cell(q("S!A1"));
        assert_eq!(sel.excluded_cells(), vec![&q("S!B1"), &q("S!A1")]);
    }

    proptest! {
        #[test]
        fn toggle_cell_twice_restores_state(
            row in 0u32..200, col in 0u16..50, pre in any::<bool>(),
        ) {
            let mut sel = SelectionModel::new();
            let cell = QualifiedRef::new("Sheet1", CellAddress::new(row, col));
            if pre {
                sel.toggle_cell(cell.clone());
            }
            let before = sel.is_cell_excluded("Sheet1", cell.cell);
            sel.toggle_cell(cell.clone());
            sel.toggle_cell(cell.clone());
            prop_assert_eq!(sel.is_cell_excluded("Sheet1", cell.cell), before);
        }

        #[test]
        fn toggle_range_is_self_inverse_from_clean_state(
            r1 in 0u32..30, c1 in 0u16..30, r2 in 0u32..30, c2 in 0u16..30,
        ) {
            let mut sel = SelectionModel::new();
            let from = QualifiedRef::new("Sheet1", CellAddress::new(r1, c1));
            let to = QualifiedRef::new("Sheet1", CellAddress::new(r2, c2));
            let range = from.cell.to(to.cell);

            sel.toggle_range(&from, &to).unwrap();
            prop_assert_eq!(sel.excluded_cell_count() as u64, range.cell_count());
            for addr in range.cells() {
                prop_assert!(sel.is_cell_excluded("Sheet1", addr));
            }

            sel.toggle_range(&from, &to).unwrap();
            prop_assert_eq!(sel.excluded_cell_count(), 0);
        }
    }
}
