//! Hand-off translation through an external assistant
//!
//! [`collect_items`] lists the cells a run would translate as
//! `<Sheet!A1, text>` lines and [`prompt`] wraps them in instructions.
//! Whatever comes back in `<Sheet!A1, text> -> translation` form is read by
//! [`CellOverrides::parse`] and written into the workbook by
//! [`Translator::apply_overrides`](crate::Translator::apply_overrides),
//! which touches only the listed cells.
//!
//! ```rust
//! use sheetlingo::manual::CellOverrides;
//! use sheetlingo::prelude::*;
//!
//! let answer = "<Sheet1!A1, 발주서> -> 订单\n<Sheet1!B2, 수량> -> 数量";
//! let overrides = CellOverrides::parse(answer);
//! assert_eq!(overrides.len(), 2);
//! assert_eq!(overrides.get("Sheet1", CellAddress::new(0, 0)), Some("订单"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use lazy_regex::{regex_captures, regex_is_match};
use sheetlingo_core::{CellAddress, CellValue, QualifiedRef, SelectionModel, Workbook};
use sheetlingo_rewrite::Direction;

use crate::transform::TransformOptions;

/// One cell to translate by hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub cell: QualifiedRef,
    pub text: String,
}

impl fmt::Display for WorkItem {
    /// Line breaks inside the text are flattened so every item is one line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: Vec<&str> = self.text.split_whitespace().collect();
        write!(f, "<{}, {}>", self.cell, text.join(" "))
    }
}

/// The string cells a translation run would send to the rewriter.
///
/// Formulas, blanks, excluded cells and text kept by the preserve rule are
/// left out, as is text without any source-language script. Items come in
/// sheet order, then row-major order.
pub fn collect_items(
    workbook: &Workbook,
    selection: &SelectionModel,
    options: TransformOptions,
) -> Vec<WorkItem> {
    let mut items = Vec::new();
    for sheet in workbook.worksheets() {
        let name = sheet.name();
        if selection.is_sheet_excluded(name) {
            continue;
        }
        let cells: Vec<(CellAddress, &str)> = sheet
            .grid()
            .iter()
            .filter(|(_, cell)| !cell.has_formula())
            .filter_map(|(addr, cell)| match &cell.value {
                CellValue::String(s) if !s.trim().is_empty() => Some((addr, s.as_str())),
                _ => None,
            })
            .filter(|(addr, text)| !selection.is_excluded(name, *addr, Some(text)))
            .filter(|(_, text)| !options.preserve.matches(text))
            .filter(|(_, text)| options.direction.has_source_script(text))
            .collect();

        items.extend(cells.into_iter().map(|(addr, text)| WorkItem {
            cell: QualifiedRef::new(name, addr),
            text: text.trim().to_string(),
        }));
    }
    log::debug!("Collected {} cells for manual translation", items.len());
    items
}

/// Instructions plus the item list, ready to paste into a chat assistant
pub fn prompt(items: &[WorkItem], direction: Direction) -> String {
    let (source, target) = match direction {
        Direction::KoreanToChinese => ("한국어", "중국어(간체)"),
        Direction::ChineseToKorean => ("중국어", "한국어"),
    };
    let mut out = format!(
        "다음 엑셀 셀의 {source} 텍스트를 {target}로 번역해 주세요.\n\
         각 줄을 `<셀주소, 원본텍스트> -> 번역된텍스트` 형식으로 답하고, \
         셀주소는 바꾸지 마세요.\n\
         숫자, 코드, 영문 약어는 그대로 두세요.\n\n"
    );
    for item in items {
        out.push_str(&item.to_string());
        out.push('\n');
    }
    out
}

/// Translations keyed by cell, read from an assistant's answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellOverrides {
    cells: BTreeMap<QualifiedRef, String>,
}

impl CellOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `<Sheet!A1, source> -> translation` lines.
    ///
    /// `→` works as the arrow and the `<…, source>` wrapper may be dropped
    /// (`Sheet!A1 -> translation`). Lines that do not start a new entry
    /// continue the previous translation on a new line. Entries with an
    /// unreadable address or an empty translation are skipped; a repeated
    /// address keeps the last translation.
    pub fn parse(answer: &str) -> Self {
        let mut overrides = Self::new();
        for entry in entries(answer) {
            let Some((_, cell, _, translation)) = regex_captures!(
                r"(?s)^<?\s*([^,<>]+?)\s*(?:,(.*?))?>?\s*(?:->|→)\s*(.*)$",
                entry.as_str()
            ) else {
                log::debug!("Skipping unreadable line {:?}", entry);
                continue;
            };
            let cell = match QualifiedRef::parse(&cell.replace('$', "")) {
                Ok(cell) => cell,
                Err(e) => {
                    log::warn!("Skipping {:?}: {}", cell, e);
                    continue;
                }
            };
            let translation = translation.trim();
            if translation.is_empty() {
                log::warn!("Skipping {}: empty translation", cell);
                continue;
            }
            if let Some(previous) = overrides.insert(cell.clone(), translation) {
                log::warn!("{} listed twice, dropping {:?}", cell, previous);
            }
        }
        overrides
    }

    /// Returns the translation this replaced, if any
    pub fn insert(&mut self, cell: QualifiedRef, text: impl Into<String>) -> Option<String> {
        self.cells.insert(cell, text.into())
    }

    pub fn get(&self, sheet: &str, addr: CellAddress) -> Option<&str> {
        self.cells
            .get(&QualifiedRef::new(sheet, addr))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QualifiedRef, &str)> {
        self.cells.iter().map(|(cell, text)| (cell, text.as_str()))
    }

    /// Addresses that name no string cell of `workbook`
    pub fn unmatched(&self, workbook: &Workbook) -> Vec<&QualifiedRef> {
        self.cells
            .keys()
            .filter(|cell| {
                let found = workbook
                    .worksheet_by_name(&cell.sheet)
                    .and_then(|sheet| sheet.grid().get(&cell.cell));
                !matches!(found, Some(c) if matches!(c.value, CellValue::String(_)))
            })
            .collect()
    }
}

/// Group answer lines into entries
fn entries(answer: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in answer.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let starts_entry = trimmed.starts_with('<')
            || regex_is_match!(
                r"^(?:'[^']*(?:''[^']*)*'|[^\s<>,'!]+)!\$?[A-Za-z]{1,3}\$?\d+\s*(?:,|->|→)",
                trimmed
            );
        match out.last_mut() {
            Some(current) if !starts_entry => {
                current.push('\n');
                current.push_str(trimmed);
            }
            _ => out.push(trimmed.to_string()),
        }
    }
    out
}
