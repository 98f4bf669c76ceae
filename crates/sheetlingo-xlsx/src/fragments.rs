//! Sheet-level XML carried through verbatim
//!
//! Elements of a worksheet part that the grid does not model (views,
//! conditional formats, validations, hyperlinks, page setup, ...) are
//! captured as serialized XML while reading and re-emitted at their schema
//! position when writing. Elements that point at other package parts
//! (drawings, comments, tables) are not carried, and relationship ids left
//! without a carried relationship are dropped from the captured markup.

use std::collections::HashSet;

use quick_xml::events::{BytesStart, Event};
use quick_xml::writer::Writer;

use crate::error::{XlsxError, XlsxResult};
use sheetlingo_core::RawFragment;

/// Carried elements in `CT_Worksheet` sequence order
const CARRIED: [&str; 22] = [
    "sheetPr",
    // dimension
    "sheetViews",
    // sheetFormatPr, cols, sheetData
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    // mergeCells
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "cellWatches",
    "ignoredErrors",
];

/// Where a carried element goes relative to the elements the writer models
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Slot {
    BeforeDimension,
    AfterDimension,
    AfterSheetData,
    AfterMerges,
}

fn position(element: &str) -> Option<usize> {
    CARRIED.iter().position(|name| *name == element)
}

pub(crate) fn is_carried(element: &[u8]) -> bool {
    std::str::from_utf8(element)
        .ok()
        .and_then(position)
        .is_some()
}

pub(crate) fn slot(element: &str) -> Slot {
    match position(element) {
        Some(0) => Slot::BeforeDimension,
        Some(1) => Slot::AfterDimension,
        Some(p) if p <= 9 => Slot::AfterSheetData,
        _ => Slot::AfterMerges,
    }
}

/// Fragments belonging to `slot`, in schema order (stable for repeats)
pub(crate) fn in_slot(fragments: &[RawFragment], slot_: Slot) -> Vec<&RawFragment> {
    let mut picked: Vec<&RawFragment> = fragments
        .iter()
        .filter(|f| slot(&f.element) == slot_)
        .collect();
    picked.sort_by_key(|f| position(&f.element).unwrap_or(usize::MAX));
    picked
}

/// Serializes one element and its subtree from reader events
pub(crate) struct Capture {
    element: String,
    depth: usize,
    writer: Writer<Vec<u8>>,
}

impl Capture {
    pub fn new(start: &BytesStart<'_>) -> Self {
        Self {
            element: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            depth: 0,
            writer: Writer::new(Vec::new()),
        }
    }

    /// Feed the next event; true once the captured element has closed.
    /// Relationship ids outside `keep_ids` are removed on the way.
    pub fn feed(&mut self, event: &Event<'_>, keep_ids: &HashSet<String>) -> XlsxResult<bool> {
        match event {
            Event::Start(e) => {
                self.depth += 1;
                self.writer.write_event(Event::Start(clean(e, keep_ids)))?;
            }
            Event::Empty(e) => {
                self.writer.write_event(Event::Empty(clean(e, keep_ids)))?;
                if self.depth == 0 {
                    return Ok(true);
                }
            }
            Event::End(_) => {
                self.writer.write_event(event.borrow())?;
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    return Ok(true);
                }
            }
            Event::Eof => return Ok(true),
            other => self.writer.write_event(other.borrow())?,
        }
        Ok(false)
    }

    pub fn finish(self) -> XlsxResult<RawFragment> {
        let xml = String::from_utf8(self.writer.into_inner()).map_err(|_| {
            XlsxError::Parse(format!("<{}> is not valid UTF-8", self.element))
        })?;
        Ok(RawFragment {
            element: self.element,
            xml,
        })
    }
}

/// Copy of a start tag without the selection flag and dangling `r:id`s
fn clean(e: &BytesStart<'_>, keep_ids: &HashSet<String>) -> BytesStart<'static> {
    let mut out = e.to_owned();
    out.clear_attributes();
    out.extend_attributes(e.attributes().flatten().filter(|attr| {
        let key = attr.key;
        if key.as_ref() == b"tabSelected" {
            return false;
        }
        if key.prefix().is_some() && key.local_name().as_ref() == b"id" {
            return std::str::from_utf8(&attr.value)
                .map_or(false, |id| keep_ids.contains(id));
        }
        true
    }));
    out
}
