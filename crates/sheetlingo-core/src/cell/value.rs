//! Cell value types

use std::fmt;

use super::CellRange;

/// Scalar value stored in a cell
///
/// A formula cell keeps its last cached result here; the formula text lives
/// beside it on [`Cell`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value (all numbers stored as f64, including dates)
    Number(f64),

    /// String value
    String(String),

    /// Error value as written by the container (`#N/A`, `#REF!`, ...)
    Error(String),

    /// ISO 8601 date stored as text by the container (`t="d"` cells)
    ///
    /// Most producers store dates as serial numbers; this variant only
    /// exists so the explicit form survives a round trip.
    Date(String),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to get the value as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The type tag matching this value
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Empty => CellType::Empty,
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::Number(_) => CellType::Number,
            CellValue::String(_) => CellType::String,
            CellValue::Error(_) => CellType::Error,
            CellValue::Date(_) => CellType::Date,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Error(e) => write!(f, "{}", e),
            CellValue::Date(d) => write!(f, "{}", d),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Type tag of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellType {
    Empty,
    Boolean,
    Number,
    String,
    Error,
    Date,
}

/// How a formula is attached to its cell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormulaKind {
    /// Plain per-cell formula
    #[default]
    Normal,
    /// Member of a shared-formula group; the master cell carries `range`
    Shared {
        index: u32,
        range: Option<CellRange>,
    },
    /// Legacy array formula spanning `range`
    Array { range: CellRange },
}

/// Formula attached to a cell, stored without the leading `=`
///
/// `text` may be empty when the container only recorded a compiled form
/// (legacy binary files) or for shared-formula followers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Formula {
    pub text: String,
    pub kind: FormulaKind,
}

impl Formula {
    pub fn new<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = text.strip_prefix('=').map(str::to_string).unwrap_or(text);
        Self {
            text,
            kind: FormulaKind::Normal,
        }
    }

    pub fn with_kind(mut self, kind: FormulaKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Opaque style reference (an index into the container's style table)
pub type StyleRef = u32;

/// One formatted run of a rich-text string
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRun {
    pub text: String,
    /// Run properties (`<rPr>`) as container XML, kept verbatim
    pub properties: Option<String>,
}

impl TextRun {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            properties: None,
        }
    }
}

/// A stored cell: typed value plus side-channel attributes carried regardless of type
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Cell value (for formula cells, the cached result)
    pub value: CellValue,
    /// Formula, if any
    pub formula: Option<Formula>,
    /// Formatted rendering cached by the producer
    pub display: Option<String>,
    /// Style reference
    pub style: Option<StyleRef>,
    /// Formatting runs of a rich-text string value
    ///
    /// Only meaningful while the runs concatenate to the string value;
    /// anything that replaces the value drops them.
    pub runs: Option<Vec<TextRun>>,
}

impl Cell {
    /// Create a new cell with a value
    pub fn new<V: Into<CellValue>>(value: V) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Create a formula cell with a cached value
    pub fn formula<V: Into<CellValue>>(formula: Formula, cached: V) -> Self {
        Self {
            value: cached.into(),
            formula: Some(formula),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: StyleRef) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_display<S: Into<String>>(mut self, display: S) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Rich-text cell; the value is the concatenated run text
    pub fn rich(runs: Vec<TextRun>) -> Self {
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        Self {
            value: CellValue::String(text),
            runs: Some(runs),
            ..Default::default()
        }
    }

    /// Replace the string value, dropping runs that no longer describe it
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.value = CellValue::String(text.into());
        self.runs = None;
    }

    /// Runs that still match the string value
    pub fn rich_runs(&self) -> Option<&[TextRun]> {
        let runs = self.runs.as_deref()?;
        let text = self.value.as_str()?;
        let joined: String = runs.iter().map(|r| r.text.as_str()).collect();
        (joined == text).then_some(runs)
    }

    /// Type tag of the stored value
    pub fn cell_type(&self) -> CellType {
        self.value.cell_type()
    }

    /// Check if the cell contains a formula
    pub fn has_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// A cell with no value and no attributes carries nothing worth storing
    pub fn is_blank(&self) -> bool {
        self.value.is_empty()
            && self.formula.is_none()
            && self.display.is_none()
            && self.style.is_none()
            && self.runs.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_strips_equals() {
        assert_eq!(Formula::new("=A1+1").text, "A1+1");
        assert_eq!(Formula::new("SUM(A1:A3)").text, "SUM(A1:A3)");
    }

    #[test]
    fn test_cell_type_follows_value() {
        assert_eq!(Cell::new("x").cell_type(), CellType::String);
        assert_eq!(Cell::new(1.5).cell_type(), CellType::Number);
        assert_eq!(
            Cell::formula(Formula::new("=1=1"), true).cell_type(),
            CellType::Boolean
        );
        assert_eq!(Cell::default().cell_type(), CellType::Empty);
    }

    #[test]
    fn test_blank_cells() {
        assert!(Cell::default().is_blank());
        // A styled empty cell still has to round-trip
        assert!(!Cell::default().with_style(3).is_blank());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(CellValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Error("#N/A".into()).to_string(), "#N/A");
        assert_eq!(CellValue::Date("2024-03-01".into()).to_string(), "2024-03-01");
        assert_eq!(CellValue::Date("2024-03-01".into()).cell_type(), CellType::Date);
    }

    #[test]
    fn test_rich_runs_follow_value() {
        let mut cell = Cell::rich(vec![
            TextRun::plain("합"),
            TextRun {
                text: "계".into(),
                properties: Some("<rPr><b/></rPr>".into()),
            },
        ]);
        assert_eq!(cell.value, CellValue::string("합계"));
        assert_eq!(cell.rich_runs().map(<[TextRun]>::len), Some(2));

        // Direct edits that bypass set_text no longer match the runs
        cell.value = CellValue::string("合计");
        assert!(cell.rich_runs().is_none());

        cell.set_text("合计");
        assert!(cell.runs.is_none());
    }
}
