//! Term glossary for local rewriting
//!
//! A glossary is an ordered list of Korean/Chinese term pairs. Rewriting
//! replaces every occurrence of each source term in list order, so earlier
//! entries win when terms overlap.

mod builtin;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{RewriteError, RewriteResult};

/// One glossary entry, Korean on the `source` side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GlossaryFile {
    #[serde(default)]
    term: Vec<Term>,
}

/// Ordered term pairs used for substring replacement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: Vec<Term>,
}

impl Glossary {
    /// An empty glossary; rewriting returns the input unchanged
    pub fn new() -> Self {
        Self::default()
    }

    /// The purchase-order vocabulary shipped with the engine
    pub fn builtin() -> Self {
        Self::from_pairs(builtin::PURCHASE_ORDER.iter().copied())
    }

    /// Build from `(korean, chinese)` pairs, skipping empty sources
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut glossary = Self::new();
        glossary.extend(pairs);
        glossary
    }

    /// Append pairs after the existing entries
    pub fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (source, target) in pairs {
            self.push(Term {
                source: source.into(),
                target: target.into(),
            });
        }
    }

    fn push(&mut self, term: Term) {
        if term.source.is_empty() || term.target.is_empty() {
            log::debug!("Skipping glossary entry with an empty side: {:?}", term);
            return;
        }
        self.terms.push(term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Parse a TOML glossary:
    ///
    /// ```toml
    /// [[term]]
    /// source = "발주서"
    /// target = "订单书"
    /// ```
    pub fn from_toml_str(s: &str) -> RewriteResult<Self> {
        let file: GlossaryFile =
            toml::from_str(s).map_err(|e| RewriteError::Parse(e.to_string()))?;
        Ok(Self::from_file(file))
    }

    /// Parse a JSON glossary, `{"term": [{"source": .., "target": ..}]}`
    pub fn from_json_str(s: &str) -> RewriteResult<Self> {
        let file: GlossaryFile =
            serde_json::from_str(s).map_err(|e| RewriteError::Parse(e.to_string()))?;
        Ok(Self::from_file(file))
    }

    /// Load a glossary file, choosing the format by extension
    pub fn load<P: AsRef<Path>>(path: P) -> RewriteResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let glossary = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        log::debug!("Loaded {} glossary terms from {}", glossary.len(), path.display());
        Ok(glossary)
    }

    fn from_file(file: GlossaryFile) -> Self {
        let mut glossary = Self::new();
        for term in file.term {
            glossary.push(term);
        }
        glossary
    }

    /// Replace every known term, in list order
    pub fn apply(&self, text: &str, direction: Direction) -> String {
        let mut out = text.to_string();
        for term in &self.terms {
            let (from, to) = match direction {
                Direction::KoreanToChinese => (&term.source, &term.target),
                Direction::ChineseToKorean => (&term.target, &term.source),
            };
            if out.contains(from.as_str()) {
                out = out.replace(from.as_str(), to);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_terms() {
        let g = Glossary::builtin();
        assert!(g.len() > 100);
        assert_eq!(g.apply("발주서", Direction::KoreanToChinese), "订单书");
        assert_eq!(g.apply("订单书", Direction::ChineseToKorean), "발주서");
        assert_eq!(
            g.apply("품목: 태블릿PC", Direction::KoreanToChinese),
            "品目: 平板电脑"
        );
    }

    #[test]
    fn test_earlier_entry_wins() {
        let g = Glossary::builtin();
        // The full name is listed before the bare title
        assert_eq!(
            g.apply("심대용과장", Direction::KoreanToChinese),
            "沈大龙科长"
        );
        assert_eq!(g.apply("과장", Direction::KoreanToChinese), "科长");
    }

    #[test]
    fn test_unknown_text_is_untouched() {
        let g = Glossary::builtin();
        assert_eq!(g.apply("안녕하세요", Direction::KoreanToChinese), "안녕하세요");
        assert_eq!(Glossary::new().apply("발주서", Direction::KoreanToChinese), "발주서");
    }

    #[test]
    fn test_empty_entries_skipped() {
        let g = Glossary::from_pairs([("", "x"), ("수량", ""), ("단위", "单位")]);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_from_toml_and_json() {
        let toml = r#"
            [[term]]
            source = "견적서"
            target = "报价单"

            [[term]]
            source = "납품"
            target = "交货"
        "#;
        let g = Glossary::from_toml_str(toml).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.apply("견적서 납품", Direction::KoreanToChinese), "报价单 交货");

        let json = r#"{"term": [{"source": "견적서", "target": "报价单"}]}"#;
        let g = Glossary::from_json_str(json).unwrap();
        assert_eq!(g.terms()[0].target, "报价单");

        assert!(matches!(
            Glossary::from_toml_str("term = 5"),
            Err(RewriteError::Parse(_))
        ));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("terms.json");
        std::fs::write(&json_path, r#"{"term": [{"source": "납품", "target": "交货"}]}"#).unwrap();
        assert_eq!(Glossary::load(&json_path).unwrap().len(), 1);

        let toml_path = dir.path().join("terms.toml");
        std::fs::write(&toml_path, "[[term]]\nsource = \"납품\"\ntarget = \"交货\"\n").unwrap();
        assert_eq!(Glossary::load(&toml_path).unwrap().len(), 1);

        assert!(matches!(
            Glossary::load(dir.path().join("missing.toml")),
            Err(RewriteError::Io(_))
        ));
    }
}
