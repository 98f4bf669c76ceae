//! Translation direction

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::script::{contains_han, contains_hangul};

/// Source → target language pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Korean → Chinese
    #[default]
    #[serde(rename = "ko-zh")]
    KoreanToChinese,
    /// Chinese → Korean
    #[serde(rename = "zh-ko")]
    ChineseToKorean,
}

impl Direction {
    /// Wire form, `ko-zh` or `zh-ko`
    pub fn code(self) -> &'static str {
        match self {
            Direction::KoreanToChinese => "ko-zh",
            Direction::ChineseToKorean => "zh-ko",
        }
    }

    pub fn source_lang(self) -> &'static str {
        match self {
            Direction::KoreanToChinese => "ko",
            Direction::ChineseToKorean => "zh",
        }
    }

    pub fn target_lang(self) -> &'static str {
        match self {
            Direction::KoreanToChinese => "zh",
            Direction::ChineseToKorean => "ko",
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::KoreanToChinese => Direction::ChineseToKorean,
            Direction::ChineseToKorean => Direction::KoreanToChinese,
        }
    }

    /// Does `text` contain anything written in the source language's script?
    pub fn has_source_script(self, text: &str) -> bool {
        match self {
            Direction::KoreanToChinese => contains_hangul(text),
            Direction::ChineseToKorean => contains_han(text),
        }
    }

    /// Suffix for a translated copy of a sheet, written in the target language
    pub fn sheet_suffix(self) -> &'static str {
        match self {
            Direction::KoreanToChinese => "_中文",
            Direction::ChineseToKorean => "_한국어",
        }
    }

    /// Suffix for the output file name
    pub fn file_suffix(self) -> &'static str {
        match self {
            Direction::KoreanToChinese => "_중문번역",
            Direction::ChineseToKorean => "_한국어번역",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ko-zh" | "ko2zh" => Ok(Direction::KoreanToChinese),
            "zh-ko" | "zh2ko" => Ok(Direction::ChineseToKorean),
            other => Err(format!("unknown direction '{}', expected ko-zh or zh-ko", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("ko-zh".parse::<Direction>(), Ok(Direction::KoreanToChinese));
        assert_eq!(" ZH-KO ".parse::<Direction>(), Ok(Direction::ChineseToKorean));
        assert!("en-zh".parse::<Direction>().is_err());
        assert_eq!(Direction::ChineseToKorean.to_string(), "zh-ko");
    }

    #[test]
    fn test_source_script_gate() {
        assert!(Direction::KoreanToChinese.has_source_script("발주서"));
        assert!(!Direction::KoreanToChinese.has_source_script("订单书"));
        assert!(Direction::ChineseToKorean.has_source_script("订单书"));
        assert_eq!(Direction::KoreanToChinese.reverse(), Direction::ChineseToKorean);
    }

    #[test]
    fn test_serde_uses_wire_codes() {
        let json = serde_json::to_string(&Direction::ChineseToKorean).unwrap();
        assert_eq!(json, "\"zh-ko\"");
        let back: Direction = serde_json::from_str("\"ko-zh\"").unwrap();
        assert_eq!(back, Direction::KoreanToChinese);
    }
}
