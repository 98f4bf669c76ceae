//! Script detection for the two supported languages

use lazy_regex::regex_is_match;

/// Any precomposed Hangul syllable (U+AC00..=U+D7A3)
pub fn contains_hangul(text: &str) -> bool {
    text.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))
}

/// Any CJK unified ideograph (U+4E00..=U+9FFF)
pub fn contains_han(text: &str) -> bool {
    text.chars().any(|c| ('\u{4E00}'..='\u{9FFF}').contains(&c))
}

/// Text made only of ASCII letters, digits, whitespace and light punctuation.
///
/// Codes, part numbers, e-mail addresses and URLs fall in here and are left
/// alone by default.
pub fn looks_english(text: &str) -> bool {
    regex_is_match!(r"^[a-zA-Z0-9\s.,\-()\[\]{}@:/]+$", text.trim())
}
