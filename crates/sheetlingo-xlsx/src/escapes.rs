//! Text escaping for SpreadsheetML
//!
//! Besides XML entities, Excel encodes characters XML cannot carry as
//! `_xHHHH_`. A literal underscore that would otherwise read as the start of
//! such a sequence is itself written as `_x005f_`.

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('_') {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match parse_escape(tail) {
            Some(decoded) => {
                result.push(decoded);
                rest = &tail[7..];
            }
            None => {
                result.push('_');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);

    result
}

/// `_xHHHH_` at the start of `s`
fn parse_escape(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || bytes[1] != b'x' || bytes[6] != b'_' {
        return None;
    }
    let hex = s.get(2..6)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Inverse of [`decode_excel_escapes`]
pub(crate) fn encode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '_' if parse_escape(&s[i..]).is_some() => result.push_str("_x005f_"),
            '\t' | '\n' => result.push(c),
            c if (c as u32) < 0x20 => result.push_str(&format!("_x{:04x}_", c as u32)),
            c => result.push(c),
        }
    }
    result
}

/// Escape XML special characters for text and attribute content
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Cell text as it goes between `<t>` tags
pub(crate) fn escape_cell_text(s: &str) -> String {
    escape_xml(&encode_excel_escapes(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_excel_escapes_carriage_return() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
    }

    #[test]
    fn test_decode_excel_escapes_multiple() {
        assert_eq!(
            decode_excel_escapes("line1_x000d__x000a_line2"),
            "line1\r\nline2"
        );
    }

    #[test]
    fn test_decode_excel_escapes_underscore() {
        // _x005f_ is an escaped underscore
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
    }

    #[test]
    fn test_decode_excel_escapes_partial_sequence() {
        // Incomplete sequences should be left as-is
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("a_b_c"), "a_b_c");
    }

    #[test]
    fn test_decode_excel_escapes_uppercase() {
        assert_eq!(decode_excel_escapes("_x000D_"), "\r");
    }

    #[test]
    fn test_decode_multibyte_text() {
        assert_eq!(decode_excel_escapes("발주_x000a_서"), "발주\n서");
        assert_eq!(decode_excel_escapes("品目_"), "品目_");
    }

    #[test]
    fn test_encode_escapes_control_chars_and_lookalikes() {
        assert_eq!(encode_excel_escapes("a\rb"), "a_x000d_b");
        assert_eq!(encode_excel_escapes("a\nb\tc"), "a\nb\tc");
        assert_eq!(encode_excel_escapes("_x0041_"), "_x005f_x0041_");
        assert_eq!(encode_excel_escapes("snake_case"), "snake_case");
    }

    #[test]
    fn test_escape_round_trip_of_tricky_text() {
        for text in ["_x005f_", "x\r\ny", "plain", "_x00ZZ_"] {
            assert_eq!(decode_excel_escapes(&encode_excel_escapes(text)), text);
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
    }
}
