//! Names for translated sheets and output files

use std::path::{Path, PathBuf};

use sheetlingo_core::MAX_SHEET_NAME_LEN;
use sheetlingo_rewrite::Direction;

/// Name for the translated copy of `name`.
///
/// The base is cut so the suffix always fits the sheet-name limit.
pub fn derive_sheet_name(name: &str, direction: Direction) -> String {
    let suffix = direction.sheet_suffix();
    let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
    let mut derived: String = name.chars().take(room).collect();
    derived.push_str(suffix);
    derived
}

/// Point the sheet references in `formula` that name `from` at `to` instead.
///
/// Both quoted (`'발주서 1'!A1`) and bare (`Sheet1!A1`) references are
/// recognized; string literals are left alone. Sheet names compare
/// case-insensitively.
pub fn retarget_sheet_refs(formula: &str, from: &str, to: &str) -> String {
    let from = from.to_lowercase();
    let target = quote_sheet_name(to);
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut i = 0;

    while i < chars.len() {
        let start = i;
        match chars[i] {
            '"' => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == '"' {
                        if chars.get(i + 1) == Some(&'"') {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                out.extend(&chars[start..i]);
            }
            '\'' => {
                let mut name = String::new();
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            name.push('\'');
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    name.push(chars[i]);
                    i += 1;
                }
                if chars.get(i) == Some(&'!') && name.to_lowercase() == from {
                    out.push_str(&target);
                } else {
                    out.extend(&chars[start..i]);
                }
            }
            c if is_bare_name_char(c) => {
                while i < chars.len() && is_bare_name_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if chars.get(i) == Some(&'!') && word.to_lowercase() == from {
                    out.push_str(&target);
                } else {
                    out.push_str(&word);
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn is_bare_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Sheet name as it must appear before `!`
fn quote_sheet_name(name: &str) -> String {
    let bare = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if bare {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// `<dir>/<stem><suffix>.xlsx` next to the input
///
/// The output is always written as xlsx, whatever the input container.
pub fn output_path(input: &Path, direction: Direction) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    let file_name = format!("{}{}.xlsx", stem, direction.file_suffix());
    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}
