//! Shared-formula translation.
//!
//! A shared formula is stored once, on its anchor cell. Every other cell of
//! the group only names the group, and its formula text is the anchor's text
//! with relative references moved by the distance between the two cells.

use crate::reference::{CellRef, MAX_COLS, MAX_ROWS};

const REF_ERROR: &str = "#REF!";

/// Re-anchor `formula` (written for `origin`) to `target`.
///
/// Relative row/column parts move; `$`-anchored parts stay. String literals,
/// function names and sheet names are copied unchanged. A reference pushed
/// off the sheet becomes `#REF!`.
///
/// ```
/// use sheetrange::xlsx::translate_formula;
/// use sheetrange::CellRef;
///
/// let moved = translate_formula("A1*$B$1+C$2", CellRef::new(0, 3), CellRef::new(2, 4));
/// assert_eq!(moved, "B3*$B$1+D$2");
/// ```
pub fn translate_formula(formula: &str, origin: CellRef, target: CellRef) -> String {
    let rows = i64::from(target.row) - i64::from(origin.row);
    let cols = i64::from(target.col) - i64::from(origin.col);
    if rows == 0 && cols == 0 {
        return formula.to_string();
    }

    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                let end = quoted_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '[' => {
                // Structured or external-book references: copy verbatim.
                let end = chars[i..]
                    .iter()
                    .position(|&b| b == ']')
                    .map_or(chars.len(), |p| i + p + 1);
                out.extend(&chars[i..end]);
                i = end;
            }
            c if is_word_char(c) => {
                let end = word_end(&chars, i);
                let word: String = chars[i..end].iter().collect();
                i = end;

                match chars.get(i) {
                    Some('(') | Some('!') => {
                        out.push_str(&word);
                        continue;
                    }
                    Some(':') => {
                        let second_end = word_end(&chars, i + 1);
                        let second: String = chars[i + 1..second_end].iter().collect();
                        if let Some(moved) = shift_line_range(&word, &second, rows, cols) {
                            out.push_str(&moved);
                            i = second_end;
                            continue;
                        }
                    }
                    _ => {}
                }

                match shift_cell(&word, rows, cols) {
                    Some(Some(moved)) => out.push_str(&moved),
                    Some(None) => out.push_str(REF_ERROR),
                    None => out.push_str(&word),
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

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | '\\')
}

fn word_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|&c| !is_word_char(c))
        .map_or(chars.len(), |p| start + p)
}

/// Index just past the closing quote of a literal starting at `start`.
/// A doubled quote inside the literal is an escaped quote.
fn quoted_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// A cell reference split into its anchored and relative parts.
struct Reference<'a> {
    col_abs: bool,
    col_letters: &'a str,
    row_abs: bool,
    row: u32,
}

fn split_reference(word: &str) -> Option<Reference<'_>> {
    let (col_abs, body) = match word.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    let letters_end = body
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(body.len());
    let (col_letters, rest) = body.split_at(letters_end);
    let (row_abs, digits) = match rest.strip_prefix('$') {
        Some(digits) => (true, digits),
        None => (false, rest),
    };
    if col_letters.is_empty()
        || col_letters.len() > 3
        || digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }
    CellRef::letters_to_column(col_letters)?;
    Some(Reference {
        col_abs,
        col_letters,
        row_abs,
        row,
    })
}

/// `None` when `word` is not a cell reference, `Some(None)` when the moved
/// reference falls off the sheet.
fn shift_cell(word: &str, rows: i64, cols: i64) -> Option<Option<String>> {
    let reference = split_reference(word)?;
    let col = CellRef::letters_to_column(reference.col_letters)?;

    let new_col = if reference.col_abs {
        Some(i64::from(col))
    } else {
        in_bounds(i64::from(col) + cols, MAX_COLS)
    };
    let new_row = if reference.row_abs {
        Some(i64::from(reference.row) - 1)
    } else {
        in_bounds(i64::from(reference.row) - 1 + rows, MAX_ROWS)
    };

    let (Some(new_col), Some(new_row)) = (new_col, new_row) else {
        return Some(None);
    };

    Some(Some(format!(
        "{}{}{}{}",
        if reference.col_abs { "$" } else { "" },
        CellRef::column_to_letters(new_col as u32),
        if reference.row_abs { "$" } else { "" },
        new_row + 1
    )))
}

/// Whole-column (`A:C`) and whole-row (`1:5`) ranges.
fn shift_line_range(first: &str, second: &str, rows: i64, cols: i64) -> Option<String> {
    let a = split_line(first)?;
    let b = split_line(second)?;
    match (a, b) {
        (Line::Column(a_abs, a), Line::Column(b_abs, b)) => {
            let a = move_line(a_abs, a, cols, MAX_COLS);
            let b = move_line(b_abs, b, cols, MAX_COLS);
            Some(match (a, b) {
                (Some(a), Some(b)) => format!(
                    "{}{}:{}{}",
                    dollar(a_abs),
                    CellRef::column_to_letters(a),
                    dollar(b_abs),
                    CellRef::column_to_letters(b)
                ),
                _ => REF_ERROR.to_string(),
            })
        }
        (Line::Row(a_abs, a), Line::Row(b_abs, b)) => {
            let a = move_line(a_abs, a, rows, MAX_ROWS);
            let b = move_line(b_abs, b, rows, MAX_ROWS);
            Some(match (a, b) {
                (Some(a), Some(b)) => {
                    format!("{}{}:{}{}", dollar(a_abs), a + 1, dollar(b_abs), b + 1)
                }
                _ => REF_ERROR.to_string(),
            })
        }
        _ => None,
    }
}

enum Line {
    Column(bool, u32),
    Row(bool, u32),
}

fn split_line(word: &str) -> Option<Line> {
    let (abs, body) = match word.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    if body.is_empty() {
        return None;
    }
    if body.bytes().all(|b| b.is_ascii_alphabetic()) {
        return CellRef::letters_to_column(body).map(|col| Line::Column(abs, col));
    }
    if body.bytes().all(|b| b.is_ascii_digit()) {
        let row: u32 = body.parse().ok()?;
        return (1..=MAX_ROWS)
            .contains(&row)
            .then(|| Line::Row(abs, row - 1));
    }
    None
}

fn move_line(abs: bool, index: u32, delta: i64, limit: u32) -> Option<u32> {
    if abs {
        return Some(index);
    }
    in_bounds(i64::from(index) + delta, limit).map(|v| v as u32)
}

fn in_bounds(value: i64, limit: u32) -> Option<i64> {
    (0..i64::from(limit)).contains(&value).then_some(value)
}

fn dollar(abs: bool) -> &'static str {
    if abs {
        "$"
    } else {
        ""
    }
}
