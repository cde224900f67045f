//! Shared formulas: a sheet stores the text once on its anchor cell and the
//! other cells only reference it by `si`, so their text is rebuilt by
//! shifting the anchor's relative references.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Anchor text of a shared formula and the cell it was written for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFormula {
    pub text: String,
    pub row: u32,
    pub col: u32,
}

impl SharedFormula {
    /// Formula text as it reads from cell (`row`, `col`).
    pub fn translate(&self, row: u32, col: u32) -> String {
        let d_row = i64::from(row) - i64::from(self.row);
        let d_col = i64::from(col) - i64::from(self.col);
        if d_row == 0 && d_col == 0 {
            return self.text.clone();
        }
        shift_references(&self.text, d_row, d_col)
    }
}

fn shift_references(formula: &str, d_row: i64, d_col: i64) -> String {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    static COL_RE: OnceLock<Regex> = OnceLock::new();
    static ROW_RE: OnceLock<Regex> = OnceLock::new();

    let token = TOKEN_RE.get_or_init(|| {
        Regex::new(r#""(?:[^"]|"")*"|'(?:[^']|'')*'|[A-Za-z0-9_$.\\]+"#).expect("valid regex")
    });
    let cell = CELL_RE.get_or_init(|| {
        Regex::new(r"^(\$?)([A-Za-z]{1,3})(\$?)([0-9]+)$").expect("valid regex")
    });
    let col_only = COL_RE.get_or_init(|| Regex::new(r"^(\$?)([A-Za-z]{1,3})$").expect("valid regex"));
    let row_only = ROW_RE.get_or_init(|| Regex::new(r"^(\$?)([0-9]+)$").expect("valid regex"));

    let bytes = formula.as_bytes();
    token
        .replace_all(formula, |caps: &Captures| {
            let m = &caps[0];
            let (start, end) = caps.get(0).map_or((0, 0), |g| (g.start(), g.end()));
            let before = start.checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(end).copied();

            if m.starts_with(['"', '\'']) || matches!(after, Some(b'(') | Some(b'!')) {
                return m.to_string();
            }
            if let Some(c) = cell.captures(m) {
                let col = shift_col(&c[1], &c[2], d_col);
                let row = shift_row(&c[3], &c[4], d_row);
                return match (col, row) {
                    (Some(col), Some(row)) => format!("{col}{row}"),
                    _ => "#REF!".to_string(),
                };
            }
            let in_range = before == Some(b':') || after == Some(b':');
            if in_range {
                if let Some(c) = col_only.captures(m) {
                    return shift_col(&c[1], &c[2], d_col).unwrap_or_else(|| "#REF!".into());
                }
                if let Some(c) = row_only.captures(m) {
                    return shift_row(&c[1], &c[2], d_row).unwrap_or_else(|| "#REF!".into());
                }
            }
            m.to_string()
        })
        .into_owned()
}

fn shift_col(anchor: &str, letters: &str, delta: i64) -> Option<String> {
    if !anchor.is_empty() {
        return Some(format!("{anchor}{letters}"));
    }
    let index = super::col_ref_to_index(letters)?;
    let shifted = u32::try_from(i64::from(index) + delta).ok()?;
    Some(col_to_letters(shifted))
}

fn shift_row(anchor: &str, digits: &str, delta: i64) -> Option<String> {
    if !anchor.is_empty() {
        return Some(format!("{anchor}{digits}"));
    }
    let row = digits.parse::<i64>().ok()? + delta;
    (row >= 1).then(|| row.to_string())
}

fn col_to_letters(mut col: u32) -> String {
    let mut result = Vec::new();
    loop {
        result.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result.reverse();
    String::from_utf8_lossy(&result).into_owned()
}
