//! A1 notation helpers.

/// Column letters for a zero-based column index: 0 → `A`, 25 → `Z`,
/// 26 → `AA`.
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Tab name portion of a range such as `Sheet1!A:Z` or `'Q3 Plan'!A1:F`.
///
/// A range without `!` is taken to be a bare tab name.
pub fn tab_of(range: &str) -> &str {
    match range.rsplit_once('!') {
        Some((tab, _)) => tab,
        None => range,
    }
}

/// Top-left cell of a range as a zero-based column and 1-based row.
///
/// `Sheet1!B3:Z` starts at `(1, 3)`. Whole-column ranges (`A:Z`) start on
/// row 1, whole-row ranges (`3:40`) on column `A`, and a bare tab name at
/// `A1`. `$` anchors are ignored. Returns `None` when the start cell is not
/// valid A1 notation.
pub fn range_origin(range: &str) -> Option<(usize, usize)> {
    let cells = match range.rsplit_once('!') {
        Some((_, cells)) => cells,
        None => return Some((0, 1)),
    };
    let start = cells.split(':').next().unwrap_or_default().replace('$', "");
    let split = start
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(start.len());
    let (letters, digits) = start.split_at(split);
    if letters.is_empty() && digits.is_empty() {
        return None;
    }

    let column = if letters.is_empty() {
        0
    } else {
        let number = letters.bytes().try_fold(0usize, |acc, b| {
            acc.checked_mul(26)?
                .checked_add(usize::from(b.to_ascii_uppercase() - b'A') + 1)
        })?;
        number - 1
    };
    let row = if digits.is_empty() {
        1
    } else {
        digits.parse::<usize>().ok().filter(|r| *r > 0)?
    };
    Some((column, row))
}

/// Single-cell range in `tab` for a 1-based `row` and zero-based `column`.
///
/// Tab names containing anything other than ASCII alphanumerics and `_` are
/// single-quoted, with embedded quotes doubled. Already-quoted names are kept
/// as they are.
pub fn cell_range(tab: &str, row: usize, column: usize) -> String {
    let tab = if tab.starts_with('\'') || tab.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        tab.to_string()
    } else {
        format!("'{}'", tab.replace('\'', "''"))
    };
    format!("{tab}!{}{row}", column_letters(column))
}
