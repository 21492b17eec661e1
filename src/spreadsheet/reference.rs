//! Conversions between A1-style references and 0-based indexes.

/// Converts column letters ("A", "AB") to a 0-based index.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |index, letter| {
        let digit = letter.to_ascii_uppercase();
        if digit.is_ascii_uppercase() {
            index.checked_mul(26)?.checked_add((digit as usize) - ('A' as usize) + 1)
        } else {
            None
        }
    }).map(|index| index - 1)
}

/// Converts a 1-based row number ("1", "42") to a 0-based index.
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok()?.checked_sub(1)
}

/// Converts a 0-based column index to letters.
pub(crate) fn index_to_col(col: usize) -> String {
    let mut col = col + 1;
    let mut letters = Vec::new();
    while col > 0 {
        col -= 1;
        letters.push(char::from(b'A' + (col % 26) as u8));
        col /= 26;
    }
    letters.iter().rev().collect()
}

/// Formats a cell reference such as "C7".
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Parses a cell reference such as "C7" into (row, col).
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}
