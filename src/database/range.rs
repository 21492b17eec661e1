use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// Excel-style cell range with optional boundaries (0-based, inclusive).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Range {
    pub row_lower_bound: Option<usize>,
    pub row_upper_bound: Option<usize>,
    pub col_lower_bound: Option<usize>,
    pub col_upper_bound: Option<usize>,
}

impl TryFrom<&str> for Range {
    type Error = RangeError;

    /// Parses "A1", "B2:C5", "A:C", or "1:10", ignoring case.
    /// A single reference such as "C3" selects everything from that cell onward.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let value = value.trim().to_ascii_uppercase();
        let captures = PATTERN
            .get_or_init(|| Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").ok())
            .as_ref()
            .and_then(|pattern| pattern.captures(value.as_str()))
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        let bound = |index: usize, parse: fn(&str) -> Option<usize>| -> Result<Option<usize>, RangeError> {
            match captures.get(index).map(|matcher| matcher.as_str()) {
                None | Some("") => Ok(None),
                Some(text) => parse(text)
                    .map(Some)
                    .ok_or_else(|| RangeError::FormatError(value.to_owned())),
            }
        };
        let range = Range {
            col_lower_bound: bound(1, col_to_index)?,
            row_lower_bound: bound(2, row_to_index)?,
            col_upper_bound: bound(4, col_to_index)?,
            row_upper_bound: bound(5, row_to_index)?,
        };
        if range == Range::default() {
            Err(RangeError::FormatError(value.to_owned()))?
        }
        Ok(range)
    }
}
