use crate::spreadsheet::reference::index_to_reference;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeDelta;
use chrono::Timelike;
use std::fmt::Display;

/// How a raw cell value is stored and rendered as text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CellType {
    #[default]
    Empty,
    /// "1" or "0"
    Boolean,
    /// Decimal number text
    Number,
    /// Serial numbers from the 1900 epoch formatted as date and time
    NumberDateTime1900,
    /// Serial numbers from the 1900 epoch formatted as date
    NumberDate1900,
    /// Serial numbers formatted as time of day
    NumberTime1900,
    /// Serial numbers from the 1904 epoch formatted as date and time
    NumberDateTime1904,
    /// Serial numbers from the 1904 epoch formatted as date
    NumberDate1904,
    /// Serial numbers formatted as time of day, 1904 workbook
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Literal text
    InlineString,
    /// Error literal such as "#N/A"
    Error,
}

impl CellType {
    /// Maps built-in number format ids to date/time types.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Classifies a custom number format code by its date and time tokens,
    /// ignoring quoted literals, escapes, and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// Converts BIFF error codes to their literal text.
pub(crate) fn to_error_value(value: u8) -> &'static str {
    match value {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        0x2B => "#GETTING_DATA",
        _ => "#ERROR!",
    }
}

/// One used cell: position, storage type, and raw value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Row index (0-based)
    pub row: usize,
    /// Column index (0-based)
    pub col: usize,
    pub kind: CellType,
    pub value: String,
}

impl Cell {
    /// Creates a literal text cell.
    pub fn text(row: usize, col: usize, value: impl Into<String>) -> Cell {
        Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: value.into(),
        }
    }

    /// Returns the A1-style reference of this cell.
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Renders the value as text. Date and time serials that cannot be
    /// converted fall back to the raw value.
    pub fn to_text(&self) -> String {
        let rendered = match self.kind {
            CellType::Empty => Some(String::new()),
            CellType::Boolean => Some(if self.value == "1" { "true" } else { "false" }.to_owned()),
            CellType::Number => self.value.parse::<f64>().ok().map(|number| number.to_string()),
            CellType::NumberDateTime1900 => to_serial_datetime(&self.value, false).map(format_datetime),
            CellType::NumberDateTime1904 => to_serial_datetime(&self.value, true).map(format_datetime),
            CellType::NumberDate1900 => to_serial_datetime(&self.value, false).map(|it| it.format("%Y-%m-%d").to_string()),
            CellType::NumberDate1904 => to_serial_datetime(&self.value, true).map(|it| it.format("%Y-%m-%d").to_string()),
            CellType::NumberTime1900 | CellType::NumberTime1904 => to_serial_datetime(&self.value, false).map(format_time),
            CellType::IsoDateTime => Some(self.value.replace('T', " ")),
            CellType::InlineString | CellType::Error => None,
        };
        rendered.unwrap_or_else(|| self.value.to_owned())
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Converts a serial day number to a timestamp, rounded to milliseconds.
/// The 1900 system counts the nonexistent 1900-02-29, so serials before it shift by a day.
fn to_serial_datetime(value: &str, is_1904: bool) -> Option<NaiveDateTime> {
    let serial = value.parse::<f64>().ok().filter(|serial| serial.is_finite())?;
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let milliseconds = (serial * 86_400_000f64).round();
    if milliseconds.abs() > 1e16 {
        return None;
    }
    let offset = TimeDelta::try_milliseconds(milliseconds as i64)?;
    epoch.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    format!("{} {}", datetime.format("%Y-%m-%d"), format_time(datetime))
}

fn format_time(datetime: NaiveDateTime) -> String {
    if datetime.nanosecond() >= 1_000_000 {
        datetime.format("%H:%M:%S%.3f").to_string()
    } else {
        datetime.format("%H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell {
            row: 0,
            col: 0,
            kind,
            value: value.to_owned(),
        }
    }

    #[test]
    fn custom_number_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm:ss", true), CellType::NumberTime1904);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd hh:mm", false), CellType::NumberDateTime1900);
        assert_eq!(CellType::parse_custom_number_format("0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("\"days\" 0", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.0", false), CellType::Number);
    }

    #[test]
    fn builtin_number_formats() {
        assert_eq!(CellType::parse_builtin_number_format_id("14", false), Some(CellType::NumberDate1900));
        assert_eq!(CellType::parse_builtin_number_format_id("22", true), Some(CellType::NumberDateTime1904));
        assert_eq!(CellType::parse_builtin_number_format_id("2", false), None);
    }

    #[test]
    fn numbers_and_booleans() {
        assert_eq!(cell(CellType::Number, "30").to_text(), "30");
        assert_eq!(cell(CellType::Number, "30.0").to_text(), "30");
        assert_eq!(cell(CellType::Number, "2.5").to_text(), "2.5");
        assert_eq!(cell(CellType::Number, "1E-3").to_text(), "0.001");
        assert_eq!(cell(CellType::Boolean, "1").to_text(), "true");
        assert_eq!(cell(CellType::Boolean, "0").to_text(), "false");
        assert_eq!(cell(CellType::Error, "#N/A").to_text(), "#N/A");
        assert_eq!(cell(CellType::InlineString, " Lisbon ").to_text(), " Lisbon ");
    }

    #[test]
    fn dates_1900() {
        assert_eq!(cell(CellType::NumberDate1900, "1").to_text(), "1900-01-01");
        assert_eq!(cell(CellType::NumberDate1900, "61").to_text(), "1900-03-01");
        assert_eq!(cell(CellType::NumberDate1900, "45000").to_text(), "2023-03-15");
        assert_eq!(cell(CellType::NumberDateTime1900, "45000.5").to_text(), "2023-03-15 12:00:00");
        assert_eq!(cell(CellType::NumberTime1900, "0.75").to_text(), "18:00:00");
    }

    #[test]
    fn dates_1904() {
        assert_eq!(cell(CellType::NumberDate1904, "0").to_text(), "1904-01-01");
        assert_eq!(cell(CellType::NumberDateTime1904, "1.25").to_text(), "1904-01-02 06:00:00");
    }

    #[test]
    fn unparsable_serial_keeps_raw_value() {
        assert_eq!(cell(CellType::NumberDate1900, "n/a").to_text(), "n/a");
        assert_eq!(cell(CellType::IsoDateTime, "2024-05-01T08:30:00").to_text(), "2024-05-01 08:30:00");
    }

    #[test]
    fn references() {
        assert_eq!(Cell::text(2, 3, "x").reference(), "D3");
    }
}
