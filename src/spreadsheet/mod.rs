//! Workbook engines behind one `Workbook` trait.
//!
//! - `.xls`: OLE compound file holding a BIFF8 record stream
//! - everything else: zipped SpreadsheetML (`.xlsx`, `.xlsm`)
pub mod cell;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xls;
pub(crate) mod xlsx;

use crate::error::FormatError;
use crate::error::ImportError;
use crate::error::ResultKind;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::xls::XlsWorkbook;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("'{0}' is not a zipped workbook")]
    UnexpectedFormatError(String),

    #[error("Part '{0}' not found")]
    FileError(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Shared string {0} not found")]
    SharedStringError(usize),
}

/// An open workbook.
///
/// The handle owns its file; dropping it releases the file.
pub trait Workbook {
    /// Path the workbook was opened from.
    fn path(&self) -> &str;

    /// Names of the worksheets, in workbook order.
    fn sheet_names(&mut self) -> Result<Vec<String>, FormatError>;

    /// Reads every non-empty cell of a sheet, named exactly as `sheet_names` reports it.
    fn read_cells(&mut self, sheet_name: &str) -> Result<Vec<Cell>, FormatError>;

    /// Whether `sheet_names` reports schema identifiers with a trailing `$` marker.
    /// The built-in readers report sheet names as stored, without one.
    fn marks_sheet_names(&self) -> bool {
        false
    }
}

/// Reader profile chosen from the file extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Excel 97-2003 binary workbook
    Legacy,
    /// Zipped XML workbook
    Modern,
}

impl Profile {
    pub fn detect(path: &str) -> Profile {
        let is_legacy = Path::new(path)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.eq_ignore_ascii_case("xls"))
            .unwrap_or(false);
        if is_legacy {
            Profile::Legacy
        } else {
            Profile::Modern
        }
    }
}

/// Opens a workbook with the engine matching its extension.
///
/// Missing files, unreadable containers, and encrypted workbooks fail with
/// [`ImportError::SourceUnavailable`]. The sheet directory is read later,
/// by [`Workbook::sheet_names`].
pub fn open_workbook(path: &str) -> Result<Box<dyn Workbook>, ImportError> {
    let profile = Profile::detect(path);
    tracing::debug!(path, ?profile, "open workbook");
    let workbook: Box<dyn Workbook> = match profile {
        Profile::Legacy => Box::new(XlsWorkbook::open(path).or_unavailable(path)?),
        Profile::Modern => Box::new(XlsxWorkbook::open(path).or_unavailable(path)?),
    };
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_by_extension() {
        assert_eq!(Profile::detect("report.xls"), Profile::Legacy);
        assert_eq!(Profile::detect("REPORT.XLS"), Profile::Legacy);
        assert_eq!(Profile::detect("report.xlsx"), Profile::Modern);
        assert_eq!(Profile::detect("report.xlsm"), Profile::Modern);
        assert_eq!(Profile::detect("report"), Profile::Modern);
        assert_eq!(Profile::detect("archive.xls.bak"), Profile::Modern);
    }

    #[test]
    fn missing_file_is_unavailable() {
        for path in ["does-not-exist.xlsx", "does-not-exist.xls"] {
            let error = open_workbook(path).err().unwrap();
            assert!(matches!(error, ImportError::SourceUnavailable { path: ref failed, .. } if failed == path));
        }
    }
}
