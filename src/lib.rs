//! # Sheet Import
//!
//! Reads tabular data from spreadsheet workbooks and delimited text files into
//! a [`Table`]: ordered, uniquely named columns and rows of text values.
//!
//! ## Sources
//!
//! - **Legacy workbooks** (`.xls`): Excel 97-2003 compound files with BIFF8 records
//! - **Zipped XML workbooks** (`.xlsx`, `.xlsm`, any other extension)
//! - **Delimited text**: one record per line, fields split literally on a
//!   delimiter character (`;` by default), first line as header
//!
//! ## Operations
//!
//! - [`list_sheets`] / [`list_sheets_in`]: sheet names, deduplicated, schema `$` marker removed
//! - [`read_sheet`] / [`read_sheet_in`]: one sheet as a table, `None` when the sheet is missing
//! - [`read_delimited`], [`read_delimited_with_options`], [`read_delimited_from`]
//!
//! Every cell is rendered as text: numbers in shortest form, booleans as
//! `true`/`false`, date-formatted numbers as ISO dates and times.
//!
//! ```no_run
//! use sheet_import::{read_delimited, read_sheet_in, SheetOptions};
//!
//! let people = read_delimited("people.txt", ';')?;
//! let sales = read_sheet_in("report.xlsx", "Sales", &SheetOptions::default())?;
//! # Ok::<(), sheet_import::ImportError>(())
//! ```
mod database;
mod error;
mod helpers;
mod import;
mod spreadsheet;

pub use crate::database::range::Range;
pub use crate::database::range::RangeError;
pub use crate::database::table::Table;
pub use crate::error::FormatError;
pub use crate::error::ImportError;
pub use crate::import::catalog::list_sheets;
pub use crate::import::catalog::list_sheets_in;
pub use crate::import::delimited::read_delimited;
pub use crate::import::delimited::read_delimited_from;
pub use crate::import::delimited::read_delimited_with_options;
pub use crate::import::delimited::DelimitedOptions;
pub use crate::import::materializer::read_sheet;
pub use crate::import::materializer::read_sheet_in;
pub use crate::import::materializer::SheetOptions;
pub use crate::spreadsheet::cell::Cell;
pub use crate::spreadsheet::cell::CellType;
pub use crate::spreadsheet::open_workbook;
pub use crate::spreadsheet::Profile;
pub use crate::spreadsheet::SpreadsheetError;
pub use crate::spreadsheet::Workbook;
