use crate::error::FormatError;
use crate::error::ResultOptionChain;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::match_biff8_record;
use crate::spreadsheet::cell::to_error_value;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel::load_number_formats;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use either::Either;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use thiserror::Error;

// BIFF8 record types
const FORMULA: u16 = 6;
const EOF: u16 = 10;
const DATE1904: u16 = 34;
const FILE_PASS: u16 = 47;
const CODE_PAGE: u16 = 66;
const BOUND_SHEET8: u16 = 133;
const MUL_RK: u16 = 189;
const XF: u16 = 224;
const SST: u16 = 252;
const LABEL_SST: u16 = 253;
const NUMBER: u16 = 515;
const LABEL: u16 = 516;
const BOOL_ERR: u16 = 517;
const STRING: u16 = 519;
const ARRAY: u16 = 545;
const TABLE: u16 = 566;
const RK: u16 = 638;
const FORMAT: u16 = 1054;
const SHARED_FORMULA: u16 = 1212;
const BOF: u16 = 2057;

#[derive(Error, Debug)]
pub enum XlsError {
    #[error("Invalid code page '{0}'")]
    CodePageError(u16),

    #[error("Invalid formula value '{0:#018x}'")]
    FormulaValueError(u64),

    #[error("Workbook stream not found in '{0}'")]
    WorkbookStreamError(String),
}

/// Workbook-level records, parsed once on first use.
struct Globals {
    shared_strings: Vec<String>,
    number_formats: Vec<CellType>,
    /// (sheet name, BOF position) of worksheets only
    sheets: Vec<(String, usize)>,
}

/// Excel 97-2003 binary workbook (`.xls`).
pub(crate) struct XlsWorkbook {
    name: String,
    reader: Biff8Reader,
    globals: Option<Globals>,
}

impl XlsWorkbook {
    /// Opens the compound document and extracts its workbook stream.
    pub(crate) fn open(file_name: &str) -> Result<XlsWorkbook, FormatError> {
        let mut buf_reader = BufReader::new(File::open(file_name)?);
        let cfb = Cfb::new(&mut buf_reader)?;
        let stream = cfb.read("Workbook")
            .ok_none_else(|| cfb.read("Book"))?
            .ok_or_else(|| XlsError::WorkbookStreamError(file_name.to_owned()))?;
        XlsWorkbook::from_stream(file_name, stream)
    }

    /// Wraps a raw BIFF8 workbook stream. Encrypted workbooks are rejected here.
    pub(crate) fn from_stream(file_name: &str, stream: Vec<u8>) -> Result<XlsWorkbook, FormatError> {
        let mut reader = Biff8Reader::new(stream);
        match_biff8_record!(reader => {
            EOF => break,
            FILE_PASS => Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?,
        });
        reader.goto(0);
        Ok(XlsWorkbook {
            name: file_name.to_owned(),
            reader,
            globals: None,
        })
    }

    fn globals(&mut self) -> Result<&Globals, FormatError> {
        if self.globals.is_none() {
            self.globals = Some(load_globals(&mut self.reader)?);
        }
        self.globals
            .as_ref()
            .ok_or_else(|| SpreadsheetError::FileError(self.name.to_owned()).into())
    }
}

impl Workbook for XlsWorkbook {
    fn path(&self) -> &str {
        &self.name
    }

    fn sheet_names(&mut self) -> Result<Vec<String>, FormatError> {
        Ok(self.globals()?.sheets.iter().map(|(name, _)| name.to_owned()).collect())
    }

    fn read_cells(&mut self, sheet_name: &str) -> Result<Vec<Cell>, FormatError> {
        self.globals()?;
        let Some(globals) = self.globals.as_ref() else {
            return Ok(Vec::new());
        };
        let pointer = globals.sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, pointer)| *pointer)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet_name.to_owned()))?;

        let reader = &mut self.reader;
        reader.goto(pointer);
        if reader.next()? != Some(BOF) {
            Err(SpreadsheetError::FileError(format!("{}#{}", self.name, sheet_name)))?
        }
        let mut cells = Vec::<Cell>::new();
        while let Some(tag) = reader.next()? {
            match tag {
                BOF | EOF => break,
                MUL_RK => {
                    let row = reader.read_u16()? as usize;
                    let col_lower_bound = reader.read_u16()? as usize;
                    let col_upper_bound = reader.get_u16_back(2)? as usize;
                    for col in col_lower_bound..=col_upper_bound {
                        let index = reader.read_u16()? as usize;
                        let kind = format_of(&globals.number_formats, index);
                        let value = reader.read_rk_number()?;
                        cells.push(Cell { row, col, kind, value });
                    }
                }
                BOOL_ERR | NUMBER | RK | LABEL_SST | LABEL | FORMULA => {
                    let row = reader.read_u16()? as usize;
                    let col = reader.read_u16()? as usize;
                    let (either, value) = match tag {
                        BOOL_ERR => read_bool_or_error_cell(reader)?,
                        NUMBER => read_number_cell(reader)?,
                        RK => read_rk_cell(reader)?,
                        LABEL_SST => read_label_sst_cell(reader, &globals.shared_strings)?,
                        LABEL => read_label_cell(reader)?,
                        _ => read_formula_cell(reader)?,
                    };
                    let kind = match either {
                        Either::Left(kind) => kind,
                        Either::Right(index) => format_of(&globals.number_formats, index),
                    };
                    if !value.is_empty() {
                        cells.push(Cell { row, col, kind, value });
                    }
                }
                _ => (),
            }
        }
        Ok(cells)
    }
}

fn format_of(number_formats: &[CellType], index: usize) -> CellType {
    number_formats.get(index).copied().unwrap_or(CellType::Number)
}

/// Parses the globals substream up to its EOF record.
fn load_globals(reader: &mut Biff8Reader) -> Result<Globals, FormatError> {
    reader.goto(0);
    let mut is_1904 = false;
    let mut shared_strings = Vec::new();
    let mut custom_formats: HashMap<String, CellType> = HashMap::new();
    let mut format_indexes: Vec<String> = Vec::new();
    let mut sheets: Vec<(String, usize)> = Vec::new();
    match_biff8_record!(reader => {
        EOF => break,
        DATE1904 if reader.read_u16()? == 1 => is_1904 = true,
        CODE_PAGE => {
            let code_page = reader.read_u16()?;
            reader.encoding = codepage::to_encoding(code_page).ok_or(XlsError::CodePageError(code_page))?;
        }
        FORMAT => {
            let id = reader.read_u16()?;
            let format = reader.read_xl_unicode_string()?;
            custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
        }
        XF => {
            reader.skip(2)?;
            let id = reader.read_u16()?;
            format_indexes.push(id.to_string());
        }
        SST => shared_strings = load_shared_strings(reader)?,
        BOUND_SHEET8 => {
            let pointer = reader.read_usize()?;
            reader.skip(1)?;
            // 0 is a worksheet; chart, macro, and VB module sheets carry no table
            let sheet_type = reader.read_u8()?;
            let sheet_name = reader.read_short_xl_unicode_string()?;
            if sheet_type == 0 {
                sheets.push((sheet_name, pointer));
            }
        }
    });
    let number_formats = load_number_formats(format_indexes, custom_formats, is_1904);
    Ok(Globals {
        shared_strings,
        number_formats,
        sheets,
    })
}

fn load_shared_strings(reader: &mut Biff8Reader) -> Result<Vec<String>, FormatError> {
    reader.skip(4)?;
    let count = reader.read_usize()?;
    let mut shared_strings: Vec<String> = Vec::with_capacity(count.min(u16::MAX as usize));
    for _ in 0..count {
        shared_strings.push(reader.read_xl_unicode_rich_extended_string()?);
    }
    Ok(shared_strings)
}

fn read_bool_or_error_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), FormatError> {
    reader.skip(2)?;
    let value = reader.read_u8()?;
    let flag = reader.read_u8()?;
    if flag == 0 {
        Ok((Either::Left(CellType::Boolean), value.to_string()))
    } else {
        Ok((Either::Left(CellType::Error), to_error_value(value).to_owned()))
    }
}

fn read_number_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), FormatError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_f64()?;
    Ok((Either::Right(index), value.to_string()))
}

fn read_rk_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), FormatError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_rk_number()?;
    Ok((Either::Right(index), value))
}

/// Resolves the shared string index immediately.
fn read_label_sst_cell(reader: &mut Biff8Reader, shared_strings: &[String]) -> Result<(Either<CellType, usize>, String), FormatError> {
    reader.skip(2)?;
    let index = reader.read_usize()?;
    let value = shared_strings
        .get(index)
        .cloned()
        .ok_or(SpreadsheetError::SharedStringError(index))?;
    Ok((Either::Left(CellType::InlineString), value))
}

fn read_label_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), FormatError> {
    reader.skip(2)?;
    let value = reader.read_xl_unicode_string()?;
    Ok((Either::Left(CellType::InlineString), value))
}

/// Reads the cached result of a formula.
/// String results live in the STRING record that follows, possibly after
/// shared formula, array, or table records.
fn read_formula_cell(reader: &mut Biff8Reader) -> Result<(Either<CellType, usize>, String), FormatError> {
    let index = reader.read_u16()? as usize;
    let formula = reader.read_u64()?;
    let is_number = (formula & 0xFFFF_0000_0000_0000) != 0xFFFF_0000_0000_0000;
    let flag = formula & 0xFF;
    if is_number {
        return Ok((Either::Right(index), f64::from_bits(formula).to_string()));
    }
    match flag {
        0 => {
            while let Some(kind) = reader.next()? {
                match kind {
                    STRING => {
                        let value = reader.read_xl_unicode_string()?;
                        return Ok((Either::Left(CellType::InlineString), value));
                    }
                    SHARED_FORMULA | ARRAY | TABLE => (),
                    _ => break,
                }
            }
            Err(XlsError::FormulaValueError(formula))?
        }
        1 => {
            let value = if (formula & 0xFF_0000) > 0 { "1" } else { "0" };
            Ok((Either::Left(CellType::Boolean), value.to_owned()))
        }
        2 => {
            let code = ((formula >> 16) & 0xFF) as u8;
            Ok((Either::Left(CellType::Error), to_error_value(code).to_owned()))
        }
        3 => Ok((Either::Left(CellType::InlineString), String::new())),
        _ => Err(XlsError::FormulaValueError(formula))?,
    }
}
