use crate::database::range::Range;
use crate::database::table::Table;
use crate::error::ImportError;
use crate::error::ResultKind;
use crate::import::catalog::strip_sheet_marker;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::open_workbook;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Workbook;
use std::collections::HashSet;

/// Options for reading one sheet.
#[derive(Debug, Clone)]
pub struct SheetOptions {
    /// Part of the sheet to read (default: the used range)
    pub range: Option<Range>,
    /// Maximum number of data rows (default: all)
    pub limit: Option<usize>,
    /// Leave out rows without any cell (default: true)
    pub skip_empty_rows: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        SheetOptions {
            range: None,
            limit: None,
            skip_empty_rows: true,
        }
    }
}

impl SheetOptions {
    /// Set the range
    #[must_use]
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    /// Set the data row limit
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set whether empty rows are left out
    #[must_use]
    pub fn with_skip_empty_rows(mut self, skip_empty_rows: bool) -> Self {
        self.skip_empty_rows = skip_empty_rows;
        self
    }
}

/// Reads one sheet of an open workbook into a table.
///
/// The sheet name matches exactly, then ignoring case, then ignoring a
/// trailing `$` on either side. Returns `Ok(None)` when no sheet matches and an
/// empty table when the sheet has no cells. The first used row names the
/// columns; cells right of its last used cell are left out.
pub fn read_sheet(workbook: &mut dyn Workbook, sheet_name: &str, options: &SheetOptions) -> Result<Option<Table>, ImportError> {
    let names = workbook.sheet_names().or_read_failure(sheet_name)?;
    let Some(name) = find_sheet(&names, sheet_name) else {
        tracing::debug!(path = workbook.path(), sheet = sheet_name, "sheet not found");
        return Ok(None);
    };
    let cells = workbook.read_cells(name).or_read_failure(name)?;
    let table = materialize(name, cells, options)?;
    tracing::debug!(
        path = workbook.path(),
        sheet = name,
        columns = table.width(),
        rows = table.len(),
        "read sheet"
    );
    Ok(Some(table))
}

/// Opens the workbook at `path`, reads one sheet, and closes it.
pub fn read_sheet_in(path: &str, sheet_name: &str, options: &SheetOptions) -> Result<Option<Table>, ImportError> {
    let mut workbook = open_workbook(path)?;
    read_sheet(workbook.as_mut(), sheet_name, options)
}

fn find_sheet<'a>(names: &'a [String], sheet_name: &str) -> Option<&'a str> {
    let lowercase = sheet_name.to_lowercase();
    let unmarked = strip_sheet_marker(sheet_name).to_lowercase();
    names.iter()
        .find(|name| *name == sheet_name)
        .or_else(|| names.iter().find(|name| name.to_lowercase() == lowercase))
        .or_else(|| names.iter().find(|name| strip_sheet_marker(name).to_lowercase() == unmarked))
        .map(String::as_str)
}

/// Lays the cells out on the grid and splits off the header row.
fn materialize(sheet_name: &str, cells: Vec<Cell>, options: &SheetOptions) -> Result<Table, ImportError> {
    let mut sheet = Sheet::new(sheet_name, options.range);
    for cell in cells {
        sheet.push(cell);
    }
    if sheet.is_empty() {
        return Ok(Table::default());
    }
    sheet.finish();

    let mut records = sheet.records(options.skip_empty_rows).into_iter();
    let Some(header) = records.next() else {
        return Ok(Table::default());
    };
    // The header row's last used cell bounds the table
    let width = header.iter().rposition(Option::is_some).map_or(0, |index| index + 1);
    let columns = header_names(&sheet.name, &header[..width]);

    let mut table = Table::with_columns(columns)?;
    let limit = options.limit.unwrap_or(usize::MAX);
    let mut dropped = 0;
    let rows = records
        .filter_map(|mut record| {
            dropped += record.split_off(width).into_iter().flatten().count();
            let is_empty = record.iter().all(Option::is_none);
            (!(is_empty && options.skip_empty_rows)).then_some(record)
        })
        .take(limit);
    for record in rows {
        table.push_row(record.iter().map(|cell| cell.map(Cell::to_text).unwrap_or_default()).collect());
    }
    if dropped > 0 {
        tracing::warn!(sheet = %sheet.name, cells = dropped, "cells right of the header left out");
    }
    Ok(table)
}

/// Header texts taken verbatim. Empty header cells get the first free `column{k}`,
/// counting from their 1-based position.
fn header_names(sheet_name: &str, header: &[Option<&Cell>]) -> Vec<String> {
    let names = header
        .iter()
        .map(|cell| cell.map(Cell::to_text).filter(|name| !name.is_empty()))
        .collect::<Vec<Option<String>>>();
    let mut taken = names.iter().flatten().cloned().collect::<HashSet<String>>();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| match name {
            Some(name) => name,
            None => {
                let name = (index + 1..)
                    .map(|k| format!("column{k}"))
                    .find(|name| !taken.contains(name))
                    .unwrap_or_default();
                tracing::warn!(sheet = sheet_name, column = %name, "blank header cell");
                taken.insert(name.clone());
                name
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;

    fn cells(rows: &[&[&str]]) -> Vec<Cell> {
        rows.iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values.iter()
                    .enumerate()
                    .filter(|(_, value)| !value.is_empty())
                    .map(move |(col, value)| Cell::text(row, col, *value))
            })
            .collect()
    }

    #[test]
    fn header_and_rows() {
        let table = materialize("Data", cells(&[&["Name", "Age"], &["Ana", "30"], &["Bruno", "25"]]), &SheetOptions::default()).unwrap();
        assert_eq!(table.columns(), ["Name", "Age"]);
        assert_eq!(table.rows(), [vec!["Ana", "30"], vec!["Bruno", "25"]]);
    }

    #[test]
    fn short_rows_are_gap_filled() {
        let table = materialize("Data", cells(&[&["A", "B", "C"], &["1"], &["", "", "3"]]), &SheetOptions::default()).unwrap();
        assert_eq!(table.rows(), [vec!["1", "", ""], vec!["", "", "3"]]);
    }

    #[test]
    fn blank_header_cells_get_names() {
        let mut input = cells(&[&["", "B", "", "D"], &["w", "x", "y", "z"]]);
        input.push(Cell::text(0, 4, " "));
        let table = materialize("Data", input, &SheetOptions::default()).unwrap();
        assert_eq!(table.columns(), ["column1", "B", "column3", "D", " "]);
    }

    #[test]
    fn generated_names_skip_taken_ones() {
        let input = cells(&[&["", "column1", "", "column3"], &["a", "b", "c", "d"]]);
        let table = materialize("Data", input, &SheetOptions::default()).unwrap();
        assert_eq!(table.columns(), ["column2", "column1", "column4", "column3"]);
        assert_eq!(table.rows(), [vec!["a", "b", "c", "d"]]);
    }

    #[test]
    fn header_bounds_the_columns() {
        let input = cells(&[&["A", "B"], &["1", "2", "3"], &["", "", "4"], &["5"]]);
        let table = materialize("Data", input.clone(), &SheetOptions::default()).unwrap();
        assert_eq!(table.columns(), ["A", "B"]);
        assert_eq!(table.width(), 2);
        assert_eq!(table.rows(), [vec!["1", "2"], vec!["5", ""]]);

        let kept = materialize("Data", input, &SheetOptions::default().with_skip_empty_rows(false)).unwrap();
        assert_eq!(kept.rows(), [vec!["1", "2"], vec!["", ""], vec!["5", ""]]);
    }

    #[test]
    fn empty_rows_follow_options() {
        let input = cells(&[&["A"], &[""], &["1"]]);
        let skipped = materialize("Data", input.clone(), &SheetOptions::default()).unwrap();
        assert_eq!(skipped.len(), 1);
        let kept = materialize("Data", input, &SheetOptions::default().with_skip_empty_rows(false)).unwrap();
        assert_eq!(kept.rows(), [vec![""], vec!["1"]]);
    }

    #[test]
    fn range_and_limit() {
        let input = cells(&[&["title"], &["", "Name", "Age"], &["", "Ana", "30"], &["", "Bruno", "25"]]);
        let options = SheetOptions::default()
            .with_range(Range::try_from("B2").unwrap())
            .with_limit(1);
        let table = materialize("Data", input, &options).unwrap();
        assert_eq!(table.columns(), ["Name", "Age"]);
        assert_eq!(table.rows(), [vec!["Ana", "30"]]);
    }

    #[test]
    fn typed_cells_render_as_text() {
        let input = vec![
            Cell::text(0, 0, "Flag"),
            Cell::text(0, 1, "When"),
            Cell { row: 1, col: 0, kind: CellType::Boolean, value: "1".to_owned() },
            Cell { row: 1, col: 1, kind: CellType::NumberDate1900, value: "45000".to_owned() },
        ];
        let table = materialize("Data", input, &SheetOptions::default()).unwrap();
        assert_eq!(table.rows(), [vec!["true", "2023-03-15"]]);
    }

    #[test]
    fn duplicate_header_fails() {
        let error = materialize("Data", cells(&[&["A", "A"]]), &SheetOptions::default()).unwrap_err();
        assert!(matches!(error, ImportError::DuplicateColumn { ref name } if name == "A"));
    }

    #[test]
    fn empty_sheet_is_empty_table() {
        let table = materialize("Data", Vec::new(), &SheetOptions::default()).unwrap();
        assert_eq!(table, Table::default());
    }

    #[test]
    fn lookup_order() {
        let names = vec!["Sales".to_owned(), "sales".to_owned(), "Notes$".to_owned()];
        assert_eq!(find_sheet(&names, "sales"), Some("sales"));
        assert_eq!(find_sheet(&names, "SALES"), Some("Sales"));
        assert_eq!(find_sheet(&names, "notes"), Some("Notes$"));
        assert_eq!(find_sheet(&names, "Notes$"), Some("Notes$"));
        assert_eq!(find_sheet(&names, "Summary"), None);
    }

    #[test]
    fn requested_marker_is_optional() {
        let names = vec!["Sales".to_owned()];
        assert_eq!(find_sheet(&names, "Sales$"), Some("Sales"));
        assert_eq!(find_sheet(&names, "SALES$"), Some("Sales"));
        assert_eq!(find_sheet(&names, "Sales$$"), None);
    }
}
