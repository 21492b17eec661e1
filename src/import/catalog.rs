use crate::error::ImportError;
use crate::error::ResultKind;
use crate::spreadsheet::open_workbook;
use crate::spreadsheet::Workbook;
use std::collections::HashSet;

/// Lists the sheets of an open workbook in workbook order.
///
/// Repeated names are reported once, at their first position. For workbooks
/// whose names carry a `$` marker, the marker is removed first.
pub fn list_sheets(workbook: &mut dyn Workbook) -> Result<Vec<String>, ImportError> {
    let names = workbook.sheet_names().or_schema_failure(workbook.path())?;
    let sheets = dedup_sheet_names(names, workbook.marks_sheet_names());
    tracing::debug!(path = workbook.path(), sheets = sheets.len(), "list sheets");
    Ok(sheets)
}

/// Opens the workbook at `path`, lists its sheets, and closes it.
pub fn list_sheets_in(path: &str) -> Result<Vec<String>, ImportError> {
    let mut workbook = open_workbook(path)?;
    list_sheets(workbook.as_mut())
}

pub(crate) fn strip_sheet_marker(name: &str) -> &str {
    name.strip_suffix('$').unwrap_or(name)
}

fn dedup_sheet_names(names: Vec<String>, is_marked: bool) -> Vec<String> {
    let mut seen = HashSet::<String>::with_capacity(names.len());
    names
        .iter()
        .map(|name| if is_marked { strip_sheet_marker(name) } else { name.as_str() })
        .filter(|name| seen.insert(name.to_string()))
        .map(str::to_owned)
        .collect()
}
