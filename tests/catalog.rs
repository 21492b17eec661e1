use sheet_import::{list_sheets, read_sheet, Cell, FormatError, ImportError, SheetOptions, Workbook};

/// In-memory workbook: sheet names with their cells.
struct MemoryWorkbook {
    sheets: Vec<(String, Vec<Cell>)>,
    marked: bool,
    broken_directory: bool,
}

impl MemoryWorkbook {
    fn new(sheets: &[(&str, Vec<Cell>)]) -> Self {
        MemoryWorkbook {
            sheets: sheets
                .iter()
                .map(|(name, cells)| (name.to_string(), cells.clone()))
                .collect(),
            marked: false,
            broken_directory: false,
        }
    }

    /// Names carry the `$` marker of a schema query.
    fn marked(sheets: &[(&str, Vec<Cell>)]) -> Self {
        MemoryWorkbook {
            marked: true,
            ..MemoryWorkbook::new(sheets)
        }
    }
}

impl Workbook for MemoryWorkbook {
    fn path(&self) -> &str {
        "memory.xlsx"
    }

    fn sheet_names(&mut self) -> Result<Vec<String>, FormatError> {
        if self.broken_directory {
            return Err(FormatError::Message("directory unreadable".to_owned()));
        }
        Ok(self.sheets.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read_cells(&mut self, sheet_name: &str) -> Result<Vec<Cell>, FormatError> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, cells)| cells.clone())
            .ok_or_else(|| FormatError::Message(format!("corrupt sheet {sheet_name}")))
    }

    fn marks_sheet_names(&self) -> bool {
        self.marked
    }
}

fn people() -> Vec<Cell> {
    vec![
        Cell::text(0, 0, "Name"),
        Cell::text(0, 1, "Age"),
        Cell::text(0, 2, "City"),
        Cell::text(1, 0, "Ana"),
        Cell::text(1, 1, "30"),
        Cell::text(1, 2, "Lisbon"),
        Cell::text(2, 0, "Bruno"),
    ]
}

#[test]
fn test_duplicate_marked_names() {
    let mut workbook = MemoryWorkbook::marked(&[
        ("Sales$", people()),
        ("Sales$", Vec::new()),
        ("Notes$", Vec::new()),
    ]);

    let sheets = list_sheets(&mut workbook).unwrap();

    assert_eq!(sheets, vec!["Sales", "Notes"]);
}

#[test]
fn test_listed_names_resolve() {
    let mut workbook = MemoryWorkbook::marked(&[("Sales$", people()), ("Notes$", Vec::new())]);

    for name in list_sheets(&mut workbook).unwrap() {
        let table = read_sheet(&mut workbook, &name, &SheetOptions::default()).unwrap();
        assert!(table.is_some(), "sheet {name} should resolve");
    }
}

#[test]
fn test_dollar_in_stored_names() {
    let mut workbook = MemoryWorkbook::new(&[("Q1$", people()), ("Q1", Vec::new())]);

    assert_eq!(list_sheets(&mut workbook).unwrap(), vec!["Q1$", "Q1"]);

    let marked = read_sheet(&mut workbook, "Q1$", &SheetOptions::default()).unwrap().unwrap();
    let plain = read_sheet(&mut workbook, "Q1", &SheetOptions::default()).unwrap().unwrap();
    assert_eq!(marked.width(), 3);
    assert_eq!(plain.width(), 0);
}

#[test]
fn test_marker_optional_in_requested_name() {
    let mut workbook = MemoryWorkbook::new(&[("Sales", people())]);

    let table = read_sheet(&mut workbook, "Sales$", &SheetOptions::default()).unwrap();

    assert_eq!(table.map(|table| table.columns().to_vec()), Some(vec!["Name".to_owned(), "Age".to_owned(), "City".to_owned()]));
}

#[test]
fn test_case_insensitive_lookup_and_gap_fill() {
    let mut workbook = MemoryWorkbook::new(&[("People", people())]);

    let table = read_sheet(&mut workbook, "PEOPLE", &SheetOptions::default())
        .unwrap()
        .unwrap();

    assert_eq!(table.columns(), ["Name", "Age", "City"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[1], vec!["Bruno", "", ""]);
}

#[test]
fn test_not_found_versus_empty() {
    let mut workbook = MemoryWorkbook::new(&[("Empty", Vec::new())]);

    let missing = read_sheet(&mut workbook, "Other", &SheetOptions::default()).unwrap();
    let empty = read_sheet(&mut workbook, "empty", &SheetOptions::default()).unwrap();

    assert!(missing.is_none());
    let empty = empty.unwrap();
    assert_eq!(empty.width(), 0);
    assert!(empty.is_empty());
}

#[test]
fn test_directory_failure() {
    let mut workbook = MemoryWorkbook::new(&[("People", people())]);
    workbook.broken_directory = true;

    let listed = list_sheets(&mut workbook);
    let read = read_sheet(&mut workbook, "People", &SheetOptions::default());

    assert!(matches!(listed, Err(ImportError::SchemaReadFailure { ref path, .. }) if path == "memory.xlsx"));
    assert!(matches!(read, Err(ImportError::ReadFailure { ref sheet, .. }) if sheet == "People"));
}

#[test]
fn test_corrupt_sheet_is_read_failure() {
    struct CorruptWorkbook;

    impl Workbook for CorruptWorkbook {
        fn path(&self) -> &str {
            "corrupt.xls"
        }

        fn sheet_names(&mut self) -> Result<Vec<String>, FormatError> {
            Ok(vec!["Data".to_owned()])
        }

        fn read_cells(&mut self, _sheet_name: &str) -> Result<Vec<Cell>, FormatError> {
            Err(FormatError::Message("truncated record".to_owned()))
        }
    }

    let result = read_sheet(&mut CorruptWorkbook, "data", &SheetOptions::default());

    assert!(matches!(result, Err(ImportError::ReadFailure { ref sheet, .. }) if sheet == "Data"));
}
