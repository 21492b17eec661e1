use sheet_import::{read_delimited, read_delimited_with_options, DelimitedOptions, ImportError, Table};
use std::fs;
use tempfile::tempdir;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_owned()
}

fn row(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn test_people_file() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "people.txt", b"Name;Age;City\nAna;30;Lisbon\nBruno;25;Porto\n");

    let table = read_delimited(&path, ';').unwrap();

    assert_eq!(table.columns(), ["Name", "Age", "City"]);
    assert_eq!(table.rows(), [row(&["Ana", "30", "Lisbon"]), row(&["Bruno", "25", "Porto"])]);
    assert_eq!(table.column("City").unwrap().collect::<Vec<_>>(), vec!["Lisbon", "Porto"]);
}

#[test]
fn test_round_trip() {
    let expected = Table::from_rows(
        ["id", "product", "price", "note"],
        vec![
            row(&["1", "Pen", "1.50", ""]),
            row(&["2", "Notebook", "4", "A5, ruled"]),
            row(&["3", "Ink \"blue\"", "7.25", "refill"]),
        ],
    )
    .unwrap();

    let mut text = expected.columns().join("|");
    for values in expected.rows() {
        text.push('\n');
        text.push_str(&values.join("|"));
    }

    let dir = tempdir().unwrap();
    let path = write_file(&dir, "products.txt", text.as_bytes());
    let table = read_delimited(&path, '|').unwrap();

    assert_eq!(table, expected);
}

#[test]
fn test_tab_delimiter_and_crlf() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "data.tsv", b"a\tb\r\n1\t2\r\n");

    let options = DelimitedOptions::default().with_delimiter('\t');
    let table = read_delimited_with_options(&path, &options).unwrap();

    assert_eq!(table.columns(), ["a", "b"]);
    assert_eq!(table.rows(), [row(&["1", "2"])]);
}

#[test]
fn test_malformed_row_reports_line() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "bad.txt", b"A;B\n1;2\n3;4\n5;6;7\n");

    let result = read_delimited(&path, ';');

    assert!(matches!(
        result,
        Err(ImportError::MalformedRow { line: 4, fields: 3, columns: 2 })
    ));
}

#[test]
fn test_empty_file() {
    let dir = tempdir().unwrap();
    let path = write_file(&dir, "empty.txt", b"");

    let table = read_delimited(&path, ';').unwrap();

    assert_eq!(table, Table::default());
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.txt");

    let result = read_delimited(path.to_str().unwrap(), ';');

    assert!(matches!(result, Err(ImportError::SourceUnavailable { .. })));
}

#[test]
fn test_directory_path() {
    let dir = tempdir().unwrap();

    let result = read_delimited(dir.path().to_str().unwrap(), ';');

    assert!(matches!(result, Err(ImportError::SourceUnavailable { .. })));
}
