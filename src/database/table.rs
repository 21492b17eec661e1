use crate::error::ImportError;
use std::collections::HashSet;

/// Imported data: named columns and rows of text values.
///
/// Every row holds exactly one value per column, and column names are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Builds a table from a header and rows.
    /// Short rows are padded with empty text; rows wider than the header are rejected.
    pub fn from_rows<C, R>(columns: C, rows: R) -> Result<Table, ImportError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = Vec<String>>,
    {
        let mut table = Table::with_columns(columns.into_iter().map(Into::into).collect())?;
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() > table.width() {
                Err(ImportError::MalformedRow {
                    line: index + 2,
                    fields: row.len(),
                    columns: table.width(),
                })?
            }
            table.push_row(row);
        }
        Ok(table)
    }

    /// Creates an empty table, rejecting repeated column names.
    pub(crate) fn with_columns(columns: Vec<String>) -> Result<Table, ImportError> {
        let mut names = HashSet::<&str>::with_capacity(columns.len());
        if let Some(name) = columns.iter().find(|name| !names.insert(name.as_str())) {
            Err(ImportError::DuplicateColumn { name: name.to_owned() })?
        }
        Ok(Table {
            columns,
            rows: Vec::new(),
        })
    }

    /// Appends a row, padding it to the table width.
    /// Callers check the width beforehand.
    pub(crate) fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows, header excluded.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Gets the value at a row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    /// Iterates over the values of one column, in row order.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[index].as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn builds_from_rows() {
        let table = Table::from_rows(["Name", "Age"], vec![row(&["Ana", "30"]), row(&["Bruno"])]).unwrap();
        assert_eq!(table.columns(), ["Name", "Age"]);
        assert_eq!(table.width(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], row(&["Bruno", ""]));
        assert_eq!(table.get(0, "Age"), Some("30"));
        assert_eq!(table.get(2, "Age"), None);
        assert_eq!(table.get(0, "City"), None);
        assert_eq!(table.column("Name").unwrap().collect::<Vec<_>>(), vec!["Ana", "Bruno"]);
        assert!(table.column("City").is_none());
    }

    #[test]
    fn rejects_wide_rows() {
        let error = Table::from_rows(["Name"], vec![row(&["Ana", "30"])]).unwrap_err();
        assert!(matches!(error, ImportError::MalformedRow { line: 2, fields: 2, columns: 1 }));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let error = Table::from_rows(["Name", "Age", "Name"], Vec::<Vec<String>>::new()).unwrap_err();
        assert!(matches!(error, ImportError::DuplicateColumn { ref name } if name == "Name"));
    }

    #[test]
    fn default_is_empty() {
        let table = Table::default();
        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
    }
}
