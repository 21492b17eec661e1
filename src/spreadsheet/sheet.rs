use crate::database::range::Range;
use crate::spreadsheet::cell::Cell;

/// Cells of one sheet restricted to a range, with the used bounds tracked as cells arrive.
pub(crate) struct Sheet {
    pub(crate) name: String,
    cells: Vec<Cell>,
    /// Expected data range (user-specified)
    range: Range,
    /// Actual data range (determined from cell data)
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str, range: Option<Range>) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            range: range.unwrap_or_default(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Checks if a cell at (row, col) is within the requested range.
    pub(crate) fn contains(&self, row: usize, col: usize) -> bool {
        let range = &self.range;
        range.row_lower_bound.map(|bound| bound <= row).unwrap_or(true)
            && range.row_upper_bound.map(|bound| row <= bound).unwrap_or(true)
            && range.col_lower_bound.map(|bound| bound <= col).unwrap_or(true)
            && range.col_upper_bound.map(|bound| col <= bound).unwrap_or(true)
    }

    /// Adds a cell if it lies inside the range. Returns whether it was kept.
    pub(crate) fn push(&mut self, cell: Cell) -> bool {
        if !self.contains(cell.row, cell.col) {
            return false;
        }
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
        true
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|bound| row < bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|bound| bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|bound| col < bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|bound| bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Orders cells by position; a later cell at the same position replaces an earlier one.
    pub(crate) fn finish(&mut self) {
        self.cells.sort_by_key(|cell| (cell.row, cell.col));
        self.cells.dedup_by(|later, earlier| {
            let same = later.row == earlier.row && later.col == earlier.col;
            if same {
                std::mem::swap(later, earlier);
            }
            same
        });
    }

    /// Column span of the table: the requested column bounds where given,
    /// otherwise the used ones.
    pub(crate) fn col_span(&self) -> Option<(usize, usize)> {
        let lower = self.range.col_lower_bound.or(self.col_lower_bound)?;
        let upper = self.range.col_upper_bound.or(self.col_upper_bound)?;
        Some((lower, upper.max(lower)))
    }

    /// Lays the cells out as rows over the column span, starting at the first used row.
    /// Rows without any cell are left out when `skip_empty_rows` is set.
    pub(crate) fn records(&self, skip_empty_rows: bool) -> Vec<Vec<Option<&Cell>>> {
        let Some(((col_lower, col_upper), (row_lower, row_upper))) = self.col_span().zip(self.row_lower_bound.zip(self.row_upper_bound)) else {
            return Vec::new();
        };
        let width = col_upper - col_lower + 1;
        let mut records = Vec::<Vec<Option<&Cell>>>::new();
        let mut cells = self.cells.iter().peekable();
        for row in row_lower..=row_upper {
            let mut record = vec![None; width];
            let mut is_empty = true;
            while let Some(cell) = cells.next_if(|cell| cell.row == row) {
                if (col_lower..=col_upper).contains(&cell.col) {
                    record[cell.col - col_lower] = Some(cell);
                    is_empty = false;
                }
            }
            if !(is_empty && skip_empty_rows) {
                records.push(record);
            }
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) -> bool {
        sheet.push(Cell::text(row, col, value))
    }

    fn texts(records: Vec<Vec<Option<&Cell>>>) -> Vec<Vec<String>> {
        records
            .into_iter()
            .map(|record| record.into_iter().map(|cell| cell.map(Cell::to_text).unwrap_or_default()).collect())
            .collect()
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Data", None);
        assert!(sheet.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert_eq!(sheet.col_span(), None);
        assert!(sheet.records(true).is_empty());
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("Data", None);
        push(&mut sheet, 3, 3, "d");
        push(&mut sheet, 1, 1, "a");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 3, 1, "c");
        sheet.finish();

        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_span(), Some((1, 3)));
        assert_eq!(texts(sheet.records(true)), vec![
            vec!["a", "", "b"],
            vec!["c", "", "d"],
        ]);
        assert_eq!(texts(sheet.records(false)), vec![
            vec!["a", "", "b"],
            vec!["", "", ""],
            vec!["c", "", "d"],
        ]);
    }

    #[test]
    fn sheet_update_with_range() {
        let mut sheet = Sheet::new("Data", Some(Range {
            row_lower_bound: Some(1),
            row_upper_bound: None,
            col_lower_bound: Some(0),
            col_upper_bound: Some(1),
        }));
        assert!(!push(&mut sheet, 0, 0, "title"));
        assert!(push(&mut sheet, 1, 1, "b"));
        assert!(!push(&mut sheet, 1, 2, "outside"));
        assert!(push(&mut sheet, 2, 0, "c"));
        sheet.finish();

        assert_eq!(sheet.col_span(), Some((0, 1)));
        assert_eq!(texts(sheet.records(true)), vec![
            vec!["", "b"],
            vec!["c", ""],
        ]);
    }

    #[test]
    fn later_cell_wins() {
        let mut sheet = Sheet::new("Data", None);
        push(&mut sheet, 0, 0, "first");
        push(&mut sheet, 0, 0, "second");
        sheet.finish();
        assert_eq!(texts(sheet.records(true)), vec![vec!["second"]]);
    }
}
