use crate::normalize::parse_numeric_or_zero;

/// A single cell, as read back out of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Number(_) => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            Cell::Number(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<String>),
    Numeric(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Text(values) => values.len(),
            ColumnData::Numeric(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    pub fn cell(&self, row: usize) -> Option<Cell> {
        match &self.data {
            ColumnData::Text(values) => values.get(row).map(|s| Cell::Text(s.clone())),
            ColumnData::Numeric(values) => values.get(row).map(|v| Cell::Number(*v)),
        }
    }

    /// Numeric view of the column. Text cells go through the zero-fill parse.
    pub fn numbers(&self) -> Vec<f64> {
        match &self.data {
            ColumnData::Numeric(values) => values.clone(),
            ColumnData::Text(values) => values.iter().map(|s| parse_numeric_or_zero(s)).collect(),
        }
    }
}

/// Column-oriented table built from a header row plus data rows.
///
/// Every column holds exactly `row_count()` values. Column order follows
/// the header; lookups by name resolve to the first column with that name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no data rows (a header-only table is empty).
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<Cell> {
        self.column(column).and_then(|c| c.cell(row))
    }

    /// All `(column, cell)` pairs of one data row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<(String, Cell)>> {
        if row >= self.rows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .filter_map(|c| c.cell(row).map(|cell| (c.name.clone(), cell)))
                .collect(),
        )
    }
}

/// Builds a [`Table`] from raw rows, using row 0 as the header.
///
/// Empty input yields an empty table. Data rows shorter than the header
/// are padded with `""`; cells past the header width are dropped.
pub fn build_table<R, S>(rows: &[R]) -> Table
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let Some((header, data)) = rows.split_first() else {
        return Table::empty();
    };

    let header: &[S] = header.as_ref();
    let names: Vec<String> = header
        .iter()
        .map(|h| {
            let name: &str = h.as_ref();
            name.trim().to_string()
        })
        .collect();
    let width = names.len();

    let mut values: Vec<Vec<String>> = names
        .iter()
        .map(|_| Vec::with_capacity(data.len()))
        .collect();
    let mut padded = 0usize;
    let mut dropped = 0usize;

    for row in data {
        let cells: &[S] = row.as_ref();
        if cells.len() < width {
            padded += 1;
        } else if cells.len() > width {
            dropped += cells.len() - width;
        }
        for (idx, column) in values.iter_mut().enumerate() {
            let cell: &str = cells.get(idx).map(|c| c.as_ref()).unwrap_or("");
            column.push(cell.to_string());
        }
    }

    if padded > 0 {
        log::debug!("padded {padded} short row(s) to {width} columns");
    }
    if dropped > 0 {
        log::debug!("dropped {dropped} cell(s) beyond the header width");
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column {
            name,
            data: ColumnData::Text(values),
        })
        .collect();

    Table {
        columns,
        rows: data.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty_table() {
        let rows: Vec<Vec<String>> = Vec::new();
        let table = build_table(&rows);
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let rows = vec![
            vec!["Player", "Goals", "Assists"],
            vec!["A", "3"],
            vec!["B", "1", "2", "extra"],
        ];
        let table = build_table(&rows);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(0, "Assists"), Some(Cell::Text(String::new())));
        assert_eq!(table.cell(1, "Assists"), Some(Cell::Text("2".to_string())));
    }

    #[test]
    fn duplicate_headers_resolve_to_first() {
        let rows = vec![vec!["Player", "Goals", "Goals"], vec!["A", "1", "9"]];
        let table = build_table(&rows);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(0, "Goals"), Some(Cell::Text("1".to_string())));
    }

    #[test]
    fn whole_numbers_display_without_fraction() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
    }
}
