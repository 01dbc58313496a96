//! Rows and data sets
//!
//! A data set maps table name to an ordered sequence of rows. The checker
//! only ever reads a data set; nothing here is mutated during a check.

use std::collections::BTreeMap;

use super::cell::Cell;

/// A row: field name to cell value
pub type Row = BTreeMap<String, Cell>;

/// Builds a row from `(field, value)` pairs.
pub fn row<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<Cell>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Tables of rows supplied to a check invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    tables: BTreeMap<String, Vec<Row>>,
}

impl DataSet {
    /// Creates an empty data set
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a whole table, returning the previous rows.
    pub fn insert_table(&mut self, name: impl Into<String>, rows: Vec<Row>) -> Option<Vec<Row>> {
        self.tables.insert(name.into(), rows)
    }

    /// Builder form of [`insert_table`](Self::insert_table)
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.insert_table(name, rows);
        self
    }

    /// Appends a row, creating the table if needed.
    pub fn push_row(&mut self, table: impl Into<String>, row: Row) {
        self.tables.entry(table.into()).or_default().push(row);
    }

    /// Returns the rows of a table. Absent tables read as empty.
    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the table was supplied, even if empty.
    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Returns the supplied table names in order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Iterates over `(table, rows)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the number of supplied tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the total row count across all tables
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_table_reads_empty() {
        let data = DataSet::new();
        assert!(data.rows("foods").is_empty());
        assert!(!data.contains_table("foods"));
    }

    #[test]
    fn test_push_row_creates_table() {
        let mut data = DataSet::new();
        data.push_row("foods", row([("Name", "milk")]));
        data.push_row("foods", row([("Name", "bread")]));

        assert!(data.contains_table("foods"));
        assert_eq!(data.rows("foods").len(), 2);
        assert_eq!(data.rows("foods")[1]["Name"], Cell::from("bread"));
        assert_eq!(data.row_count(), 2);
    }

    #[test]
    fn test_with_table_replaces() {
        let data = DataSet::new()
            .with_table("foods", vec![row([("Name", "milk")])])
            .with_table("foods", vec![]);
        assert_eq!(data.len(), 1);
        assert!(data.rows("foods").is_empty());
    }
}
