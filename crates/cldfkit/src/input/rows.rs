//! Row sets built from loosely shaped records.

use indexmap::IndexMap;
use serde_json::Value;

/// One input row: column key -> scalar value.
pub type Record = IndexMap<String, Value>;

/// Records sharing one ordered column set.
///
/// Every record holds every column; cells absent from the input (or given as
/// JSON `null`) are filled with the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RowSet {
    /// Build a row set whose columns are the union of the record keys, in
    /// order of first appearance.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|column| {
                        let value = match record.swap_remove(column) {
                            None | Some(Value::Null) => Value::String(String::new()),
                            Some(value) => value,
                        };
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Rename a column in place, keeping its position.
    ///
    /// Returns false, leaving the row set untouched, if `from` is missing or
    /// `to` already names another column.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.has_column(from);
        }
        if self.has_column(to) {
            return false;
        }
        let Some(index) = self.columns.iter().position(|c| c == from) else {
            return false;
        };
        self.columns[index] = to.to_string();
        for row in &mut self.rows {
            let renamed: Record = std::mem::take(row)
                .into_iter()
                .map(|(key, value)| {
                    if key == from {
                        (to.to_string(), value)
                    } else {
                        (key, value)
                    }
                })
                .collect();
            *row = renamed;
        }
        true
    }

    pub fn into_records(self) -> Vec<Record> {
        self.rows
    }
}
