//! Reconciled test case table.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use super::schema::Schema;

/// Column name of the degraded single-column table.
pub const FALLBACK_COLUMN: &str = "Output";

/// Tabular result of reconciling a model reply against a schema.
///
/// Rows are positional and always as wide as `columns`. When parsing
/// succeeded `columns` equals the schema; otherwise the table is the
/// single `Output` column holding the raw reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciledTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReconciledTable {
    /// Empty table shaped like `schema`.
    pub fn with_schema(schema: &Schema) -> Self {
        Self {
            columns: schema.columns().to_vec(),
            rows: Vec::new(),
        }
    }

    /// Single-column table holding the whole reply.
    pub fn fallback(raw_reply: &str) -> Self {
        Self {
            columns: vec![FALLBACK_COLUMN.to_string()],
            rows: vec![vec![raw_reply.trim().to_string()]],
        }
    }

    /// Append a row. Short rows are padded with empty strings and long
    /// rows truncated so the table stays rectangular.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether this table has the fallback shape (one column named `Output`).
    pub fn is_fallback(&self) -> bool {
        self.columns.len() == 1 && self.columns[0] == FALLBACK_COLUMN
    }

    /// Value of `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Column-name keyed view of one row.
    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        self.rows.get(index).map(|values| RowView {
            columns: &self.columns,
            values,
        })
    }

    /// Iterate rows as column-name keyed views.
    pub fn records(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|values| RowView {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of a row as an ordered column -> value mapping.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx].as_str())
    }

    /// Pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl Serialize for ReconciledTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: Vec<RowView<'_>> = self.records().collect();
        let mut state = serializer.serialize_struct("ReconciledTable", 2)?;
        state.serialize_field("columns", &self.columns)?;
        state.serialize_field("rows", &rows)?;
        state.end()
    }
}
