//! Column schema for generated test case tables.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{TestgenError, TestgenResult};

/// Columns used when no template is uploaded.
pub const DEFAULT_COLUMNS: &[&str] = &[
    "Test Case Number",
    "Title",
    "Preconditions",
    "Steps",
    "Expected Results",
    "Transaction Type",
    "Status",
    "Test Data",
];

/// Ordered, unique, non-empty list of column names.
///
/// Drives both the header line the model is asked to reproduce and the
/// shape the reconciler forces the reply into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Build a schema, rejecting empty lists and duplicate names.
    pub fn new<I, S>(columns: I) -> TestgenResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(TestgenError::SchemaMissing);
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TestgenError::DuplicateColumn {
                    name: column.clone(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// The built-in default schema.
    pub fn default_columns() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Render the columns as a CSV header line with every name quoted.
    pub fn quoted_header(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.columns.iter()
    }
}

impl TryFrom<Vec<String>> for Schema {
    type Error = TestgenError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(columns)
    }
}

impl From<Schema> for Vec<String> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
