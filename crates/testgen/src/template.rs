//! Schema source: read the header row of an uploaded test case template.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::entities::Schema;
use crate::errors::{TestgenError, TestgenResult};
use crate::reconcile::csv::read_records;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateKind {
    Csv,
    Spreadsheet,
}

impl TemplateKind {
    fn from_name(name: &str) -> TestgenResult<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx" | "xlsm" | "xls" | "ods") => Ok(Self::Spreadsheet),
            _ => Err(TestgenError::UnsupportedTemplate {
                name: name.to_string(),
            }),
        }
    }
}

/// Reads column schemas from `.csv` and spreadsheet templates.
pub struct TemplateReader;

impl TemplateReader {
    /// Read the schema from a template file on disk.
    pub fn read_path(path: &Path) -> TestgenResult<Schema> {
        let name = path.display().to_string();
        // Reject unknown extensions before touching the file.
        TemplateKind::from_name(&name)?;

        let bytes = std::fs::read(path).map_err(|e| TestgenError::FileReadError {
            path: name.clone(),
            reason: e.to_string(),
        })?;
        Self::read_bytes(&name, &bytes)
    }

    /// Read the schema from uploaded bytes; `file_name` picks the format.
    pub fn read_bytes(file_name: &str, bytes: &[u8]) -> TestgenResult<Schema> {
        let header = match TemplateKind::from_name(file_name)? {
            TemplateKind::Csv => csv_header(bytes),
            TemplateKind::Spreadsheet => spreadsheet_header(file_name, bytes)?,
        };

        let columns: Vec<String> = header
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if columns.is_empty() {
            return Err(TestgenError::TemplateEmpty {
                name: file_name.to_string(),
            });
        }

        debug!(template = file_name, columns = columns.len(), "Read template header");
        Schema::new(columns)
    }
}

fn csv_header(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');
    read_records(text)
        .into_iter()
        .next()
        .map(|record| record.fields)
        .unwrap_or_default()
}

fn spreadsheet_header(file_name: &str, bytes: &[u8]) -> TestgenResult<Vec<String>> {
    let read_error = |reason: String| TestgenError::TemplateReadError {
        name: file_name.to_string(),
        reason,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| read_error(e.to_string()))?;

    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range.map_err(|e| read_error(e.to_string()))?;

    Ok(range
        .rows()
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_template_header() {
        let bytes = b"\xEF\xBB\xBF\"Test Case Number\", Title ,,\"Steps\"\n\"1\",\"x\",,\"y\"\n";
        let schema = TemplateReader::read_bytes("template.CSV", bytes).unwrap();
        assert_eq!(schema.columns(), ["Test Case Number", "Title", "Steps"]);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            TemplateReader::read_bytes("template.json", b"{}"),
            Err(TestgenError::UnsupportedTemplate { .. })
        ));
    }

    #[test]
    fn test_empty_csv_template() {
        assert!(matches!(
            TemplateReader::read_bytes("empty.csv", b"\n\n"),
            Err(TestgenError::TemplateEmpty { .. })
        ));
    }

    #[test]
    fn test_corrupt_spreadsheet() {
        assert!(matches!(
            TemplateReader::read_bytes("broken.xlsx", b"not a zip"),
            Err(TestgenError::TemplateReadError { .. })
        ));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        assert!(matches!(
            TemplateReader::read_bytes("dup.csv", b"A,B,A\n"),
            Err(TestgenError::DuplicateColumn { .. })
        ));
    }
}
