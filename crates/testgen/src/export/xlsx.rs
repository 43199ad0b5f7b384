//! Spreadsheet export.

use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};

use crate::entities::ReconciledTable;
use crate::errors::TestgenResult;

use super::{export_error, ExportFormat};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "TestCases";

const MIN_WIDTH: usize = 12;
const MAX_WIDTH: usize = 60;

pub fn export_xlsx(table: &ReconciledTable) -> TestgenResult<Vec<u8>> {
    build_workbook(table).map_err(|e| export_error(ExportFormat::Xlsx, e))
}

fn build_workbook(table: &ReconciledTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top);
    let cell = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    for (col, name) in table.columns().iter().enumerate() {
        let col = column_index(col)?;
        worksheet.write_string_with_format(0, col, name, &header)?;
        worksheet.set_column_width(col, column_width(table, usize::from(col)))?;
    }

    for (row, values) in table.rows().iter().enumerate() {
        let row = u32::try_from(row + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, value) in values.iter().enumerate() {
            worksheet.write_string_with_format(row, column_index(col)?, value, &cell)?;
        }
    }

    workbook.save_to_buffer()
}

fn column_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

/// Width from the longest single line in the column, clamped.
#[allow(clippy::cast_precision_loss)]
fn column_width(table: &ReconciledTable, col: usize) -> f64 {
    let longest = std::iter::once(table.columns()[col].as_str())
        .chain(table.rows().iter().map(|row| row[col].as_str()))
        .flat_map(str::lines)
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    longest.clamp(MIN_WIDTH, MAX_WIDTH) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Schema;

    #[test]
    fn test_xlsx_is_zip() {
        let schema = Schema::new(["A", "B"]).unwrap();
        let mut table = ReconciledTable::with_schema(&schema);
        table.push_row(vec!["1".to_string(), "two\nlines".to_string()]);

        let bytes = export_xlsx(&table).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_column_width_clamped() {
        let schema = Schema::new(["Id", "Steps"]).unwrap();
        let mut table = ReconciledTable::with_schema(&schema);
        table.push_row(vec!["1".to_string(), "x".repeat(200)]);
        assert!((column_width(&table, 0) - 12.0).abs() < f64::EPSILON);
        assert!((column_width(&table, 1) - 60.0).abs() < f64::EPSILON);
    }
}
