//! CSV export.

use crate::entities::ReconciledTable;
use crate::errors::TestgenResult;

use super::{export_error, ExportFormat};

/// Header from the table's columns, one record per row, necessary-only quoting.
pub fn export_csv(table: &ReconciledTable) -> TestgenResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .map_err(|e| export_error(ExportFormat::Csv, e))?;
    for row in table.rows() {
        writer
            .write_record(row)
            .map_err(|e| export_error(ExportFormat::Csv, e))?;
    }
    writer
        .into_inner()
        .map_err(|e| export_error(ExportFormat::Csv, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Schema;

    #[test]
    fn test_csv_quotes_only_when_needed() {
        let schema = Schema::new(["Id", "Steps"]).unwrap();
        let mut table = ReconciledTable::with_schema(&schema);
        table.push_row(vec!["1".to_string(), "1. Open\n2. Say \"hi\", then close".to_string()]);

        let bytes = export_csv(&table).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Id,Steps\n1,\"1. Open\n2. Say \"\"hi\"\", then close\"\n"
        );
    }
}
