//! Integration tests for exports and template reading.
//!
//! Spreadsheets written by the exporters are read back with the same
//! crates a user's tooling would use.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

use testgen::entities::{ReconciledTable, Schema, Session};
use testgen::export::{export_session, export_table, write_export, ExportFormat, SHEET_NAME};
use testgen::{reconcile, TemplateReader, TestgenError};

fn sample_table() -> ReconciledTable {
    let schema = Schema::new(["Test Case Number", "Steps", "Status"]).unwrap();
    let reply = "\"Test Case Number\",\"Steps\",\"Status\"\n\
                 \"TC-001\",\"1. Open policy\n2. Save\",\"Draft\"\n\
                 \"TC-002\",\"1. Cancel, then \"\"confirm\"\"\",\"Draft\"";
    let reconciliation = reconcile(reply, &schema);
    assert!(!reconciliation.is_fallback());
    reconciliation.table
}

mod csv_export_tests {
    use super::*;

    #[test]
    fn test_csv_reads_back_with_csv_crate() {
        let bytes = export_table(ExportFormat::Csv, &sample_table()).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, ["Test Case Number", "Steps", "Status"]);

        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "1. Open policy\n2. Save");
        assert_eq!(&records[1][1], "1. Cancel, then \"confirm\"");
    }

    #[test]
    fn test_fallback_table_exports_single_column() {
        let schema = Schema::new(["A", "B"]).unwrap();
        let table = reconcile("Sorry, I cannot help with that.", &schema).table;

        let bytes = export_table(ExportFormat::Csv, &table).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Output\n\"Sorry, I cannot help with that.\"\n");
    }
}

mod xlsx_export_tests {
    use super::*;

    #[test]
    fn test_xlsx_reads_back_with_calamine() {
        let bytes = export_table(ExportFormat::Xlsx, &sample_table()).unwrap();

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), [SHEET_NAME]);

        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ["Test Case Number", "Steps", "Status"]);
        assert_eq!(rows[1], ["TC-001", "1. Open policy\n2. Save", "Draft"]);
        assert_eq!(rows[2][0], "TC-002");
    }

    #[test]
    fn test_exported_xlsx_is_a_valid_template() {
        let bytes = export_table(ExportFormat::Xlsx, &sample_table()).unwrap();
        let schema = TemplateReader::read_bytes("test_cases.xlsx", &bytes).unwrap();
        assert_eq!(schema.columns(), ["Test Case Number", "Steps", "Status"]);
    }
}

mod template_tests {
    use super::*;

    fn write_template(dir: &TempDir, header: &[&str]) -> std::path::PathBuf {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in (0u16..).zip(header) {
            sheet.write_string(0, col, *name).unwrap();
        }
        sheet.write_string(1, 0, "ignored row").unwrap();

        let path = dir.path().join("template.xlsx");
        std::fs::write(&path, workbook.save_to_buffer().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_xlsx_template_header() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, &["ID", " Scenario ", "", "Expected Result"]);

        let schema = TemplateReader::read_path(&path).unwrap();
        assert_eq!(schema.columns(), ["ID", "Scenario", "Expected Result"]);
    }

    #[test]
    fn test_csv_template_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("template.csv");
        std::fs::write(&path, "\"Test Case Number\",\"Title\"\n").unwrap();

        let schema = TemplateReader::read_path(&path).unwrap();
        assert_eq!(schema.columns(), ["Test Case Number", "Title"]);
    }

    #[test]
    fn test_missing_template_file() {
        let dir = TempDir::new().unwrap();
        let result = TemplateReader::read_path(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(TestgenError::FileReadError { .. })));
    }

    #[test]
    fn test_wrong_extension_checked_before_reading() {
        let dir = TempDir::new().unwrap();
        let result = TemplateReader::read_path(&dir.path().join("absent.docx"));
        assert!(matches!(result, Err(TestgenError::UnsupportedTemplate { .. })));
    }
}

mod session_export_tests {
    use super::*;

    #[test]
    fn test_exports_need_their_source() {
        let session = Session::new("gemini-2.0-flash-exp", Some(Schema::default_columns()));

        assert!(matches!(
            export_session(&session, ExportFormat::Pdf),
            Err(TestgenError::BrdMissing)
        ));
        assert!(matches!(
            export_session(&session, ExportFormat::Csv),
            Err(TestgenError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_every_format_written_to_disk() {
        let mut session = Session::new("gemini-2.0-flash-exp", None);
        session.set_brd("Use case", "# BRD\n\n| Field | Value |\nDate: today".to_string());
        session.table = Some(sample_table());

        let dir = TempDir::new().unwrap();
        for format in ExportFormat::ALL {
            let bytes = export_session(&session, format).unwrap();
            let path = write_export(dir.path(), format, &bytes).unwrap();

            assert_eq!(path.file_name().unwrap().to_str(), Some(format.file_name()));
            assert_eq!(std::fs::read(&path).unwrap(), bytes);
        }

        let pdf = std::fs::read(dir.path().join("generated_brd.pdf")).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        let txt = std::fs::read_to_string(dir.path().join("generated_brd.txt")).unwrap();
        assert_eq!(txt, session.brd_text);
    }
}
