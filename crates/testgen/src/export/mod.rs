//! File exports of the BRD and the reconciled table.
//!
//! - Text: the BRD verbatim
//! - PDF: the BRD as paragraphs, `|` lines as bordered cell rows
//! - CSV: header plus rows with standard quoting
//! - XLSX: a single `TestCases` sheet

mod delimited;
mod pdf;
mod xlsx;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{ReconciledTable, Session};
use crate::errors::{TestgenError, TestgenResult};

pub use delimited::export_csv;
pub use pdf::{export_pdf, sanitize_latin1};
pub use xlsx::{export_xlsx, SHEET_NAME};

/// Download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Pdf,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Text, Self::Pdf, Self::Csv, Self::Xlsx];

    /// Canonical download file name.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Text => "generated_brd.txt",
            Self::Pdf => "generated_brd.pdf",
            Self::Csv => "test_cases.csv",
            Self::Xlsx => "test_cases.xlsx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Pdf => "application/pdf",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// True for formats rendered from the test case table rather than the BRD.
    pub fn is_table(self) -> bool {
        matches!(self, Self::Csv | Self::Xlsx)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = TestgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(TestgenError::InvalidArgument {
                reason: format!("Unknown export format '{other}' (expected txt, pdf, csv or xlsx)"),
            }),
        }
    }
}

/// BRD text as UTF-8 bytes.
pub fn export_text(brd_text: &str) -> Vec<u8> {
    brd_text.as_bytes().to_vec()
}

/// Render the BRD in a document format (`Text` or `Pdf`).
pub fn export_document(format: ExportFormat, brd_text: &str) -> TestgenResult<Vec<u8>> {
    match format {
        ExportFormat::Text => Ok(export_text(brd_text)),
        ExportFormat::Pdf => export_pdf(brd_text),
        ExportFormat::Csv | ExportFormat::Xlsx => Err(TestgenError::InvalidArgument {
            reason: format!("{format} is a table format"),
        }),
    }
}

/// Render the table in a table format (`Csv` or `Xlsx`).
pub fn export_table(format: ExportFormat, table: &ReconciledTable) -> TestgenResult<Vec<u8>> {
    match format {
        ExportFormat::Csv => export_csv(table),
        ExportFormat::Xlsx => export_xlsx(table),
        ExportFormat::Text | ExportFormat::Pdf => Err(TestgenError::InvalidArgument {
            reason: format!("{format} is a document format"),
        }),
    }
}

/// Render the session's BRD or table in `format`.
///
/// Document formats need a BRD; table formats need generated test cases.
pub fn export_session(session: &Session, format: ExportFormat) -> TestgenResult<Vec<u8>> {
    if format.is_table() {
        let table = session
            .table
            .as_ref()
            .ok_or_else(|| TestgenError::InvalidArgument {
                reason: "No test cases generated yet. Generate test cases first.".to_string(),
            })?;
        export_table(format, table)
    } else {
        if !session.has_brd() {
            return Err(TestgenError::BrdMissing);
        }
        export_document(format, &session.brd_text)
    }
}

/// Write exported bytes into `dir` under the format's canonical name.
pub fn write_export(dir: &Path, format: ExportFormat, bytes: &[u8]) -> TestgenResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| TestgenError::FileWriteError {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let path = dir.join(format.file_name());
    std::fs::write(&path, bytes).map_err(|e| TestgenError::FileWriteError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    info!(path = %path.display(), bytes = bytes.len(), "Wrote export");
    Ok(path)
}

fn export_error(format: ExportFormat, reason: impl fmt::Display) -> TestgenError {
    TestgenError::ExportError {
        format: format.to_string(),
        reason: reason.to_string(),
    }
}
