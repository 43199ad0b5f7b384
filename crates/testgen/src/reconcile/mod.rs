//! Response reconciliation.
//!
//! Turns the free-text reply of the generation service into a table
//! shaped like the caller's schema:
//! 1. Strip code fences and an opening language tag
//! 2. Check that the first line mentions every schema column
//! 3. Parse the text as quoted CSV, dropping malformed rows
//! 4. Force the parsed columns into schema order, synthesizing blanks
//! 5. Fall back to a single `Output` column holding the raw reply
//!
//! Nothing here fails: every reply yields a renderable table.

pub mod csv;
pub mod fence;

use serde::Serialize;
use tracing::{debug, warn};

use crate::entities::{ReconciledTable, Schema};

pub use self::csv::{parse_quoted_csv, CsvParseError, ParsedCsv};
pub use self::fence::strip_framing;

/// Why a reply could not be aligned to the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum FallbackReason {
    /// Fewer than a header line and one data line after cleaning.
    TooFewLines,
    /// Schema columns absent from the first line.
    MissingColumns(Vec<String>),
    /// The header record could not be parsed.
    ParseFailure(String),
    /// Parsing succeeded but every data row was dropped.
    NoDataRows,
}

/// How the table was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReconcileOutcome {
    #[serde(rename_all = "camelCase")]
    Parsed { dropped_rows: usize },
    Fallback { reason: FallbackReason },
}

/// Reconciled table plus the condition the caller should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub table: ReconciledTable,
    pub outcome: ReconcileOutcome,
}

impl Reconciliation {
    fn fallback(raw_reply: &str, reason: FallbackReason) -> Self {
        warn!(?reason, "Reply could not be reconciled, showing raw output");
        Self {
            table: ReconciledTable::fallback(raw_reply),
            outcome: ReconcileOutcome::Fallback { reason },
        }
    }

    /// True when the raw-output fallback table was produced.
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, ReconcileOutcome::Fallback { .. })
    }

    /// Advisory text to show next to a degraded table.
    pub fn warning(&self) -> Option<String> {
        let ReconcileOutcome::Fallback { reason } = &self.outcome else {
            return None;
        };

        Some(match reason {
            FallbackReason::TooFewLines | FallbackReason::NoDataRows => {
                "No table detected in the generated output. Showing raw output.".to_string()
            }
            FallbackReason::MissingColumns(missing) => format!(
                "No table detected in the generated output (missing columns: {}). Showing raw output.",
                missing.join(", ")
            ),
            FallbackReason::ParseFailure(e) => format!(
                "Could not parse generated test cases as a table. Showing raw output. Error: {e}"
            ),
        })
    }

    /// Rows dropped while parsing, zero for the fallback table.
    pub fn dropped_rows(&self) -> usize {
        match self.outcome {
            ReconcileOutcome::Parsed { dropped_rows } => dropped_rows,
            ReconcileOutcome::Fallback { .. } => 0,
        }
    }
}

/// Reconcile a raw model reply against `schema`.
pub fn reconcile(raw_reply: &str, schema: &Schema) -> Reconciliation {
    let cleaned = strip_framing(raw_reply);

    let mut lines = cleaned.lines();
    let Some(first_line) = lines.next() else {
        return Reconciliation::fallback(raw_reply, FallbackReason::TooFewLines);
    };
    if lines.next().is_none() {
        return Reconciliation::fallback(raw_reply, FallbackReason::TooFewLines);
    }

    let missing: Vec<String> = schema
        .iter()
        .filter(|column| !first_line.contains(column.trim()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Reconciliation::fallback(raw_reply, FallbackReason::MissingColumns(missing));
    }

    let parsed = match parse_quoted_csv(cleaned) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Reconciliation::fallback(raw_reply, FallbackReason::ParseFailure(e.to_string()))
        }
    };

    if parsed.rows.is_empty() {
        return Reconciliation::fallback(raw_reply, FallbackReason::NoDataRows);
    }

    let table = align_to_schema(&parsed, schema);
    debug!(
        rows = table.len(),
        dropped = parsed.dropped,
        "Reconciled reply against schema"
    );

    Reconciliation {
        table,
        outcome: ReconcileOutcome::Parsed {
            dropped_rows: parsed.dropped,
        },
    }
}

/// Keep schema columns only, in schema order; absent ones become blank.
fn align_to_schema(parsed: &ParsedCsv, schema: &Schema) -> ReconciledTable {
    let positions: Vec<Option<usize>> = schema
        .iter()
        .map(|column| parsed.header.iter().position(|h| h == column.trim()))
        .collect();

    let mut table = ReconciledTable::with_schema(schema);
    for row in &parsed.rows {
        table.push_row(
            positions
                .iter()
                .map(|pos| pos.map(|i| row[i].clone()).unwrap_or_default())
                .collect(),
        );
    }
    table
}
