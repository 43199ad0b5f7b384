//! Caller-owned session state.
//!
//! Holds what the form shell shows between actions: the current BRD,
//! the active schema and the last reconciled table. Every generation
//! call takes the session by `&mut` and updates it explicitly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::reconcile::{ReconcileOutcome, Reconciliation};

use super::schema::Schema;
use super::table::ReconciledTable;

/// One completed test case generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub rows: usize,
    pub fallback: bool,
}

/// State for one user of the form shell.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    /// Model used for the next generation
    pub model: String,
    /// Use case the current BRD was generated from
    pub use_case: Option<String>,
    /// Current BRD text (empty until generated)
    pub brd_text: String,
    /// Schema from an uploaded template or the configured default
    pub schema: Option<Schema>,
    /// Last reconciled table
    pub table: Option<ReconciledTable>,
    /// How the last table was produced
    pub outcome: Option<ReconcileOutcome>,
    pub history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new(model: impl Into<String>, schema: Option<Schema>) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: model.into(),
            use_case: None,
            brd_text: String::new(),
            schema,
            table: None,
            outcome: None,
            history: Vec::new(),
        }
    }

    pub fn has_brd(&self) -> bool {
        !self.brd_text.trim().is_empty()
    }

    /// Switch models. History from another model is discarded.
    ///
    /// Returns true when the model actually changed.
    pub fn select_model(&mut self, model: &str) -> bool {
        if self.model == model {
            return false;
        }
        self.model = model.to_string();
        self.history.clear();
        true
    }

    /// Replace the current BRD; the previous table no longer matches it.
    pub fn set_brd(&mut self, use_case: &str, brd_text: String) {
        self.use_case = Some(use_case.to_string());
        self.brd_text = brd_text;
        self.table = None;
        self.outcome = None;
    }

    /// Store a reconciliation result as the current table.
    pub fn record_table(&mut self, reconciliation: Reconciliation) {
        self.history.push(HistoryEntry {
            generated_at: Utc::now(),
            model: self.model.clone(),
            rows: reconciliation.table.len(),
            fallback: reconciliation.is_fallback(),
        });
        self.table = Some(reconciliation.table);
        self.outcome = Some(reconciliation.outcome);
    }
}

/// Resolve the use case text from an uploaded file or pasted text.
///
/// A non-blank upload wins over pasted text; pasted text is trimmed.
pub fn resolve_use_case(file: Option<&[u8]>, pasted: &str) -> Option<String> {
    if let Some(bytes) = file {
        let text = String::from_utf8_lossy(bytes);
        if !text.trim().is_empty() {
            return Some(text.into_owned());
        }
    }

    let pasted = pasted.trim();
    if pasted.is_empty() {
        None
    } else {
        Some(pasted.to_string())
    }
}
