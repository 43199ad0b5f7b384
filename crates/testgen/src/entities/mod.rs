//! Core entities: schema, reconciled table, session state and configuration.

mod config;
mod schema;
mod session;
mod table;

pub use config::{ModelSettings, PromptProfile, ServerSettings, TemplateSettings, TestgenConfig};
pub use schema::{Schema, DEFAULT_COLUMNS};
pub use session::{resolve_use_case, HistoryEntry, Session};
pub use table::{ReconciledTable, RowView, FALLBACK_COLUMN};
