#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_inception)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_self)]
#![allow(clippy::if_not_else)]
#![allow(clippy::map_unwrap_or)]

//! # Testgen
//!
//! Turns a free-text use case into a Business Requirements Document and
//! then into a table of QA test cases, using a hosted text generation
//! model for both steps.
//!
//! This crate provides:
//! - Prompt building for the BRD and the quoted-CSV test case table
//! - Reconciliation of loosely structured replies onto a column schema,
//!   degrading to a raw-output table instead of failing
//! - Template header reading (`.csv`, `.xlsx`) and TXT/PDF/CSV/XLSX exports
//! - A Gemini client behind a provider trait
//! - CLI and HTTP form shell interfaces
//!
//! ## Example
//!
//! ```rust,ignore
//! use testgen::{reconcile, Schema};
//!
//! let schema = Schema::new(["A", "B"])?;
//! let result = reconcile("\"A\",\"B\"\n\"1\",\"2\"", &schema);
//! assert_eq!(result.table.get(0, "B"), Some("2"));
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Reply reconciliation
pub mod reconcile;

// Template header reading
pub mod template;

// File exports
pub mod export;

// Domain facades
pub mod domain;

// Terminal UI helpers
pub mod ui;

// Generation service integration
pub mod ai;

// HTTP form shell
pub mod server;

// Re-export key types for convenience
pub use ai::{as_of_today, build_brd_prompt, build_test_case_prompt, PromptBuilder};
pub use domain::{ConfigDomain, GeneratorDomain, TestCaseRun};
pub use entities::{
    resolve_use_case, ReconciledTable, Schema, Session, TestgenConfig, DEFAULT_COLUMNS,
    FALLBACK_COLUMN,
};
pub use errors::{TestgenError, TestgenResult};
pub use export::ExportFormat;
pub use reconcile::{reconcile, FallbackReason, ReconcileOutcome, Reconciliation};
pub use template::TemplateReader;
