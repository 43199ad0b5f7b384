//! Terminal UI helpers for the CLI.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use std::time::Duration;

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};

use crate::ai::{AIProvider, TokenUsage};
use crate::entities::{ReconciledTable, Session};
use crate::reconcile::Reconciliation;

/// Create a table for displaying reconciled test cases
pub fn test_case_table(table: &ReconciledTable) -> Table {
    let mut out = Table::new();
    out.set_content_arrangement(ContentArrangement::Dynamic);

    let header_color = if table.is_fallback() {
        Color::Yellow
    } else {
        Color::Cyan
    };
    out.set_header(
        table
            .columns()
            .iter()
            .map(|c| Cell::new(c).fg(header_color))
            .collect::<Vec<_>>(),
    );

    for row in table.rows() {
        out.add_row(row.iter().map(Cell::new).collect::<Vec<_>>());
    }

    out
}

/// Create a table for displaying registered providers
pub fn provider_table(providers: &[std::sync::Arc<dyn AIProvider>]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Configured").fg(Color::Cyan),
        Cell::new("API key").fg(Color::Cyan),
        Cell::new("Models").fg(Color::Cyan),
    ]);

    for provider in providers {
        let (status, color) = if provider.is_configured() {
            ("yes", Color::Green)
        } else {
            ("no", Color::Red)
        };
        table.add_row(vec![
            Cell::new(provider.name()),
            Cell::new(status).fg(color),
            Cell::new(provider.api_key_env_var()).fg(Color::DarkGrey),
            Cell::new(provider.supported_models().join("\n")),
        ]);
    }

    table
}

/// Print a reconciled table with its warning, if any
pub fn display_reconciliation(reconciliation: &Reconciliation) {
    if let Some(warning) = reconciliation.warning() {
        print_warning(&warning);
    }
    println!("{}", test_case_table(&reconciliation.table));

    let dropped = reconciliation.dropped_rows();
    if dropped > 0 {
        print_info(&format!("{dropped} malformed row(s) were skipped"));
    }
}

/// Print a short summary of the session
pub fn display_session(session: &Session) {
    println!("{}", "═".repeat(60).dimmed());
    println!("{} {}", "Session".cyan().bold(), session.id.to_string().cyan());
    println!("{}", "═".repeat(60).dimmed());
    println!("{}: {}", "Model".bold(), session.model);
    println!(
        "{}: {}",
        "BRD".bold(),
        if session.has_brd() {
            format!("{} chars", session.brd_text.len())
        } else {
            "-".dimmed().to_string()
        }
    );
    if let Some(schema) = &session.schema {
        println!("{}: {}", "Columns".bold(), schema.columns().join(", "));
    }
    println!("{}: {}", "Generations".bold(), session.history.len());
    println!();
}

/// Print token usage on one dimmed line
pub fn print_usage(usage: TokenUsage) {
    println!(
        "{}",
        format!(
            "tokens: {} in / {} out / {} total",
            usage.input_tokens, usage.output_tokens, usage.total_tokens
        )
        .dimmed()
    );
}

/// Spinner shown while waiting on the generation service
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
