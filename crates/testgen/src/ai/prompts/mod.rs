//! Prompt template system.
//!
//! This module provides:
//! - Handlebars-based prompt templates (HTML escaping disabled)
//! - The `brd` and `test-cases` templates
//! - `PromptBuilder`, which couples the templates with a `PromptProfile`

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use crate::entities::{PromptProfile, Schema};
use crate::errors::{TestgenError, TestgenResult};

mod brd;
mod test_cases;

pub use brd::BrdContext;
pub use test_cases::TestCaseContext;

/// Template id of the BRD prompt.
pub const BRD_TEMPLATE: &str = "brd";

/// Template id of the test case prompt.
pub const TEST_CASES_TEMPLATE: &str = "test-cases";

/// A single-message prompt template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub id: String,
    pub version: String,
    pub description: String,
    /// Handlebars source of the prompt body
    pub body: String,
}

impl PromptTemplate {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: "1.0.0".to_string(),
            description: String::new(),
            body: body.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Render the template with the given context.
    pub fn render<T: Serialize>(&self, context: &T) -> TestgenResult<String> {
        let mut handlebars = create_handlebars();

        handlebars
            .register_template_string(&self.id, &self.body)
            .map_err(|e| TestgenError::Ai(format!("Invalid prompt template '{}': {e}", self.id)))?;

        handlebars
            .render(&self.id, context)
            .map_err(|e| TestgenError::Ai(format!("Failed to render prompt '{}': {e}", self.id)))
    }
}

/// Create a Handlebars instance with custom helpers.
fn create_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    // Helper: {{join values}} -> "a, b, c"
    handlebars.register_helper(
        "join",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output| {
                let separator = h
                    .param(1)
                    .and_then(|v| v.value().as_str())
                    .unwrap_or(", ");
                if let Some(values) = h.param(0).and_then(|v| v.value().as_array()) {
                    let joined = values
                        .iter()
                        .filter_map(serde_json::Value::as_str)
                        .collect::<Vec<_>>()
                        .join(separator);
                    out.write(&joined)?;
                }
                Ok(())
            },
        ),
    );

    handlebars
}

/// Registry of prompt templates by id.
pub struct PromptManager {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptManager {
    /// Create a manager with the built-in templates.
    pub fn new() -> Self {
        let mut manager = Self {
            templates: HashMap::new(),
        };
        manager.register(brd::template());
        manager.register(test_cases::template());
        manager
    }

    /// Register a template, replacing any with the same id.
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.get(id)
    }

    pub fn render<T: Serialize>(&self, id: &str, context: &T) -> TestgenResult<String> {
        let template = self
            .get(id)
            .ok_or_else(|| TestgenError::Ai(format!("Template '{id}' not found")))?;
        template.render(context)
    }

    /// List all template ids, sorted.
    pub fn template_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the two generation prompts. Pure string construction.
pub struct PromptBuilder {
    manager: PromptManager,
    profile: PromptProfile,
}

impl PromptBuilder {
    pub fn new(profile: PromptProfile) -> Self {
        Self {
            manager: PromptManager::new(),
            profile,
        }
    }

    /// Use a custom template set (e.g. reworded prompts).
    pub fn with_manager(mut self, manager: PromptManager) -> Self {
        self.manager = manager;
        self
    }

    pub fn profile(&self) -> &PromptProfile {
        &self.profile
    }

    /// Prompt asking for a BRD of `use_case`, dated `as_of`.
    ///
    /// Fails with `EmptyInput` when the use case is blank.
    pub fn brd_prompt(&self, use_case: &str, as_of: &str) -> TestgenResult<String> {
        if use_case.trim().is_empty() {
            return Err(TestgenError::EmptyInput);
        }

        let context = BrdContext {
            product_name: self.profile.product_name.clone(),
            as_of: as_of.to_string(),
            use_case: use_case.to_string(),
        };
        let prompt = self.manager.render(BRD_TEMPLATE, &context)?;
        debug!(chars = prompt.len(), "Built BRD prompt");
        Ok(prompt)
    }

    /// Prompt asking for a quoted CSV table of test cases for `brd`.
    ///
    /// Fails with `BrdMissing` when the BRD is blank.
    pub fn test_case_prompt(&self, brd: &str, schema: &Schema) -> TestgenResult<String> {
        if brd.trim().is_empty() {
            return Err(TestgenError::BrdMissing);
        }

        let context = TestCaseContext::new(&self.profile, brd, schema);
        let prompt = self.manager.render(TEST_CASES_TEMPLATE, &context)?;
        debug!(
            chars = prompt.len(),
            columns = schema.len(),
            "Built test case prompt"
        );
        Ok(prompt)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(PromptProfile::default())
    }
}

/// BRD prompt with the default profile.
pub fn build_brd_prompt(use_case: &str, as_of: &str) -> TestgenResult<String> {
    PromptBuilder::default().brd_prompt(use_case, as_of)
}

/// Test case prompt with the default profile.
pub fn build_test_case_prompt(brd: &str, schema: &Schema) -> TestgenResult<String> {
    PromptBuilder::default().test_case_prompt(brd, schema)
}

/// Format a date the way BRD prompts show it, e.g. "October 17, 2026".
pub fn format_as_of(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Today's local date in BRD prompt format.
pub fn as_of_today() -> String {
    format_as_of(Local::now().date_naive())
}
