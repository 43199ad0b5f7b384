//! Test case prompt template.
//!
//! The reply is parsed by the reconciler, so the template spells out
//! the CSV contract: every field quoted, no fences, an exact header
//! line and real line breaks inside Steps.

use serde::Serialize;

use crate::entities::{PromptProfile, Schema};

use super::{PromptTemplate, TEST_CASES_TEMPLATE};

/// Context for the test case prompt.
#[derive(Debug, Clone, Serialize)]
pub struct TestCaseContext {
    pub product_name: String,
    pub test_case_count: Option<u32>,
    pub columns: Vec<String>,
    /// Literal header line the reply must reproduce
    pub header_line: String,
    pub has_status: bool,
    pub has_steps: bool,
    pub transaction_types: Vec<String>,
    pub require_each_transaction_type: bool,
    pub brd: String,
}

impl TestCaseContext {
    pub fn new(profile: &PromptProfile, brd: &str, schema: &Schema) -> Self {
        Self {
            product_name: profile.product_name.clone(),
            test_case_count: profile.test_case_count.filter(|n| *n > 0),
            columns: schema.columns().to_vec(),
            header_line: schema.quoted_header(),
            has_status: schema.contains("Status"),
            has_steps: schema.contains("Steps"),
            transaction_types: profile.transaction_types.clone(),
            require_each_transaction_type: profile.require_each_transaction_type
                && !profile.transaction_types.is_empty(),
            brd: brd.to_string(),
        }
    }
}

pub fn template() -> PromptTemplate {
    PromptTemplate::new(TEST_CASES_TEMPLATE, BODY)
        .with_description("Generate a quoted CSV table of QA test cases from a BRD")
}

const BODY: &str = r#"You are a QA test case generator for {{product_name}}. Based on the BRD below, do the following:

1. Automatically detect the transaction type (e.g., New Business, Policy Change, etc.).
2. Generate {{#if test_case_count}}{{test_case_count}} {{/if}}detailed test cases.
3. Each test case must include these columns, in this order: {{join columns}}.{{#if has_status}} Set Status = Draft.{{/if}}
4. Include additional scenarios based on the BRD (both Positive and Negative).{{#if require_each_transaction_type}}
5. Include at least one test case of each transaction type ({{join transaction_types}}) wherever it is relevant to the BRD.{{/if}}

Output strict CSV format (comma-separated). Wrap all fields in double quotes, even multiline ones.
Do NOT include markdown or ``` formatting.

Use the exact headers below:
{{header_line}}
{{#if has_steps}}
In the Steps field, number each step (e.g., 1. Do this, 2. Do that, 3. ...). Do not use "\n" or any escape characters. Each new step should be on a new line inside the cell using a real line break, not the characters "\n".{{/if}}
If you are unsure about a column, leave it blank.

BRD:
{{brd}}"#;
