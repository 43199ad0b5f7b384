//! BRD prompt template.

use serde::Serialize;

use super::{PromptTemplate, BRD_TEMPLATE};

/// Context for the BRD prompt.
#[derive(Debug, Clone, Serialize)]
pub struct BrdContext {
    pub product_name: String,
    /// Date the document is written "as of"
    pub as_of: String,
    /// Use case text, embedded verbatim
    pub use_case: String,
}

pub fn template() -> PromptTemplate {
    PromptTemplate::new(BRD_TEMPLATE, BODY)
        .with_description("Write a Business Requirements Document from a use case")
}

const BODY: &str = "Create a detailed Business Requirements Document (BRD) with today's date ({{as_of}}) based on the following {{product_name}} use case:

{{use_case}}";
