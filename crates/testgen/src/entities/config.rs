//! Configuration entities.

use serde::{Deserialize, Serialize};

use crate::errors::TestgenResult;

use super::schema::{Schema, DEFAULT_COLUMNS};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TestgenConfig {
    /// Generation model settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Prompt wording knobs
    #[serde(default)]
    pub prompt: PromptProfile,

    /// Schema source settings
    #[serde(default)]
    pub template: TemplateSettings,

    /// HTTP shell settings
    #[serde(default)]
    pub server: ServerSettings,
}

impl TestgenConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }
}

/// Individual model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider name (e.g., "gemini")
    pub provider: String,

    /// Model ID
    #[serde(rename = "modelId")]
    pub model_id: String,

    /// Maximum tokens
    #[serde(default = "default_max_tokens", rename = "maxTokens")]
    pub max_tokens: u32,

    /// Temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional base URL override
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "baseURL")]
    pub base_url: Option<String>,
}

const fn default_max_tokens() -> u32 {
    8192
}

const fn default_temperature() -> f32 {
    0.4
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model_id: "gemini-2.0-flash-exp".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: None,
        }
    }
}

/// Prompt wording that differs between deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptProfile {
    /// Product the use cases describe
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Fixed number of test cases to request (None = model decides)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case_count: Option<u32>,

    /// Transaction categories the table should cover
    #[serde(default = "default_transaction_types")]
    pub transaction_types: Vec<String>,

    /// Ask for at least one test case per transaction category
    #[serde(default = "default_true")]
    pub require_each_transaction_type: bool,
}

fn default_product_name() -> String {
    "Guidewire PolicyCenter".to_string()
}

fn default_transaction_types() -> Vec<String> {
    [
        "Submission",
        "Policy Change",
        "Cancellation",
        "Rewrite",
        "Reinstatement",
    ]
    .iter()
    .map(|t| (*t).to_string())
    .collect()
}

const fn default_true() -> bool {
    true
}

impl Default for PromptProfile {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            test_case_count: None,
            transaction_types: default_transaction_types(),
            require_each_transaction_type: true,
        }
    }
}

/// Schema source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    /// Columns used when no template is uploaded (empty = none)
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,
}

fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|c| (*c).to_string()).collect()
}

impl TemplateSettings {
    /// The configured default schema; `None` when no defaults are configured.
    pub fn default_schema(&self) -> TestgenResult<Option<Schema>> {
        if self.default_columns.is_empty() {
            return Ok(None);
        }
        Schema::new(self.default_columns.iter().cloned()).map(Some)
    }
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            default_columns: default_columns(),
        }
    }
}

/// HTTP shell settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}
