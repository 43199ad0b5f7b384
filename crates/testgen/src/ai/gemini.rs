//! Google Gemini provider implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{TestgenError, TestgenResult};

use super::provider::{AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, TokenUsage};

/// Gemini API base URL
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Supported Gemini models
const SUPPORTED_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// One text part of a content block
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// A content block (one conversation turn)
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart { text: Some(text) }],
        }
    }
}

/// Generation parameters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

/// Gemini generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

/// Gemini response candidate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[allow(dead_code)]
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Gemini usage metadata
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_field_names)]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
}

impl GeminiResponse {
    /// Text of the first candidate, or None when there is nothing usable.
    fn candidate_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let texts: Vec<&str> = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Gemini API error
#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    #[allow(dead_code)]
    #[serde(default)]
    status: Option<String>,
}

/// Gemini API error response
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

/// Google Gemini provider.
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    /// Create from environment variable.
    pub fn from_env() -> TestgenResult<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok();
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    /// Set a custom base URL (proxies, regional endpoints, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Split messages into a system instruction and conversation turns.
    fn convert_messages(messages: &[AIMessage]) -> (Option<GeminiContent>, Vec<GeminiContent>) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == AIRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let system_instruction = if system.is_empty() {
            None
        } else {
            Some(GeminiContent::text(None, system.join("\n\n")))
        };

        let contents = messages
            .iter()
            .filter_map(|msg| match msg.role {
                AIRole::System => None,
                AIRole::User => Some(GeminiContent::text(Some("user"), msg.content.clone())),
                AIRole::Assistant => {
                    Some(GeminiContent::text(Some("model"), msg.content.clone()))
                }
            })
            .collect();

        (system_instruction, contents)
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn api_key_env_var(&self) -> &'static str {
        "GOOGLE_API_KEY"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn supported_models(&self) -> Vec<&str> {
        SUPPORTED_MODELS.to_vec()
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> TestgenResult<AIResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| TestgenError::ProviderNotConfigured {
                provider: "gemini (set GOOGLE_API_KEY)".to_string(),
            })?;

        let (system_instruction, contents) = Self::convert_messages(messages);

        let request = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                stop_sequences: options.stop_sequences.clone(),
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(%url, "Sending Gemini generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TestgenError::AiTimeout
                } else {
                    TestgenError::Ai(format!("Gemini API request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TestgenError::Ai(format!("Failed to read response: {e}")))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TestgenError::AiRateLimitExceeded);
        }

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                return Err(TestgenError::Ai(format!(
                    "Gemini API error: {}",
                    error_response.error.message
                )));
            }
            return Err(TestgenError::Ai(format!(
                "Gemini API error ({status}): {body}"
            )));
        }

        let api_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| TestgenError::Ai(format!("Failed to parse response: {e}")))?;

        let text = api_response.candidate_text();
        let no_candidates = text.is_none();
        if no_candidates {
            warn!(model, "Gemini returned no candidate text");
        }

        let usage = api_response.usage_metadata.unwrap_or_default();

        Ok(AIResponse {
            text: text.unwrap_or_default(),
            usage: TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            },
            model: api_response
                .model_version
                .unwrap_or_else(|| model.to_string()),
            provider: "gemini".to_string(),
            no_candidates,
        })
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|_| Self {
            client: Client::new(),
            api_key: None,
            base_url: GEMINI_API_URL.to_string(),
        })
    }
}

/// Get the default Gemini model.
pub fn default_model() -> &'static str {
    DEFAULT_MODEL
}
