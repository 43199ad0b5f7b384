//! Generation service integration.
//!
//! This module provides:
//! - The `AIProvider` abstraction and the Gemini client
//! - Handlebars prompt templates and the `PromptBuilder`
//! - A registry resolving the client that serves a model

pub mod prompts;
pub mod provider;
pub mod registry;

// Provider implementation
pub mod gemini;

pub use gemini::GeminiProvider;
pub use prompts::{
    as_of_today, build_brd_prompt, build_test_case_prompt, format_as_of, PromptBuilder,
    PromptManager, PromptTemplate,
};
pub use provider::{AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, TokenUsage};
pub use registry::ProviderRegistry;
