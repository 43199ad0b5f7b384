//! Provider registry.
//!
//! Maps provider names to client instances and resolves the client that
//! serves a given model.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::{TestgenError, TestgenResult};

use super::gemini::GeminiProvider;
use super::provider::AIProvider;

/// Registry of generation service clients.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn AIProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with the Gemini client read from the environment.
    pub fn with_defaults() -> Self {
        let registry = Self::new();

        if let Ok(provider) = GeminiProvider::from_env() {
            registry.register(Arc::new(provider));
        }

        registry
    }

    /// Register a provider, replacing any with the same name.
    pub fn register(&self, provider: Arc<dyn AIProvider>) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AIProvider>> {
        self.read().get(name).cloned()
    }

    /// Get the first configured provider.
    pub fn get_configured(&self) -> Option<Arc<dyn AIProvider>> {
        self.read().values().find(|p| p.is_configured()).cloned()
    }

    /// Get a provider that supports a specific model.
    pub fn get_for_model(&self, model: &str) -> Option<Arc<dyn AIProvider>> {
        self.read()
            .values()
            .find(|p| p.supports_model(model))
            .cloned()
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered provider names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all providers, sorted by name.
    pub fn providers(&self) -> Vec<Arc<dyn AIProvider>> {
        let mut providers: Vec<_> = self.read().values().cloned().collect();
        providers.sort_by_key(|p| p.name());
        providers
    }

    /// Get a provider, returning an error if it is not registered.
    pub fn require(&self, name: &str) -> TestgenResult<Arc<dyn AIProvider>> {
        self.get(name)
            .ok_or_else(|| TestgenError::Ai(format!("Provider '{name}' not found")))
    }

    /// Get any configured provider, returning an error if none is available.
    pub fn require_any(&self) -> TestgenResult<Arc<dyn AIProvider>> {
        self.get_configured().ok_or_else(|| {
            TestgenError::Ai(
                "No AI provider is configured. Please set GOOGLE_API_KEY"
                    .to_string(),
            )
        })
    }

    /// Resolve the provider for `model`, preferring `preferred` when it serves it.
    ///
    /// Fails when no registered provider supports the model or the one that
    /// does has no API key.
    pub fn resolve(&self, preferred: &str, model: &str) -> TestgenResult<Arc<dyn AIProvider>> {
        let provider = self
            .get(preferred)
            .filter(|p| p.supports_model(model))
            .or_else(|| self.get_for_model(model))
            .ok_or_else(|| TestgenError::ModelNotSupported {
                model: model.to_string(),
            })?;

        if !provider.is_configured() {
            return Err(TestgenError::ProviderNotConfigured {
                provider: format!("{} (set {})", provider.name(), provider.api_key_env_var()),
            });
        }
        Ok(provider)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn AIProvider>>> {
        self.providers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
