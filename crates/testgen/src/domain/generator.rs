//! Generator domain: the BRD and test case flows.
//!
//! Each flow is strictly sequential: check preconditions, build the
//! prompt, make one generation call, then update the caller's session.

use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::{
    AIMessage, AIProvider, AIResponse, GeminiProvider, GenerateOptions, PromptBuilder,
    ProviderRegistry, TokenUsage,
};
use crate::entities::{ModelSettings, Schema, Session, TestgenConfig};
use crate::errors::{TestgenError, TestgenResult};
use crate::reconcile::{reconcile, Reconciliation};

/// Result of one test case generation.
#[derive(Debug, Clone)]
pub struct TestCaseRun {
    pub reconciliation: Reconciliation,
    pub usage: TokenUsage,
    /// The service answered without candidate text
    pub no_candidates: bool,
}

/// Generation flows over a provider registry.
pub struct GeneratorDomain {
    registry: ProviderRegistry,
    prompts: PromptBuilder,
    settings: ModelSettings,
}

impl GeneratorDomain {
    /// Create with providers read from the environment.
    pub fn new(config: &TestgenConfig) -> Self {
        Self::with_registry(config, registry_for(&config.model))
    }

    /// Create with a custom provider registry.
    pub fn with_registry(config: &TestgenConfig, registry: ProviderRegistry) -> Self {
        Self {
            registry,
            prompts: PromptBuilder::new(config.prompt.clone()),
            settings: config.model.clone(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// A fresh session on the configured model.
    pub fn new_session(&self, schema: Option<Schema>) -> Session {
        Session::new(self.settings.model_id.clone(), schema)
    }

    /// Generate a BRD for `use_case` and store it in the session.
    ///
    /// A blank use case fails with `EmptyInput` before any service call.
    pub async fn generate_brd(
        &self,
        session: &mut Session,
        use_case: &str,
        as_of: &str,
    ) -> TestgenResult<TokenUsage> {
        let prompt = self.prompts.brd_prompt(use_case, as_of)?;
        let response = self.complete(&session.model, prompt).await?;

        session.set_brd(use_case, response.text.trim().to_string());
        info!(
            session = %session.id,
            chars = session.brd_text.len(),
            "Generated BRD"
        );
        Ok(response.usage)
    }

    /// Generate test cases for the session's BRD and schema.
    ///
    /// `BrdMissing` and `SchemaMissing` block the call. Malformed replies
    /// never fail: they come back as a fallback table.
    pub async fn generate_test_cases(&self, session: &mut Session) -> TestgenResult<TestCaseRun> {
        if !session.has_brd() {
            return Err(TestgenError::BrdMissing);
        }
        let schema = session.schema.clone().ok_or(TestgenError::SchemaMissing)?;

        let prompt = self.prompts.test_case_prompt(&session.brd_text, &schema)?;
        let response = self.complete(&session.model, prompt).await?;

        let reconciliation = reconcile(&response.text, &schema);
        info!(
            session = %session.id,
            rows = reconciliation.table.len(),
            fallback = reconciliation.is_fallback(),
            "Generated test cases"
        );

        session.record_table(reconciliation.clone());
        Ok(TestCaseRun {
            reconciliation,
            usage: response.usage,
            no_candidates: response.no_candidates,
        })
    }

    /// Reconcile a reply offline, without a session or service call.
    pub fn reconcile_only(raw_reply: &str, schema: &Schema) -> Reconciliation {
        reconcile(raw_reply, schema)
    }

    fn provider_for(&self, model: &str) -> TestgenResult<Arc<dyn AIProvider>> {
        self.registry.resolve(&self.settings.provider, model)
    }

    async fn complete(&self, model: &str, prompt: String) -> TestgenResult<AIResponse> {
        let provider = self.provider_for(model)?;
        let options = GenerateOptions {
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            ..Default::default()
        };

        let response = provider
            .generate_text(model, &[AIMessage::user(prompt)], &options)
            .await?;
        if response.no_candidates {
            warn!(model, provider = provider.name(), "No candidates, continuing with empty text");
        }
        Ok(response)
    }
}

/// Default registry, with the configured provider pointed at `base_url` if set.
fn registry_for(settings: &ModelSettings) -> ProviderRegistry {
    let registry = ProviderRegistry::with_defaults();

    if let Some(url) = settings.base_url.as_deref() {
        match settings.provider.as_str() {
            "gemini" => registry.register(Arc::new(GeminiProvider::default().with_base_url(url))),
            other => warn!(provider = other, "baseURL set for unknown provider, ignoring"),
        }
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies and records the prompts it receives.
    struct Scripted {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|r| (*r).to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AIProvider for Scripted {
        fn name(&self) -> &'static str {
            "gemini"
        }
        fn api_key_env_var(&self) -> &'static str {
            "GOOGLE_API_KEY"
        }
        fn is_configured(&self) -> bool {
            true
        }
        fn supported_models(&self) -> Vec<&str> {
            vec!["gemini-2.0-flash-exp"]
        }
        async fn generate_text(
            &self,
            model: &str,
            messages: &[AIMessage],
            _options: &GenerateOptions,
        ) -> TestgenResult<AIResponse> {
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            let text = self.replies.lock().unwrap().pop().unwrap_or_default();
            Ok(AIResponse {
                text,
                usage: TokenUsage::default(),
                model: model.to_string(),
                provider: "gemini".to_string(),
                no_candidates: false,
            })
        }
    }

    fn domain(provider: Arc<Scripted>) -> GeneratorDomain {
        let registry = ProviderRegistry::new();
        registry.register(provider);
        GeneratorDomain::with_registry(&TestgenConfig::default(), registry)
    }

    #[tokio::test]
    async fn test_brd_then_test_cases() {
        let provider = Scripted::new(&["  The BRD  \n", "\"A\",\"B\"\n\"1\",\"2\""]);
        let domain = domain(provider.clone());
        let mut session = domain.new_session(Some(Schema::new(["A", "B"]).unwrap()));

        domain
            .generate_brd(&mut session, "Issue a policy", "October 17, 2026")
            .await
            .unwrap();
        assert_eq!(session.brd_text, "The BRD");

        let run = domain.generate_test_cases(&mut session).await.unwrap();
        assert!(!run.reconciliation.is_fallback());
        assert_eq!(session.table.as_ref().unwrap().rows(), [vec!["1", "2"]]);
        assert_eq!(session.history.len(), 1);

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Issue a policy"));
        assert!(prompts[1].contains("BRD:\nThe BRD"));
    }

    #[tokio::test]
    async fn test_preconditions_block_service_call() {
        let provider = Scripted::new(&[]);
        let domain = domain(provider.clone());

        let mut session = domain.new_session(None);
        assert!(matches!(
            domain.generate_brd(&mut session, "   ", "today").await,
            Err(TestgenError::EmptyInput)
        ));
        assert!(matches!(
            domain.generate_test_cases(&mut session).await,
            Err(TestgenError::BrdMissing)
        ));

        session.set_brd("uc", "BRD".to_string());
        assert!(matches!(
            domain.generate_test_cases(&mut session).await,
            Err(TestgenError::SchemaMissing)
        ));
        assert!(provider.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_model_rejected() {
        let domain = domain(Scripted::new(&["x"]));
        let mut session = domain.new_session(None);
        session.select_model("no-such-model");
        assert!(matches!(
            domain.generate_brd(&mut session, "uc", "today").await,
            Err(TestgenError::ModelNotSupported { .. })
        ));
    }
}
