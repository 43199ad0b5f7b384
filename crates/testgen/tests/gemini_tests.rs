//! Integration tests for the Gemini client against a mock HTTP server.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use testgen::ai::{AIMessage, AIProvider, GeminiProvider, GenerateOptions, ProviderRegistry};
use testgen::entities::{Schema, TestgenConfig};
use testgen::{GeneratorDomain, TestgenError};

const MODEL_PATH: &str = "/models/gemini-2.0-flash-exp:generateContent";

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 40,
            "candidatesTokenCount": 12,
            "totalTokenCount": 52
        },
        "modelVersion": "gemini-2.0-flash-exp"
    })
}

fn provider(server: &MockServer) -> GeminiProvider {
    GeminiProvider::new("test-key").with_base_url(server.uri())
}

async fn generate(provider: &GeminiProvider) -> Result<testgen::ai::AIResponse, TestgenError> {
    provider
        .generate_text(
            "gemini-2.0-flash-exp",
            &[AIMessage::user("Write a BRD")],
            &GenerateOptions {
                temperature: Some(0.4),
                max_tokens: Some(256),
                ..Default::default()
            },
        )
        .await
}

mod provider_tests {
    use super::*;

    #[tokio::test]
    async fn test_request_shape_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Write a BRD" }] }],
                "generationConfig": { "maxOutputTokens": 256 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("# BRD")))
            .expect(1)
            .mount(&server)
            .await;

        let response = generate(&provider(&server)).await.unwrap();

        assert_eq!(response.text, "# BRD");
        assert_eq!(response.provider, "gemini");
        assert_eq!(response.usage.total_tokens, 52);
        assert!(!response.no_candidates);
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let response = generate(&provider(&server)).await.unwrap();

        assert!(response.text.is_empty());
        assert!(response.no_candidates);
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let result = generate(&provider(&server)).await;
        assert!(matches!(result, Err(TestgenError::AiRateLimitExceeded)));
    }

    #[tokio::test]
    async fn test_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" }
            })))
            .mount(&server)
            .await;

        let err = generate(&provider(&server)).await.unwrap_err();
        assert!(matches!(&err, TestgenError::Ai(msg) if msg.contains("API key not valid")));
    }
}

mod generator_tests {
    use super::*;

    fn generator(server: &MockServer) -> GeneratorDomain {
        let registry = ProviderRegistry::new();
        registry.register(Arc::new(provider(server)));
        GeneratorDomain::with_registry(&TestgenConfig::default(), registry)
    }

    #[tokio::test]
    async fn test_brd_then_prose_reply_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Use the exact headers below"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply("Here are some test cases you might like.")),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("  # BRD\nRenewals\n")))
            .mount(&server)
            .await;

        let generator = generator(&server);
        let mut session = generator.new_session(Some(Schema::new(["A", "B"]).unwrap()));

        generator
            .generate_brd(&mut session, "Renew a policy", "October 17, 2026")
            .await
            .unwrap();
        assert_eq!(session.brd_text, "# BRD\nRenewals");

        let run = generator.generate_test_cases(&mut session).await.unwrap();
        assert!(run.reconciliation.is_fallback());
        assert_eq!(
            run.reconciliation.table.get(0, "Output"),
            Some("Here are some test cases you might like.")
        );
        assert_eq!(session.history.len(), 1);
        assert!(session.history[0].fallback);
    }

    #[tokio::test]
    async fn test_service_error_leaves_session_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let generator = generator(&server);
        let mut session = generator.new_session(None);

        let result = generator
            .generate_brd(&mut session, "Renew a policy", "today")
            .await;
        assert!(matches!(result, Err(TestgenError::Ai(_))));
        assert!(!session.has_brd());
        assert!(session.use_case.is_none());
    }
}
