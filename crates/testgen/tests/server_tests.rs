//! Integration tests for the HTTP form shell.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`,
//! backed by a provider that answers from the prompt it receives.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use testgen::ai::{
    AIMessage, AIProvider, AIResponse, GenerateOptions, ProviderRegistry, TokenUsage,
};
use testgen::entities::{Schema, TestgenConfig};
use testgen::server::{build_router, ServerState};
use testgen::{GeneratorDomain, TestgenResult};

/// Answers BRD prompts with a canned BRD and test case prompts with CSV
/// shaped like the default columns.
struct Echo;

#[async_trait]
impl AIProvider for Echo {
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
        vec!["gemini-2.0-flash-exp", "gemini-2.5-pro"]
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        _options: &GenerateOptions,
    ) -> TestgenResult<AIResponse> {
        let prompt = &messages[0].content;
        let text = if prompt.contains("Use the exact headers below") {
            let header = Schema::default_columns().quoted_header();
            format!(
                "```csv\n{header}\n\"TC-001\",\"Renew\",\"None\",\"1. Open\n2. Renew\",\"Renewed\",\"Policy Change\",\"Draft\",\"\"\n```"
            )
        } else {
            "Business Requirements Document\n\n| Field | Value |".to_string()
        };

        Ok(AIResponse {
            text,
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
            model: model.to_string(),
            provider: "gemini".to_string(),
            no_candidates: false,
        })
    }
}

fn app() -> Router {
    let config = TestgenConfig::default();
    let registry = ProviderRegistry::new();
    registry.register(Arc::new(Echo));
    let generator = GeneratorDomain::with_registry(&config, registry);
    let state = ServerState::with_generator(config, generator).unwrap();
    build_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["sessionId"].as_str().unwrap().to_string()
}

mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);

        create_session(&app).await;
        create_session(&app).await;
        let (_, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(body["sessions"], 2);
    }

    #[tokio::test]
    async fn test_create_session_uses_default_columns() {
        let app = app();
        let (status, body) = send(&app, Method::POST, "/api/sessions", None).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["model"], "gemini-2.0-flash-exp");
        assert_eq!(body["columns"], json!(Schema::default_columns().columns()));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app(), Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_model_selection() {
        let app = app();
        let id = create_session(&app).await;
        let uri = format!("/api/sessions/{id}/model");

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "model": "gpt-4o" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(&app, Method::PUT, &uri, Some(json!({ "model": "gemini-2.5-pro" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "gemini-2.5-pro");
        assert_eq!(body["historyCleared"], true);
    }

    #[tokio::test]
    async fn test_schema_replacement() {
        let app = app();
        let id = create_session(&app).await;
        let uri = format!("/api/sessions/{id}/schema");

        let (status, body) =
            send(&app, Method::PUT, &uri, Some(json!({ "columns": ["ID", "Scenario"] }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["columns"], json!(["ID", "Scenario"]));

        let (status, _) =
            send(&app, Method::PUT, &uri, Some(json!({ "columns": ["ID", "ID"] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, session) = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(session["columns"], json!(["ID", "Scenario"]));
    }

    #[tokio::test]
    async fn test_template_upload() {
        let app = app();
        let id = create_session(&app).await;

        let boundary = "testgen-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"template.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             \"Case\",\"Expected\"\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/sessions/{id}/template"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["columns"], json!(["Case", "Expected"]));
    }
}

mod generation_tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_use_case_rejected() {
        let app = app();
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/brd"),
            Some(json!({ "useCase": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_test_cases_need_a_brd() {
        let app = app();
        let id = create_session(&app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/test-cases"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/sessions/{id}/export/pdf"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_full_flow_and_exports() {
        let app = app();
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/brd"),
            Some(json!({ "useCase": "Renew a policy", "asOf": "October 17, 2026" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["brdText"]
            .as_str()
            .unwrap()
            .starts_with("Business Requirements Document"));
        assert_eq!(body["usage"]["total_tokens"], 15);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{id}/test-cases"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["status"], "parsed");
        assert!(body["warning"].is_null());
        assert_eq!(body["table"]["rows"][0]["Test Case Number"], "TC-001");
        assert_eq!(body["table"]["rows"][0]["Steps"], "1. Open\n2. Renew");

        let request = Request::builder()
            .uri(format!("/api/sessions/{id}/export/csv"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"test_cases.csv\""
        );
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(csv.starts_with("Test Case Number,Title,"));

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/sessions/{id}/export/docx"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, session) = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(session["useCase"], "Renew a policy");
        assert_eq!(session["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let app = app();
        let ids = futures::future::join_all((0..4).map(|_| create_session(&app))).await;

        let first = &ids[0];
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/sessions/{first}/brd"),
            Some(json!({ "useCase": "Cancel a policy" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        for id in &ids[1..] {
            let (_, session) = send(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
            assert_eq!(session["brdText"], "");
            assert!(session["useCase"].is_null());
        }
    }
}
