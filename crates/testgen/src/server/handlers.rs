//! Request handlers and the JSON error mapping.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::ai::{as_of_today, TokenUsage};
use crate::entities::{HistoryEntry, ReconciledTable, Schema};
use crate::errors::TestgenError;
use crate::export::{export_session, ExportFormat};
use crate::reconcile::ReconcileOutcome;
use crate::template::TemplateReader;

use super::ServerState;

/// A `TestgenError` rendered as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError(pub TestgenError);

impl From<TestgenError> for ApiError {
    fn from(e: TestgenError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_precondition() => StatusCode::BAD_REQUEST,
            TestgenError::ModelNotSupported { .. } => StatusCode::BAD_REQUEST,
            TestgenError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            TestgenError::Ai(_)
            | TestgenError::AiTimeout
            | TestgenError::AiRateLimitExceeded
            | TestgenError::ProviderNotConfigured { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sessions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSession {
    pub session_id: Uuid,
    pub model: String,
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub model: String,
    pub use_case: Option<String>,
    pub brd_text: String,
    pub columns: Option<Vec<String>>,
    pub table: Option<ReconciledTable>,
    pub outcome: Option<ReconcileOutcome>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    pub model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub model: String,
    pub history_cleared: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrdRequest {
    pub use_case: String,
    /// Defaults to today's date
    #[serde(default)]
    pub as_of: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrdResponse {
    pub brd_text: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SchemaBody {
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCasesResponse {
    pub table: ReconciledTable,
    pub outcome: ReconcileOutcome,
    pub warning: Option<String>,
    pub usage: TokenUsage,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.session_count().await,
    })
}

pub async fn create_session(State(state): State<Arc<ServerState>>) -> ApiResult<impl IntoResponse> {
    let id = state.create_session().await;
    let session = state.session(id).await?;
    let session = session.lock().await;

    Ok((
        StatusCode::CREATED,
        Json(CreatedSession {
            session_id: id,
            model: session.model.clone(),
            columns: session.schema.as_ref().map(|s| s.columns().to_vec()),
        }),
    ))
}

pub async fn get_session(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSummary>> {
    let session = state.session(id).await?;
    let session = session.lock().await;

    Ok(Json(SessionSummary {
        session_id: session.id,
        model: session.model.clone(),
        use_case: session.use_case.clone(),
        brd_text: session.brd_text.clone(),
        columns: session.schema.as_ref().map(|s| s.columns().to_vec()),
        table: session.table.clone(),
        outcome: session.outcome.clone(),
        history: session.history.clone(),
    }))
}

pub async fn select_model(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ModelRequest>,
) -> ApiResult<Json<ModelResponse>> {
    let model = request.model.trim();
    if state.generator.registry().get_for_model(model).is_none() {
        return Err(TestgenError::ModelNotSupported {
            model: model.to_string(),
        }
        .into());
    }

    let session = state.session(id).await?;
    let mut session = session.lock().await;
    let history_cleared = session.select_model(model);

    Ok(Json(ModelResponse {
        model: session.model.clone(),
        history_cleared,
    }))
}

pub async fn generate_brd(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<BrdRequest>,
) -> ApiResult<Json<BrdResponse>> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;

    let as_of = request.as_of.unwrap_or_else(as_of_today);
    let usage = state
        .generator
        .generate_brd(&mut session, request.use_case.trim(), &as_of)
        .await?;

    Ok(Json(BrdResponse {
        brd_text: session.brd_text.clone(),
        usage,
    }))
}

pub async fn set_schema(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<SchemaBody>,
) -> ApiResult<Json<SchemaBody>> {
    let schema = Schema::new(body.columns)?;

    let session = state.session(id).await?;
    let mut session = session.lock().await;
    let columns = schema.columns().to_vec();
    session.schema = Some(schema);

    Ok(Json(SchemaBody { columns }))
}

pub async fn upload_template(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<SchemaBody>> {
    let session = state.session(id).await?;

    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| TestgenError::InvalidArgument {
                reason: "Uploaded template has no file name".to_string(),
            })?;
        let bytes = field.bytes().await.map_err(invalid_upload)?;
        let schema = TemplateReader::read_bytes(&file_name, &bytes)?;

        let columns = schema.columns().to_vec();
        session.lock().await.schema = Some(schema);
        return Ok(Json(SchemaBody { columns }));
    }

    Err(TestgenError::InvalidArgument {
        reason: "Multipart body has no 'file' field".to_string(),
    }
    .into())
}

pub async fn generate_test_cases(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TestCasesResponse>> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;

    let run = state.generator.generate_test_cases(&mut session).await?;
    let warning = run.reconciliation.warning();

    Ok(Json(TestCasesResponse {
        table: run.reconciliation.table,
        outcome: run.reconciliation.outcome,
        warning,
        usage: run.usage,
    }))
}

pub async fn export(
    State(state): State<Arc<ServerState>>,
    Path((id, format)): Path<(Uuid, String)>,
) -> ApiResult<impl IntoResponse> {
    let format: ExportFormat = format.parse()?;
    let session = state.session(id).await?;
    let bytes = export_session(&*session.lock().await, format)?;

    let headers = [
        (header::CONTENT_TYPE, format.mime_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", format.file_name()),
        ),
    ];
    Ok((headers, bytes))
}

fn invalid_upload(e: axum::extract::multipart::MultipartError) -> TestgenError {
    TestgenError::InvalidArgument {
        reason: format!("Invalid upload: {e}"),
    }
}
