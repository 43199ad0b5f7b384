//! HTTP form shell.
//!
//! Provides REST API endpoints for:
//! - Health checks
//! - Creating and inspecting sessions
//! - Generating the BRD and test cases
//! - Uploading templates and downloading exports

mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::domain::GeneratorDomain;
use crate::entities::{Schema, Session, TestgenConfig};
use crate::errors::{TestgenError, TestgenResult};

pub use handlers::ApiError;

/// Server state shared across handlers.
pub struct ServerState {
    pub config: TestgenConfig,
    pub generator: GeneratorDomain,
    /// Schema new sessions start with
    default_schema: Option<Schema>,
    /// Each session is locked for the whole of an action
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl ServerState {
    /// Create state with providers read from the environment.
    pub fn new(config: TestgenConfig) -> TestgenResult<Self> {
        let generator = GeneratorDomain::new(&config);
        Self::with_generator(config, generator)
    }

    /// Create state around an existing generator.
    pub fn with_generator(config: TestgenConfig, generator: GeneratorDomain) -> TestgenResult<Self> {
        let default_schema = config.template.default_schema()?;
        Ok(Self {
            config,
            generator,
            default_schema,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Start a new session and return its id.
    pub async fn create_session(&self) -> Uuid {
        let session = self.generator.new_session(self.default_schema.clone());
        let id = session.id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, "Created session");
        id
    }

    pub async fn session(&self, id: Uuid) -> TestgenResult<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| TestgenError::SessionNotFound { id: id.to_string() })
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/{id}", get(handlers::get_session))
        .route("/api/sessions/{id}/model", put(handlers::select_model))
        .route("/api/sessions/{id}/brd", post(handlers::generate_brd))
        .route("/api/sessions/{id}/schema", put(handlers::set_schema))
        .route("/api/sessions/{id}/template", post(handlers::upload_template))
        .route("/api/sessions/{id}/test-cases", post(handlers::generate_test_cases))
        .route("/api/sessions/{id}/export/{format}", get(handlers::export))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn run_server(state: Arc<ServerState>, addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("testgen server listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
