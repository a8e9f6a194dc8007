//! Pitch HTTP REST API
//!
//! Axum-based HTTP server that exposes pitch generation and history.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function. The inner functions are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET  /health             : health check with store status
//! - GET  /version            : server version info
//! - POST /api/pitch/generate : generate a pitch without saving it
//! - POST /api/pitch/create   : save supplied content, or generate then save
//! - GET  /api/pitches        : caller's pitches, newest first
//! - GET  /api/pitches/:id    : one of the caller's pitches

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use pitch_core::config::HttpConfig;
use pitch_core::{
    create_generator, db, AuthError, GenerationError, IdentityProvider, MemoryPitchStore,
    PgPitchStore, PitchConfig, PitchContent, PitchError, PitchGenerator, PitchRecord, PitchStore,
    SupabaseIdentity,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::{require_owner, Owner};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn PitchStore>,
    pub generator: Arc<dyn PitchGenerator>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl HttpState {
    /// Build every collaborator once from config.
    pub async fn from_config(config: &PitchConfig) -> Result<Self, PitchError> {
        let store: Arc<dyn PitchStore> = match config.store.backend.as_str() {
            "memory" => Arc::new(MemoryPitchStore::new()),
            _ => {
                let pool = db::create_pool(&config.database).await?;
                db::ensure_schema(&pool).await?;
                Arc::new(PgPitchStore::new(pool))
            }
        };
        let generator: Arc<dyn PitchGenerator> = Arc::from(create_generator(&config.generation)?);
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(SupabaseIdentity::from_config(&config.auth)?);

        tracing::info!(
            store = store.name(),
            generator = generator.name(),
            "Pitch services ready"
        );

        Ok(Self {
            store,
            generator,
            identity,
        })
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let protected = Router::new()
        .route("/api/pitch/generate", post(generate_handler))
        .route("/api/pitch/create", post(create_handler))
        .route("/api/pitches", get(list_handler))
        .route("/api/pitches/:id", get(get_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_owner));

    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .merge(protected)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: HttpState,
    config: HttpConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);

    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Pitch HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct GenerateRequest {
    pub idea: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateRequest {
    pub idea: Option<String>,
    /// Previously generated content; `response` is accepted as an alias.
    #[serde(alias = "response")]
    pub content: Option<serde_json::Value>,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

/// HTTP status for a pitch error.
pub fn status_for(err: &PitchError) -> StatusCode {
    match err {
        PitchError::InvalidInput(_) | PitchError::Generation(GenerationError::InvalidInput) => {
            StatusCode::BAD_REQUEST
        }
        PitchError::NotFound(_) => StatusCode::NOT_FOUND,
        PitchError::Auth(AuthError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
        PitchError::Auth(AuthError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        PitchError::Generation(GenerationError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        PitchError::Generation(e) if e.is_upstream() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert an error into the `(status, body)` pair every handler returns.
pub fn error_reply(err: impl Into<PitchError>) -> (StatusCode, serde_json::Value) {
    let err = err.into();
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), error = %err, "Request failed");
    } else {
        tracing::debug!(status = status.as_u16(), error = %err, "Request rejected");
    }
    let body = serde_json::to_value(ErrorResponse::new(err.to_string()))
        .unwrap_or_else(|_| serde_json::json!({ "status": "error" }));
    (status, body)
}

fn success(key: &str, data: impl Serialize) -> (StatusCode, serde_json::Value) {
    match serde_json::to_value(data) {
        Ok(value) => {
            let mut body = serde_json::Map::new();
            body.insert("status".to_string(), "success".into());
            body.insert(key.to_string(), value);
            (StatusCode::OK, serde_json::Value::Object(body))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "error": e.to_string(), "status": "error" }),
        ),
    }
}

fn required_idea(idea: Option<&str>) -> Result<&str, PitchError> {
    match idea {
        Some(i) if !i.trim().is_empty() => Ok(i),
        _ => Err(PitchError::InvalidInput("idea field is required".to_string())),
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check: asks the store for its status.
pub async fn health_inner(store: &dyn PitchStore) -> (StatusCode, serde_json::Value) {
    match store.health().await {
        Ok(store_status) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "store": store_status,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "pitch/1",
    })
}

/// Inner generate: validates the idea and runs the generator, nothing is stored.
pub async fn generate_inner(
    generator: &dyn PitchGenerator,
    req: GenerateRequest,
) -> (StatusCode, serde_json::Value) {
    let idea = match required_idea(req.idea.as_deref()) {
        Ok(i) => i,
        Err(e) => return error_reply(e),
    };

    let start = Instant::now();
    match generator.generate(idea).await {
        Ok(content) => {
            tracing::info!(
                generator = generator.name(),
                took_ms = start.elapsed().as_millis() as u64,
                "Generated pitch"
            );
            success("data", content)
        }
        Err(e) => error_reply(e),
    }
}

/// Trusts complete resubmitted content, otherwise generates. Stores exactly once.
async fn create_pitch(
    state: &HttpState,
    owner_id: &str,
    req: CreateRequest,
) -> Result<PitchRecord, PitchError> {
    let idea = required_idea(req.idea.as_deref())?;

    let content = match req.content {
        Some(value) => PitchContent::from_value(&value).ok_or_else(|| {
            PitchError::InvalidInput(
                "content must contain seven non-empty string fields".to_string(),
            )
        })?,
        None => state.generator.generate(idea).await?,
    };

    Ok(state.store.create(owner_id, idea, &content).await?)
}

/// Inner create: persists a pitch for the authenticated owner.
pub async fn create_inner(
    state: &HttpState,
    owner_id: &str,
    req: CreateRequest,
) -> (StatusCode, serde_json::Value) {
    match create_pitch(state, owner_id, req).await {
        Ok(record) => success("data", record),
        Err(e) => error_reply(e),
    }
}

/// Inner list: the owner's pitches, newest first.
pub async fn list_inner(store: &dyn PitchStore, owner_id: &str) -> (StatusCode, serde_json::Value) {
    match store.list(owner_id).await {
        Ok(records) => success("pitches", records),
        Err(e) => error_reply(e),
    }
}

/// Inner get: one pitch owned by the caller, or 404.
pub async fn get_inner(
    store: &dyn PitchStore,
    owner_id: &str,
    id: Uuid,
) -> (StatusCode, serde_json::Value) {
    match store.get(owner_id, id).await {
        Ok(Some(record)) => success("data", record),
        Ok(None) => error_reply(PitchError::NotFound(format!("pitch {}", id))),
        Err(e) => error_reply(e),
    }
}

// ============================================================================
// Axum handler wrappers (thin: delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(state.store.as_ref()).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn generate_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    let (status, body) = generate_inner(state.generator.as_ref(), req).await;
    (status, Json(body))
}

pub async fn create_handler(
    State(state): State<Arc<HttpState>>,
    Extension(owner): Extension<Owner>,
    Json(req): Json<CreateRequest>,
) -> impl IntoResponse {
    let (status, body) = create_inner(&state, &owner.0, req).await;
    (status, Json(body))
}

pub async fn list_handler(
    State(state): State<Arc<HttpState>>,
    Extension(owner): Extension<Owner>,
) -> impl IntoResponse {
    let (status, body) = list_inner(state.store.as_ref(), &owner.0).await;
    (status, Json(body))
}

pub async fn get_handler(
    State(state): State<Arc<HttpState>>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let (status, body) = get_inner(state.store.as_ref(), &owner.0, id).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================
