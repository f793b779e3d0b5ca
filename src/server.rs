//! HTTP API over the sync service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/sync/user` | Sync one user (`all`, `transactions`, `accounts`, `profile`) |
//! | `POST` | `/sync/batch` | Queue a full sync for a list of users (202) |
//! | `GET`  | `/sync/status/{user_id}` | What the store holds for a user |
//! | `GET`  | `/collections` | Collection names in the document store |
//! | `GET`  | `/documents/{kind}/{user_id}` | Mirrored documents of one kind |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "user_id must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500). Per-entity sync
//! failures are not HTTP errors; they come back inside `details` with
//! `status: "error"`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use ledger_mirror_core::store::StoredObject;
use ledger_mirror_core::{EntityKind, SyncService, SyncStatusReport};

use crate::config::Config;
use crate::service::{self, SyncReport, SyncType};

#[derive(Clone)]
struct AppState {
    service: Arc<SyncService>,
}

/// Build the router. Split from [`run_server`] so tests can serve it on an
/// ephemeral port.
pub fn router(service: Arc<SyncService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/sync/user", post(handle_sync_user))
        .route("/sync/batch", post(handle_sync_batch))
        .route("/sync/status/{user_id}", get(handle_sync_status))
        .route("/collections", get(handle_collections))
        .route("/documents/{kind}/{user_id}", get(handle_documents))
        .layer(cors)
        .with_state(AppState { service })
}

/// Connect to both backends and serve until the process is stopped.
///
/// # Arguments
///
/// - `config`: loaded configuration; `server.bind` is the listen address.
///
/// # Returns
///
/// Only returns once the server stops.
///
/// # Errors
///
/// Returns an error if [`service::connect`] fails or the bind address is
/// unavailable.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = Arc::new(service::connect(config).await?);
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "sync server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Store read failures. The full chain is logged; the client gets the
/// top-level message.
fn internal(err: anyhow::Error) -> AppError {
    error!(error = %format!("{:#}", err), "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
    }
}

fn require_user(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(bad_request("user_id must not be empty"));
    }
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /sync/user ============

#[derive(Deserialize)]
struct SyncUserRequest {
    user_id: String,
    #[serde(default = "default_sync_type")]
    sync_type: String,
    limit: Option<usize>,
}

fn default_sync_type() -> String {
    "all".to_string()
}

#[derive(Serialize)]
struct SyncUserResponse {
    status: String,
    message: String,
    details: SyncReport,
}

/// Runs the requested sync inline. The HTTP status is 200 even when an
/// entity failed; callers inspect `details`.
async fn handle_sync_user(
    State(state): State<AppState>,
    Json(req): Json<SyncUserRequest>,
) -> Result<Json<SyncUserResponse>, AppError> {
    require_user(&req.user_id)?;
    let sync_type: SyncType = req.sync_type.parse().map_err(bad_request)?;

    let details = service::run_sync(&state.service, sync_type, &req.user_id, req.limit).await;

    Ok(Json(SyncUserResponse {
        status: "success".to_string(),
        message: format!("Sync completed for user {}", req.user_id),
        details,
    }))
}

// ============ POST /sync/batch ============

#[derive(Serialize)]
struct BatchAccepted {
    status: String,
    message: String,
    details: BatchDetails,
}

#[derive(Serialize)]
struct BatchDetails {
    user_count: usize,
}

/// Accepts the batch and runs it on a background task.
async fn handle_sync_batch(
    State(state): State<AppState>,
    Json(user_ids): Json<Vec<String>>,
) -> Result<(StatusCode, Json<BatchAccepted>), AppError> {
    if user_ids.is_empty() {
        return Err(bad_request("user_ids must not be empty"));
    }
    if user_ids.iter().any(|u| u.trim().is_empty()) {
        return Err(bad_request("user_ids must not contain empty ids"));
    }

    let user_count = user_ids.len();
    let service = state.service.clone();
    tokio::spawn(async move {
        service.sync_users(&user_ids).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchAccepted {
            status: "accepted".to_string(),
            message: format!("Batch sync queued for {} users", user_count),
            details: BatchDetails { user_count },
        }),
    ))
}

// ============ GET /sync/status/{user_id} ============

async fn handle_sync_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SyncStatusReport>, AppError> {
    require_user(&user_id)?;
    let report = state.service.sync_status(&user_id).await.map_err(internal)?;
    Ok(Json(report))
}

// ============ GET /collections ============

#[derive(Serialize)]
struct CollectionsResponse {
    collections: Vec<String>,
}

async fn handle_collections(
    State(state): State<AppState>,
) -> Result<Json<CollectionsResponse>, AppError> {
    let collections = state.service.list_collections().await.map_err(internal)?;
    Ok(Json(CollectionsResponse { collections }))
}

// ============ GET /documents/{kind}/{user_id} ============

#[derive(Deserialize)]
struct DocumentsQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct DocumentsResponse {
    collection: String,
    user_id: String,
    count: usize,
    documents: Vec<StoredObject>,
}

async fn handle_documents(
    State(state): State<AppState>,
    Path((kind, user_id)): Path<(String, String)>,
    Query(query): Query<DocumentsQuery>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let kind: EntityKind = kind.parse().map_err(bad_request)?;
    require_user(&user_id)?;

    let documents = state
        .service
        .fetch_documents(kind, &user_id, query.limit)
        .await
        .map_err(internal)?;

    Ok(Json(DocumentsResponse {
        collection: kind.collection().to_string(),
        user_id,
        count: documents.len(),
        documents,
    }))
}
