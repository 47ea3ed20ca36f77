//! JSON HTTP API for the jar cache.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/cookies` | Create a jar from `{"curl_cmd": "..."}` |
//! | `GET` | `/cookies?url=...` | Hand out the best jar for a URL, recording a pending call |
//! | `PATCH` | `/calls/{id}` | Report the outcome of a call |
//! | `GET` | `/jars/{id}` | A jar with its call history |
//! | `DELETE` | `/jars/{id}` | Delete a jar and its calls |
//! | `GET` | `/domains` | Every domain with its active jar and recent calls |
//! | `GET` | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no usable jar for domain: example.com" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `conflict` (409),
//! `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crustula_core::models::{Call, CallUpdate, CallWithJar, DomainSummary, Jar, JarWithCalls};
use crustula_core::selector::SelectionPolicy;
use crustula_core::service;
use crustula_core::store::Store;
use crustula_core::CrustulaError;

use crate::config::Config;
use crate::db;
use crate::migrate::migrate_pool;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn Store>,
    policy: SelectionPolicy,
    recent_calls: usize,
}

/// Starts the HTTP server on `[server].bind`.
///
/// Migrations run first, so a fresh database works without `crustula init`.
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));

    let app = router(store, config);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router over any store backend.
pub fn router(store: Arc<dyn Store>, config: &Config) -> Router {
    let state = AppState {
        store,
        policy: config.selection_policy(),
        recent_calls: config.domains.recent_calls,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cookies", get(handle_get_cookies).post(handle_create_jar))
        .route("/calls/{id}", patch(handle_update_call))
        .route("/jars/{id}", get(handle_get_jar).delete(handle_delete_jar))
        .route("/domains", get(handle_domains))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
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
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<CrustulaError> for AppError {
    fn from(err: CrustulaError) -> Self {
        let (status, code) = match &err {
            CrustulaError::MalformedCurl(_) | CrustulaError::MissingUrl => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            CrustulaError::JarNotFound(_)
            | CrustulaError::CallNotFound(_)
            | CrustulaError::NoUsableJar(_) => (StatusCode::NOT_FOUND, "not_found"),
            CrustulaError::CallAlreadyReported(_) => (StatusCode::CONFLICT, "conflict"),
            CrustulaError::Store(e) => {
                tracing::error!("store failure: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
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

// ============ /cookies ============

#[derive(Deserialize)]
struct JarCreate {
    curl_cmd: String,
}

/// Handler for `POST /cookies`.
async fn handle_create_jar(
    State(state): State<AppState>,
    Json(body): Json<JarCreate>,
) -> Result<Json<Jar>, AppError> {
    let jar = service::create_jar(state.store.as_ref(), &body.curl_cmd, Utc::now()).await?;
    Ok(Json(jar))
}

#[derive(Deserialize)]
struct CookiesQuery {
    url: String,
}

/// Handler for `GET /cookies?url=...`.
///
/// Returns the new pending call with the jar embedded; the caller reports
/// the outcome through `PATCH /calls/{id}`.
async fn handle_get_cookies(
    State(state): State<AppState>,
    Query(query): Query<CookiesQuery>,
) -> Result<Json<CallWithJar>, AppError> {
    let result =
        service::checkout_jar(state.store.as_ref(), &query.url, Utc::now(), &state.policy).await;
    match result {
        Ok(out) => Ok(Json(out)),
        Err(e @ CrustulaError::NoUsableJar(_)) => {
            tracing::info!(url = %query.url, "{}", e);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

// ============ /calls ============

/// Handler for `PATCH /calls/{id}`.
async fn handle_update_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<CallUpdate>,
) -> Result<Json<Call>, AppError> {
    let call = service::report_call(state.store.as_ref(), &id, &update).await?;
    Ok(Json(call))
}

// ============ /jars ============

async fn handle_get_jar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JarWithCalls>, AppError> {
    Ok(Json(service::jar_with_calls(state.store.as_ref(), &id).await?))
}

#[derive(Serialize)]
struct DeleteResponse {
    ok: bool,
}

async fn handle_delete_jar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    service::delete_jar(state.store.as_ref(), &id).await?;
    Ok(Json(DeleteResponse { ok: true }))
}

// ============ GET /domains ============

async fn handle_domains(
    State(state): State<AppState>,
) -> Result<Json<Vec<DomainSummary>>, AppError> {
    let domains =
        service::domain_overview(state.store.as_ref(), &state.policy, state.recent_calls).await?;
    Ok(Json(domains))
}
