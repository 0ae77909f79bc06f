use acd_core::{clean, complete, document, Error, Keyspace, Store};
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct CompleteParams {
    /// Search terms separated by whitespace; every term must match.
    pub q: String,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub terms: Vec<String>,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub keys: Keyspace,
    pub admin_token: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(err: Error) -> ApiError {
    let status = if err.is_invalid_query() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/complete", get(complete_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/admin/clean", post(clean_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn complete_handler(
    State(state): State<AppState>,
    Query(params): Query<CompleteParams>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let start = std::time::Instant::now();
    let terms: Vec<String> = params.q.split_whitespace().map(str::to_owned).collect();
    let results: Vec<String> = complete(&*state.store, &state.keys, terms.as_slice())
        .map_err(api_error)?
        .into_iter()
        .flatten()
        .collect();
    let elapsed = start.elapsed();
    tracing::debug!(q = %params.q, hits = results.len(), "completed");
    Ok(Json(CompleteResponse { terms, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u64>,
) -> Result<Json<acd_core::Document>, ApiError> {
    match document(&*state.store, &state.keys, doc_id).map_err(api_error)? {
        Some(doc) => Ok(Json(doc)),
        None => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))),
    }
}

async fn clean_handler(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<acd_core::CleanReport>, ApiError> {
    authorize(&state, &headers)?;
    let report = clean(&*state.store, &state.keys).map_err(api_error)?;
    Ok(Json(report))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap) -> Result<(), ApiError> {
    let unauthorized = |msg: &str| (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "error": msg })));
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(unauthorized("ADMIN_TOKEN not set")),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(unauthorized("invalid admin token"))
    }
}
