//! API route definitions.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::state::AppState;
use crate::sample::MetricSample;
use crate::storage;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", post(ingest_metric))
        .route("/summary", get(summary))
        .route("/anomalies", get(list_anomalies))
        .route("/actions", get(list_actions))
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({
        "data": data,
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn health() -> Json<Value> {
    envelope(json!({ "status": "ok" }))
}

/// Ingest one metric sample, score it, and run remediation if flagged.
/// Malformed samples get a 400 and never touch scorer state.
async fn ingest_metric(
    State(state): State<AppState>,
    Json(sample): Json<MetricSample>,
) -> (StatusCode, Json<Value>) {
    match state.engine.process(sample).await {
        Ok((verdict, action)) => (
            StatusCode::OK,
            envelope(json!({
                "verdict": verdict,
                "action": action,
            })),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn summary(State(state): State<AppState>) -> Json<Value> {
    let summary = state.engine.summary();
    envelope(json!(summary))
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

async fn list_anomalies(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> (StatusCode, Json<Value>) {
    match storage::list_recent_verdicts(&state.pool, params.limit) {
        Ok(rows) => {
            let total = rows.len();
            (
                StatusCode::OK,
                Json(json!({ "data": rows, "meta": { "total": total } })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn list_actions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> (StatusCode, Json<Value>) {
    match storage::list_recent_actions(&state.pool, params.limit) {
        Ok(rows) => {
            let total = rows.len();
            (
                StatusCode::OK,
                Json(json!({ "data": rows, "meta": { "total": total } })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}
