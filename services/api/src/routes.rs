use crate::infra::{AppState, SessionLendingService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use credi_index::error::AppError;
use credi_index::workflows::lending::{
    advice_router, lending_router, parse_submissions, score_batch, AdvicePipeline, BatchOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchScoreRequest {
    pub(crate) csv: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchScoreResponse {
    pub(crate) rows: usize,
    pub(crate) scored: usize,
    pub(crate) rejected: usize,
    pub(crate) outcomes: Vec<BatchOutcome>,
}

pub(crate) fn with_service_routes(
    service: Arc<SessionLendingService>,
    advice: Arc<AdvicePipeline>,
) -> axum::Router {
    lending_router(service)
        .merge(advice_router(advice))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/lending/batch",
            axum::routing::post(batch_score_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Score a CSV upload in one request. Rows failing intake are reported, not fatal.
pub(crate) async fn batch_score_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<BatchScoreRequest>,
) -> Result<Json<BatchScoreResponse>, AppError> {
    let submissions = parse_submissions(Cursor::new(payload.csv.into_bytes()))?;
    let outcomes = score_batch(&state.lending, submissions);

    let scored = outcomes
        .iter()
        .filter(|outcome| outcome.assessment().is_some())
        .count();

    Ok(Json(BatchScoreResponse {
        rows: outcomes.len(),
        scored,
        rejected: outcomes.len() - scored,
        outcomes,
    }))
}
