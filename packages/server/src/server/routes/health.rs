use axum::{extract::Extension, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    isolation: String,
    active_jobs: usize,
    started_at: DateTime<Utc>,
}

/// Health check endpoint
///
/// Reports the job slot policy and how many scrape jobs are in flight.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            isolation: state.slots.label().to_string(),
            active_jobs: state.active_jobs(),
            started_at: state.started_at,
        }),
    )
}
