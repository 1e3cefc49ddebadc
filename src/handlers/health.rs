//! Liveness endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    project: String,
    version: String,
    environment: String,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// GET /health. Never touches the database.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = &state.config;

    Json(HealthResponse {
        status: "UP",
        project: config.project_name.clone(),
        version: config.project_version.clone(),
        environment: config.environment.clone(),
        timestamp: chrono::Utc::now(),
    })
}
