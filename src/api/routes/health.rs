//! Health Routes
//!
//! - GET /api/health - Service status, version, uptime and database check

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /api/health
///
/// Returns 200 while the database answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = state.service.database_ok().await;

    let (status, code) = if database_ok {
        ("healthy", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        database: if database_ok { "ok" } else { "error" }.to_string(),
    };

    (code, Json(body))
}
