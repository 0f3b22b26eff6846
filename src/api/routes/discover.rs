//! Discovery Routes
//!
//! - GET /api/leaderboard - Users ranked by total logged days
//! - GET /api/explore - Most recently active habit per user

use axum::extract::State;
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::domain::{ExploreEntry, LeaderboardEntry};

/// GET /api/leaderboard
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiJson<Vec<LeaderboardEntry>>> {
    Ok(ApiJson(state.service.leaderboard().await?))
}

/// GET /api/explore
pub async fn explore(State(state): State<Arc<AppState>>) -> ApiResult<ApiJson<Vec<ExploreEntry>>> {
    Ok(ApiJson(state.service.explore().await?))
}
