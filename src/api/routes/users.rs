//! User Routes
//!
//! - GET /api/users/search?q= - Find users by username prefix or substring
//! - GET /api/users/:username - Profile page data
//! - GET /api/users/:username/followers
//! - GET /api/users/:username/following
//! - POST /api/users/:username/follow
//! - DELETE /api/users/:username/follow

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::api::dto::SearchQuery;
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, AuthUser, MaybeAuthUser};
use crate::api::state::AppState;
use crate::domain::{ProfileData, PublicUser};

/// GET /api/users/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<ApiJson<Vec<PublicUser>>> {
    let Query(query) = query?;
    Ok(ApiJson(state.service.search_users(&query.q).await?))
}

/// GET /api/users/:username
///
/// Anonymous viewers get the same data with `isOwner`/`isFollowing` false.
pub async fn profile(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(username): Path<String>,
) -> ApiResult<ApiJson<ProfileData>> {
    Ok(ApiJson(state.service.get_profile_data(&username, viewer).await?))
}

/// GET /api/users/:username/followers
pub async fn followers(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> ApiResult<ApiJson<Vec<PublicUser>>> {
    Ok(ApiJson(state.service.followers(&username).await?))
}

/// GET /api/users/:username/following
pub async fn following(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> ApiResult<ApiJson<Vec<PublicUser>>> {
    Ok(ApiJson(state.service.following(&username).await?))
}

/// POST /api/users/:username/follow
pub async fn follow(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.follow_user(auth.user_id, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/users/:username/follow
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.unfollow_user(auth.user_id, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
