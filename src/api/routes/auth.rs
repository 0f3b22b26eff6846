//! Auth Routes
//!
//! - POST /api/auth/signup - Create an account
//! - POST /api/auth/login - Exchange credentials for a bearer token

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use crate::api::dto::{LoginRequest, SignupRequest};
use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::domain::{Session, User};

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, ApiJson<User>)> {
    let user = state
        .service
        .create_user(&req.username, &req.email, &req.password)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(user)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<ApiJson<Session>> {
    let session = state.service.login_user(&req.identifier, &req.password).await?;
    tracing::info!(user_id = %session.user.id, "User logged in");
    Ok(ApiJson(session))
}
