//! Account Routes
//!
//! - GET /api/me - The signed-in user
//! - DELETE /api/me - Delete the account and everything it owns
//! - POST /api/me/avatar - Upload a JPEG or PNG avatar (multipart field `avatar`)

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::api::dto::AvatarResponse;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiJson, AuthUser};
use crate::api::state::AppState;
use crate::domain::User;

const AVATAR_FIELD: &str = "avatar";

/// GET /api/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<ApiJson<User>> {
    Ok(ApiJson(state.service.get_user(auth.user_id).await?))
}

/// DELETE /api/me
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<StatusCode> {
    state.service.delete_user(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/me/avatar
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiJson<AvatarResponse>> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let data = field.bytes().await?;
        let avatar_url = state.service.update_user_avatar(auth.user_id, &data).await?;
        return Ok(ApiJson(AvatarResponse { avatar_url }));
    }

    Err(ApiError::BadRequest(format!("missing file field '{AVATAR_FIELD}'")))
}
