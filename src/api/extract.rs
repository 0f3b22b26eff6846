//! Request extractors
//!
//! - [`AuthUser`]: requires a valid `Authorization: Bearer <token>` header
//! - [`MaybeAuthUser`]: the same, but anonymous requests pass through
//! - [`ApiJson`]: `Json` whose rejections become [`ApiError::InvalidPayload`]

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiError;
use super::state::AppState;
use crate::auth::bearer_token;
use crate::service::ServiceError;

/// The signed-in user making the request
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("authorization header required"))?;

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::unauthorized("invalid authorization header format"))?;

        let user_id = state
            .service
            .authenticate(token)
            .await
            .map_err(|err| match err {
                ServiceError::Auth(_) => ApiError::unauthorized("invalid or expired token"),
                other => ApiError::from(other),
            })?;

        Ok(AuthUser { user_id })
    }
}

/// The viewer, when the request carries a valid token
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let viewer = AuthUser::from_request_parts(parts, state)
            .await
            .ok()
            .map(|user| user.user_id);
        Ok(MaybeAuthUser(viewer))
    }
}

/// JSON body extractor and response with the API's error shape
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
