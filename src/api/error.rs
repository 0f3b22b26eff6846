//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.
//!
//! Every error body has the shape `{"error": "<message>"}`; validation
//! failures add a `details` object mapping field names to messages.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::auth::AuthError;
use crate::service::ServiceError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Body is not the JSON the endpoint expects
    #[error("Invalid request payload")]
    InvalidPayload,

    /// Field validation failed
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload | ApiError::Validation(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        ApiError::Unauthorized(message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                status = status.as_u16(),
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                status = status.as_u16(),
                error_message = %self,
                "Request rejected"
            );
        }

        // Internal details stay in the log
        let body = match self {
            ApiError::Validation(details) => ErrorResponse {
                error: "validation failed".to_string(),
                details: Some(details),
            },
            ApiError::Internal(_) | ApiError::Io(_) => ErrorResponse {
                error: "Internal server error".to_string(),
                details: None,
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(field) => {
                ApiError::Validation(BTreeMap::from([(field.field.to_string(), field.message)]))
            }
            ServiceError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            ServiceError::Auth(AuthError::InvalidToken | AuthError::TokenExpired) => {
                ApiError::unauthorized("invalid or expired token")
            }
            ServiceError::Auth(e) => ApiError::Internal(e.to_string()),
            ServiceError::UserNotFound | ServiceError::HabitNotFound => {
                ApiError::NotFound(err.to_string())
            }
            ServiceError::AccessDenied => ApiError::Forbidden(err.to_string()),
            ServiceError::CannotFollowSelf | ServiceError::UnsupportedFileType(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ServiceError::FileTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            ServiceError::DuplicateUsername | ServiceError::DuplicateEmail => {
                ApiError::Conflict(err.to_string())
            }
            ServiceError::Repository(_) | ServiceError::FileStorage(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        ApiError::InvalidPayload
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
