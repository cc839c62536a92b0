//! Mapping from domain errors to HTTP responses.

use super::api_types::MessageResponse;
use crate::core::appeals::{AppealError, NotifyError};
use crate::core::sessions::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

impl From<AppealError> for ApiError {
    fn from(err: AppealError) -> Self {
        if err.is_client_error() {
            return ApiError::BadRequest(err.to_string());
        }

        match err {
            AppealError::Notification {
                source: NotifyError::ChannelMissing,
                ..
            } => ApiError::Internal(NotifyError::ChannelMissing.to_string()),
            other => {
                tracing::error!(error = %other, "Appeal request failed");
                ApiError::Internal("Internal server error.".to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        tracing::error!(error = %err, "Session lookup failed");
        ApiError::Internal("Internal server error.".to_string())
    }
}
