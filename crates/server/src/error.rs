use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Client error with a short code-like label and a human-readable hint.
    #[error("{error}: {message}")]
    BadRequest { error: String, message: String },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest { error, message } => (StatusCode::BAD_REQUEST, error, message),
            ApiError::Internal(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch portfolio data".to_string(),
                reason,
            ),
        };
        if status.is_server_error() {
            tracing::error!("{error}: {message}");
        }
        (status, Json(ApiResponse::<()>::failure(error, message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
