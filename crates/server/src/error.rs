//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use claimbeaver_core::{ErrorResponse, InquiryError};

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}

impl From<InquiryError> for AppError {
    fn from(err: InquiryError) -> Self {
        tracing::error!(error = %err, "Inquiry failed");
        AppError::Internal(err.to_string())
    }
}
