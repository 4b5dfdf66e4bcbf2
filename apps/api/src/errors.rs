use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::layout::LayoutError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Layout(e) => (StatusCode::BAD_REQUEST, "LAYOUT_ERROR", e.to_string()),
            AppError::Capacity(msg) => {
                tracing::warn!("Rejected request: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CAPACITY_EXCEEDED",
                    msg.clone(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
