use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::error::StockServiceError;

pub const INVALID_TERM_MESSAGE: &str = "Not a valid string!";

#[derive(Debug)]
pub enum AppError {
    NotFound,
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    ServiceUnavailable(String),
}

impl From<StockServiceError> for AppError {
    fn from(err: StockServiceError) -> Self {
        match err {
            StockServiceError::NotFound(_) => AppError::NotFound,
            StockServiceError::InvalidInput(_) => AppError::BadRequest(INVALID_TERM_MESSAGE.to_string()),
            StockServiceError::IngestInProgress => AppError::Conflict(err.to_string()),
            StockServiceError::FetchFailed(_) | StockServiceError::MalformedArchive(_) => {
                AppError::BadGateway(err.to_string())
            }
            StockServiceError::StoreUnavailable(_) => {
                tracing::error!("存储不可用: {}", err);
                AppError::ServiceUnavailable("store unavailable".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response(),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "bad request", "message": msg})),
            )
                .into_response(),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                Json(json!({"error": "conflict", "message": msg})),
            )
                .into_response(),
            AppError::BadGateway(msg) => (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": "upstream error", "message": msg})),
            )
                .into_response(),
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": "service unavailable", "message": msg})),
            )
                .into_response(),
        }
    }
}
