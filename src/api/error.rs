//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query validation or evaluation error
    #[error("Query error: {0}")]
    Query(#[from] crate::engine::EngineError),

    /// Payload decoding error
    #[error("Ingest error: {0}")]
    Ingest(#[from] crate::ingest::IngestError),

    /// Dataset registry error
    #[error("Store error: {0}")]
    Store(#[from] crate::dataset::StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use crate::dataset::StoreError;
        use crate::engine::EngineError;

        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Query(e) => match e {
                EngineError::DatasetNotFound(_) => (StatusCode::NOT_FOUND, "DATASET_NOT_FOUND"),
                EngineError::ResultTooLarge => (StatusCode::BAD_REQUEST, "RESULT_TOO_LARGE"),
                EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "QUERY_ERROR"),
            },
            ApiError::Ingest(_) => (StatusCode::BAD_REQUEST, "INGEST_ERROR"),
            ApiError::Store(e) => match e {
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "DATASET_NOT_FOUND"),
                StoreError::InvalidId(_) | StoreError::AlreadyExists(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                }
                StoreError::Io(_) | StoreError::Serde(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
                }
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        // Log the error
        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
