//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use constancias::DocumentError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong `x-admin-passphrase` header
    #[error("unauthorized")]
    Unauthorized,

    /// The request body was rejected before reaching the core
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    /// HTTP status for this error
    ///
    /// - Unknown DNI: 404
    /// - Incomplete input or year out of range: 422
    /// - No `base_datos.xlsx` uploaded yet: 503
    /// - Anything else: 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Document(e) => match e {
                DocumentError::DirectoryLookupMiss(_) => StatusCode::NOT_FOUND,
                DocumentError::DirectoryMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
                DocumentError::InputIncomplete(_) | DocumentError::YearOutOfRange(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                tracing::warn!(error = %self, "student directory unavailable");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
