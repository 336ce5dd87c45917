//! Centralized error taxonomy for the application's JSON surfaces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use super::provider::ProviderError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Sea ORM operation failed")]
    Database(#[from] sea_orm::DbErr),

    #[error("Auth provider operation failed")]
    Provider(#[from] ProviderError),

    #[error("An internal server error occurred")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Database(err) => {
                tracing::error!("Database error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred".to_string())
            },
            AppError::Provider(err) => {
                tracing::error!("Provider error: {err:?}");
                (StatusCode::BAD_GATEWAY, "Auth provider unavailable".to_string())
            },
            AppError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal server error occurred".to_string())
            },
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
