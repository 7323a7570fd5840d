use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Lock store error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Neither a stored external id nor a parseable link is available
    #[error("Series {series_id} has no external id and no link to resolve one from")]
    MissingExternalReference { series_id: Uuid },

    /// The metadata source failed (transport, 4xx or 5xx)
    #[error("Metadata provider failed for external id {external_id}: {message}")]
    ExternalProvider { external_id: u64, message: String },

    #[error("No unwatched content available for recommendation")]
    NoUnwatchedContent,

    #[error("A reconciliation run is already in progress")]
    ReconciliationInProgress,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::NoUnwatchedContent => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::MissingExternalReference { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExternalProvider { .. } | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::ReconciliationInProgress => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            AppError::NotFound(msg) | AppError::InvalidInput(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
