use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quadmart_db::StoreError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Conflict(&'static str),

    /// Checkout precondition failures surface as 500 with the exact error
    /// text in the body; clients key off that message.
    #[error("{0}")]
    Checkout(String),

    #[error("internal server error")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Checkout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(detail) => {
                error!("internal error: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal details stay in the log, never in the body.
        let message = self.to_string();
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            StoreError::Conflict(what) => ApiError::Conflict(what),
            e @ (StoreError::EmptyCart | StoreError::NoSellableItems) => {
                ApiError::Checkout(e.to_string())
            }
            StoreError::Integrity(msg) => ApiError::Internal(msg),
            StoreError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}
