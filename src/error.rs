use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::ai::AiError;
use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("{0}")]
    Validation(String),

    #[error("You must be logged in.")]
    Unauthorized,

    #[error("Not found.")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("❌ DB error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
            AppError::Auth(AuthError::Transport(e)) => {
                tracing::error!("❌ Auth provider unreachable: {e}");
                (StatusCode::BAD_GATEWAY, "Auth service unavailable".to_string())
            }
            AppError::Auth(AuthError::Rejected(_)) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Ai(AiError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AI service not configured. Please contact support.".to_string(),
            ),
            AppError::Ai(e) => {
                tracing::error!("❌ AI call failed: {e}");
                (StatusCode::BAD_GATEWAY, "AI service unavailable".to_string())
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
