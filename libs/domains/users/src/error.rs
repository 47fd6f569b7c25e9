use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            UserError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("User {} not found", id),
            ),
            // Duplicate email renders as 400, not 409
            UserError::DuplicateEmail(email) => (
                StatusCode::BAD_REQUEST,
                "duplicate_email",
                format!("User with email '{}' already exists", email),
            ),
            UserError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            UserError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
