//! JSON extractor with automatic validation using the validator crate.

use crate::errors::{ErrorCode, ErrorResponse};
use axum::{
    extract::{FromRequest, Json, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Extractor that deserializes JSON and runs `validator` rules on the payload.
///
/// Returns 400 with a field-by-field breakdown when validation fails.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct CreateUser {
///     #[validate(length(min = 2, max = 50))]
///     name: String,
/// }
///
/// async fn create_user(ValidatedJson(payload): ValidatedJson<CreateUser>) {
///     // payload passed all validation rules
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| e.into_response())?;

        if let Err(errors) = value.validate() {
            let mut details = serde_json::Map::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<serde_json::Value> = field_errors
                    .iter()
                    .map(|err| {
                        serde_json::json!({
                            "code": err.code,
                            "message": err.message,
                            "params": err.params,
                        })
                    })
                    .collect();
                details.insert(field.to_string(), serde_json::Value::Array(messages));
            }

            let body = ErrorResponse {
                code: ErrorCode::ValidationError.code(),
                error: ErrorCode::ValidationError.as_str().to_string(),
                message: ErrorCode::ValidationError.default_message().to_string(),
                details: Some(serde_json::Value::Object(details)),
            };
            return Err((StatusCode::BAD_REQUEST, axum::Json(body)).into_response());
        }

        Ok(ValidatedJson(value))
    }
}
