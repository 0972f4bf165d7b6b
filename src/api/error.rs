use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// The body could not be read as JSON (syntax error, wrong content type).
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// AI is required by configuration but no client could be built.
    #[error("{0}")]
    Unavailable(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": "Validation failed", "errors": errors }),
            ),
            Self::Rejected { status, message } => {
                log::debug!("Rejected request body: {}", message);
                (status, json!({ "message": message }))
            }
            Self::Unavailable(message) => {
                log::error!("Model client unavailable: {}", message);
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "message": message }))
            }
        };
        (status, Json(body)).into_response()
    }
}
