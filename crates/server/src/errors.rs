use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::customer::errors::CustomerError;
use service::customer::validation::FieldError;
use thiserror::Error;
use tracing::error;

/// JSON error body: `{"error": title, "message": detail, "fields": [...]}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub message: String,
    pub fields: Option<Vec<FieldError>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [FieldError]>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, message: impl Into<String>) -> Self {
        Self { status, title, message: message.into(), fields: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", message)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.title, message: &self.message, fields: self.fields.as_deref() };
        (self.status, Json(body)).into_response()
    }
}

impl From<CustomerError> for JsonApiError {
    fn from(e: CustomerError) -> Self {
        match e {
            CustomerError::Validation(v) => {
                let message = v.to_string();
                Self { fields: Some(v.errors), ..Self::bad_request(message) }
            }
            CustomerError::Conflict => Self::new(StatusCode::CONFLICT, "Conflict", e.to_string()),
            CustomerError::Unauthorized => Self::unauthorized(e.to_string()),
            CustomerError::NotFound => Self::new(StatusCode::NOT_FOUND, "Not Found", e.to_string()),
            CustomerError::HashError(_) | CustomerError::TokenError(_) | CustomerError::Repository(_) => {
                error!(err = %e, code = e.code(), "customer request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", "internal error")
            }
        }
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(r: JsonRejection) -> Self {
        Self::bad_request(r.body_text())
    }
}

impl From<PathRejection> for JsonApiError {
    fn from(r: PathRejection) -> Self {
        Self::bad_request(r.body_text())
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(r: QueryRejection) -> Self {
        Self::bad_request(r.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
