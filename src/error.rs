//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error funneled through the pipeline to `on_error`. Every failing stage —
/// hook, filter parsing, or core operation — produces one of these.
#[derive(Error, Debug)]
pub enum RestError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Upstream data-layer failure (constraint violation, connection loss).
    /// The message is kept for logs and custom handlers; the default handler
    /// never sends it to the client.
    #[error("data layer: {0}")]
    DataLayer(String),
    /// A hook signaled failure with its own message. Sanitized on output the
    /// same way as a data-layer error.
    #[error("hook: {0}")]
    Hook(String),
}

impl RestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RestError::Forbidden(_) => StatusCode::FORBIDDEN,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::DataLayer(_) | RestError::Hook(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RestError::Validation(_) => "validation_error",
            RestError::BadRequest(_) => "bad_request",
            RestError::Forbidden(_) => "forbidden",
            RestError::NotFound(_) => "not_found",
            RestError::DataLayer(_) => "database_error",
            RestError::Hook(_) => "hook_error",
        }
    }

    /// Message safe to send to the client. Client-caused errors carry their
    /// own message; internal failures are reduced to a fixed phrase so stack
    /// detail and query structure never leak.
    pub fn public_message(&self) -> String {
        match self {
            RestError::Validation(m)
            | RestError::BadRequest(m)
            | RestError::NotFound(m)
            | RestError::Forbidden(m) => m.clone(),
            RestError::DataLayer(_) | RestError::Hook(_) => "internal error".to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Sanitized JSON error body used by the default error handler.
pub fn error_body(err: &RestError) -> ErrorBody {
    ErrorBody {
        error: ErrorDetail {
            code: err.code().to_string(),
            message: err.public_message(),
        },
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(error_body(&self))).into_response()
    }
}
