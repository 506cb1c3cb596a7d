use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// HTTP-facing error envelope. Maps `context`'s [`context::ContextError`]
/// (itself wrapping `storage::KarpsError` and the `query` crate's
/// parse/compile/plan/aggregate errors) onto spec's error envelope: every
/// failure surfaces as HTTP 500 with `{message, code?, details?}` — there is
/// no 4xx/2xx split, per spec §7 ("all ... user-error conditions short-circuit
/// the request and are surfaced verbatim").
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpError {
    pub message: String,
    pub code: Option<u16>,
    pub details: Option<serde_json::Value>,
}

impl From<context::ContextError> for HttpError {
    fn from(err: context::ContextError) -> Self {
        match err {
            context::ContextError::Storage(storage::KarpsError::CodeUser { code, message, details }) => {
                HttpError { message, code: Some(code), details }
            }
            other => HttpError { message: other.to_string(), code: None, details: None },
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "message": self.message,
            "code": self.code,
            "details": self.details,
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
