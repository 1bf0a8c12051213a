use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Maps any internal failure to a 500 with its display text, classified
/// via [`crate::error::ControllerError`] for the log line only — the
/// response body stays a flat string (spec §6 doesn't define an error
/// envelope beyond the status code).
pub fn internal(err: anyhow::Error) -> Response {
    let kind = crate::error::ControllerError::classify(&err);
    tracing::warn!(kind, error = %err, "api request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
