//! The JSON envelope every endpoint answers with.

use axum::http::StatusCode;
use serde::Serialize;

/// `{status, message, data}` where `status` repeats the HTTP status code.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Numeric HTTP status.
    pub status: u16,
    /// Short human-readable outcome.
    pub message: String,
    /// Endpoint-specific payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data` with an explicit status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    /// A 200 response.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self::new(StatusCode::OK, "Success", data)
    }
}
