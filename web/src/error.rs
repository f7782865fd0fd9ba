//! Error types for web handlers.
//!
//! This module bridges engine errors and HTTP responses. Every failure is
//! rendered in the same `{status, message, data}` envelope as a success, with
//! `data` carrying a machine-readable `code`.

use album_invitations_core::InvitationError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::response::ApiResponse;

/// Application error type for web handlers.
///
/// Implements Axum's `IntoResponse`; server errors are logged together with
/// their source before the response is written.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<ApiResponse<Data>>, AppError> {
///     let data = load().await.map_err(AppError::from)?;
///     Ok(Json(ApiResponse::success(data)))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "bad_request".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "unauthorized".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "internal_error".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Payload placed in `data` for failed requests.
#[derive(Debug, Serialize)]
struct ErrorData {
    /// Error code (for client error handling).
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        metrics::counter!(
            "http_errors_total",
            "status" => self.status.as_str().to_string(),
            "code" => self.code.clone()
        )
        .increment(1);

        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ApiResponse::new(
            self.status,
            self.message,
            ErrorData { code: self.code },
        );

        (self.status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Map engine outcomes onto HTTP statuses.
///
/// Missing records are 404, state conflicts are 409, a store that cannot be
/// reached is 503 and a store returning invalid data is 500.
impl From<InvitationError> for AppError {
    fn from(err: InvitationError) -> Self {
        let status = match &err {
            InvitationError::AlbumNotFound(_)
            | InvitationError::ProfileNotFound(_)
            | InvitationError::InvitationNotFound { .. } => StatusCode::NOT_FOUND,
            InvitationError::AlreadyInvited { .. } | InvitationError::AlreadyCollaborator { .. } => {
                StatusCode::CONFLICT
            },
            InvitationError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            InvitationError::StorageCorrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let code = err.kind().to_string();
        if err.is_rejection() {
            Self::new(status, err.to_string(), code)
        } else {
            let message = if status == StatusCode::SERVICE_UNAVAILABLE {
                "Storage is temporarily unavailable"
            } else {
                "An internal error occurred"
            };
            Self::new(status, message.to_string(), code).with_source(anyhow::Error::new(err))
        }
    }
}

/// A body that failed to parse is always a 400 with the same message.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        Self::bad_request("Error parsing body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use album_invitations_core::{AlbumId, ProfileId};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[bad_request] Invalid input");
    }

    #[test]
    fn test_rejections_map_to_client_errors() {
        let pair = (ProfileId::new(1), AlbumId::new(10));

        let err = AppError::from(InvitationError::AlbumNotFound(pair.1));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "album_not_found");

        let err = AppError::from(InvitationError::InvitationNotFound {
            profile: pair.0,
            album: pair.1,
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = AppError::from(InvitationError::AlreadyCollaborator {
            profile: pair.0,
            album: pair.1,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "already_collaborator");
    }

    #[test]
    fn test_storage_failures_hide_details() {
        let err = AppError::from(InvitationError::StorageUnavailable("pool timed out".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.to_string().contains("pool timed out"));
        assert!(std::error::Error::source(&err).is_some());

        let err = AppError::from(InvitationError::StorageCorrupted("negative id".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "storage_corrupted");
    }
}
