//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation id
//! - `BearerToken`: the raw token from `Authorization: Bearer <token>`
//! - `Authenticated`: the verified caller identity
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     Authenticated(identity): Authenticated,
//!     correlation_id: CorrelationId,
//! ) -> Result<Json<ApiResponse<Data>>, AppError> {
//!     tracing::info!(user_id = %identity.user_id, correlation_id = %correlation_id.0, "Processing request");
//!     Ok(Json(ApiResponse::success(data)))
//! }
//! ```

use crate::auth::{AuthError, TokenVerifier};
use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use album_invitations_core::Identity;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Prefers the id the correlation middleware stored in the request
/// extensions, then the `X-Correlation-ID` header, and otherwise generates a
/// fresh UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Bearer token extracted from `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| {
                AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'")
            })?
            .trim();

        if token.is_empty() {
            return Err(AppError::unauthorized("Empty bearer token"));
        }

        Ok(Self(token.to_string()))
    }
}

/// The verified caller.
///
/// Resolves the bearer token through the `TokenVerifier` held in state.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    Arc<dyn TokenVerifier>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let verifier = Arc::<dyn TokenVerifier>::from_ref(state);

        match verifier.verify(&token).await {
            Ok(identity) => {
                tracing::debug!(user_id = %identity.user_id, "Authenticated request");
                Ok(Self(identity))
            },
            Err(AuthError::InvalidToken) => Err(AppError::unauthorized("Unauthorized")),
        }
    }
}
