//! HTTP API for album invitations.
//!
//! Translates authenticated HTTP calls into [`InvitationEngine`] operations
//! and renders every outcome in a `{status, message, data}` envelope.
//!
//! # Request Flow
//!
//! 1. **Correlation layer** tags the request with an id and a tracing span
//! 2. **`Authenticated`** resolves the bearer token to an `Identity`
//! 3. **Handler** parses the body and calls the engine
//! 4. **`AppError`** maps engine errors to 4xx/5xx
//!
//! # Example
//!
//! ```ignore
//! use album_invitations_web::{AppState, StaticTokenVerifier, build_router};
//!
//! let verifier = StaticTokenVerifier::parse("dev-token=1:alice@example.com")?;
//! let app = build_router(AppState::new(engine, Arc::new(verifier)));
//! axum::serve(listener, app).await?;
//! ```
//!
//! [`InvitationEngine`]: album_invitations_core::InvitationEngine

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod state;

pub use auth::{AuthError, StaticTokenVerifier, TokenVerifier};
pub use error::AppError;
pub use extractors::{Authenticated, BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};
pub use response::ApiResponse;
pub use router::build_router;
pub use state::AppState;
