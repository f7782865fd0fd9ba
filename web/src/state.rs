//! Application state for Axum handlers.

use crate::auth::TokenVerifier;
use album_invitations_core::InvitationEngine;
use axum::extract::FromRef;
use std::sync::Arc;

/// Shared by every handler; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Invitation engine backing the API.
    pub engine: Arc<InvitationEngine>,
    /// Resolves bearer tokens for [`Authenticated`](crate::extractors::Authenticated).
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Bundle an engine with a token verifier.
    #[must_use]
    pub fn new(engine: InvitationEngine, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            engine: Arc::new(engine),
            verifier,
        }
    }
}

impl FromRef<AppState> for Arc<InvitationEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Arc<dyn TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}
