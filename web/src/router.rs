//! Router configuration.

use crate::handlers::{health, invitations};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health`, `/ready`: probes, no authentication
/// - `/api/invitations`: GET, POST, PUT and DELETE, bearer token required
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().route(
        "/invitations",
        get(invitations::list_invitations)
            .post(invitations::propose_invitation)
            .put(invitations::accept_invitation)
            .delete(invitations::withdraw_invitation),
    );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}
