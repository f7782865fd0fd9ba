//! Health check endpoints.
//!
//! Used by load balancers and orchestrators to decide whether the service is
//! alive and whether it can take traffic.

use crate::response::ApiResponse;
use album_invitations_core::InvitationEngine;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

/// Readiness details.
#[derive(Debug, Serialize)]
pub struct ReadinessStatus {
    /// Whether the mirror store answered.
    pub store: bool,
}

/// Liveness probe. Does not touch dependencies.
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness probe. Pings the mirror store.
///
/// - 200 OK: store reachable
/// - 503 Service Unavailable: store unreachable
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness_check(
    State(engine): State<Arc<InvitationEngine>>,
) -> (StatusCode, Json<ApiResponse<ReadinessStatus>>) {
    match engine.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(ReadinessStatus { store: true })),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Not ready",
                    ReadinessStatus { store: false },
                )),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
