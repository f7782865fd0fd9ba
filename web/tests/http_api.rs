//! End-to-end HTTP tests against the router with in-memory fakes.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use album_invitations_core::{AlbumId, Identity, ProfileId};
use album_invitations_testing::TestHarness;
use album_invitations_web::{AppState, CORRELATION_ID_HEADER, StaticTokenVerifier, build_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ALICE_TOKEN: &str = "alice-token";
const BOB_TOKEN: &str = "bob-token";

/// Alice (1) and Bob (2) are mirrored; album 10 "Demo" has carol as collaborator.
async fn setup() -> (TestHarness, Router) {
    let h = TestHarness::new()
        .with_profile(1, "alice")
        .await
        .with_profile(2, "bob")
        .await
        .with_album(10, "Demo", &["carol"])
        .await
        .with_album(11, "Live", &[])
        .await;

    let verifier = StaticTokenVerifier::new()
        .with_token(ALICE_TOKEN, Identity::new(ProfileId::new(1), "alice@example.com"))
        .with_token(BOB_TOKEN, Identity::new(ProfileId::new(2), "bob@example.com"));
    let app = build_router(AppState::new(h.engine.clone(), Arc::new(verifier)));
    (h, app)
}

async fn send(
    app: &Router,
    method: Method,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri("/api/invitations");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_invite_list_and_accept() {
    let (h, app) = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        Some(BOB_TOKEN),
        Some(r#"{"user_id": 1, "album_id": 10}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": 200, "message": "Success", "data": {"invitation": true}})
    );

    let (status, body) = send(&app, Method::GET, Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"invitations": [{"id": "10", "name": "Demo"}]}));

    let (status, body) = send(&app, Method::PUT, Some(ALICE_TOKEN), Some(r#"{"album_id": 10}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({"new_artists": ["carol", "alice"], "album_id": 10})
    );

    let published = h.bus.published();
    assert_eq!(published.len(), 1);
    let payload: Value = serde_json::from_slice(&published[0].data).unwrap();
    assert_eq!(payload, json!({"artists": ["carol", "alice"], "id": 10}));

    let (_, body) = send(&app, Method::GET, Some(ALICE_TOKEN), None).await;
    assert_eq!(body["data"]["invitations"], json!([]));
}

#[tokio::test]
async fn test_missing_or_unknown_token_is_unauthorized() {
    let (_h, app) = setup().await;

    let (status, body) = send(&app, Method::GET, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["data"]["code"], "unauthorized");

    let (status, _) = send(&app, Method::GET, Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_body_is_bad_request() {
    let (h, app) = setup().await;

    for body in [r#"{"user_id": 1}"#, "not json", r#"{"user_id": -1, "album_id": 10}"#] {
        let (status, json) = send(&app, Method::POST, Some(BOB_TOKEN), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(json["message"], "Error parsing body");
    }
    assert!(h.store.profile_snapshot(ProfileId::new(1)).unwrap().invitations.is_empty());
}

#[tokio::test]
async fn test_business_rejections_map_to_client_errors() {
    let (_h, app) = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        Some(BOB_TOKEN),
        Some(r#"{"user_id": 1, "album_id": 99}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["code"], "album_not_found");

    let invite = r#"{"user_id": 1, "album_id": 10}"#;
    send(&app, Method::POST, Some(BOB_TOKEN), Some(invite)).await;
    let (status, body) = send(&app, Method::POST, Some(BOB_TOKEN), Some(invite)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["code"], "already_invited");

    let (status, body) = send(&app, Method::PUT, Some(BOB_TOKEN), Some(r#"{"album_id": 10}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["code"], "invitation_not_found");
}

#[tokio::test]
async fn test_withdraw_only_touches_callers_invitations() {
    let (h, app) = setup().await;
    h.engine.propose(ProfileId::new(1), AlbumId::new(10)).await.unwrap();
    h.engine.propose(ProfileId::new(1), AlbumId::new(11)).await.unwrap();

    let (status, body) = send(&app, Method::DELETE, Some(ALICE_TOKEN), Some(r#"{"album_id": 10}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"invitations": [11]}));

    // Bob naming Alice still acts on Bob, who holds no invitation.
    let (status, body) = send(
        &app,
        Method::DELETE,
        Some(BOB_TOKEN),
        Some(r#"{"album_id": 11, "user_id": 1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["code"], "invitation_not_found");
    let remaining = h.engine.query(ProfileId::new(1)).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].album_id, AlbumId::new(11));
    assert!(h.bus.published().is_empty());
}

#[tokio::test]
async fn test_storage_outage_is_service_unavailable() {
    let (h, app) = setup().await;
    h.store.set_unavailable(true);

    let (status, body) = send(&app, Method::GET, Some(ALICE_TOKEN), None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["data"]["code"], "storage_unavailable");
}

#[tokio::test]
async fn test_probes_and_correlation_header() {
    let (h, app) = setup().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(CORRELATION_ID_HEADER));

    let ready = || Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(ready()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    h.store.set_unavailable(true);
    let response = app.clone().oneshot(ready()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
