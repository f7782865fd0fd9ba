//! Invitation endpoints.
//!
//! - GET /api/invitations - pending invitations of the caller
//! - POST /api/invitations - invite a profile to an album
//! - PUT /api/invitations - the caller accepts an invitation
//! - DELETE /api/invitations - the caller declines an invitation
//!
//! All of them require `Authorization: Bearer <token>`.

#![allow(clippy::missing_errors_doc)] // Handlers return AppError

use crate::error::AppError;
use crate::extractors::Authenticated;
use crate::response::ApiResponse;
use album_invitations_core::{AlbumId, InvitationEngine, InvitationSummary, ProfileId};
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /api/invitations`.
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    /// Profile to invite.
    pub user_id: ProfileId,
    /// Album to invite them to.
    pub album_id: AlbumId,
}

/// Body of `PUT /api/invitations`.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    /// Album whose invitation the caller accepts.
    pub album_id: AlbumId,
}

/// Body of `DELETE /api/invitations`.
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    /// Album the invitation is for.
    pub album_id: AlbumId,
}

/// One pending invitation.
#[derive(Debug, Serialize)]
pub struct InvitationView {
    /// Album id, rendered as a string.
    pub id: String,
    /// Album name.
    pub name: String,
}

impl From<InvitationSummary> for InvitationView {
    fn from(summary: InvitationSummary) -> Self {
        Self {
            id: summary.album_id.to_string(),
            name: summary.album_name,
        }
    }
}

/// Payload of `GET /api/invitations`.
#[derive(Debug, Serialize)]
pub struct InvitationList {
    /// Pending invitations in the order they were created.
    pub invitations: Vec<InvitationView>,
}

/// Payload of `POST /api/invitations`.
#[derive(Debug, Serialize)]
pub struct ProposeResponse {
    /// Always `true`; failures are reported as errors.
    pub invitation: bool,
}

/// Payload of `PUT /api/invitations`.
#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    /// Collaborators after the acceptance.
    pub new_artists: Vec<String>,
    /// Album that gained the collaborator.
    pub album_id: AlbumId,
}

/// Payload of `DELETE /api/invitations`.
#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    /// Albums the profile is still invited to.
    pub invitations: Vec<AlbumId>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List the caller's pending invitations.
#[tracing::instrument(skip_all, fields(user_id = %caller.0.user_id))]
pub async fn list_invitations(
    State(engine): State<Arc<InvitationEngine>>,
    caller: Authenticated,
) -> Result<Json<ApiResponse<InvitationList>>, AppError> {
    let invitations = engine
        .query(caller.0.user_id)
        .await?
        .into_iter()
        .map(InvitationView::from)
        .collect();

    Ok(Json(ApiResponse::success(InvitationList { invitations })))
}

/// Invite a profile to an album.
#[tracing::instrument(skip_all, fields(user_id = %caller.0.user_id))]
pub async fn propose_invitation(
    State(engine): State<Arc<InvitationEngine>>,
    caller: Authenticated,
    body: Result<Json<ProposeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProposeResponse>>, AppError> {
    let Json(request) = body?;

    engine.propose(request.user_id, request.album_id).await?;

    tracing::info!(
        invitee = %request.user_id,
        album_id = %request.album_id,
        inviter = %caller.0.email,
        "Invitation created"
    );
    Ok(Json(ApiResponse::success(ProposeResponse { invitation: true })))
}

/// Accept an invitation on behalf of the caller.
#[tracing::instrument(skip_all, fields(user_id = %caller.0.user_id))]
pub async fn accept_invitation(
    State(engine): State<Arc<InvitationEngine>>,
    caller: Authenticated,
    body: Result<Json<AcceptRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AcceptResponse>>, AppError> {
    let Json(request) = body?;

    let accepted = engine.accept(caller.0.user_id, request.album_id).await?;

    Ok(Json(ApiResponse::success(AcceptResponse {
        new_artists: accepted.artists,
        album_id: accepted.album_id,
    })))
}

/// The caller declines one of their own pending invitations.
#[tracing::instrument(skip_all, fields(user_id = %caller.0.user_id))]
pub async fn withdraw_invitation(
    State(engine): State<Arc<InvitationEngine>>,
    caller: Authenticated,
    body: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<WithdrawResponse>>, AppError> {
    let Json(request) = body?;
    let invitations = engine.withdraw(caller.0.user_id, request.album_id).await?;

    Ok(Json(ApiResponse::success(WithdrawResponse { invitations })))
}
