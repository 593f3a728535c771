//! Invitation API routes
//!
//! - `POST /invitations` - Issue a token and return the questionnaire link

use crate::error::AppError;
use crate::features::FeatureState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{issue, IssueInvitationCommand};

pub fn invitations_routes() -> Router<FeatureState> {
    Router::new().route("/", post(issue_invitation))
}

/// Issue a new invitation
///
/// # Response
///
/// - `201 Created` - `{ "token": "...", "link": "..." }`
/// - `400 Bad Request` - Token collisions exhausted every attempt
/// - `500 Internal Server Error` - Storage unavailable or timed out
#[tracing::instrument(skip(state))]
async fn issue_invitation(State(state): State<FeatureState>) -> Result<Response, AppError> {
    let command = IssueInvitationCommand {
        public_base_url: state.public_base_url.to_string(),
    };
    let invitation = issue::handle(state.store, command).await?;

    tracing::info!(token = %invitation.token, "Invitation issued via API");

    Ok((StatusCode::CREATED, Json(invitation)).into_response())
}
