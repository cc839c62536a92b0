//! HTTP handlers for the appeal web form.
//!
//! Every `/api` route needs a logged-in Discord user. The session token is
//! read from the `appeal_session` cookie or an `Authorization: Bearer` header.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    Json,
};
use std::sync::Arc;

use super::api_error::ApiError;
use super::api_types::{AppealView, MeResponse, MessageResponse, SubmitAppealRequest};
use super::WebState;
use crate::core::appeals::AppealSubmission;
use crate::core::sessions::SessionUser;

pub const SESSION_COOKIE: &str = "appeal_session";

/// Pull the session token out of the request headers.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

async fn current_user(
    state: &WebState,
    headers: &HeaderMap,
    unauthorized: &'static str,
) -> Result<SessionUser, ApiError> {
    let Some(token) = session_token(headers) else {
        return Err(ApiError::Unauthorized(unauthorized));
    };
    state
        .sessions
        .resolve(&token)
        .await?
        .ok_or(ApiError::Unauthorized(unauthorized))
}

/// Handler: GET /api/me
pub async fn me(
    State(state): State<Arc<WebState>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let user = current_user(&state, &headers, "Not logged in").await?;
    Ok(Json(MeResponse::from(&user)))
}

/// Handler: GET /api/my-appeals
///
/// The caller's appeals, newest first.
pub async fn my_appeals(
    State(state): State<Arc<WebState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppealView>>, ApiError> {
    let user = current_user(&state, &headers, "Not logged in").await?;
    let appeals = state.appeals.appeals_for(user.id).await?;
    Ok(Json(appeals.into_iter().map(AppealView::from).collect()))
}

/// Handler: POST /api/submit-appeal
pub async fn submit_appeal(
    State(state): State<Arc<WebState>>,
    headers: HeaderMap,
    body: Result<Json<SubmitAppealRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = current_user(&state, &headers, "You must be logged in.").await?;

    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected appeal body");
        ApiError::BadRequest("Invalid request body.".to_string())
    })?;

    let submission = AppealSubmission {
        subject_id: user.id,
        subject_tag: user.tag(),
        subject_avatar_url: user.avatar_url(128),
        punishment_kind: body.punishment_type,
        punishment_reason: body.punishment_reason,
        appeal_reason: body.appeal_reason,
        additional_notes: body.additional_info,
        evidence_links: body.screenshot_links.unwrap_or_default(),
    };

    state.appeals.submit(submission).await?;
    Ok(Json(MessageResponse::new("Appeal submitted successfully.")))
}
