//! Request and response bodies for the appeal API.

use crate::core::appeals::Appeal;
use crate::core::sessions::SessionUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/submit-appeal`.
///
/// Required fields default to empty so that a missing field yields the same
/// "Missing required fields." answer as a blank one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAppealRequest {
    #[serde(default)]
    pub punishment_type: String,
    #[serde(default)]
    pub punishment_reason: String,
    #[serde(default)]
    pub appeal_reason: String,
    pub additional_info: Option<String>,
    /// Zero to two screenshot URLs from the form.
    pub screenshot_links: Option<Vec<String>>,
}

/// `{ "message": ... }`, used by every non-list response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One appeal as returned by `GET /api/my-appeals`.
///
/// Snowflakes are strings: they don't fit in a JavaScript number.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppealView {
    pub case_id: String,
    pub subject_id: String,
    pub subject_tag: String,
    pub punishment_kind: String,
    pub punishment_reason: String,
    pub appeal_reason: String,
    pub additional_notes: String,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub resolver_id: Option<String>,
    pub resolver_tag: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Appeal> for AppealView {
    fn from(appeal: Appeal) -> Self {
        let status = appeal.status().to_string();
        let resolution = appeal.resolution;
        Self {
            case_id: appeal.case_id,
            subject_id: appeal.subject_id.to_string(),
            subject_tag: appeal.subject_tag,
            punishment_kind: appeal.punishment_kind.to_string(),
            punishment_reason: appeal.punishment_reason,
            appeal_reason: appeal.appeal_reason,
            additional_notes: appeal.additional_notes,
            status,
            submitted_at: appeal.submitted_at,
            resolver_id: resolution.as_ref().map(|r| r.resolver_id.to_string()),
            resolver_tag: resolution.as_ref().map(|r| r.resolver_tag.clone()),
            resolved_at: resolution.as_ref().map(|r| r.resolved_at),
        }
    }
}

/// `GET /api/me`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&SessionUser> for MeResponse {
    fn from(user: &SessionUser) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            discriminator: user.discriminator.clone(),
            avatar_url: user.avatar_url(256),
        }
    }
}
