// Appeal domain models - data structures for the appeal lifecycle.
//
// These are pure domain types with no Discord or HTTP dependencies.
// User ids are Discord snowflakes kept as plain u64s, like the rest of core.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The enforcement action a user is appealing against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PunishmentKind {
    Muted,
    Banned,
}

impl PunishmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PunishmentKind::Muted => "Muted",
            PunishmentKind::Banned => "Banned",
        }
    }
}

impl std::fmt::Display for PunishmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PunishmentKind {
    type Err = String;

    /// Accepts the labels the web form sends ("Muted", "Banned") as well as
    /// the bare verbs, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "muted" | "mute" => Ok(PunishmentKind::Muted),
            "banned" | "ban" => Ok(PunishmentKind::Banned),
            other => Err(format!("Unknown punishment type: {}", other)),
        }
    }
}

/// Lifecycle status of an appeal. Only `Pending` can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppealStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppealStatus::Pending => "Pending",
            AppealStatus::Approved => "Approved",
            AppealStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for AppealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppealStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AppealStatus::Pending),
            "Approved" => Ok(AppealStatus::Approved),
            "Rejected" => Ok(AppealStatus::Rejected),
            other => Err(format!("Unknown appeal status: {}", other)),
        }
    }
}

/// A moderator's verdict on a pending appeal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// The terminal status this decision moves an appeal into.
    pub fn status(&self) -> AppealStatus {
        match self {
            Decision::Approve => AppealStatus::Approved,
            Decision::Reject => AppealStatus::Rejected,
        }
    }
}

/// Who resolved an appeal, how, and when.
///
/// Kept as a single optional block on [`Appeal`] so the resolver fields can
/// never exist without a terminal status (or vice versa).
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub decision: Decision,
    pub resolver_id: u64,
    pub resolver_tag: String,
    pub resolved_at: DateTime<Utc>,
}

/// One persisted appeal.
#[derive(Debug, Clone, PartialEq)]
pub struct Appeal {
    pub case_id: String,
    pub subject_id: u64,
    pub subject_tag: String,
    pub punishment_kind: PunishmentKind,
    pub punishment_reason: String,
    pub appeal_reason: String,
    pub additional_notes: String,
    pub submitted_at: DateTime<Utc>,
    /// `None` while the appeal is pending.
    pub resolution: Option<Resolution>,
}

impl Appeal {
    pub fn status(&self) -> AppealStatus {
        match &self.resolution {
            None => AppealStatus::Pending,
            Some(resolution) => resolution.decision.status(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Everything a user hands us when filing an appeal.
///
/// Text fields arrive raw from the caller; the service validates them.
#[derive(Debug, Clone, Default)]
pub struct AppealSubmission {
    pub subject_id: u64,
    pub subject_tag: String,
    pub subject_avatar_url: Option<String>,
    pub punishment_kind: String,
    pub punishment_reason: String,
    pub appeal_reason: String,
    pub additional_notes: Option<String>,
    /// Screenshot links in the order they were received.
    pub evidence_links: Vec<String>,
}

/// Presentation-only data that goes to the notifier alongside a new appeal
/// but is never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseExtras {
    pub evidence_links: Vec<String>,
    pub subject_avatar_url: Option<String>,
}

/// Where the public rendering of a case lives (channel + message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseMessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// A moderator pressing Approve or Reject.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub case_id: String,
    pub decision: Decision,
    pub moderator_id: u64,
    pub moderator_tag: String,
    /// The message the control was attached to, if the trigger knows it.
    pub case_message: Option<CaseMessageRef>,
}

/// Result of a decision. Only `Applied` changed anything.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// This call won the transition; carries the resolved appeal.
    Applied(Appeal),
    /// Someone (maybe us, on a retried delivery) already resolved it.
    AlreadyResolved(AppealStatus),
    /// No appeal carries that case id.
    UnknownCase,
}

/// Tunables for the appeal lifecycle.
#[derive(Debug, Clone)]
pub struct AppealConfig {
    /// How long a rejection blocks resubmission.
    pub throttle_window: Duration,
    /// Number of decimal digits in a case id.
    pub case_id_width: u32,
    /// Upper bound on identifier draws before giving up.
    pub case_id_max_attempts: u32,
}

impl Default for AppealConfig {
    fn default() -> Self {
        Self {
            throttle_window: Duration::days(7),
            case_id_width: 4,
            case_id_max_attempts: 64,
        }
    }
}
