// Appeal lifecycle service - core business logic for appeals.
//
// This service handles:
// - Validating and throttling new submissions
// - Allocating case ids and persisting appeals
// - Applying moderator decisions exactly once
// - Handing cases and outcomes to the notifier
//
// NO Discord dependencies here - the notifier is an injected trait object.

use super::appeal_models::{
    Appeal, AppealConfig, AppealStatus, AppealSubmission, CaseExtras, CaseMessageRef,
    DecisionOutcome, DecisionRequest, PunishmentKind, Resolution,
};
use super::case_ids::CaseIdGenerator;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Appeal channel not found.")]
    ChannelMissing,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Error)]
pub enum AppealError {
    #[error("{0}")]
    Validation(String),

    #[error("You already have a pending appeal.")]
    AlreadyPending,

    #[error("You have a rejected appeal within the last {days} days. Please wait before appealing again.")]
    Throttled {
        days: i64,
        retry_after: DateTime<Utc>,
    },

    /// Raised by stores when an insert hits the case id unique constraint.
    #[error("Case id {0} is already taken")]
    CaseIdTaken(String),

    #[error("No free case id after {0} attempts")]
    CaseIdsExhausted(u32),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The appeal was saved but could not be announced.
    #[error("Appeal {case_id} was saved but not announced: {source}")]
    Notification {
        case_id: String,
        #[source]
        source: NotifyError,
    },
}

impl AppealError {
    /// Whether the caller did something wrong (as opposed to us).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppealError::Validation(_) | AppealError::AlreadyPending | AppealError::Throttled { .. }
        )
    }
}

// ============================================================================
// PORTS
// ============================================================================

/// Persistence for appeals.
#[async_trait]
pub trait AppealStore: Send + Sync {
    /// Insert a new appeal.
    ///
    /// Fails with `CaseIdTaken` on a case id collision and `AlreadyPending`
    /// if the subject already has a pending appeal.
    async fn insert(&self, appeal: &Appeal) -> Result<(), AppealError>;

    async fn case_id_exists(&self, case_id: &str) -> Result<bool, AppealError>;

    async fn find_by_case_id(&self, case_id: &str) -> Result<Option<Appeal>, AppealError>;

    async fn find_pending_for_subject(&self, subject_id: u64)
        -> Result<Option<Appeal>, AppealError>;

    /// Most recent rejection of this subject resolved at or after `since`.
    async fn latest_rejection_since(
        &self,
        subject_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Option<Appeal>, AppealError>;

    /// All appeals of a subject, newest submission first.
    async fn list_for_subject(&self, subject_id: u64) -> Result<Vec<Appeal>, AppealError>;

    /// Atomically resolve the appeal if and only if it is still pending.
    ///
    /// Returns the updated appeal when this call performed the transition,
    /// `None` when the case is unknown or already resolved.
    async fn resolve_if_pending(
        &self,
        case_id: &str,
        resolution: &Resolution,
    ) -> Result<Option<Appeal>, AppealError>;
}

/// Outbound announcements about appeals.
#[async_trait]
pub trait AppealNotifier: Send + Sync {
    /// Post a freshly created case with its decision and history controls.
    async fn publish_case(&self, appeal: &Appeal, extras: &CaseExtras) -> Result<(), NotifyError>;

    /// Tell the subject how their appeal was decided.
    async fn notify_subject(&self, appeal: &Appeal) -> Result<(), NotifyError>;

    /// Re-render the public case after it was resolved.
    async fn refresh_case(
        &self,
        appeal: &Appeal,
        case_message: Option<CaseMessageRef>,
    ) -> Result<(), NotifyError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct AppealService<S: AppealStore> {
    store: S,
    notifier: Arc<dyn AppealNotifier>,
    case_ids: CaseIdGenerator,
    config: AppealConfig,
    // Subject ID -> lock held across the check-then-insert of a submission
    submission_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl<S: AppealStore> AppealService<S> {
    pub fn new(store: S, notifier: Arc<dyn AppealNotifier>, config: AppealConfig) -> Self {
        Self {
            store,
            notifier,
            case_ids: CaseIdGenerator::new(config.case_id_width, config.case_id_max_attempts),
            config,
            submission_locks: DashMap::new(),
        }
    }

    /// File a new appeal.
    ///
    /// The appeal is persisted before it is announced. If the announcement
    /// fails the appeal stays saved and `AppealError::Notification` is
    /// returned so the caller can report it.
    pub async fn submit(&self, submission: AppealSubmission) -> Result<Appeal, AppealError> {
        let punishment_kind = validate_submission(&submission)?;
        let subject_id = submission.subject_id;

        let lock = self
            .submission_locks
            .entry(subject_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let created = {
            let _guard = lock.lock().await;
            self.create_locked(punishment_kind, &submission).await
        };

        drop(lock);
        self.submission_locks
            .remove_if(&subject_id, |_, l| Arc::strong_count(l) == 1);

        let appeal = created?;
        tracing::info!(
            case_id = %appeal.case_id,
            subject_id = appeal.subject_id,
            punishment = %appeal.punishment_kind,
            "Appeal submitted"
        );

        let extras = CaseExtras {
            evidence_links: submission
                .evidence_links
                .iter()
                .map(|link| link.trim())
                .filter(|link| !link.is_empty())
                .map(str::to_string)
                .collect(),
            subject_avatar_url: submission.subject_avatar_url.clone(),
        };

        if let Err(source) = self.notifier.publish_case(&appeal, &extras).await {
            tracing::error!(
                case_id = %appeal.case_id,
                error = %source,
                "Appeal saved but could not be published"
            );
            return Err(AppealError::Notification {
                case_id: appeal.case_id,
                source,
            });
        }

        Ok(appeal)
    }

    /// Checks and creation for one subject. Must run under that subject's lock.
    async fn create_locked(
        &self,
        punishment_kind: PunishmentKind,
        submission: &AppealSubmission,
    ) -> Result<Appeal, AppealError> {
        let subject_id = submission.subject_id;

        if self
            .store
            .find_pending_for_subject(subject_id)
            .await?
            .is_some()
        {
            return Err(AppealError::AlreadyPending);
        }

        let now = Utc::now();
        let window = self.config.throttle_window;
        if let Some(rejected) = self
            .store
            .latest_rejection_since(subject_id, now - window)
            .await?
        {
            let resolved_at = rejected
                .resolution
                .as_ref()
                .map(|r| r.resolved_at)
                .unwrap_or(now);
            return Err(AppealError::Throttled {
                days: window.num_days(),
                retry_after: resolved_at + window,
            });
        }

        // One draw budget for the whole submission, covering both the existence
        // check and collisions reported by the insert itself.
        let mut attempts = 0;
        loop {
            let case_id = self.case_ids.allocate(&self.store, &mut attempts).await?;
            let appeal = Appeal {
                case_id,
                subject_id,
                subject_tag: submission.subject_tag.trim().to_string(),
                punishment_kind,
                punishment_reason: submission.punishment_reason.trim().to_string(),
                appeal_reason: submission.appeal_reason.trim().to_string(),
                additional_notes: submission
                    .additional_notes
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
                submitted_at: now,
                resolution: None,
            };

            match self.store.insert(&appeal).await {
                Ok(()) => return Ok(appeal),
                Err(AppealError::CaseIdTaken(case_id)) => {
                    tracing::debug!(case_id = %case_id, "Case id taken at insert, redrawing");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Apply a moderator decision.
    ///
    /// Safe to call any number of times for the same case: only the first
    /// call on a pending appeal changes it, every other call is a no-op.
    pub async fn decide(&self, request: DecisionRequest) -> Result<DecisionOutcome, AppealError> {
        let resolution = Resolution {
            decision: request.decision,
            resolver_id: request.moderator_id,
            resolver_tag: request.moderator_tag.clone(),
            resolved_at: Utc::now(),
        };

        let Some(appeal) = self
            .store
            .resolve_if_pending(&request.case_id, &resolution)
            .await?
        else {
            let outcome = match self.store.find_by_case_id(&request.case_id).await? {
                Some(existing) => DecisionOutcome::AlreadyResolved(existing.status()),
                None => DecisionOutcome::UnknownCase,
            };
            tracing::info!(
                case_id = %request.case_id,
                moderator_id = request.moderator_id,
                outcome = ?outcome,
                "Decision ignored"
            );
            return Ok(outcome);
        };

        tracing::info!(
            case_id = %appeal.case_id,
            subject_id = appeal.subject_id,
            moderator_id = request.moderator_id,
            status = %appeal.status(),
            "Appeal resolved"
        );

        if let Err(err) = self.notifier.notify_subject(&appeal).await {
            tracing::warn!(
                case_id = %appeal.case_id,
                subject_id = appeal.subject_id,
                error = %err,
                "Failed to DM appeal outcome"
            );
        }

        if let Err(err) = self
            .notifier
            .refresh_case(&appeal, request.case_message)
            .await
        {
            tracing::warn!(case_id = %appeal.case_id, error = %err, "Failed to update case message");
        }

        Ok(DecisionOutcome::Applied(appeal))
    }

    /// A subject's appeals, newest first.
    pub async fn appeals_for(&self, subject_id: u64) -> Result<Vec<Appeal>, AppealError> {
        self.store.list_for_subject(subject_id).await
    }

    pub async fn find_case(&self, case_id: &str) -> Result<Option<Appeal>, AppealError> {
        self.store.find_by_case_id(case_id.trim()).await
    }
}

/// Longest screenshot URL we accept. Rendered as `[View Screenshot](url)`, it
/// has to fit in one embed field value.
pub const MAX_EVIDENCE_LINK_LEN: usize = 512;

/// Required fields must be non-blank, the punishment kind must parse and every
/// screenshot link must be a reasonably short http(s) URL.
fn validate_submission(submission: &AppealSubmission) -> Result<PunishmentKind, AppealError> {
    let required = [
        &submission.punishment_kind,
        &submission.punishment_reason,
        &submission.appeal_reason,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(AppealError::Validation(
            "Missing required fields.".to_string(),
        ));
    }

    let bad_link = submission
        .evidence_links
        .iter()
        .map(|link| link.trim())
        .filter(|link| !link.is_empty())
        .any(|link| !is_acceptable_link(link));
    if bad_link {
        return Err(AppealError::Validation(
            "Invalid screenshot link.".to_string(),
        ));
    }

    submission
        .punishment_kind
        .parse::<PunishmentKind>()
        .map_err(AppealError::Validation)
}

fn is_acceptable_link(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    let has_host = ["https://", "http://"]
        .iter()
        .any(|scheme| lower.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()));
    has_host
        && link.chars().count() <= MAX_EVIDENCE_LINK_LEN
        && !link.chars().any(|c| c.is_whitespace() || c == ')')
}

// ============================================================================
// TESTS
// ============================================================================
