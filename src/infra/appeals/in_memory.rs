// In-memory implementation of AppealStore.
//
// Handy for tests and local runs without a database. It keeps the same
// guarantees as the SQLite store: unique case ids, one pending appeal per
// subject, and an atomic pending -> resolved transition.

use crate::core::appeals::{Appeal, AppealError, AppealStatus, AppealStore, Resolution};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

pub struct InMemoryAppealStore {
    /// Case ID -> appeal
    appeals: DashMap<String, Appeal>,
    /// Subject ID -> case ID of their pending appeal
    pending: DashMap<u64, String>,
}

impl InMemoryAppealStore {
    pub fn new() -> Self {
        Self {
            appeals: DashMap::new(),
            pending: DashMap::new(),
        }
    }

    fn subject_appeals(&self, subject_id: u64) -> Vec<Appeal> {
        self.appeals
            .iter()
            .filter(|entry| entry.subject_id == subject_id)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for InMemoryAppealStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppealStore for InMemoryAppealStore {
    async fn insert(&self, appeal: &Appeal) -> Result<(), AppealError> {
        // Claim the pending slot first so two inserts for one subject can't both win.
        if appeal.is_pending() {
            match self.pending.entry(appeal.subject_id) {
                Entry::Occupied(_) => return Err(AppealError::AlreadyPending),
                Entry::Vacant(slot) => {
                    slot.insert(appeal.case_id.clone());
                }
            }
        }

        match self.appeals.entry(appeal.case_id.clone()) {
            Entry::Occupied(_) => {
                if appeal.is_pending() {
                    self.pending.remove(&appeal.subject_id);
                }
                Err(AppealError::CaseIdTaken(appeal.case_id.clone()))
            }
            Entry::Vacant(slot) => {
                slot.insert(appeal.clone());
                Ok(())
            }
        }
    }

    async fn case_id_exists(&self, case_id: &str) -> Result<bool, AppealError> {
        Ok(self.appeals.contains_key(case_id))
    }

    async fn find_by_case_id(&self, case_id: &str) -> Result<Option<Appeal>, AppealError> {
        Ok(self.appeals.get(case_id).map(|a| a.clone()))
    }

    async fn find_pending_for_subject(
        &self,
        subject_id: u64,
    ) -> Result<Option<Appeal>, AppealError> {
        let case_id = match self.pending.get(&subject_id) {
            Some(case_id) => case_id.clone(),
            None => return Ok(None),
        };
        Ok(self.appeals.get(&case_id).map(|a| a.clone()))
    }

    async fn latest_rejection_since(
        &self,
        subject_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Option<Appeal>, AppealError> {
        Ok(self
            .subject_appeals(subject_id)
            .into_iter()
            .filter(|a| a.status() == AppealStatus::Rejected)
            .filter(|a| a.resolution.as_ref().is_some_and(|r| r.resolved_at >= since))
            .max_by_key(|a| a.resolution.as_ref().map(|r| r.resolved_at)))
    }

    async fn list_for_subject(&self, subject_id: u64) -> Result<Vec<Appeal>, AppealError> {
        let mut appeals = self.subject_appeals(subject_id);
        appeals.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(appeals)
    }

    async fn resolve_if_pending(
        &self,
        case_id: &str,
        resolution: &Resolution,
    ) -> Result<Option<Appeal>, AppealError> {
        // get_mut holds the shard's write lock, so check-and-set is atomic per case.
        let Some(mut appeal) = self.appeals.get_mut(case_id) else {
            return Ok(None);
        };
        if !appeal.is_pending() {
            return Ok(None);
        }

        appeal.resolution = Some(resolution.clone());
        let resolved = appeal.clone();
        drop(appeal);

        self.pending
            .remove_if(&resolved.subject_id, |_, pending_case| pending_case == case_id);
        Ok(Some(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::appeals::{Decision, PunishmentKind};
    use chrono::Duration;

    fn pending(case_id: &str, subject_id: u64) -> Appeal {
        Appeal {
            case_id: case_id.to_string(),
            subject_id,
            subject_tag: "someone".to_string(),
            punishment_kind: PunishmentKind::Muted,
            punishment_reason: "spam".to_string(),
            appeal_reason: "sorry".to_string(),
            additional_notes: String::new(),
            submitted_at: Utc::now(),
            resolution: None,
        }
    }

    fn rejection(resolved_at: DateTime<Utc>) -> Resolution {
        Resolution {
            decision: Decision::Reject,
            resolver_id: 9,
            resolver_tag: "mod".to_string(),
            resolved_at,
        }
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_case_id_and_single_pending() {
        let store = InMemoryAppealStore::new();
        store.insert(&pending("1000", 1)).await.unwrap();

        let dup_id = store.insert(&pending("1000", 2)).await.unwrap_err();
        assert!(matches!(dup_id, AppealError::CaseIdTaken(_)));
        // The failed insert must not leave subject 2 blocked.
        assert!(store.find_pending_for_subject(2).await.unwrap().is_none());

        let dup_pending = store.insert(&pending("1001", 1)).await.unwrap_err();
        assert!(matches!(dup_pending, AppealError::AlreadyPending));
    }

    #[tokio::test]
    async fn test_resolve_if_pending_only_once() {
        let store = InMemoryAppealStore::new();
        store.insert(&pending("1000", 1)).await.unwrap();

        let first = store
            .resolve_if_pending("1000", &rejection(Utc::now()))
            .await
            .unwrap();
        assert!(first.is_some());
        assert!(store.find_pending_for_subject(1).await.unwrap().is_none());

        let second = store
            .resolve_if_pending("1000", &rejection(Utc::now()))
            .await
            .unwrap();
        assert!(second.is_none());

        assert!(store
            .resolve_if_pending("9999", &rejection(Utc::now()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_latest_rejection_since_respects_window() {
        let store = InMemoryAppealStore::new();
        store.insert(&pending("1000", 1)).await.unwrap();
        store
            .resolve_if_pending("1000", &rejection(Utc::now() - Duration::days(10)))
            .await
            .unwrap();

        let since = Utc::now() - Duration::days(7);
        assert!(store.latest_rejection_since(1, since).await.unwrap().is_none());

        store.insert(&pending("1001", 1)).await.unwrap();
        store
            .resolve_if_pending("1001", &rejection(Utc::now() - Duration::days(2)))
            .await
            .unwrap();
        let found = store.latest_rejection_since(1, since).await.unwrap().unwrap();
        assert_eq!(found.case_id, "1001");
    }
}
