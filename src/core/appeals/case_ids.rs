// Case identifier allocation.
//
// Case ids are short fixed-width numbers ("4821") that moderators read out
// loud and that get embedded in button ids. We draw at random and retry on
// collision, with a hard ceiling so a crowded id space fails loudly instead
// of spinning forever.

use super::appeal_service::{AppealError, AppealStore};
use rand::Rng;

pub struct CaseIdGenerator {
    low: u32,
    high: u32,
    max_attempts: u32,
}

impl CaseIdGenerator {
    /// `width` digits, no leading zero: width 4 gives `1000..=9999`.
    pub fn new(width: u32, max_attempts: u32) -> Self {
        let width = width.clamp(1, 9);
        Self {
            low: 10u32.pow(width - 1),
            high: 10u32.pow(width) - 1,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Number of distinct ids this generator can produce.
    pub fn capacity(&self) -> u32 {
        self.high - self.low + 1
    }

    fn draw(&self) -> String {
        rand::thread_rng().gen_range(self.low..=self.high).to_string()
    }

    /// Draw ids until one is unused in `store`.
    ///
    /// `attempts` counts draws already spent on this submission and is shared
    /// with the caller's insert retries, so the total never exceeds
    /// `max_attempts`. This is check-then-act: the caller must still treat a
    /// unique-constraint failure on insert as a collision.
    pub async fn allocate<S: AppealStore + ?Sized>(
        &self,
        store: &S,
        attempts: &mut u32,
    ) -> Result<String, AppealError> {
        while *attempts < self.max_attempts {
            *attempts += 1;
            let candidate = self.draw();
            if !store.case_id_exists(&candidate).await? {
                if *attempts > 1 {
                    tracing::debug!(attempt = *attempts, case_id = %candidate, "Case id allocated after collisions");
                }
                return Ok(candidate);
            }
        }

        tracing::error!(
            attempts = self.max_attempts,
            capacity = self.capacity(),
            "Case id space looks exhausted"
        );
        Err(AppealError::CaseIdsExhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::appeals::{Appeal, PunishmentKind};
    use crate::infra::appeals::InMemoryAppealStore;
    use chrono::Utc;

    fn appeal_with_id(case_id: &str, subject_id: u64) -> Appeal {
        Appeal {
            case_id: case_id.to_string(),
            subject_id,
            subject_tag: format!("user{}", subject_id),
            punishment_kind: PunishmentKind::Muted,
            punishment_reason: "spam".to_string(),
            appeal_reason: "sorry".to_string(),
            additional_notes: String::new(),
            submitted_at: Utc::now(),
            resolution: None,
        }
    }

    #[test]
    fn test_width_bounds() {
        let generator = CaseIdGenerator::new(4, 10);
        assert_eq!(generator.low, 1000);
        assert_eq!(generator.high, 9999);
        assert_eq!(generator.capacity(), 9000);

        for _ in 0..200 {
            let id = generator.draw();
            assert_eq!(id.len(), 4);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
            assert!(!id.starts_with('0'));
        }
    }

    #[tokio::test]
    async fn test_allocate_skips_taken_ids() {
        let store = InMemoryAppealStore::new();
        // Width 1 leaves 1..=9; take all but 7.
        for (n, id) in ["1", "2", "3", "4", "5", "6", "8", "9"].iter().enumerate() {
            store.insert(&appeal_with_id(id, n as u64)).await.unwrap();
        }

        let generator = CaseIdGenerator::new(1, 10_000);
        let mut attempts = 0;
        let id = generator.allocate(&store, &mut attempts).await.unwrap();
        assert_eq!(id, "7");
        assert!(attempts >= 1);
    }

    #[tokio::test]
    async fn test_allocate_fails_when_space_is_full() {
        let store = InMemoryAppealStore::new();
        for n in 1..=9u64 {
            store
                .insert(&appeal_with_id(&n.to_string(), n))
                .await
                .unwrap();
        }

        let generator = CaseIdGenerator::new(1, 25);
        let mut attempts = 0;
        let err = generator.allocate(&store, &mut attempts).await.unwrap_err();
        assert!(matches!(err, AppealError::CaseIdsExhausted(25)));
        assert_eq!(attempts, 25);
    }

    #[tokio::test]
    async fn test_allocate_respects_attempts_already_spent() {
        let store = InMemoryAppealStore::new();
        let generator = CaseIdGenerator::new(4, 5);

        let mut attempts = 5;
        let err = generator.allocate(&store, &mut attempts).await.unwrap_err();
        assert!(matches!(err, AppealError::CaseIdsExhausted(5)));
        assert_eq!(attempts, 5);

        let mut attempts = 4;
        assert!(generator.allocate(&store, &mut attempts).await.is_ok());
        assert_eq!(attempts, 5);
    }
}
