// Violation history service - compiles a user's prior enforcement actions.
//
// Every call re-queries the ledger from scratch; nothing is cached between
// calls and no cursor is kept.

use super::history_models::{
    LedgerPage, Report, ViolationEntry, ViolationHistory, ACTION_TAKEN_PREFIX,
};
use async_trait::async_trait;
use thiserror::Error;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Read access to the report log.
#[async_trait]
pub trait ReportLedger: Send + Sync {
    /// Action-taken reports against `subject_id`, newest first, at most
    /// `limit` of them, together with the total number of matches.
    async fn actions_taken(&self, subject_id: u64, limit: usize)
        -> Result<LedgerPage, HistoryError>;
}

pub struct HistoryService<L: ReportLedger> {
    ledger: L,
    limit: usize,
}

impl<L: ReportLedger> HistoryService<L> {
    pub fn new(ledger: L, limit: usize) -> Self {
        Self {
            ledger,
            limit: limit.max(1),
        }
    }

    /// History using the configured limit.
    pub async fn violation_history(&self, subject_id: u64) -> Result<ViolationHistory, HistoryError> {
        self.violation_history_limited(subject_id, self.limit).await
    }

    pub async fn violation_history_limited(
        &self,
        subject_id: u64,
        limit: usize,
    ) -> Result<ViolationHistory, HistoryError> {
        let page = self.ledger.actions_taken(subject_id, limit).await?;

        let entries: Vec<ViolationEntry> = page.reports.iter().take(limit).map(summarize).collect();
        let total = page.total.max(entries.len());

        tracing::debug!(subject_id, shown = entries.len(), total, "Violation history compiled");

        Ok(ViolationHistory {
            subject_id,
            entries,
            total,
        })
    }
}

fn summarize(report: &Report) -> ViolationEntry {
    let action = report
        .status
        .get(ACTION_TAKEN_PREFIX.len()..)
        .filter(|_| report.is_action_taken())
        .unwrap_or(report.status.as_str())
        .trim()
        .to_string();

    ViolationEntry {
        case_id: report.case_id.clone(),
        date: report.timestamp,
        action,
        reason: non_blank(&report.reason).unwrap_or("No reason").to_string(),
        moderator: non_blank(&report.resolver_display_name)
            .unwrap_or("Unknown")
            .to_string(),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::reports::InMemoryReportLedger;
    use chrono::{Duration, Utc};

    fn report(case_id: &str, subject_id: u64, status: &str, days_ago: i64) -> Report {
        Report {
            case_id: case_id.to_string(),
            subject_id,
            status: status.to_string(),
            reason: Some("Spam".to_string()),
            resolver_display_name: Some("Mod".to_string()),
            timestamp: Utc::now() - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn test_history_truncates_to_limit_with_note() {
        let ledger = InMemoryReportLedger::new();
        for i in 0..15 {
            ledger.record(report(&format!("C{}", i), 1, "Action Taken: Mute", i));
        }
        let service = HistoryService::new(ledger, DEFAULT_HISTORY_LIMIT);

        let history = service.violation_history(1).await.unwrap();

        assert_eq!(history.entries.len(), 10);
        assert_eq!(history.total, 15);
        assert_eq!(history.omitted(), 5);
        assert_eq!(
            history.truncation_note().as_deref(),
            Some("Showing only 10 of 15 total (5 more omitted).")
        );
        assert!(history
            .entries
            .windows(2)
            .all(|pair| pair[0].date >= pair[1].date));
        assert_eq!(history.entries[0].case_id, "C0");
    }

    #[tokio::test]
    async fn test_history_empty_is_not_an_error() {
        let ledger = InMemoryReportLedger::new();
        ledger.record(report("X", 2, "Action Taken: Ban", 1));
        let service = HistoryService::new(ledger, DEFAULT_HISTORY_LIMIT);

        let history = service.violation_history(1).await.unwrap();

        assert!(history.is_empty());
        assert_eq!(history.total, 0);
        assert_eq!(history.truncation_note(), None);
    }

    #[tokio::test]
    async fn test_history_only_counts_action_taken() {
        let ledger = InMemoryReportLedger::new();
        ledger.record(report("A", 1, "Pending", 1));
        ledger.record(report("B", 1, "Dismissed", 2));
        ledger.record(report("C", 1, "action taken: Warn", 3));
        let service = HistoryService::new(ledger, DEFAULT_HISTORY_LIMIT);

        let history = service.violation_history(1).await.unwrap();

        assert_eq!(history.entries.len(), 1);
        assert_eq!(history.entries[0].case_id, "C");
        assert_eq!(history.entries[0].action, "Warn");
    }

    #[test]
    fn test_summarize_defaults() {
        let mut raw = report("7", 1, "Action Taken: Timeout 1h", 0);
        raw.reason = None;
        raw.resolver_display_name = Some("   ".to_string());

        let entry = summarize(&raw);

        assert_eq!(entry.action, "Timeout 1h");
        assert_eq!(entry.reason, "No reason");
        assert_eq!(entry.moderator, "Unknown");
    }
}
