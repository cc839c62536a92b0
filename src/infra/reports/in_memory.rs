// In-memory report ledger, used by tests and local runs.

use crate::core::history::{HistoryError, LedgerPage, Report, ReportLedger};
use async_trait::async_trait;
use dashmap::DashMap;

pub struct InMemoryReportLedger {
    /// Case ID -> report
    reports: DashMap<String, Report>,
}

impl InMemoryReportLedger {
    pub fn new() -> Self {
        Self {
            reports: DashMap::new(),
        }
    }

    /// Append a report, as the report-intake side would.
    pub fn record(&self, report: Report) {
        self.reports.insert(report.case_id.clone(), report);
    }
}

impl Default for InMemoryReportLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportLedger for InMemoryReportLedger {
    async fn actions_taken(
        &self,
        subject_id: u64,
        limit: usize,
    ) -> Result<LedgerPage, HistoryError> {
        let mut matching: Vec<Report> = self
            .reports
            .iter()
            .filter(|r| r.subject_id == subject_id && r.is_action_taken())
            .map(|r| r.value().clone())
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matching.len();
        matching.truncate(limit);
        Ok(LedgerPage {
            reports: matching,
            total,
        })
    }
}
