// Violation history models.
//
// Reports are written by the report-intake side of the bot; here they are
// read-only snapshots.

use chrono::{DateTime, Utc};

/// Status prefix the report log uses for completed enforcement actions.
pub const ACTION_TAKEN_PREFIX: &str = "Action Taken:";

/// One enforcement record from the report log.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub case_id: String,
    pub subject_id: u64,
    pub status: String,
    pub reason: Option<String>,
    pub resolver_display_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Report {
    /// Whether this report records an action that was actually taken.
    pub fn is_action_taken(&self) -> bool {
        self.status
            .get(..ACTION_TAKEN_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(ACTION_TAKEN_PREFIX))
    }
}

/// A bounded page of action-taken reports plus the total number that matched.
#[derive(Debug, Clone, Default)]
pub struct LedgerPage {
    /// Newest first.
    pub reports: Vec<Report>,
    pub total: usize,
}

/// A report boiled down for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationEntry {
    pub case_id: String,
    pub date: DateTime<Utc>,
    pub action: String,
    pub reason: String,
    pub moderator: String,
}

/// Summarised violation history of one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationHistory {
    pub subject_id: u64,
    /// Newest first, at most `limit` long.
    pub entries: Vec<ViolationEntry>,
    /// How many matching reports exist in total.
    pub total: usize,
}

impl ViolationHistory {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn omitted(&self) -> usize {
        self.total.saturating_sub(self.entries.len())
    }

    /// Trailing note when the history was truncated.
    pub fn truncation_note(&self) -> Option<String> {
        let omitted = self.omitted();
        (omitted > 0).then(|| {
            format!(
                "Showing only {} of {} total ({} more omitted).",
                self.entries.len(),
                self.total,
                omitted
            )
        })
    }
}
