// SQLite-backed report ledger (read path only).
//
// The reports table belongs to the report-intake side of the bot. We create it
// if it is missing so a fresh install starts with an empty ledger, and we
// never write to it.

use crate::core::history::{HistoryError, LedgerPage, Report, ReportLedger, ACTION_TAKEN_PREFIX};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteReportLedger {
    pool: Pool<Sqlite>,
}

impl SqliteReportLedger {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn open(database_path: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}?mode=rwc", database_path))
            .await?;

        let ledger = Self::new(pool);
        ledger.migrate().await?;
        Ok(ledger)
    }

    pub async fn migrate(&self) -> Result<(), HistoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                case_id TEXT NOT NULL UNIQUE,
                message_id INTEGER,
                channel_id INTEGER,
                reporter_id INTEGER,
                reporter_tag TEXT,
                author_id INTEGER NOT NULL,
                author_tag TEXT,
                content TEXT,
                status TEXT NOT NULL DEFAULT 'Pending',
                action_taken_by INTEGER,
                action_taken_by_name TEXT,
                action_type TEXT,
                reason TEXT,
                is_profile BOOLEAN NOT NULL DEFAULT 0,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_reports_author_status
                ON reports(author_id, status);
            CREATE INDEX IF NOT EXISTS idx_reports_author_timestamp
                ON reports(author_id, timestamp);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| HistoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ReportLedger for SqliteReportLedger {
    async fn actions_taken(
        &self,
        subject_id: u64,
        limit: usize,
    ) -> Result<LedgerPage, HistoryError> {
        // LIKE is case-insensitive for ASCII in SQLite, matching "action taken:" too.
        // The window count is evaluated before LIMIT, so it is the full match count.
        // Timestamps are written by the intake side in whatever RFC 3339 shape it
        // likes; julianday() normalises offsets and fractional seconds for sorting.
        let rows = sqlx::query(
            r#"
            SELECT case_id, author_id, status, reason, action_taken_by_name, timestamp,
                   COUNT(*) OVER () AS total
            FROM reports
            WHERE author_id = ? AND status LIKE ? || '%'
            ORDER BY julianday(timestamp) DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(subject_id as i64)
        .bind(ACTION_TAKEN_PREFIX)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| HistoryError::Storage(e.to_string()))?;

        let total = rows
            .first()
            .map(|row| row.get::<i64, _>("total") as usize)
            .unwrap_or(0);

        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let case_id: String = row.get("case_id");
            let timestamp_str: String = row.get("timestamp");
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|e| {
                    tracing::warn!(case_id = %case_id, error = %e, "Unparseable report timestamp");
                    DateTime::<Utc>::UNIX_EPOCH
                });

            reports.push(Report {
                case_id,
                subject_id: row.get::<i64, _>("author_id") as u64,
                status: row.get("status"),
                reason: row.get("reason"),
                resolver_display_name: row.get("action_taken_by_name"),
                timestamp,
            });
        }

        Ok(LedgerPage { reports, total })
    }
}
