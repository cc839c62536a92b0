// SQLite-backed appeal store.
//
// Table:
// - appeals: one row per appeal, case_id unique, at most one Pending row per
//   subject (partial unique index), resolver columns filled iff resolved (CHECK).

use crate::core::appeals::{
    Appeal, AppealError, AppealStatus, AppealStore, Decision, PunishmentKind, Resolution,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

const APPEAL_COLUMNS: &str = "case_id, subject_id, subject_tag, punishment_kind, \
     punishment_reason, appeal_reason, additional_notes, status, submitted_at, \
     resolver_id, resolver_tag, resolved_at";

pub struct SqliteAppealStore {
    pool: Pool<Sqlite>,
}

impl SqliteAppealStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and run migrations.
    pub async fn open(database_path: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}?mode=rwc", database_path))
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), AppealError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS appeals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                case_id TEXT NOT NULL UNIQUE,
                subject_id INTEGER NOT NULL,
                subject_tag TEXT NOT NULL,
                punishment_kind TEXT NOT NULL,
                punishment_reason TEXT NOT NULL,
                appeal_reason TEXT NOT NULL,
                additional_notes TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Pending',
                submitted_at TEXT NOT NULL,
                resolver_id INTEGER,
                resolver_tag TEXT,
                resolved_at TEXT,
                CHECK (
                    (status = 'Pending'
                        AND resolver_id IS NULL AND resolver_tag IS NULL AND resolved_at IS NULL)
                    OR (status IN ('Approved', 'Rejected')
                        AND resolver_id IS NOT NULL AND resolver_tag IS NOT NULL
                        AND resolved_at IS NOT NULL)
                )
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_appeals_one_pending
                ON appeals(subject_id) WHERE status = 'Pending';
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_appeals_subject_submitted
                ON appeals(subject_id, submitted_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> AppealError {
    AppealError::Storage(e.to_string())
}

/// Fixed-width UTC timestamps so that string comparison in SQL is chronological.
fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_ts(raw: &str) -> Result<DateTime<Utc>, AppealError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppealError::Storage(format!("Bad timestamp {:?}: {}", raw, e)))
}

fn appeal_from_row(row: &SqliteRow) -> Result<Appeal, AppealError> {
    let case_id: String = row.get("case_id");
    let status: AppealStatus = row
        .get::<String, _>("status")
        .parse()
        .map_err(AppealError::Storage)?;
    let punishment_kind: PunishmentKind = row
        .get::<String, _>("punishment_kind")
        .parse()
        .map_err(AppealError::Storage)?;

    let resolution = match status {
        AppealStatus::Pending => None,
        resolved => {
            let resolver_id: Option<i64> = row.get("resolver_id");
            let resolver_tag: Option<String> = row.get("resolver_tag");
            let resolved_at: Option<String> = row.get("resolved_at");
            let (Some(resolver_id), Some(resolver_tag), Some(resolved_at)) =
                (resolver_id, resolver_tag, resolved_at)
            else {
                return Err(AppealError::Storage(format!(
                    "Appeal {} is {} but has no resolver",
                    case_id, resolved
                )));
            };
            Some(Resolution {
                decision: if resolved == AppealStatus::Approved {
                    Decision::Approve
                } else {
                    Decision::Reject
                },
                resolver_id: resolver_id as u64,
                resolver_tag,
                resolved_at: decode_ts(&resolved_at)?,
            })
        }
    };

    Ok(Appeal {
        subject_id: row.get::<i64, _>("subject_id") as u64,
        subject_tag: row.get("subject_tag"),
        punishment_kind,
        punishment_reason: row.get("punishment_reason"),
        appeal_reason: row.get("appeal_reason"),
        additional_notes: row.get("additional_notes"),
        submitted_at: decode_ts(&row.get::<String, _>("submitted_at"))?,
        resolution,
        case_id,
    })
}

#[async_trait]
impl AppealStore for SqliteAppealStore {
    async fn insert(&self, appeal: &Appeal) -> Result<(), AppealError> {
        let resolution = appeal.resolution.as_ref();

        sqlx::query(
            r#"
            INSERT INTO appeals (case_id, subject_id, subject_tag, punishment_kind,
                punishment_reason, appeal_reason, additional_notes, status, submitted_at,
                resolver_id, resolver_tag, resolved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&appeal.case_id)
        .bind(appeal.subject_id as i64)
        .bind(&appeal.subject_tag)
        .bind(appeal.punishment_kind.as_str())
        .bind(&appeal.punishment_reason)
        .bind(&appeal.appeal_reason)
        .bind(&appeal.additional_notes)
        .bind(appeal.status().as_str())
        .bind(encode_ts(appeal.submitted_at))
        .bind(resolution.map(|r| r.resolver_id as i64))
        .bind(resolution.map(|r| r.resolver_tag.clone()))
        .bind(resolution.map(|r| encode_ts(r.resolved_at)))
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() && db.message().contains("case_id") => {
                AppealError::CaseIdTaken(appeal.case_id.clone())
            }
            Some(db) if db.is_unique_violation() => AppealError::AlreadyPending,
            _ => storage_error(e),
        })?;
        Ok(())
    }

    async fn case_id_exists(&self, case_id: &str) -> Result<bool, AppealError> {
        let row = sqlx::query("SELECT 1 FROM appeals WHERE case_id = ?")
            .bind(case_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.is_some())
    }

    async fn find_by_case_id(&self, case_id: &str) -> Result<Option<Appeal>, AppealError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appeals WHERE case_id = ?",
            APPEAL_COLUMNS
        ))
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(appeal_from_row).transpose()
    }

    async fn find_pending_for_subject(
        &self,
        subject_id: u64,
    ) -> Result<Option<Appeal>, AppealError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appeals WHERE subject_id = ? AND status = 'Pending'",
            APPEAL_COLUMNS
        ))
        .bind(subject_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(appeal_from_row).transpose()
    }

    async fn latest_rejection_since(
        &self,
        subject_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Option<Appeal>, AppealError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM appeals
            WHERE subject_id = ? AND status = 'Rejected' AND resolved_at >= ?
            ORDER BY resolved_at DESC
            LIMIT 1
            "#,
            APPEAL_COLUMNS
        ))
        .bind(subject_id as i64)
        .bind(encode_ts(since))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(appeal_from_row).transpose()
    }

    async fn list_for_subject(&self, subject_id: u64) -> Result<Vec<Appeal>, AppealError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM appeals WHERE subject_id = ? ORDER BY submitted_at DESC, id DESC",
            APPEAL_COLUMNS
        ))
        .bind(subject_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(appeal_from_row).collect()
    }

    async fn resolve_if_pending(
        &self,
        case_id: &str,
        resolution: &Resolution,
    ) -> Result<Option<Appeal>, AppealError> {
        // One statement: the status guard and the write cannot be interleaved.
        let row = sqlx::query(&format!(
            r#"
            UPDATE appeals
            SET status = ?, resolver_id = ?, resolver_tag = ?, resolved_at = ?
            WHERE case_id = ? AND status = 'Pending'
            RETURNING {}
            "#,
            APPEAL_COLUMNS
        ))
        .bind(resolution.decision.status().as_str())
        .bind(resolution.resolver_id as i64)
        .bind(&resolution.resolver_tag)
        .bind(encode_ts(resolution.resolved_at))
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(appeal_from_row).transpose()
    }
}
