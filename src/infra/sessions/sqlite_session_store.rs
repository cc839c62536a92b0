// SQLite-backed session lookup.
//
// Rows are written by the OAuth login service when a user signs in with
// Discord; this side only reads them.

use crate::core::sessions::{SessionError, SessionResolver, SessionUser};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn open(database_path: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{}?mode=rwc", database_path))
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                username TEXT NOT NULL,
                discriminator TEXT,
                avatar TEXT,
                expires_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SessionResolver for SqliteSessionStore {
    async fn resolve(&self, token: &str) -> Result<Option<SessionUser>, SessionError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let row = sqlx::query(
            r#"
            SELECT user_id, username, discriminator, avatar
            FROM sessions
            WHERE token = ? AND expires_at > ?
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;

        Ok(row.map(|row| SessionUser {
            id: row.get::<i64, _>("user_id") as u64,
            username: row.get("username"),
            discriminator: row.get("discriminator"),
            avatar: row.get("avatar"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};

    async fn store_with_session(token: &str, expires_at: DateTime<Utc>) -> SqliteSessionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteSessionStore::new(pool);
        store.migrate().await.unwrap();

        sqlx::query(
            "INSERT INTO sessions (token, user_id, username, discriminator, avatar, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(token)
        .bind(77_i64)
        .bind("wanda")
        .bind("0")
        .bind(Option::<String>::None)
        .bind(expires_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&store.pool)
        .await
        .unwrap();

        store
    }

    #[tokio::test]
    async fn test_resolves_live_session() {
        let store = store_with_session("tok", Utc::now() + Duration::hours(1)).await;

        let user = store.resolve("tok").await.unwrap().unwrap();
        assert_eq!(user.id, 77);
        assert_eq!(user.tag(), "wanda");

        assert!(store.resolve("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_ignored() {
        let store = store_with_session("tok", Utc::now() - Duration::minutes(1)).await;

        assert!(store.resolve("tok").await.unwrap().is_none());
    }
}
