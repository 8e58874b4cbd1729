//! SQLite storage backend for sandbox-share.

use super::{ShareStorage, StoredShare};
use crate::error::StorageError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// SQLite-based share storage.
///
/// Uses WAL mode for concurrent reads/writes.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("connections", &self.pool.size())
            .finish()
    }
}

impl SqliteStorage {
    /// Create a new SQLite storage from a database path.
    ///
    /// Creates the database file if it doesn't exist.
    pub async fn new(path: &Path) -> Result<Self, StorageError> {
        let location = path.to_str().ok_or_else(|| StorageError::InvalidPath {
            path: path.to_path_buf(),
        })?;
        let options = SqliteConnectOptions::from_str(location)
            .map_err(StorageError::Database)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage (for testing).
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(":memory:")
            .map_err(StorageError::Database)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        // One connection: every pooled connection would get its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Database)?;

        let storage = Self { pool };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS shares (
                handle TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))?;

        Ok(())
    }

    fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ShareStorage for SqliteStorage {
    async fn put_share(&self, handle: &str, body: &str) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO shares (handle, body, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(handle) DO NOTHING
            "#,
        )
        .bind(handle)
        .bind(body)
        .bind(Self::current_timestamp())
        .execute(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let stored: Option<String> = sqlx::query_scalar("SELECT body FROM shares WHERE handle = ?1")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Database)?;
        match stored {
            Some(existing) if existing != body => Err(StorageError::HandleCollision {
                handle: handle.to_string(),
            }),
            _ => Ok(false),
        }
    }

    async fn get_share(&self, handle: &str) -> Result<Option<StoredShare>, StorageError> {
        let row = sqlx::query_as::<_, ShareRow>(
            r#"
            SELECT handle, body, created_at
            FROM shares
            WHERE handle = ?1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Database)?;

        Ok(row.map(Into::into))
    }

    async fn count_shares(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shares")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Database)?;

        Ok(count as u64)
    }
}

/// Internal row type for SQLite queries.
#[derive(sqlx::FromRow)]
struct ShareRow {
    handle: String,
    body: String,
    created_at: i64,
}

impl From<ShareRow> for StoredShare {
    fn from(row: ShareRow) -> Self {
        StoredShare {
            handle: row.handle,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::content_handle;

    const BODY: &str = r#"{"files":[{"name":"main.wgsl","source":"fn main() {}"}]}"#;

    #[tokio::test]
    async fn put_then_get() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let handle = content_handle(BODY);

        assert!(storage.put_share(&handle, BODY).await.unwrap());

        let stored = storage.get_share(&handle).await.unwrap().unwrap();
        assert_eq!(stored.handle, handle);
        assert_eq!(stored.body, BODY);
        assert!(stored.created_at > 0);
    }

    #[tokio::test]
    async fn missing_share_is_none() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert!(storage.get_share("deadbeef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn republishing_keeps_one_row() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let handle = content_handle(BODY);

        assert!(storage.put_share(&handle, BODY).await.unwrap());
        assert!(!storage.put_share(&handle, BODY).await.unwrap());
        assert_eq!(storage.count_shares().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn different_body_under_taken_handle_is_refused() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        let handle = content_handle(BODY);
        storage.put_share(&handle, BODY).await.unwrap();

        let err = storage
            .put_share(&handle, r#"{"files":[]}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::HandleCollision { .. }));

        let stored = storage.get_share(&handle).await.unwrap().unwrap();
        assert_eq!(stored.body, BODY);
        assert_eq!(storage.count_shares().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn count_tracks_distinct_shares() {
        let storage = SqliteStorage::in_memory().await.unwrap();
        assert_eq!(storage.count_shares().await.unwrap(), 0);

        for i in 0..3 {
            let body = format!(r#"{{"files":[{{"name":"f{}.wgsl","source":""}}]}}"#, i);
            storage
                .put_share(&content_handle(&body), &body)
                .await
                .unwrap();
        }
        assert_eq!(storage.count_shares().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shares.db");
        let handle = content_handle(BODY);

        {
            let storage = SqliteStorage::new(&path).await.unwrap();
            storage.put_share(&handle, BODY).await.unwrap();
        }

        let reopened = SqliteStorage::new(&path).await.unwrap();
        let stored = reopened.get_share(&handle).await.unwrap().unwrap();
        assert_eq!(stored.body, BODY);
    }
}
