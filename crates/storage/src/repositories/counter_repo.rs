use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{CounterStore, StorageError};

#[derive(Clone)]
pub struct SqliteCounterStore {
    pool: SqlitePool,
}

impl SqliteCounterStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for SqliteCounterStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM counters WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r#"
                INSERT INTO counters (key, value, updated_at) VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_pool;

    async fn store(dir: &tempfile::TempDir) -> SqliteCounterStore {
        let folder = dir.path().to_str().unwrap();
        SqliteCounterStore::new(open_pool(folder).await.unwrap())
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        assert_eq!(store.get("foo").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        store.put("foo", "1").await.unwrap();
        store.put("foo", "2").await.unwrap();

        assert_eq!(store.get("foo").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        store(&dir).await.put("foo", "7").await.unwrap();

        let reopened = store(&dir).await;

        assert_eq!(reopened.get("foo").await.unwrap().as_deref(), Some("7"));
    }
}
