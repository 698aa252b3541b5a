use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::utils::ApiResult;

/// Storage key of the user's locale choice.
pub const LOCALE_PREFERENCE_KEY: &str = "lang";
/// Storage key of the serialized session.
pub const SESSION_KEY: &str = "auth-storage";

/// Key/value persistence that survives restarts.
#[async_trait]
pub trait DurableStorage: Send + Sync {
    async fn get(&self, key: &str) -> ApiResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> ApiResult<()>;
    async fn remove(&self, key: &str) -> ApiResult<()>;
}

#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DurableStorage for SqliteStorage {
    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        tracing::debug!("Stored key '{}'", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> ApiResult<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
