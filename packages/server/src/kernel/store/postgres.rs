use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::StoreError;
use crate::kernel::{BaseStore, StoreModifier};

/// Key/value collections in the `kv_store` table (see migrations/).
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseStore for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value = sqlx::query_scalar::<_, Value>("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Row-locked read-modify-write. Concurrent writers to the same key queue up
    /// behind `FOR UPDATE` instead of overwriting each other.
    async fn modify(&self, key: &str, f: StoreModifier<'_>) -> Result<Value, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Make sure there is a row to lock
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES ($1, 'null'::jsonb)
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .execute(&mut *tx)
        .await?;

        let current = sqlx::query_scalar::<_, Value>(
            "SELECT value FROM kv_store WHERE key = $1 FOR UPDATE",
        )
        .bind(key)
        .fetch_one(&mut *tx)
        .await?;

        // Dropping the transaction on error rolls it back
        let next = f(Some(current))?;

        sqlx::query("UPDATE kv_store SET value = $2, updated_at = NOW() WHERE key = $1")
            .bind(key)
            .bind(&next)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(next)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
