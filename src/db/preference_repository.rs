use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::error;

use super::KeyValueStore;
use crate::errors::AppError;

/// [`KeyValueStore`] over the `preferences` table.
#[derive(Clone)]
pub struct PgKeyValueStore {
    pool: PgPool,
}

impl PgKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM preferences WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to read preference {key}: {e}");
                AppError::db_query(format!("Failed to read preference {key}"), e)
            })
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO preferences (key, value, updated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save preference {key}: {e}");
            AppError::db_query(format!("Failed to save preference {key}"), e)
        })?;
        Ok(())
    }
}
