use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::error::EngineError;
use crate::models::TranscriptRow;
use crate::store::{decode_blob, encode_blob, RowStore};

pub async fn init_db(pool: &PgPool) -> Result<(), EngineError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| EngineError::database("run migrations", e.into()))?;
    Ok(())
}

/// Transcript blob kept in Postgres under one cache key.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    cache_key: String,
}

impl PgStore {
    pub fn new(pool: PgPool, cache_key: impl Into<String>) -> Self {
        Self {
            pool,
            cache_key: cache_key.into(),
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub async fn updated_at(&self) -> Result<Option<DateTime<Utc>>, EngineError> {
        let row = sqlx::query("SELECT updated_at FROM transcript_cache WHERE cache_key = $1")
            .bind(&self.cache_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::database("read cache timestamp", e))?;
        Ok(row.map(|row| row.get("updated_at")))
    }
}

impl RowStore for PgStore {
    async fn load(&self) -> Result<Option<Vec<TranscriptRow>>, EngineError> {
        let row = sqlx::query("SELECT payload FROM transcript_cache WHERE cache_key = $1")
            .bind(&self.cache_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| EngineError::database("load transcript", e))?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload");
                decode_blob(&payload).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, rows: &[TranscriptRow]) -> Result<(), EngineError> {
        let payload = encode_blob(rows)?;
        sqlx::query(
            r#"
            INSERT INTO transcript_cache (cache_key, payload, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (cache_key) DO UPDATE
            SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&self.cache_key)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| EngineError::database("save transcript", e))?;

        tracing::info!(cache_key = self.cache_key.as_str(), rows = rows.len(), "db: saved transcript");
        Ok(())
    }
}
