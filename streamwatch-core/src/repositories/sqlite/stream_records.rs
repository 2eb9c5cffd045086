// src/repositories/sqlite/stream_records.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};
use tracing::warn;

pub(crate) use streamwatch_common::traits::repository_traits::StreamStore;
use streamwatch_common::models::stream::{StreamKey, StreamRecord};
use crate::Error;

/// Key/value table of JSON-encoded records.
#[derive(Clone)]
pub struct SqliteStreamStore {
    pool: Pool<Sqlite>,
}

impl SqliteStreamStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreamStore for SqliteStreamStore {
    async fn load_all(&self) -> Result<Vec<StreamRecord>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT key, value
            FROM stream_records
            ORDER BY key
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for r in rows {
            let key: String = r.try_get("key")?;
            let value: String = r.try_get("value")?;

            // One corrupt row shouldn't keep every other channel from loading.
            match serde_json::from_str::<StreamRecord>(&value) {
                Ok(rec) if rec.key().to_string() == key => records.push(rec),
                Ok(rec) => {
                    warn!("Skipping stream record stored under '{}' but describing '{}'", key, rec.key());
                }
                Err(e) => {
                    warn!("Skipping unreadable stream record '{}': {}", key, e);
                }
            }
        }
        Ok(records)
    }

    async fn put(&self, record: &StreamRecord) -> Result<(), Error> {
        let key = record.key().to_string();
        let value = serde_json::to_string(record)?;

        sqlx::query(
            r#"
            INSERT INTO stream_records (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (key)
            DO UPDATE SET
               value      = excluded.value,
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

    async fn delete(&self, key: &StreamKey) -> Result<(), Error> {
        sqlx::query("DELETE FROM stream_records WHERE key = ?")
            .bind(key.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
