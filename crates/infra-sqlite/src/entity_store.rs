// SQLite Entity Store Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use queues_core::domain::EntityRef;
use queues_core::error::{AppError, Result};
use queues_core::port::{EntityStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// JSON record table backing `EntityStore`
pub struct SqliteEntityStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteEntityStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }
}

#[async_trait]
impl EntityStore for SqliteEntityStore {
    async fn put(&self, reference: &EntityRef, body: &serde_json::Value) -> Result<()> {
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            INSERT INTO entities (type_tag, entity_id, body, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (type_tag, entity_id)
            DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            "#,
        )
        .bind(reference.type_tag.as_str())
        .bind(&reference.entity_id)
        .bind(body.to_string())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(entity = %reference, "Entity stored");
        Ok(())
    }

    async fn get(&self, reference: &EntityRef) -> Result<Option<serde_json::Value>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM entities WHERE type_tag = ? AND entity_id = ?")
                .bind(reference.type_tag.as_str())
                .bind(&reference.entity_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        body.map(|raw| {
            serde_json::from_str(&raw).map_err(|e| {
                AppError::Database(format!("corrupt body for {}: {}", reference, e))
            })
        })
        .transpose()
    }

    async fn delete(&self, reference: &EntityRef) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entities WHERE type_tag = ? AND entity_id = ?")
            .bind(reference.type_tag.as_str())
            .bind(&reference.entity_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
