// SQLite Queue Repository Implementation

use crate::error::map_sqlx_error;
use crate::transaction::SqliteQueueTransaction;
use async_trait::async_trait;
use queues_core::domain::Queue;
use queues_core::error::Result;
use queues_core::port::{QueueRepository, QueueTransaction};
use sqlx::SqlitePool;

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn begin(&self) -> Result<Box<dyn QueueTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteQueueTransaction::new(tx)))
    }

    async fn find_queue(&self, queue_id: &str) -> Result<Option<Queue>> {
        let row: Option<QueueRow> =
            sqlx::query_as("SELECT id, created_at FROM queues WHERE id = ?")
                .bind(queue_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(QueueRow::into_queue))
    }
}

/// SQLite row representation of a queue header
#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    id: String,
    created_at: i64,
}

impl QueueRow {
    fn into_queue(self) -> Queue {
        Queue::new(self.id, self.created_at)
    }
}
