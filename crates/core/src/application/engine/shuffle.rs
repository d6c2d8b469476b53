// Shuffle: atomic random reassignment of positions

use super::QueueEngine;
use crate::domain::{validate_permutation, Position, Queue};
use crate::error::{AppError, Result};
use tracing::debug;

impl QueueEngine {
    /// Put the slots in a uniformly random order.
    ///
    /// The permutation comes from the engine's `RandomProvider` and is applied
    /// in one transaction: readers see either the old order or the new one.
    pub async fn shuffle(&self, queue: &Queue) -> Result<()> {
        let queue_id = queue.id.as_str();
        let len = self
            .retry
            .run("shuffle", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = tx
                    .lock_queue(queue_id)
                    .await?
                    .ok_or_else(|| AppError::QueueNotFound(queue_id.to_string()))?;
                if len < 2 {
                    tx.rollback().await?;
                    return Ok(len);
                }

                let order = self.random.permutation(len as usize);
                validate_permutation(&order)?;
                let order: Vec<Position> = order.into_iter().map(|p| p as Position).collect();

                tx.assign_positions(queue_id, &order).await?;
                tx.commit().await?;
                Ok(len)
            })
            .await?;

        debug!(queue_id = %queue.id, len, "Shuffled");
        Ok(())
    }
}
