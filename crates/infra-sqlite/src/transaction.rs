// SQLite Transaction Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use queues_core::domain::{EntityRef, Position, Queue, Slot, TypeTag};
use queues_core::error::{AppError, Result};
use queues_core::port::{QueueTransaction, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};

const SLOT_COLUMNS: &str = "queue_id, position, item_type, item_id";

pub struct SqliteQueueTransaction {
    tx: SqlxTransaction<'static, Sqlite>,
}

impl SqliteQueueTransaction {
    pub fn new(tx: SqlxTransaction<'static, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteQueueTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl QueueTransaction for SqliteQueueTransaction {
    async fn insert_queue(&mut self, queue: &Queue) -> Result<()> {
        sqlx::query("INSERT INTO queues (id, len, created_at) VALUES (?, 0, ?)")
            .bind(&queue.id)
            .bind(queue.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_queue(&mut self, queue_id: &str) -> Result<bool> {
        // Slots go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM queues WHERE id = ?")
            .bind(queue_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn lock_queue(&mut self, queue_id: &str) -> Result<Option<i64>> {
        // A write as the first statement takes SQLite's write lock up front
        // (waiting through busy_timeout), so no stale read snapshot ever
        // needs upgrading. This is our SELECT ... FOR UPDATE.
        // The lock covers the whole database file, not just this row: a
        // writer on any other queue waits for it too (bounded by
        // busy_timeout, then retried as Busy). Readers are never blocked.
        sqlx::query_scalar("UPDATE queues SET len = len WHERE id = ? RETURNING len")
            .bind(queue_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn read_len(&mut self, queue_id: &str) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT len FROM queues WHERE id = ?")
            .bind(queue_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)
    }

    async fn set_len(&mut self, queue_id: &str, len: i64) -> Result<()> {
        sqlx::query("UPDATE queues SET len = ? WHERE id = ?")
            .bind(len)
            .bind(queue_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn slot_at(&mut self, queue_id: &str, position: Position) -> Result<Option<Slot>> {
        let row: Option<SlotRow> = sqlx::query_as(&format!(
            "SELECT {} FROM slots WHERE queue_id = ? AND position = ?",
            SLOT_COLUMNS
        ))
        .bind(queue_id)
        .bind(position)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(SlotRow::into_slot).transpose()
    }

    async fn slots_between(
        &mut self,
        queue_id: &str,
        first: Position,
        last: Position,
    ) -> Result<Vec<Slot>> {
        let rows: Vec<SlotRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM slots
            WHERE queue_id = ? AND position BETWEEN ? AND ?
            ORDER BY position ASC
            "#,
            SLOT_COLUMNS
        ))
        .bind(queue_id)
        .bind(first)
        .bind(last)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(SlotRow::into_slot).collect()
    }

    async fn slots(&mut self, queue_id: &str) -> Result<Vec<Slot>> {
        let rows: Vec<SlotRow> = sqlx::query_as(&format!(
            "SELECT {} FROM slots WHERE queue_id = ? ORDER BY position ASC",
            SLOT_COLUMNS
        ))
        .bind(queue_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(SlotRow::into_slot).collect()
    }

    async fn find_position(
        &mut self,
        queue_id: &str,
        item: &EntityRef,
    ) -> Result<Option<Position>> {
        sqlx::query_scalar(
            r#"
            SELECT position FROM slots
            WHERE queue_id = ? AND item_type = ? AND item_id = ?
            ORDER BY position ASC
            LIMIT 1
            "#,
        )
        .bind(queue_id)
        .bind(item.type_tag.as_str())
        .bind(&item.entity_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }

    async fn insert_slot(&mut self, slot: &Slot) -> Result<()> {
        sqlx::query(
            "INSERT INTO slots (queue_id, position, item_type, item_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&slot.queue_id)
        .bind(slot.position)
        .bind(slot.item.type_tag.as_str())
        .bind(&slot.item.entity_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_slot(&mut self, queue_id: &str, position: Position) -> Result<Option<Slot>> {
        let row: Option<SlotRow> = sqlx::query_as(&format!(
            "DELETE FROM slots WHERE queue_id = ? AND position = ? RETURNING {}",
            SLOT_COLUMNS
        ))
        .bind(queue_id)
        .bind(position)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.map(SlotRow::into_slot).transpose()
    }

    async fn shift_positions(
        &mut self,
        queue_id: &str,
        from: Position,
        delta: i64,
    ) -> Result<u64> {
        // UNIQUE(queue_id, position) is checked row by row, so a plain
        // `position = position + delta` can collide with a neighbour that
        // has not moved yet. Park the affected rows on distinct negative
        // positions first, then bring them back shifted.
        sqlx::query(
            "UPDATE slots SET position = -position - 1 WHERE queue_id = ? AND position >= ?",
        )
        .bind(queue_id)
        .bind(from)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        let result = sqlx::query(
            "UPDATE slots SET position = -position - 1 + ? WHERE queue_id = ? AND position < 0",
        )
        .bind(delta)
        .bind(queue_id)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn assign_positions(&mut self, queue_id: &str, order: &[Position]) -> Result<()> {
        let parked = sqlx::query("UPDATE slots SET position = -position - 1 WHERE queue_id = ?")
            .bind(queue_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if parked != order.len() as u64 {
            return Err(AppError::InvalidState(format!(
                "queue {} holds {} slots but {} positions were assigned",
                queue_id,
                parked,
                order.len()
            )));
        }

        for (current, &target) in order.iter().enumerate() {
            let moved = sqlx::query(
                "UPDATE slots SET position = ? WHERE queue_id = ? AND position = ?",
            )
            .bind(target)
            .bind(queue_id)
            .bind(-(current as i64) - 1)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

            if moved != 1 {
                return Err(AppError::InvalidState(format!(
                    "queue {} has no slot parked for position {}",
                    queue_id, current
                )));
            }
        }
        Ok(())
    }

    async fn clear_slots(&mut self, queue_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM slots WHERE queue_id = ?")
            .bind(queue_id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

/// SQLite row representation of a slot
#[derive(Debug, sqlx::FromRow)]
struct SlotRow {
    queue_id: String,
    position: i64,
    item_type: String,
    item_id: String,
}

impl SlotRow {
    fn into_slot(self) -> Result<Slot> {
        let type_tag = TypeTag::new(self.item_type)?;
        Ok(Slot::new(
            self.queue_id,
            self.position,
            EntityRef::new(type_tag, self.item_id),
        ))
    }
}
