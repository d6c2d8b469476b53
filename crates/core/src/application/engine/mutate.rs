// Mutations: push, insert, pop, remove, clear

use super::QueueEngine;
use crate::domain::{clamp_insert_index, normalize_index, EntityRef, Item, Queue, Slot, Storable};
use crate::error::{AppError, Result};
use crate::port::QueueTransaction;
use tracing::debug;

/// Lock the queue row and return its length
async fn lock(tx: &mut Box<dyn QueueTransaction>, queue_id: &str) -> Result<i64> {
    tx.lock_queue(queue_id)
        .await?
        .ok_or_else(|| AppError::QueueNotFound(queue_id.to_string()))
}

impl QueueEngine {
    /// Append `entity` at the end of the queue
    pub async fn push<T: Storable>(&self, queue: &Queue, entity: &T) -> Result<Slot> {
        let item = self.resolver.make_ref(entity)?;
        self.push_ref(queue, item).await
    }

    /// Append a pre-built reference. The tag must be registered.
    pub async fn push_ref(&self, queue: &Queue, item: EntityRef) -> Result<Slot> {
        self.resolver.check_known(&item)?;

        let (queue_id, item) = (queue.id.as_str(), &item);
        let slot = self
            .retry
            .run("push", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = lock(&mut tx, queue_id).await?;

                let slot = Slot::new(queue_id, len, item.clone());
                tx.insert_slot(&slot).await?;
                tx.set_len(queue_id, len + 1).await?;
                tx.commit().await?;
                Ok(slot)
            })
            .await?;

        debug!(queue_id = %queue.id, item = %slot.item, position = slot.position, "Pushed");
        Ok(slot)
    }

    /// Insert `entity` before `index`, shifting later slots up.
    ///
    /// Like `list.insert`, out-of-range indices clamp to the ends.
    pub async fn insert<T: Storable>(&self, queue: &Queue, index: i64, entity: &T) -> Result<Slot> {
        let item = self.resolver.make_ref(entity)?;
        self.insert_ref(queue, index, item).await
    }

    pub async fn insert_ref(&self, queue: &Queue, index: i64, item: EntityRef) -> Result<Slot> {
        self.resolver.check_known(&item)?;

        let (queue_id, item) = (queue.id.as_str(), &item);
        let slot = self
            .retry
            .run("insert", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = lock(&mut tx, queue_id).await?;
                let position = clamp_insert_index(index, len);

                tx.shift_positions(queue_id, position, 1).await?;
                let slot = Slot::new(queue_id, position, item.clone());
                tx.insert_slot(&slot).await?;
                tx.set_len(queue_id, len + 1).await?;
                tx.commit().await?;
                Ok(slot)
            })
            .await?;

        debug!(queue_id = %queue.id, item = %slot.item, position = slot.position, "Inserted");
        Ok(slot)
    }

    /// Remove and return the item at `index` (negative counts from the end).
    ///
    /// The removal commits even when the referenced entity has since been
    /// deleted; in that case `DanglingReference` is returned afterwards and
    /// the queue no longer holds the slot.
    pub async fn pop(&self, queue: &Queue, index: i64) -> Result<Item> {
        let slot = self.pop_slot(queue, index).await?;
        self.resolver.resolve(&slot.item).await
    }

    /// Remove and return the last item
    pub async fn pop_back(&self, queue: &Queue) -> Result<Item> {
        self.pop(queue, -1).await
    }

    /// Remove and return the first item
    pub async fn pop_front(&self, queue: &Queue) -> Result<Item> {
        self.pop(queue, 0).await
    }

    /// Remove the slot at `index` without resolving its item
    pub async fn pop_slot(&self, queue: &Queue, index: i64) -> Result<Slot> {
        let queue_id = queue.id.as_str();
        let slot = self
            .retry
            .run("pop", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = lock(&mut tx, queue_id).await?;
                let position = normalize_index(index, len)
                    .ok_or(AppError::IndexOutOfRange { index, len })?;

                let slot = tx.delete_slot(queue_id, position).await?.ok_or_else(|| {
                    AppError::InvalidState(format!(
                        "queue {} has len {} but no slot at {}",
                        queue_id, len, position
                    ))
                })?;
                tx.shift_positions(queue_id, position + 1, -1).await?;
                tx.set_len(queue_id, len - 1).await?;
                tx.commit().await?;
                Ok(slot)
            })
            .await?;

        debug!(queue_id = %queue.id, item = %slot.item, position = slot.position, "Popped");
        Ok(slot)
    }

    /// Remove the first slot referencing `entity`. `false` if none does.
    pub async fn remove<T: Storable>(&self, queue: &Queue, entity: &T) -> Result<bool> {
        let item = self.resolver.make_ref(entity)?;
        self.remove_ref(queue, &item).await
    }

    pub async fn remove_ref(&self, queue: &Queue, item: &EntityRef) -> Result<bool> {
        let queue_id = queue.id.as_str();
        let removed = self
            .retry
            .run("remove", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = lock(&mut tx, queue_id).await?;

                let Some(position) = tx.find_position(queue_id, item).await? else {
                    tx.rollback().await?;
                    return Ok(false);
                };

                tx.delete_slot(queue_id, position).await?;
                tx.shift_positions(queue_id, position + 1, -1).await?;
                tx.set_len(queue_id, len - 1).await?;
                tx.commit().await?;
                Ok(true)
            })
            .await?;

        debug!(queue_id, item = %item, removed, "Removed");
        Ok(removed)
    }

    /// Remove every slot. Returns how many were removed.
    pub async fn clear(&self, queue: &Queue) -> Result<u64> {
        let queue_id = queue.id.as_str();
        let removed = self
            .retry
            .run("clear", move || async move {
                let mut tx = self.repo.begin().await?;
                lock(&mut tx, queue_id).await?;
                let removed = tx.clear_slots(queue_id).await?;
                tx.set_len(queue_id, 0).await?;
                tx.commit().await?;
                Ok(removed)
            })
            .await?;

        debug!(queue_id = %queue.id, removed, "Cleared");
        Ok(removed)
    }
}
