// Reads: indexing, slicing, membership, iteration

use super::QueueEngine;
use crate::domain::{normalize_index, EntityRef, Item, Queue, SliceSpec, Slot, Storable};
use crate::error::{AppError, Result};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::collections::HashMap;

impl QueueEngine {
    /// Item at `index` (negative counts from the end)
    pub async fn get(&self, queue: &Queue, index: i64) -> Result<Item> {
        let slot = self.slot_at(queue, index).await?;
        self.resolver.resolve(&slot.item).await
    }

    /// Slot at `index` without resolving its item
    pub async fn slot_at(&self, queue: &Queue, index: i64) -> Result<Slot> {
        let queue_id = queue.id.as_str();
        self.retry
            .run("get", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = tx
                    .read_len(queue_id)
                    .await?
                    .ok_or_else(|| AppError::QueueNotFound(queue_id.to_string()))?;
                let position = normalize_index(index, len)
                    .ok_or(AppError::IndexOutOfRange { index, len })?;

                let slot = tx.slot_at(queue_id, position).await?;
                tx.rollback().await?;
                slot.ok_or_else(|| {
                    AppError::InvalidState(format!(
                        "queue {} has len {} but no slot at {}",
                        queue_id, len, position
                    ))
                })
            })
            .await
    }

    /// Items selected by a Python-style slice. Never fails for an empty selection.
    pub async fn slice(&self, queue: &Queue, spec: impl Into<SliceSpec>) -> Result<Vec<Item>> {
        let slots = self.slice_slots(queue, spec.into()).await?;
        futures::future::try_join_all(slots.iter().map(|s| self.resolver.resolve(&s.item))).await
    }

    pub async fn slice_slots(&self, queue: &Queue, spec: SliceSpec) -> Result<Vec<Slot>> {
        let queue_id = queue.id.as_str();
        self.retry
            .run("slice", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = tx
                    .read_len(queue_id)
                    .await?
                    .ok_or_else(|| AppError::QueueNotFound(queue_id.to_string()))?;

                let positions = spec.indices(len)?;
                let (Some(&first), Some(&last)) =
                    (positions.iter().min(), positions.iter().max())
                else {
                    tx.rollback().await?;
                    return Ok(Vec::new());
                };

                let mut by_position: HashMap<i64, Slot> = tx
                    .slots_between(queue_id, first, last)
                    .await?
                    .into_iter()
                    .map(|slot| (slot.position, slot))
                    .collect();
                tx.rollback().await?;

                positions
                    .iter()
                    .map(|p| {
                        by_position.remove(p).ok_or_else(|| {
                            AppError::InvalidState(format!(
                                "queue {} has len {} but no slot at {}",
                                queue_id, len, p
                            ))
                        })
                    })
                    .collect()
            })
            .await
    }

    /// Whether the queue holds `entity`, compared by reference identity
    pub async fn contains<T: Storable>(&self, queue: &Queue, entity: &T) -> Result<bool> {
        let item = self.resolver.make_ref(entity)?;
        self.contains_ref(queue, &item).await
    }

    pub async fn contains_ref(&self, queue: &Queue, item: &EntityRef) -> Result<bool> {
        let queue_id = queue.id.as_str();
        self.retry
            .run("contains", move || async move {
                let mut tx = self.repo.begin().await?;
                if tx.read_len(queue_id).await?.is_none() {
                    return Err(AppError::QueueNotFound(queue_id.to_string()));
                }
                let position = tx.find_position(queue_id, item).await?;
                tx.rollback().await?;
                Ok(position.is_some())
            })
            .await
    }

    /// All slots in position order
    pub async fn slots(&self, queue: &Queue) -> Result<Vec<Slot>> {
        let queue_id = queue.id.as_str();
        self.retry
            .run("slots", move || async move {
                let mut tx = self.repo.begin().await?;
                if tx.read_len(queue_id).await?.is_none() {
                    return Err(AppError::QueueNotFound(queue_id.to_string()));
                }
                let slots = tx.slots(queue_id).await?;
                tx.rollback().await?;
                Ok(slots)
            })
            .await
    }

    /// Lazily resolved items in position order.
    ///
    /// The set of references is read once, when this is called; later
    /// mutations of the queue do not show up in the returned stream. Calling
    /// again starts a fresh snapshot.
    pub async fn iter(&self, queue: &Queue) -> Result<impl Stream<Item = Result<Item>> + Send + '_> {
        let slots = self.slots(queue).await?;
        let resolver = &self.resolver;
        Ok(stream::iter(slots).then(move |slot| async move { resolver.resolve(&slot.item).await }))
    }

    /// Every item, resolved, in position order
    pub async fn items(&self, queue: &Queue) -> Result<Vec<Item>> {
        self.iter(queue).await?.try_collect().await
    }

    /// Check that positions are exactly `0..len` and match the maintained count
    pub async fn verify(&self, queue: &Queue) -> Result<()> {
        let queue_id = queue.id.as_str();
        self.retry
            .run("verify", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = tx
                    .read_len(queue_id)
                    .await?
                    .ok_or_else(|| AppError::QueueNotFound(queue_id.to_string()))?;
                let slots = tx.slots(queue_id).await?;
                tx.rollback().await?;

                if slots.len() as i64 != len {
                    return Err(AppError::InvalidState(format!(
                        "queue {} records len {} but holds {} slots",
                        queue_id,
                        len,
                        slots.len()
                    )));
                }
                for (expected, slot) in slots.iter().enumerate() {
                    if slot.position != expected as i64 {
                        return Err(AppError::InvalidState(format!(
                            "queue {} has slot at {} where {} was expected",
                            queue_id, slot.position, expected
                        )));
                    }
                }
                Ok(())
            })
            .await
    }
}
