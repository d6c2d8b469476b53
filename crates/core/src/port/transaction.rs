// Transaction port for atomic queue operations

use crate::domain::{EntityRef, Position, Queue, Slot};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Entry point to the queue store.
///
/// Dropping a transaction without committing must roll it back.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Begin a new transaction
    async fn begin(&self) -> Result<Box<dyn QueueTransaction>>;

    /// Find a queue by ID (outside any transaction)
    async fn find_queue(&self, queue_id: &str) -> Result<Option<Queue>>;
}

/// Queue and slot operations within a transaction
#[async_trait]
pub trait QueueTransaction: Transaction {
    /// Insert a new, empty queue
    async fn insert_queue(&mut self, queue: &Queue) -> Result<()>;

    /// Delete a queue together with all of its slots
    async fn delete_queue(&mut self, queue_id: &str) -> Result<bool>;

    /// Take the write lock on the queue and return its length.
    ///
    /// Must be the first statement of every mutating transaction so that
    /// concurrent mutations of the same queue are serialized before any slot
    /// state is read. `None` if the queue does not exist.
    async fn lock_queue(&mut self, queue_id: &str) -> Result<Option<i64>>;

    /// Read the maintained length without locking
    async fn read_len(&mut self, queue_id: &str) -> Result<Option<i64>>;

    /// Overwrite the maintained length
    async fn set_len(&mut self, queue_id: &str, len: i64) -> Result<()>;

    async fn slot_at(&mut self, queue_id: &str, position: Position) -> Result<Option<Slot>>;

    /// Slots with `first <= position <= last`, ascending
    async fn slots_between(
        &mut self,
        queue_id: &str,
        first: Position,
        last: Position,
    ) -> Result<Vec<Slot>>;

    /// All slots of the queue, ascending by position
    async fn slots(&mut self, queue_id: &str) -> Result<Vec<Slot>>;

    /// Lowest position holding `item`, if any
    async fn find_position(&mut self, queue_id: &str, item: &EntityRef)
        -> Result<Option<Position>>;

    async fn insert_slot(&mut self, slot: &Slot) -> Result<()>;

    /// Delete the slot at `position`, returning it
    async fn delete_slot(&mut self, queue_id: &str, position: Position) -> Result<Option<Slot>>;

    /// Add `delta` to every position `>= from` as one batch.
    ///
    /// Implementations must not trip the `(queue, position)` uniqueness
    /// constraint midway, whatever order rows are visited in.
    async fn shift_positions(&mut self, queue_id: &str, from: Position, delta: i64)
        -> Result<u64>;

    /// Move the slot currently at position `i` to `order[i]`, for every `i`.
    ///
    /// `order` must be a permutation of `0..len`.
    async fn assign_positions(&mut self, queue_id: &str, order: &[Position]) -> Result<()>;

    /// Delete every slot of the queue
    async fn clear_slots(&mut self, queue_id: &str) -> Result<u64>;
}
