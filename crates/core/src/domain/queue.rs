// Queue Domain Model

use super::reference::{EntityId, EntityRef, Storable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue identifier (UUID v4)
pub type QueueId = String;

/// Zero-based rank of a slot within its queue
pub type Position = i64;

/// Type tag under which queues themselves are referenced
pub const QUEUE_TYPE_TAG: &str = "queues.queue";

/// Handle to a persistent queue.
///
/// Holds identity only. Length and contents always come from the store,
/// so a handle never goes stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub id: QueueId,
    pub created_at: i64, // epoch ms
}

impl Queue {
    pub fn new(id: impl Into<QueueId>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            created_at,
        }
    }
}

impl Storable for Queue {
    const TYPE_TAG: &'static str = QUEUE_TYPE_TAG;

    fn entity_id(&self) -> EntityId {
        self.id.clone()
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue {}", self.id)
    }
}

/// One positioned reference inside a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub queue_id: QueueId,
    pub position: Position,
    pub item: EntityRef,
}

impl Slot {
    pub fn new(queue_id: impl Into<QueueId>, position: Position, item: EntityRef) -> Self {
        Self {
            queue_id: queue_id.into(),
            position,
            item,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot {} in Queue {}", self.position, self.queue_id)
    }
}
