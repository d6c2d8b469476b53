// Domain Layer - Pure ordering logic and entities

pub mod error;
pub mod index;
pub mod queue;
pub mod reference;

// Re-exports
pub use error::DomainError;
pub use index::{clamp_insert_index, normalize_index, validate_permutation, SliceSpec};
pub use queue::{Position, Queue, QueueId, Slot, QUEUE_TYPE_TAG};
pub use reference::{EntityId, EntityRef, EntityValue, Item, Storable, TypeTag};
