// Port Layer - Interfaces for external dependencies

pub mod entity_loader;
pub mod entity_store;
pub mod id_provider; // For deterministic testing
pub mod random_provider; // For deterministic shuffles
pub mod time_provider;
pub mod transaction;

// Re-exports
pub use entity_loader::EntityLoader;
pub use entity_store::EntityStore;
pub use id_provider::{IdProvider, SequentialIdProvider, UuidProvider};
pub use random_provider::{RandomProvider, SeededRandomProvider, ThreadRngProvider};
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
pub use transaction::{QueueRepository, QueueTransaction, Transaction};
