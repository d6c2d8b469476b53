// Queues Infrastructure - SQLite Adapter
// Implements: QueueRepository, QueueTransaction, EntityStore

mod connection;
mod entity_store;
mod error;
mod migration;
mod queue_repository;
mod transaction;

pub use connection::{
    create_pool, create_pool_with, StoreConfig, DEFAULT_BUSY_TIMEOUT, DEFAULT_DB_PATH,
    DEFAULT_MAX_CONNECTIONS, ENV_DB_BUSY_TIMEOUT_MS, ENV_DB_MAX_CONNECTIONS, ENV_DB_PATH,
};
pub use entity_store::SqliteEntityStore;
pub use migration::{current_version, run_migrations};
pub use queue_repository::SqliteQueueRepository;
pub use transaction::SqliteQueueTransaction;

// sqlx::Error conversion lives in error.rs as a helper function because of
// the orphan rule (no From<sqlx::Error> for AppError here)
