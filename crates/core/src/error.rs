// Central Error Type for the Application

use crate::domain::EntityRef;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// Index outside `[-len, len)` for the queue's current length
    #[error("Index out of range: {index} (len {len})")]
    IndexOutOfRange { index: i64, len: i64 },

    /// The referenced entity no longer exists in the store
    #[error("Dangling reference: {0}")]
    DanglingReference(EntityRef),

    /// A reference carries a type tag nobody registered
    #[error("Unknown type tag: {0}")]
    UnknownType(String),

    /// An entity's Rust type was never registered as storable
    #[error("Unregistered type: {0}")]
    UnregisteredType(String),

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// Transient store contention (lock held, snapshot stale). Retried by the engine.
    #[error("Store busy: {0}")]
    Busy(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the failed operation may succeed if run again unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Busy(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by mapping SQLite result codes onto AppError variants
