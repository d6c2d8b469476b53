// Queues Core - Domain Logic & Ports
// NO infrastructure dependencies (Hexagonal Architecture)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{EngineConfig, QueueEngine, Resolver, TypeRegistry};
pub use domain::{EntityRef, Item, Queue, QueueId, SliceSpec, Slot, Storable, TypeTag};
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
