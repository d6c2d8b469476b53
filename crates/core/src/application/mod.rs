// Application Layer - Services over the ports

pub mod config;
pub mod engine;
pub mod registry;
pub mod resolver;
pub mod retry;

// Re-exports
pub use config::EngineConfig;
pub use engine::QueueEngine;
pub use registry::{RecordLoader, Registration, TypeRegistry};
pub use resolver::Resolver;
pub use retry::{RetryDecision, RetryPolicy};
