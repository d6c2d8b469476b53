// Ordered Collection Engine
//
// Every operation opens its own store transaction and re-reads positions and
// length from the store. Nothing about a queue's contents is cached between
// calls. Mutating transactions start with `lock_queue`, which serializes
// writers of the same queue before any slot is read.

mod mutate;
mod read;
mod shuffle;

use super::config::EngineConfig;
use super::registry::TypeRegistry;
use super::resolver::Resolver;
use super::retry::RetryPolicy;
use crate::domain::{EntityValue, Queue};
use crate::error::{AppError, Result};
use crate::port::{
    EntityLoader, IdProvider, QueueRepository, RandomProvider, SystemTimeProvider,
    ThreadRngProvider, TimeProvider, UuidProvider,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Persistent queue engine
pub struct QueueEngine {
    repo: Arc<dyn QueueRepository>,
    resolver: Resolver,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    random: Arc<dyn RandomProvider>,
    retry: RetryPolicy,
}

impl QueueEngine {
    /// Create an engine over `repo`, registering the queue type in `registry`
    /// so that queues can be stored in queues.
    pub fn new(repo: Arc<dyn QueueRepository>, registry: Arc<TypeRegistry>) -> Result<Self> {
        registry.register::<Queue>(Arc::new(QueueLoader {
            repo: Arc::clone(&repo),
        }))?;

        Ok(Self {
            repo,
            resolver: Resolver::new(registry),
            id_provider: Arc::new(UuidProvider),
            time_provider: Arc::new(SystemTimeProvider),
            random: Arc::new(ThreadRngProvider),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.retry = config.retry;
        self
    }

    pub fn with_id_provider(mut self, id_provider: Arc<dyn IdProvider>) -> Self {
        self.id_provider = id_provider;
        self
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomProvider>) -> Self {
        self.random = random;
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Allocate a new empty queue
    pub async fn create(&self) -> Result<Queue> {
        let queue = Queue::new(
            self.id_provider.generate_id(),
            self.time_provider.now_millis(),
        );

        let queue_ref = &queue;
        self.retry
            .run("create", move || async move {
                let mut tx = self.repo.begin().await?;
                tx.insert_queue(queue_ref).await?;
                tx.commit().await
            })
            .await?;

        info!(queue_id = %queue.id, "Queue created");
        Ok(queue)
    }

    /// Handle for an existing queue
    pub async fn open(&self, queue_id: &str) -> Result<Queue> {
        self.repo
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| AppError::QueueNotFound(queue_id.to_string()))
    }

    /// Delete a queue and all of its slots.
    ///
    /// Referenced entities are left alone. Returns `false` if the queue was already gone.
    pub async fn delete(&self, queue: &Queue) -> Result<bool> {
        let queue_id = queue.id.as_str();
        let deleted = self
            .retry
            .run("delete", move || async move {
                let mut tx = self.repo.begin().await?;
                let deleted = tx.delete_queue(queue_id).await?;
                tx.commit().await?;
                Ok(deleted)
            })
            .await?;

        if deleted {
            info!(queue_id, "Queue deleted");
        }
        Ok(deleted)
    }

    /// Number of slots, from the maintained count
    pub async fn len(&self, queue: &Queue) -> Result<i64> {
        let queue_id = queue.id.as_str();
        self.retry
            .run("len", move || async move {
                let mut tx = self.repo.begin().await?;
                let len = tx.read_len(queue_id).await?;
                tx.rollback().await?;
                len.ok_or_else(|| AppError::QueueNotFound(queue_id.to_string()))
            })
            .await
    }

    pub async fn is_empty(&self, queue: &Queue) -> Result<bool> {
        Ok(self.len(queue).await? == 0)
    }
}

/// Loads queues by ID so that references to queues resolve
struct QueueLoader {
    repo: Arc<dyn QueueRepository>,
}

#[async_trait]
impl EntityLoader for QueueLoader {
    async fn load(&self, entity_id: &str) -> Result<Option<EntityValue>> {
        let queue = self.repo.find_queue(entity_id).await?;
        Ok(queue.map(|q| Arc::new(q) as EntityValue))
    }
}
