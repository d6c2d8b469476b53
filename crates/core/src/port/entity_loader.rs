// Entity Loader Port

use crate::domain::EntityValue;
use crate::error::Result;
use async_trait::async_trait;

/// Loads one registered type by identity. `Ok(None)` means the entity is gone.
#[async_trait]
pub trait EntityLoader: Send + Sync {
    async fn load(&self, entity_id: &str) -> Result<Option<EntityValue>>;
}
