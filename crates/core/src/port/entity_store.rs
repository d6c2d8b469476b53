// Entity Store Port (generic record substrate)

use crate::domain::{EntityRef, Storable};
use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Durable record store keyed by `(type_tag, entity_id)`.
///
/// Bodies are JSON documents; the store knows nothing about their shape.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert or replace a record
    async fn put(&self, reference: &EntityRef, body: &serde_json::Value) -> Result<()>;

    async fn get(&self, reference: &EntityRef) -> Result<Option<serde_json::Value>>;

    /// Delete a record; `false` if it did not exist
    async fn delete(&self, reference: &EntityRef) -> Result<bool>;
}

impl dyn EntityStore {
    /// Serialize and store a typed entity, returning its reference
    pub async fn save<T: Storable + Serialize>(&self, entity: &T) -> Result<EntityRef> {
        let reference = EntityRef::of(entity);
        let body = serde_json::to_value(entity)?;
        self.put(&reference, &body).await?;
        Ok(reference)
    }

    /// Load and decode a typed entity
    pub async fn load<T: Storable + DeserializeOwned>(&self, entity_id: &str) -> Result<Option<T>> {
        let reference = EntityRef::new(crate::domain::TypeTag::of::<T>(), entity_id);
        match self.get(&reference).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    /// Delete a typed entity
    pub async fn remove<T: Storable>(&self, entity: &T) -> Result<bool> {
        self.delete(&EntityRef::of(entity)).await
    }
}
