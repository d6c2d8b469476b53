// Type Registry - process-wide table of storable types
//
// Populated during startup by every module that owns an entity type, then
// sealed. After sealing the table is read-only: lookups never race with
// registrations while the system is serving.

use crate::domain::{EntityId, EntityRef, EntityValue, Storable, TypeTag};
use crate::error::{AppError, Result};
use crate::port::{EntityLoader, EntityStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// Identity extractor: `None` when the value is not of the registered type
pub type IdentityFn = fn(&(dyn Any + Send + Sync)) -> Option<EntityId>;

/// One registered storable type
pub struct Registration {
    pub type_tag: TypeTag,
    pub type_name: &'static str,
    type_id: TypeId,
    loader: Arc<dyn EntityLoader>,
    identify: IdentityFn,
}

impl Registration {
    pub fn loader(&self) -> &dyn EntityLoader {
        self.loader.as_ref()
    }

    pub fn identify(&self, value: &(dyn Any + Send + Sync)) -> Option<EntityId> {
        (self.identify)(value)
    }
}

fn identify<T: Storable>(value: &(dyn Any + Send + Sync)) -> Option<EntityId> {
    value.downcast_ref::<T>().map(Storable::entity_id)
}

#[derive(Default)]
struct Tables {
    by_tag: HashMap<TypeTag, Arc<Registration>>,
    by_type: HashMap<TypeId, TypeTag>,
}

/// Table mapping type tags to loaders and identity extractors
#[derive(Default)]
pub struct TypeRegistry {
    tables: RwLock<Tables>,
    sealed: AtomicBool,
}

static GLOBAL: OnceLock<Arc<TypeRegistry>> = OnceLock::new();

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> Arc<TypeRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(TypeRegistry::new())))
    }

    /// Register `T` with a loader.
    ///
    /// Registering the same type under the same tag again is a no-op, even
    /// after sealing. A different Rust type under a taken tag is a conflict.
    pub fn register<T: Storable>(&self, loader: Arc<dyn EntityLoader>) -> Result<()> {
        let type_tag = TypeTag::new(T::TYPE_TAG)?;
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        let mut tables = self
            .tables
            .write()
            .map_err(|_| AppError::Internal("type registry lock poisoned".to_string()))?;

        if let Some(existing) = tables.by_tag.get(&type_tag) {
            if existing.type_id == type_id {
                return Ok(());
            }
            return Err(AppError::Conflict(format!(
                "type tag {} already registered for {}",
                type_tag, existing.type_name
            )));
        }
        if let Some(other_tag) = tables.by_type.get(&type_id) {
            return Err(AppError::Conflict(format!(
                "{} already registered under tag {}",
                type_name, other_tag
            )));
        }
        if self.is_sealed() {
            return Err(AppError::InvalidState(format!(
                "type registry is sealed; cannot register {}",
                type_tag
            )));
        }

        debug!(type_tag = %type_tag, type_name, "Registering storable type");

        tables.by_type.insert(type_id, type_tag.clone());
        tables.by_tag.insert(
            type_tag.clone(),
            Arc::new(Registration {
                type_tag,
                type_name,
                type_id,
                loader,
                identify: identify::<T>,
            }),
        );
        Ok(())
    }

    /// Register `T` as a JSON record kept in `store`
    pub fn register_record<T>(&self, store: Arc<dyn EntityStore>) -> Result<()>
    where
        T: Storable + DeserializeOwned,
    {
        self.register::<T>(Arc::new(RecordLoader::<T>::new(store)))
    }

    /// Freeze the table; later registrations of new types fail
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.tables
            .read()
            .map(|t| t.by_tag.keys().any(|tag| tag.as_str() == type_tag))
            .unwrap_or(false)
    }

    /// Registered tags in sorted order
    pub fn type_tags(&self) -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = self
            .tables
            .read()
            .map(|t| t.by_tag.keys().cloned().collect())
            .unwrap_or_default();
        tags.sort();
        tags
    }

    /// Registration for a tag, or `UnknownType`
    pub fn lookup(&self, type_tag: &TypeTag) -> Result<Arc<Registration>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| AppError::Internal("type registry lock poisoned".to_string()))?;
        tables
            .by_tag
            .get(type_tag)
            .cloned()
            .ok_or_else(|| AppError::UnknownType(type_tag.to_string()))
    }

    /// Registration for the concrete type of `value`, or `UnregisteredType`
    pub fn lookup_value(&self, value: &(dyn Any + Send + Sync)) -> Result<Arc<Registration>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| AppError::Internal("type registry lock poisoned".to_string()))?;
        tables
            .by_type
            .get(&value.type_id())
            .and_then(|tag| tables.by_tag.get(tag))
            .cloned()
            .ok_or_else(|| AppError::UnregisteredType(format!("{:?}", value.type_id())))
    }

    /// Type-erased reference for `value`
    pub fn reference_of(&self, value: &(dyn Any + Send + Sync)) -> Result<EntityRef> {
        let registration = self.lookup_value(value)?;
        let entity_id = registration.identify(value).ok_or_else(|| {
            AppError::Internal(format!(
                "identity extractor for {} rejected its own type",
                registration.type_tag
            ))
        })?;
        Ok(EntityRef::new(registration.type_tag.clone(), entity_id))
    }
}

/// Loader for types kept as JSON records in an [`EntityStore`]
pub struct RecordLoader<T> {
    store: Arc<dyn EntityStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RecordLoader<T> {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> EntityLoader for RecordLoader<T>
where
    T: Storable + DeserializeOwned,
{
    async fn load(&self, entity_id: &str) -> Result<Option<EntityValue>> {
        let entity: Option<T> = self.store.load::<T>(entity_id).await?;
        Ok(entity.map(|e| Arc::new(e) as EntityValue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget(u32);

    impl Storable for Widget {
        const TYPE_TAG: &'static str = "tests.widget";

        fn entity_id(&self) -> EntityId {
            self.0.to_string()
        }
    }

    struct Impostor;

    impl Storable for Impostor {
        const TYPE_TAG: &'static str = "tests.widget";

        fn entity_id(&self) -> EntityId {
            "impostor".to_string()
        }
    }

    struct Unloadable;

    #[async_trait]
    impl EntityLoader for Unloadable {
        async fn load(&self, _entity_id: &str) -> Result<Option<EntityValue>> {
            Ok(None)
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = TypeRegistry::new();
        registry.register::<Widget>(Arc::new(Unloadable)).unwrap();
        registry.register::<Widget>(Arc::new(Unloadable)).unwrap();
        assert_eq!(registry.type_tags().len(), 1);
        assert!(registry.is_registered("tests.widget"));
    }

    #[test]
    fn test_tag_collision_is_conflict() {
        let registry = TypeRegistry::new();
        registry.register::<Widget>(Arc::new(Unloadable)).unwrap();
        let result = registry.register::<Impostor>(Arc::new(Unloadable));
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_sealed_registry_rejects_new_types() {
        let registry = TypeRegistry::new();
        registry.register::<Widget>(Arc::new(Unloadable)).unwrap();
        registry.seal();

        // Re-registration stays a no-op
        assert!(registry.register::<Widget>(Arc::new(Unloadable)).is_ok());

        let other = TypeRegistry::new();
        other.seal();
        let result = other.register::<Widget>(Arc::new(Unloadable));
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_reference_of_dynamic_value() {
        let registry = TypeRegistry::new();
        registry.register::<Widget>(Arc::new(Unloadable)).unwrap();

        let reference = registry.reference_of(&Widget(9)).unwrap();
        assert_eq!(reference.to_string(), "tests.widget#9");

        let result = registry.reference_of(&Impostor);
        assert!(matches!(result, Err(AppError::UnregisteredType(_))));
    }

    #[test]
    fn test_lookup_unknown_tag() {
        let registry = TypeRegistry::new();
        let tag = TypeTag::new("tests.missing").unwrap();
        assert!(matches!(
            registry.lookup(&tag),
            Err(AppError::UnknownType(t)) if t == "tests.missing"
        ));
    }

    #[test]
    fn test_global_is_shared() {
        let a = TypeRegistry::global();
        let b = TypeRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
