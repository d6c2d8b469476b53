// Entity Reference Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Identity of a stored entity within its type
pub type EntityId = String;

/// Type-erased, shared entity value as produced by a loader
pub type EntityValue = Arc<dyn Any + Send + Sync>;

/// Identifier of a storable type (e.g. `queues.queue`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeTag(String);

impl TypeTag {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() || tag.contains('#') || tag.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidTypeTag(tag));
        }
        Ok(Self(tag))
    }

    /// Tag of a storable type, taken from its declaration
    pub fn of<T: Storable>() -> Self {
        Self(T::TYPE_TAG.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Weak, type-erased pointer to any storable entity.
///
/// Two references are the same item when both the tag and the id match;
/// field values of the referenced entity never take part in comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub type_tag: TypeTag,
    pub entity_id: EntityId,
}

impl EntityRef {
    pub fn new(type_tag: TypeTag, entity_id: impl Into<EntityId>) -> Self {
        Self {
            type_tag,
            entity_id: entity_id.into(),
        }
    }

    /// Reference built straight from the entity's declared tag.
    ///
    /// This does not consult the type registry; use
    /// [`Resolver::make_ref`](crate::application::Resolver::make_ref) when the
    /// type must be known to be registered.
    pub fn of<T: Storable>(entity: &T) -> Self {
        Self::new(TypeTag::of::<T>(), entity.entity_id())
    }

    pub fn is<T: Storable>(&self, entity: &T) -> bool {
        self.type_tag.as_str() == T::TYPE_TAG && self.entity_id == entity.entity_id()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_tag, self.entity_id)
    }
}

/// A type that can be stored and referenced from a queue
pub trait Storable: Any + Send + Sync {
    /// Registry key for this type; must be unique across the process
    const TYPE_TAG: &'static str;

    fn entity_id(&self) -> EntityId;
}

/// A resolved queue item: the reference it was stored under plus the loaded entity
#[derive(Clone)]
pub struct Item {
    reference: EntityRef,
    value: EntityValue,
}

impl Item {
    pub fn new(reference: EntityRef, value: EntityValue) -> Self {
        Self { reference, value }
    }

    pub fn reference(&self) -> &EntityRef {
        &self.reference
    }

    pub fn type_tag(&self) -> &TypeTag {
        &self.reference.type_tag
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Identity check against a concrete entity
    pub fn is<T: Storable>(&self, entity: &T) -> bool {
        self.reference.is(entity)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Item {}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Item").field(&self.reference).finish()
    }
}
