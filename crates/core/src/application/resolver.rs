// Entity Reference Resolver
//
// Translates between type-erased references and concrete entities by
// dispatching on the type tag through the registry.

use super::registry::TypeRegistry;
use crate::domain::{EntityRef, Item, Storable};
use crate::error::{AppError, Result};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Resolver {
    registry: Arc<TypeRegistry>,
}

impl Resolver {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Reference for a concrete entity.
    ///
    /// Fails with `UnregisteredType` if `T` was never registered.
    pub fn make_ref<T: Storable>(&self, entity: &T) -> Result<EntityRef> {
        match self.registry.reference_of(entity) {
            Err(AppError::UnregisteredType(_)) => Err(AppError::UnregisteredType(
                std::any::type_name::<T>().to_string(),
            )),
            other => other,
        }
    }

    /// Fail with `UnknownType` unless the reference's tag is registered
    pub fn check_known(&self, reference: &EntityRef) -> Result<()> {
        self.registry.lookup(&reference.type_tag).map(|_| ())
    }

    /// Load the entity behind a reference.
    ///
    /// `UnknownType` if the tag is unregistered, `DanglingReference` if the
    /// entity no longer exists.
    pub async fn resolve(&self, reference: &EntityRef) -> Result<Item> {
        let registration = self.registry.lookup(&reference.type_tag)?;
        match registration.loader().load(&reference.entity_id).await? {
            Some(value) => {
                debug!(item = %reference, "Resolved reference");
                Ok(Item::new(reference.clone(), value))
            }
            None => {
                warn!(item = %reference, "Referenced entity no longer exists");
                Err(AppError::DanglingReference(reference.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityId, EntityValue, TypeTag};
    use crate::port::EntityLoader;
    use async_trait::async_trait;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: String,
        color: &'static str,
    }

    impl Storable for Widget {
        const TYPE_TAG: &'static str = "tests.widget";

        fn entity_id(&self) -> EntityId {
            self.id.clone()
        }
    }

    struct Unregistered;

    impl Storable for Unregistered {
        const TYPE_TAG: &'static str = "tests.unregistered";

        fn entity_id(&self) -> EntityId {
            "0".to_string()
        }
    }

    struct MapLoader(HashMap<String, Widget>);

    #[async_trait]
    impl EntityLoader for MapLoader {
        async fn load(&self, entity_id: &str) -> Result<Option<EntityValue>> {
            Ok(self
                .0
                .get(entity_id)
                .cloned()
                .map(|w| Arc::new(w) as EntityValue))
        }
    }

    fn resolver_with(widgets: &[Widget]) -> Resolver {
        let registry = Arc::new(TypeRegistry::new());
        let map = widgets.iter().map(|w| (w.id.clone(), w.clone())).collect();
        registry
            .register::<Widget>(Arc::new(MapLoader(map)))
            .unwrap();
        Resolver::new(registry)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let widget = Widget {
            id: "1".into(),
            color: "red",
        };
        let resolver = resolver_with(&[widget.clone()]);

        let reference = resolver.make_ref(&widget).unwrap();
        let item = resolver.resolve(&reference).await.unwrap();

        assert!(item.is(&widget));
        assert_eq!(item.downcast_ref::<Widget>(), Some(&widget));
    }

    #[tokio::test]
    async fn test_dangling_reference() {
        let resolver = resolver_with(&[]);
        let reference = EntityRef::new(TypeTag::new("tests.widget").unwrap(), "gone");

        let err = resolver.resolve(&reference).await.unwrap_err();
        assert!(matches!(err, AppError::DanglingReference(r) if r == reference));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let resolver = resolver_with(&[]);
        let reference = EntityRef::new(TypeTag::new("tests.nope").unwrap(), "1");

        assert!(matches!(
            resolver.resolve(&reference).await,
            Err(AppError::UnknownType(_))
        ));
        assert!(resolver.check_known(&reference).is_err());
    }

    #[test]
    fn test_unregistered_type_names_the_rust_type() {
        let resolver = resolver_with(&[]);
        let err = resolver.make_ref(&Unregistered).unwrap_err();
        match err {
            AppError::UnregisteredType(name) => assert!(name.ends_with("Unregistered")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
