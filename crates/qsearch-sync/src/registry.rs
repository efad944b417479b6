//! Index registry: entity type -> handler.
//!
//! Populated once at startup; the dispatcher resolves each entity-type
//! group through it and skips types nobody registered.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::IndexingError;
use crate::handler::SearchIndexHandler;

/// Resolution of the handler registered for an entity type.
pub trait IndexRegistry: Send + Sync {
    /// Fail with `IndexingError::UnregisteredIndex` for unknown types.
    fn resolve(&self, entity_type: &str) -> Result<Arc<dyn SearchIndexHandler>, IndexingError>;
}

/// Explicit map from entity type to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn SearchIndexHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one handler for every listed type.
    pub fn with_types<I, S>(types: I, handler: Arc<dyn SearchIndexHandler>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for entity_type in types {
            registry.register(entity_type, handler.clone());
        }
        registry
    }

    /// Register a handler, replacing any earlier one for the type.
    pub fn register(&mut self, entity_type: impl Into<String>, handler: Arc<dyn SearchIndexHandler>) {
        let entity_type = entity_type.into();
        debug!(entity_type = %entity_type, handler = %handler.name(), "Registered index");
        self.handlers.insert(entity_type, handler);
    }

    /// Registered entity types in ascending order.
    pub fn registered_types(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl IndexRegistry for HandlerRegistry {
    fn resolve(&self, entity_type: &str) -> Result<Arc<dyn SearchIndexHandler>, IndexingError> {
        self.handlers
            .get(entity_type)
            .cloned()
            .ok_or_else(|| IndexingError::UnregisteredIndex(entity_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsearch_types::Entity;

    struct NamedHandler(&'static str);

    impl SearchIndexHandler for NamedHandler {
        fn batch_update(&self, entities: &[Entity]) -> Result<usize, IndexingError> {
            Ok(entities.len())
        }

        fn remove(&self, _identifier: &str) -> Result<(), IndexingError> {
            Ok(())
        }

        fn commit(&self) -> Result<(), IndexingError> {
            Ok(())
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_resolve_registered() {
        let mut registry = HandlerRegistry::new();
        registry.register("blog.post", Arc::new(NamedHandler("posts")));

        let handler = registry.resolve("blog.post").unwrap();
        assert_eq!(handler.name(), "posts");
    }

    #[test]
    fn test_resolve_unregistered() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());

        let err = registry.resolve("x").err().unwrap();
        assert!(matches!(err, IndexingError::UnregisteredIndex(t) if t == "x"));
    }

    #[test]
    fn test_with_types_shares_handler() {
        let handler: Arc<dyn SearchIndexHandler> = Arc::new(NamedHandler("shared"));
        let registry = HandlerRegistry::with_types(["b", "a"], handler.clone());

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.registered_types(), vec!["a", "b"]);
        assert!(Arc::ptr_eq(&registry.resolve("a").unwrap(), &handler));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = HandlerRegistry::new();
        registry.register("a", Arc::new(NamedHandler("old")));
        registry.register("a", Arc::new(NamedHandler("new")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("a").unwrap().name(), "new");
    }
}
