//! Entity repository collaborator.
//!
//! Resolves an `(entity_type, primary_key)` pair into a live entity at
//! flush time. Deletes never go through the repository.

use qsearch_storage::Storage;
use qsearch_types::{Entity, Identifier};

use crate::error::RepositoryError;

/// Lookup of live entities by type and primary key.
pub trait EntityRepository: Send + Sync {
    /// Fetch the entity, failing with `NotFound` or `AmbiguousKey`.
    fn fetch(&self, entity_type: &str, primary_key: &str) -> Result<Entity, RepositoryError>;
}

impl EntityRepository for Storage {
    fn fetch(&self, entity_type: &str, primary_key: &str) -> Result<Entity, RepositoryError> {
        let identifier = Identifier::new(entity_type, primary_key)
            .map_err(|e| RepositoryError::NotFound(e.to_string()))?;

        let entity = self
            .get_entity(&identifier)?
            .ok_or_else(|| RepositoryError::NotFound(identifier.encode()))?;

        // The stored document must name the key it is stored under
        if entity.entity_type != entity_type || entity.primary_key != primary_key {
            return Err(RepositoryError::AmbiguousKey(format!(
                "{} resolves to {}",
                identifier,
                entity.identifier()
            )));
        }

        Ok(entity)
    }
}
