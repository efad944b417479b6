//! Index handler trait.
//!
//! A handler is the search index registered for one or more entity
//! types. The dispatcher hands it whole batches, so backends can
//! amortize round-trips and merge cost.

use qsearch_types::Entity;

use crate::error::IndexingError;

/// Index-specific write operations.
pub trait SearchIndexHandler: Send + Sync {
    /// Index or re-index every entity in one backend call.
    ///
    /// Returns the number of entities written.
    fn batch_update(&self, entities: &[Entity]) -> Result<usize, IndexingError>;

    /// Remove a document by wire identifier.
    ///
    /// Must not require the entity to still exist anywhere.
    fn remove(&self, identifier: &str) -> Result<(), IndexingError>;

    /// Commit pending changes to make them visible.
    ///
    /// This may be expensive - called once per flush.
    fn commit(&self) -> Result<(), IndexingError>;

    /// Get the name of this handler for logging.
    fn name(&self) -> &str;
}
