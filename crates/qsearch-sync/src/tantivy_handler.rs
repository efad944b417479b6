//! Tantivy-backed index handler.
//!
//! Wraps the shared [`SearchIndexer`] so it can be registered for any
//! number of entity types. Every registration should share one handler
//! instance so the flush commits the writer once.

use std::sync::Arc;

use tracing::debug;

use qsearch_index::SearchIndexer;
use qsearch_types::Entity;

use crate::error::IndexingError;
use crate::handler::SearchIndexHandler;

/// Full-text handler writing to a Tantivy index.
pub struct TantivyIndexHandler {
    indexer: Arc<SearchIndexer>,
    name: String,
}

impl TantivyIndexHandler {
    pub fn new(indexer: Arc<SearchIndexer>) -> Self {
        Self::named(indexer, "tantivy")
    }

    pub fn named(indexer: Arc<SearchIndexer>, name: impl Into<String>) -> Self {
        Self {
            indexer,
            name: name.into(),
        }
    }
}

impl SearchIndexHandler for TantivyIndexHandler {
    fn batch_update(&self, entities: &[Entity]) -> Result<usize, IndexingError> {
        Ok(self.indexer.index_entities(entities)?)
    }

    fn remove(&self, identifier: &str) -> Result<(), IndexingError> {
        Ok(self.indexer.delete_document(identifier)?)
    }

    fn commit(&self) -> Result<(), IndexingError> {
        let opstamp = self.indexer.commit()?;
        debug!(handler = %self.name, opstamp, "Handler committed");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
