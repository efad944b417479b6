//! Search indexer for writing entity documents.
//!
//! The indexer wraps IndexWriter with shared access via Arc<Mutex>.
//! Writes are not visible until commit() is called.

use std::sync::{Arc, Mutex, MutexGuard};

use tantivy::{IndexWriter, Term};
use tracing::{debug, info};

use qsearch_types::Entity;

use crate::document::entity_to_doc;
use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// Manages document write operations.
///
/// One writer is shared by every entity-type handler; Tantivy allows a
/// single writer per index.
pub struct SearchIndexer {
    writer: Arc<Mutex<IndexWriter>>,
    schema: SearchSchema,
}

impl SearchIndexer {
    /// Create a new indexer from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        Ok(Self {
            writer: Arc::new(Mutex::new(index.writer()?)),
            schema: index.schema().clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, IndexWriter>, SearchError> {
        self.writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))
    }

    /// Index a batch of entities under one writer lock.
    ///
    /// Existing documents with the same identifier are replaced.
    pub fn index_entities(&self, entities: &[Entity]) -> Result<usize, SearchError> {
        let writer = self.lock()?;

        for entity in entities {
            let term = Term::from_field_text(self.schema.doc_id, &entity.identifier());
            writer.delete_term(term);
            writer.add_document(entity_to_doc(&self.schema, entity))?;
        }

        debug!(count = entities.len(), "Indexed entity batch");
        Ok(entities.len())
    }

    /// Delete a document by wire identifier.
    ///
    /// Deleting an identifier that was never indexed is not an error.
    pub fn delete_document(&self, doc_id: &str) -> Result<(), SearchError> {
        let writer = self.lock()?;
        writer.delete_term(Term::from_field_text(self.schema.doc_id, doc_id));

        debug!(doc_id, "Deleted document");
        Ok(())
    }

    /// Commit pending changes to make them searchable.
    ///
    /// This is expensive - batch writes and commit once per flush.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let opstamp = self.lock()?.commit()?;
        info!(opstamp, "Committed index changes");
        Ok(opstamp)
    }
}
