//! Error types for the drain-and-flush engine.
//!
//! None of these abort a drain cycle: each is logged and the offending
//! message, entity or group is skipped.

use qsearch_index::SearchError;
use qsearch_storage::StorageError;
use thiserror::Error;

/// Errors raised by index handlers and the registry
#[derive(Error, Debug)]
pub enum IndexingError {
    /// No index handler registered for an entity type
    #[error("No index registered for entity type: {0}")]
    UnregisteredIndex(String),

    /// Generic index operation error
    #[error("Index error: {0}")]
    Index(String),

    /// Tantivy index error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

/// Errors raised by a message queue.
#[derive(Error, Debug)]
pub enum QueueError {
    /// No message remains; the normal end of the draining phase
    #[error("Queue is empty")]
    Empty,

    /// The queue backend failed
    #[error("Queue backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for QueueError {
    fn from(err: StorageError) -> Self {
        QueueError::Backend(err.to_string())
    }
}

/// Errors raised while resolving an identifier into a live entity.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Entity no longer exists (deleted after its update was queued)
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// More than one entity answers to the key
    #[error("Ambiguous key: {0}")]
    AmbiguousKey(String),

    /// The repository backend failed
    #[error("Repository backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for RepositoryError {
    fn from(err: StorageError) -> Self {
        RepositoryError::Backend(err.to_string())
    }
}
