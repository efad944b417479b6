//! Message queue collaborator.
//!
//! The drain cycle only needs FIFO reads and an advisory length. Reads
//! consume the message; `QueueError::Empty` ends the draining phase.

use std::sync::Arc;

use qsearch_storage::Storage;

use crate::error::QueueError;

/// FIFO source of raw `"<action>:<identifier>"` messages.
pub trait MessageQueue: Send + Sync {
    /// Queue name for logging.
    fn name(&self) -> &str;

    /// Number of waiting messages. Advisory only.
    fn len(&self) -> Result<usize, QueueError>;

    /// Remove and return the oldest message, or `QueueError::Empty`.
    fn read(&self) -> Result<String, QueueError>;
}

/// Named queue stored in the RocksDB queue column family.
pub struct StorageQueue {
    storage: Arc<Storage>,
    name: String,
}

impl StorageQueue {
    pub fn new(storage: Arc<Storage>, name: impl Into<String>) -> Self {
        Self {
            storage,
            name: name.into(),
        }
    }
}

impl MessageQueue for StorageQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> Result<usize, QueueError> {
        Ok(self.storage.queue_len(&self.name)?)
    }

    fn read(&self) -> Result<String, QueueError> {
        self.storage.dequeue(&self.name)?.ok_or(QueueError::Empty)
    }
}
