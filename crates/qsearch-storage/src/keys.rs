//! Key encoding and decoding for storage layer.
//!
//! Queue key format: `queue:{name}:{sequence:020}`
//! - name: queue name (must not contain `:`)
//! - sequence: monotonic per-queue counter, zero-padded to 20 digits
//!
//! Entity key format: `entity:{identifier}`
//!
//! Zero padding makes lexicographic order equal dequeue order.

use crate::error::StorageError;

/// Key for queued messages
/// Format: queue:{name}:{sequence:020}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKey {
    /// Queue name
    pub queue: String,
    /// Monotonic sequence number within the queue
    pub sequence: u64,
}

impl QueueKey {
    /// Create a new queue key
    pub fn new(queue: impl Into<String>, sequence: u64) -> Self {
        Self {
            queue: queue.into(),
            sequence,
        }
    }

    /// Encode key to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("queue:{}:{:020}", self.queue, self.sequence).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let rest = s
            .strip_prefix("queue:")
            .ok_or_else(|| StorageError::Key(format!("Invalid queue key format: {}", s)))?;
        let (queue, sequence) = rest
            .rsplit_once(':')
            .ok_or_else(|| StorageError::Key(format!("Invalid queue key format: {}", s)))?;

        let sequence: u64 = sequence
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid sequence: {}", e)))?;

        Ok(Self::new(queue, sequence))
    }

    /// Check a queue name can be used in a key.
    ///
    /// A `:` would let one queue's prefix cover another queue's keys.
    pub fn validate_queue_name(queue: &str) -> Result<(), StorageError> {
        if queue.is_empty() {
            return Err(StorageError::Key("Queue name is empty".to_string()));
        }
        if queue.contains(':') {
            return Err(StorageError::Key(format!(
                "Queue name must not contain ':': {}",
                queue
            )));
        }
        Ok(())
    }

    /// Prefix shared by every key of one queue
    pub fn prefix(queue: &str) -> Vec<u8> {
        format!("queue:{}:", queue).into_bytes()
    }

    /// First key sorting after every key of one queue (exclusive bound)
    pub fn prefix_end(queue: &str) -> Vec<u8> {
        // ';' is the byte right after ':'
        format!("queue:{};", queue).into_bytes()
    }
}

/// Key for entity documents
/// Format: entity:{identifier}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
    /// Wire-form identifier, e.g. `blog.post.42`
    pub identifier: String,
}

impl EntityKey {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("entity:{}", self.identifier).into_bytes()
    }
}
