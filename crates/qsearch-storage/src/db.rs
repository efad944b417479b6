//! RocksDB wrapper for queued search storage.
//!
//! Provides:
//! - Database open with column family setup
//! - Named FIFO queues (enqueue, dequeue, length, peek)
//! - Entity repository reads and writes
//! - Atomic entity write + queue message (producer side of the queue)

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, ReadOptions, WriteBatch, DB};
use tracing::{debug, info, warn};

use qsearch_types::{Entity, Identifier, QueueMessage};

use crate::column_families::{build_cf_descriptors, ALL_CF_NAMES, CF_ENTITIES, CF_QUEUE};
use crate::error::StorageError;
use crate::keys::{EntityKey, QueueKey};

/// Read and write positions of one queue.
///
/// Invariant: every live key of the queue has `head <= sequence < next`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct QueueCursor {
    /// Lowest sequence that may still be live
    head: u64,
    /// Sequence the next message gets
    next: u64,
}

type Cursors = HashMap<String, QueueCursor>;

/// Main storage interface for queued search
pub struct Storage {
    db: DB,
    /// Per-queue cursors, loaded lazily from the lowest and highest keys
    cursors: Mutex<Cursors>,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            cursors: Mutex::new(HashMap::new()),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    fn lock_cursors(&self) -> Result<MutexGuard<'_, Cursors>, StorageError> {
        self.cursors
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Read options confining an iterator to one queue's keys
    fn queue_read_opts(queue: &str) -> ReadOptions {
        let mut opts = ReadOptions::default();
        opts.set_iterate_upper_bound(QueueKey::prefix_end(queue));
        opts
    }

    /// Load a queue's cursor from its lowest and highest keys
    fn load_cursor(&self, queue: &str) -> Result<QueueCursor, StorageError> {
        let cf = self.cf(CF_QUEUE)?;
        let prefix = QueueKey::prefix(queue);
        let end = QueueKey::prefix_end(queue);

        // Iterate in reverse from the exclusive bound to find the highest key
        let mut iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&end, Direction::Reverse));
        let next = match iter.next() {
            Some(item) => {
                let (key, _) = item?;
                if key.starts_with(&prefix) {
                    QueueKey::from_bytes(&key)?.sequence + 1
                } else {
                    0
                }
            }
            None => 0,
        };

        let mut iter = self.db.iterator_cf_opt(
            cf,
            Self::queue_read_opts(queue),
            IteratorMode::From(&prefix, Direction::Forward),
        );
        let head = match iter.next() {
            Some(item) => QueueKey::from_bytes(&item?.0)?.sequence,
            None => next,
        };

        debug!(queue, head, next, "Loaded queue cursor");
        Ok(QueueCursor { head, next })
    }

    fn cursor<'a>(
        &self,
        cursors: &'a mut Cursors,
        queue: &str,
    ) -> Result<&'a mut QueueCursor, StorageError> {
        QueueKey::validate_queue_name(queue)?;
        if !cursors.contains_key(queue) {
            let cursor = self.load_cursor(queue)?;
            cursors.insert(queue.to_string(), cursor);
        }
        cursors
            .get_mut(queue)
            .ok_or_else(|| StorageError::Key(format!("No cursor for queue {}", queue)))
    }

    /// Write a batch together with one new queue message.
    ///
    /// The sequence only advances once the batch is written.
    fn write_with_message(
        &self,
        queue: &str,
        mut batch: WriteBatch,
        message: &[u8],
    ) -> Result<u64, StorageError> {
        let queue_cf = self.cf(CF_QUEUE)?;
        let mut cursors = self.lock_cursors()?;
        let cursor = self.cursor(&mut cursors, queue)?;

        let key = QueueKey::new(queue, cursor.next);
        batch.put_cf(queue_cf, key.to_bytes(), message);
        self.db.write(batch)?;

        cursor.next += 1;
        Ok(key.sequence)
    }

    // ==================== Queue Methods ====================

    /// Append a raw message to a queue.
    ///
    /// Returns the sequence number assigned to the message.
    pub fn enqueue(&self, queue: &str, message: impl AsRef<[u8]>) -> Result<u64, StorageError> {
        let message = message.as_ref();
        let sequence = self.write_with_message(queue, WriteBatch::default(), message)?;
        debug!(
            queue,
            sequence,
            message = %String::from_utf8_lossy(message),
            "Enqueued message"
        );
        Ok(sequence)
    }

    /// Pop the oldest message from a queue.
    ///
    /// The message is removed as it is read, so a crash after this call
    /// loses it. Returns None once the queue is empty. Bytes that are not
    /// UTF-8 are replaced rather than failing the read, leaving the
    /// rejection to the message parser.
    pub fn dequeue(&self, queue: &str) -> Result<Option<String>, StorageError> {
        let cf = self.cf(CF_QUEUE)?;
        let mut cursors = self.lock_cursors()?;
        let cursor = self.cursor(&mut cursors, queue)?;

        // Seek past messages already popped so their tombstones are skipped
        let start = QueueKey::new(queue, cursor.head).to_bytes();
        let mut iter = self.db.iterator_cf_opt(
            cf,
            Self::queue_read_opts(queue),
            IteratorMode::From(&start, Direction::Forward),
        );
        let (key, value) = match iter.next() {
            Some(item) => item?,
            None => {
                cursor.head = cursor.next;
                return Ok(None);
            }
        };
        let sequence = QueueKey::from_bytes(&key)?.sequence;

        self.db.delete_cf(cf, &key)?;
        cursor.head = sequence + 1;

        let message = match String::from_utf8(value.to_vec()) {
            Ok(message) => message,
            Err(e) => {
                warn!(queue, sequence, error = %e, "Queued message is not valid UTF-8");
                String::from_utf8_lossy(&value).into_owned()
            }
        };
        Ok(Some(message))
    }

    /// Count messages waiting in a queue
    pub fn queue_len(&self, queue: &str) -> Result<usize, StorageError> {
        let cf = self.cf(CF_QUEUE)?;
        let mut cursors = self.lock_cursors()?;
        let cursor = self.cursor(&mut cursors, queue)?;

        let start = QueueKey::new(queue, cursor.head).to_bytes();
        let iter = self.db.iterator_cf_opt(
            cf,
            Self::queue_read_opts(queue),
            IteratorMode::From(&start, Direction::Forward),
        );

        let mut count = 0;
        for item in iter {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Read up to `limit` messages from a queue without removing them.
    ///
    /// Returns Vec of (sequence, message) tuples in dequeue order.
    pub fn peek_queue(
        &self,
        queue: &str,
        limit: usize,
    ) -> Result<Vec<(u64, String)>, StorageError> {
        let cf = self.cf(CF_QUEUE)?;
        let mut cursors = self.lock_cursors()?;
        let cursor = self.cursor(&mut cursors, queue)?;

        let start = QueueKey::new(queue, cursor.head).to_bytes();
        let iter = self.db.iterator_cf_opt(
            cf,
            Self::queue_read_opts(queue),
            IteratorMode::From(&start, Direction::Forward),
        );

        let mut results = Vec::new();
        for item in iter.take(limit) {
            let (key, value) = item?;
            let queue_key = QueueKey::from_bytes(&key)?;
            results.push((
                queue_key.sequence,
                String::from_utf8_lossy(&value).into_owned(),
            ));
        }

        Ok(results)
    }

    // ==================== Entity Methods ====================

    /// Get an entity by identifier
    pub fn get_entity(&self, identifier: &Identifier) -> Result<Option<Entity>, StorageError> {
        let cf = self.cf(CF_ENTITIES)?;
        let key = EntityKey::new(identifier.encode());

        match self.db.get_cf(cf, key.to_bytes())? {
            Some(bytes) => Ok(Some(Entity::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Store an entity and queue an `update` message for it atomically.
    pub fn put_entity(&self, queue: &str, entity: &Entity) -> Result<(), StorageError> {
        let entities_cf = self.cf(CF_ENTITIES)?;

        let identifier = Identifier::new(&entity.entity_type, &entity.primary_key)
            .map_err(|e| StorageError::Key(e.to_string()))?;
        let message = QueueMessage::for_update(&identifier).encode();

        let mut batch = WriteBatch::default();
        batch.put_cf(
            entities_cf,
            EntityKey::new(identifier.encode()).to_bytes(),
            entity.to_bytes()?,
        );
        let sequence = self.write_with_message(queue, batch, message.as_bytes())?;

        debug!(identifier = %identifier, sequence, "Stored entity");
        Ok(())
    }

    /// Remove an entity and queue a `delete` message for it atomically.
    ///
    /// The message is queued even if the entity was already gone, so the
    /// index drops any stale document. Returns whether the entity existed.
    pub fn delete_entity(&self, queue: &str, identifier: &Identifier) -> Result<bool, StorageError> {
        let entities_cf = self.cf(CF_ENTITIES)?;

        let entity_key = EntityKey::new(identifier.encode()).to_bytes();
        let existed = self.db.get_cf(entities_cf, &entity_key)?.is_some();

        let message = QueueMessage::for_delete(identifier).encode();

        let mut batch = WriteBatch::default();
        batch.delete_cf(entities_cf, &entity_key);
        let sequence = self.write_with_message(queue, batch, message.as_bytes())?;

        debug!(identifier = %identifier, existed, sequence, "Deleted entity");
        Ok(existed)
    }

    /// Flush all column families to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.flush_cf(cf)?;
            }
        }
        Ok(())
    }

    /// Get database statistics.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        Ok(StorageStats {
            queued_message_count: self.count_cf_entries(self.cf(CF_QUEUE)?)?,
            entity_count: self.count_cf_entries(self.cf(CF_ENTITIES)?)?,
            disk_usage_bytes: self.get_disk_usage(),
        })
    }

    fn count_cf_entries(&self, cf: &ColumnFamily) -> Result<u64, StorageError> {
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn get_disk_usage(&self) -> u64 {
        let mut total_size = 0u64;
        if let Ok(entries) = std::fs::read_dir(self.db.path()) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    total_size += metadata.len();
                }
            }
        }
        total_size
    }
}

/// Statistics about the storage.
#[derive(Debug, Default)]
pub struct StorageStats {
    /// Messages waiting across all queues
    pub queued_message_count: u64,
    /// Entities in the repository
    pub entity_count: u64,
    /// Total disk usage in bytes
    pub disk_usage_bytes: u64,
}
