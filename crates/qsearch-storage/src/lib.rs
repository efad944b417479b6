//! Storage layer for queued search.
//!
//! Provides RocksDB-backed storage with:
//! - Named FIFO queues of change messages, keyed by monotonic sequence
//! - An entity repository keyed by wire identifier
//! - Atomic entity write + queue message via WriteBatch

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{EntityKey, QueueKey};
