//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - queue: Change messages awaiting a drain cycle (append + pop-front)
//! - entities: Entity documents, point lookups by identifier

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for queued change messages
pub const CF_QUEUE: &str = "queue";

/// Column family name for the entity repository
pub const CF_ENTITIES: &str = "entities";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_QUEUE, CF_ENTITIES];

/// Create column family options for entities (compressed JSON documents)
fn entities_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_QUEUE, Options::default()),
        ColumnFamilyDescriptor::new(CF_ENTITIES, entities_options()),
    ]
}
