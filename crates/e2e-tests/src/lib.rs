//! End-to-end test infrastructure for queued search.
//!
//! Provides a shared TestHarness wiring real RocksDB storage, a real
//! Tantivy index and the drain cycle together.

use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;

use qsearch_index::{EntitySearcher, SearchIndex, SearchIndexConfig, SearchIndexer, SearchOptions};
use qsearch_storage::Storage;
use qsearch_sync::{
    CycleReport, DrainCycle, HandlerRegistry, StorageQueue, SyncConfig, TantivyIndexHandler,
};
use qsearch_types::{Entity, Identifier};

/// Queue name used by every harness.
pub const TEST_QUEUE: &str = "search_queue";

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
    /// Path for the Tantivy index files
    pub index_path: PathBuf,
    /// Open search index
    pub index: SearchIndex,
    /// The index's single writer, shared by every cycle
    pub indexer: Arc<SearchIndexer>,
}

impl TestHarness {
    /// Create a new test harness with temp directory, storage and index.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(
            Storage::open(&temp_dir.path().join("db")).expect("Failed to open test storage"),
        );

        let index_path = temp_dir.path().join("search-index");
        let index = SearchIndex::open_or_create(SearchIndexConfig::new(&index_path))
            .expect("Failed to open search index");
        let indexer = Arc::new(SearchIndexer::new(&index).expect("Failed to create indexer"));

        Self {
            _temp_dir: temp_dir,
            storage,
            index_path,
            index,
            indexer,
        }
    }

    /// Store an entity with a single `body` field, queueing its update.
    pub fn put(&self, raw_identifier: &str, body: &str) -> Entity {
        let identifier = Identifier::decode(raw_identifier).expect("Invalid test identifier");
        let entity = Entity::new(&identifier).with_field("body", body);
        self.storage
            .put_entity(TEST_QUEUE, &entity)
            .expect("Failed to put entity");
        entity
    }

    /// Delete an entity, queueing its removal.
    pub fn delete(&self, raw_identifier: &str) -> bool {
        let identifier = Identifier::decode(raw_identifier).expect("Invalid test identifier");
        self.storage
            .delete_entity(TEST_QUEUE, &identifier)
            .expect("Failed to delete entity")
    }

    /// Push a raw message without touching the entity store.
    pub fn enqueue_raw(&self, message: &str) {
        self.storage
            .enqueue(TEST_QUEUE, message)
            .expect("Failed to enqueue");
    }

    /// Run one drain cycle with the Tantivy handler registered for `types`.
    pub fn run_cycle(&self, types: &[&str]) -> CycleReport {
        let handler = Arc::new(TantivyIndexHandler::new(self.indexer.clone()));
        let registry = HandlerRegistry::with_types(types.iter().copied(), handler);
        let queue = StorageQueue::new(self.storage.clone(), TEST_QUEUE);

        DrainCycle::new(
            SyncConfig::default().with_queue_name(TEST_QUEUE),
            Arc::new(queue),
            Arc::new(registry),
            self.storage.clone(),
        )
        .run()
    }

    /// Search and return matching wire identifiers, sorted.
    pub fn search(&self, query: &str) -> Vec<String> {
        let searcher = EntitySearcher::new(&self.index).expect("Failed to create searcher");
        searcher.reload().expect("Failed to reload reader");

        let mut ids: Vec<String> = searcher
            .search(query, SearchOptions::default().with_limit(1000))
            .expect("Search failed")
            .into_iter()
            .map(|hit| hit.doc_id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of committed documents in the index.
    pub fn indexed_count(&self) -> u64 {
        let searcher = EntitySearcher::new(&self.index).expect("Failed to create searcher");
        searcher.reload().expect("Failed to reload reader");
        searcher.num_docs()
    }

    /// Messages still waiting in the test queue.
    pub fn queue_len(&self) -> usize {
        self.storage
            .queue_len(TEST_QUEUE)
            .expect("Failed to read queue length")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer-side change applied to the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Put,
    Delete,
}

/// Generate a random stream of changes over a small identifier pool.
///
/// The pool is kept small so most identifiers see conflicting actions.
pub fn random_changes<R: Rng>(rng: &mut R, pool: &[&str], count: usize) -> Vec<(Change, String)> {
    let mut changes = Vec::with_capacity(count);
    for _ in 0..count {
        let identifier = pool
            .choose(rng)
            .expect("Identifier pool must not be empty")
            .to_string();
        let change = if rng.random_bool(0.6) {
            Change::Put
        } else {
            Change::Delete
        };
        changes.push((change, identifier));
    }
    changes
}
