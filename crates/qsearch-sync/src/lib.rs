//! Queue-draining engine for queued search.
//!
//! This crate turns the ordered stream of `"<action>:<identifier>"`
//! change messages into a small number of grouped, conflict-free index
//! operations.
//!
//! ## Key Components
//!
//! - [`PendingActions`]: Deduplicated, mutually exclusive updates and deletes
//! - [`BatchDispatcher`]: Groups pending identifiers by entity type and issues batched calls
//! - [`DrainCycle`]: `Draining -> Flushing -> Done` state machine for one run
//! - [`MessageQueue`], [`EntityRepository`], [`IndexRegistry`], [`SearchIndexHandler`]:
//!   Collaborator seams, with RocksDB and Tantivy implementations
//!
//! ## Example
//!
//! ```ignore
//! use qsearch_sync::{DrainCycle, HandlerRegistry, StorageQueue, SyncConfig, TantivyIndexHandler};
//!
//! let handler = Arc::new(TantivyIndexHandler::new(indexer));
//! let registry = HandlerRegistry::with_types(settings.indexed_types.clone(), handler);
//! let queue = StorageQueue::new(storage.clone(), &settings.queue_name);
//!
//! let report = DrainCycle::new(
//!     SyncConfig::from_settings(&settings),
//!     Arc::new(queue),
//!     Arc::new(registry),
//!     storage,
//! )
//! .run();
//! ```

pub mod aggregator;
pub mod dispatcher;
pub mod drain;
pub mod error;
pub mod handler;
pub mod queue;
pub mod registry;
pub mod report;
pub mod repository;
pub mod tantivy_handler;

pub use aggregator::PendingActions;
pub use dispatcher::BatchDispatcher;
pub use drain::{CycleState, DrainCycle, SyncConfig};
pub use error::{IndexingError, QueueError, RepositoryError};
pub use handler::SearchIndexHandler;
pub use queue::{MessageQueue, StorageQueue};
pub use registry::{HandlerRegistry, IndexRegistry};
pub use report::{CycleReport, PassReport};
pub use repository::EntityRepository;
pub use tantivy_handler::TantivyIndexHandler;
