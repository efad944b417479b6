//! # qsearch-index
//!
//! Full-text search index for queued search entities using Tantivy.
//!
//! This crate is the index backend written to by drain cycles: entities
//! are indexed in batches, removed by wire identifier, and made visible
//! by an explicit commit.
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory for persistence
//! - One document per entity, keyed by its wire identifier
//! - BM25 search with optional entity-type filtering

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod schema;
pub mod searcher;

pub use document::entity_to_doc;
pub use error::SearchError;
pub use index::{open_or_create_index, SearchIndex, SearchIndexConfig};
pub use indexer::SearchIndexer;
pub use schema::{build_entity_schema, SearchSchema};
pub use searcher::{EntitySearcher, SearchHit, SearchOptions};
