//! Tantivy index management.
//!
//! Handles index creation and opening, on disk or in RAM.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::schema::{build_entity_schema, SearchSchema};

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Search index configuration
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Path to index directory
    pub index_path: PathBuf,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self::new("./search-index")
    }
}

impl SearchIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }
}

/// Wrapper for Tantivy index with schema access.
pub struct SearchIndex {
    index: Index,
    schema: SearchSchema,
    writer_memory_mb: usize,
    path: Option<PathBuf>,
}

impl SearchIndex {
    /// Open existing index or create new one.
    pub fn open_or_create(config: SearchIndexConfig) -> Result<Self, SearchError> {
        let index = open_or_create_index(&config.index_path)?;
        let schema = SearchSchema::from_schema(index.schema())?;

        info!(path = ?config.index_path, "Opened search index");

        Ok(Self {
            index,
            schema,
            writer_memory_mb: config.writer_memory_mb,
            path: Some(config.index_path),
        })
    }

    /// Create a throwaway index held in memory.
    pub fn create_in_ram() -> Self {
        let schema = build_entity_schema();
        let index = Index::create_in_ram(schema.schema().clone());
        debug!("Created in-memory search index");

        Self {
            index,
            schema,
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
            path: None,
        }
    }

    /// Get the search schema
    pub fn schema(&self) -> &SearchSchema {
        &self.schema
    }

    /// Get the underlying Tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Create an IndexWriter with configured memory budget
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let memory_budget = self.writer_memory_mb * 1024 * 1024;
        let writer = self.index.writer(memory_budget)?;
        debug!(memory_mb = self.writer_memory_mb, "Created index writer");
        Ok(writer)
    }

    /// Create an IndexReader that reloads shortly after each commit
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(reader)
    }

    /// Index directory, or None for an in-memory index
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Open an existing index or create a new one.
///
/// Uses MmapDirectory for persistence.
pub fn open_or_create_index(path: &Path) -> Result<Index, SearchError> {
    if path.join("meta.json").exists() {
        debug!(path = ?path, "Opening existing index");
        Ok(Index::open_in_dir(path)?)
    } else {
        info!(path = ?path, "Creating new index");
        std::fs::create_dir_all(path)?;
        let schema = build_entity_schema();
        Ok(Index::create_in_dir(path, schema.schema().clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_then_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchIndexConfig::new(temp_dir.path().join("idx"));

        let first = SearchIndex::open_or_create(config.clone()).unwrap();
        assert!(temp_dir.path().join("idx").join("meta.json").exists());
        drop(first);

        let second = SearchIndex::open_or_create(config).unwrap();
        assert_eq!(second.path(), Some(temp_dir.path().join("idx").as_path()));
    }

    #[test]
    fn test_in_ram_writer_and_reader() {
        let index = SearchIndex::create_in_ram();
        assert!(index.path().is_none());
        let _writer = index.writer().unwrap();
        let _reader = index.reader().unwrap();
    }

    #[test]
    fn test_config_with_memory() {
        let config = SearchIndexConfig::default().with_memory_mb(100);
        assert_eq!(config.writer_memory_mb, 100);
        assert_eq!(config.index_path, PathBuf::from("./search-index"));
    }
}
