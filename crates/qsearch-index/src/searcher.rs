//! Search implementation using BM25 scoring.
//!
//! Lets operators check what a drain cycle left in the index.

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{IndexReader, TantivyDocument, Term};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// A search result with relevance score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Wire identifier of the entity
    pub doc_id: String,
    /// Entity type
    pub entity_type: String,
    /// Primary key
    pub primary_key: String,
    /// BM25 relevance score
    pub score: f32,
    /// Entity modification time in milliseconds
    pub updated_at_ms: Option<i64>,
}

/// Search options for filtering and limiting results.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Filter by entity type (None = all types)
    pub entity_type: Option<String>,
    /// Maximum results to return
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            entity_type: None,
            limit: 10,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }
}

/// BM25 searcher over entity documents.
pub struct EntitySearcher {
    reader: IndexReader,
    schema: SearchSchema,
    query_parser: QueryParser,
}

impl EntitySearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let reader = index.reader()?;
        let schema = index.schema().clone();
        let query_parser = QueryParser::for_index(index.index(), vec![schema.text]);

        Ok(Self {
            reader,
            schema,
            query_parser,
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded search reader");
        Ok(())
    }

    /// Search with a query string.
    pub fn search(
        &self,
        query_str: &str,
        options: SearchOptions,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let text_query = self.query_parser.parse_query(query_str)?;

        let final_query = match &options.entity_type {
            Some(entity_type) => {
                let type_term = Term::from_field_text(self.schema.entity_type, entity_type);
                let type_query = TermQuery::new(type_term, IndexRecordOption::Basic);

                Box::new(BooleanQuery::new(vec![
                    (Occur::Must, text_query),
                    (Occur::Must, Box::new(type_query)),
                ]))
            }
            None => text_query,
        };

        let top_docs = searcher.search(&final_query, &TopDocs::with_limit(options.limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let stored = |field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };

            hits.push(SearchHit {
                doc_id: stored(self.schema.doc_id),
                entity_type: stored(self.schema.entity_type),
                primary_key: stored(self.schema.primary_key),
                score,
                updated_at_ms: stored(self.schema.updated_at_ms).parse().ok(),
            });
        }

        info!(query = query_str, results = hits.len(), "Search complete");
        Ok(hits)
    }

    /// Get the number of indexed documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::SearchIndexer;
    use qsearch_types::{Entity, Identifier};

    fn setup() -> (SearchIndex, SearchIndexer) {
        let index = SearchIndex::create_in_ram();
        let indexer = SearchIndexer::new(&index).unwrap();

        let post = Entity::new(&Identifier::new("blog.post", "1").unwrap())
            .with_field("title", "Rust borrow checker explained");
        let comment = Entity::new(&Identifier::new("blog.comment", "7").unwrap())
            .with_field("body", "great rust article");
        let other = Entity::new(&Identifier::new("blog.post", "2").unwrap())
            .with_field("title", "Gardening tips");

        indexer.index_entities(&[post, comment, other]).unwrap();
        indexer.commit().unwrap();
        (index, indexer)
    }

    #[test]
    fn test_search_all_types() {
        let (index, _indexer) = setup();
        let searcher = EntitySearcher::new(&index).unwrap();
        searcher.reload().unwrap();

        let hits = searcher.search("rust", SearchOptions::default()).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(searcher.num_docs(), 3);
    }

    #[test]
    fn test_search_filtered_by_type() {
        let (index, _indexer) = setup();
        let searcher = EntitySearcher::new(&index).unwrap();
        searcher.reload().unwrap();

        let hits = searcher
            .search("rust", SearchOptions::default().with_entity_type("blog.post"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "blog.post.1");
        assert_eq!(hits[0].primary_key, "1");
        assert!(hits[0].updated_at_ms.is_some());
    }

    #[test]
    fn test_empty_query() {
        let (index, _indexer) = setup();
        let searcher = EntitySearcher::new(&index).unwrap();
        assert!(searcher.search("  ", SearchOptions::default()).unwrap().is_empty());
    }
}
