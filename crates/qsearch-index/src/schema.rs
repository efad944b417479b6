//! Tantivy schema definition for entity documents.
//!
//! One document per entity:
//! - doc_id: wire identifier, the delete/update key
//! - entity_type / primary_key: identifier parts, for filtering and display
//! - text: flattened field values
//! - updated_at_ms: entity modification time

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use crate::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Wire identifier, e.g. "blog.post.42" (STRING | STORED)
    pub doc_id: Field,
    /// Entity type, e.g. "blog.post" (STRING | STORED)
    pub entity_type: Field,
    /// Primary key (STRING | STORED)
    pub primary_key: Field,
    /// Searchable text (TEXT)
    pub text: Field,
    /// Modification time in milliseconds (STRING | STORED)
    pub updated_at_ms: Field,
}

impl SearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a SearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            doc_id: field("doc_id")?,
            entity_type: field("entity_type")?,
            primary_key: field("primary_key")?,
            text: field("text")?,
            updated_at_ms: field("updated_at_ms")?,
            schema,
        })
    }
}

/// Build the entity search schema.
pub fn build_entity_schema() -> SearchSchema {
    let mut schema_builder = Schema::builder();

    let doc_id = schema_builder.add_text_field("doc_id", STRING | STORED);
    let entity_type = schema_builder.add_text_field("entity_type", STRING | STORED);
    let primary_key = schema_builder.add_text_field("primary_key", STRING | STORED);
    let text = schema_builder.add_text_field("text", TEXT);
    let updated_at_ms = schema_builder.add_text_field("updated_at_ms", STRING | STORED);

    let schema = schema_builder.build();

    SearchSchema {
        schema,
        doc_id,
        entity_type,
        primary_key,
        text,
        updated_at_ms,
    }
}
