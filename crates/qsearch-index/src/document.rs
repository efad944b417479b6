//! Document mapping from entities to Tantivy documents.

use tantivy::doc;
use tantivy::TantivyDocument;

use qsearch_types::Entity;

use crate::schema::SearchSchema;

/// Convert an Entity to a Tantivy document.
///
/// Text field contains every scalar field value; doc_id is the wire
/// identifier so later removals can find it without the entity.
pub fn entity_to_doc(schema: &SearchSchema, entity: &Entity) -> TantivyDocument {
    doc!(
        schema.doc_id => entity.identifier(),
        schema.entity_type => entity.entity_type.clone(),
        schema.primary_key => entity.primary_key.clone(),
        schema.text => entity.text(),
        schema.updated_at_ms => entity.updated_at.timestamp_millis().to_string()
    )
}
