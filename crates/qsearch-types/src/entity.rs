//! Entity records held by the primary data store.
//!
//! An entity is what an identifier resolves to at flush time. The index
//! backend turns it into a search document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifier::Identifier;

/// A live entity resolved from the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type, e.g. `blog.post`
    pub entity_type: String,

    /// Primary key within the entity type
    pub primary_key: String,

    /// Indexable fields
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,

    /// Last modification time (milliseconds since epoch for JSON compatibility)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create an entity with no fields.
    pub fn new(identifier: &Identifier) -> Self {
        Self {
            entity_type: identifier.entity_type().to_string(),
            primary_key: identifier.primary_key().to_string(),
            fields: BTreeMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Add a field (builder style).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Wire-form identifier, e.g. `blog.post.42`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.entity_type, self.primary_key)
    }

    /// Searchable text: every string, number and bool value, in field order.
    ///
    /// Arrays and nested objects are flattened; nulls are dropped.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        for value in self.fields.values() {
            collect_text(value, &mut parts);
        }
        parts.join(" ")
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn collect_text(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::String(s) => parts.push(s.clone()),
        Value::Bool(b) => parts.push(b.to_string()),
        Value::Number(n) => parts.push(n.to_string()),
        Value::Array(items) => {
            for item in items {
                collect_text(item, parts);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_text(item, parts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post() -> Entity {
        let id = Identifier::new("blog.post", "42").unwrap();
        Entity::new(&id)
            .with_field("title", "Rust ownership")
            .with_field("tags", json!(["borrowck", "lifetimes"]))
            .with_field("views", 7)
    }

    #[test]
    fn test_identifier() {
        assert_eq!(post().identifier(), "blog.post.42");
    }

    #[test]
    fn test_text_flattens_fields() {
        // BTreeMap orders fields by name: tags, title, views
        assert_eq!(post().text(), "borrowck lifetimes Rust ownership 7");
    }

    #[test]
    fn test_text_skips_nulls() {
        let id = Identifier::new("a", "1").unwrap();
        let entity = Entity::new(&id)
            .with_field("body", Value::Null)
            .with_field("meta", json!({"author": "ferris"}));
        assert_eq!(entity.text(), "ferris");
    }

    #[test]
    fn test_entity_roundtrip() {
        let entity = post();
        let bytes = entity.to_bytes().unwrap();
        let decoded = Entity::from_bytes(&bytes).unwrap();

        assert_eq!(decoded.entity_type, "blog.post");
        assert_eq!(decoded.primary_key, "42");
        assert_eq!(decoded.fields, entity.fields);
        assert_eq!(
            decoded.updated_at.timestamp_millis(),
            entity.updated_at.timestamp_millis()
        );
    }
}
