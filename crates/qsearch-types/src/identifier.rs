//! Identifier codec.
//!
//! Wire form: `{entity_type}.{primary_key}`
//! - entity_type: may itself contain dots (namespaced types like `blog.post`)
//! - primary_key: always the final dot-separated segment
//!
//! Converts `"blog.post.42"` into `("blog.post", "42")` and back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MessageError;

/// Separator between entity type segments and the primary key.
pub const SEPARATOR: char = '.';

/// Identifier naming one entity in the primary data store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    entity_type: String,
    primary_key: String,
}

impl Identifier {
    /// Create an identifier from its parts.
    ///
    /// Fails if either part is empty or the primary key contains the
    /// separator, since the wire form could not be decoded back.
    pub fn new(
        entity_type: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Result<Self, MessageError> {
        let entity_type = entity_type.into();
        let primary_key = primary_key.into();

        if entity_type.is_empty() || primary_key.is_empty() || primary_key.contains(SEPARATOR) {
            return Err(MessageError::MalformedIdentifier(format!(
                "{}{}{}",
                entity_type, SEPARATOR, primary_key
            )));
        }

        Ok(Self {
            entity_type,
            primary_key,
        })
    }

    /// Decode the wire form, reserving the last segment as the key.
    pub fn decode(raw: &str) -> Result<Self, MessageError> {
        match raw.rsplit_once(SEPARATOR) {
            Some((entity_type, primary_key))
                if !entity_type.is_empty() && !primary_key.is_empty() =>
            {
                Ok(Self {
                    entity_type: entity_type.to_string(),
                    primary_key: primary_key.to_string(),
                })
            }
            _ => Err(MessageError::MalformedIdentifier(raw.to_string())),
        }
    }

    /// Encode to the wire form.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.entity_type, SEPARATOR, self.primary_key)
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.entity_type, SEPARATOR, self.primary_key)
    }
}

impl FromStr for Identifier {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_namespaced_type() {
        let id = Identifier::decode("blog.post.42").unwrap();
        assert_eq!(id.entity_type(), "blog.post");
        assert_eq!(id.primary_key(), "42");
    }

    #[test]
    fn test_decode_simple_type() {
        let id = Identifier::decode("a.1").unwrap();
        assert_eq!(id.entity_type(), "a");
        assert_eq!(id.primary_key(), "1");
    }

    #[test]
    fn test_encode() {
        let id = Identifier::new("blog.post", "42").unwrap();
        assert_eq!(id.encode(), "blog.post.42");
        assert_eq!(id.to_string(), "blog.post.42");
    }

    #[test]
    fn test_roundtrip() {
        for (entity_type, pk) in [
            ("notes.note", "23"),
            ("a", "b"),
            ("deeply.nested.app.model", "0001"),
            ("user", "6f1c-42"),
        ] {
            let encoded = Identifier::new(entity_type, pk).unwrap().encode();
            let decoded = Identifier::decode(&encoded).unwrap();
            assert_eq!(decoded.entity_type(), entity_type);
            assert_eq!(decoded.primary_key(), pk);
        }
    }

    #[test]
    fn test_decode_without_separator() {
        let err = Identifier::decode("nodot").unwrap_err();
        assert_eq!(err, MessageError::MalformedIdentifier("nodot".to_string()));
    }

    #[test]
    fn test_decode_empty_parts() {
        assert!(Identifier::decode("").is_err());
        assert!(Identifier::decode("blog.").is_err());
        assert!(Identifier::decode(".42").is_err());
    }

    #[test]
    fn test_new_rejects_dotted_key() {
        assert!(Identifier::new("blog", "4.2").is_err());
        assert!(Identifier::new("", "42").is_err());
        assert!(Identifier::new("blog", "").is_err());
    }

    #[test]
    fn test_from_str() {
        let id: Identifier = "notes.note.23".parse().unwrap();
        assert_eq!(id.entity_type(), "notes.note");
        assert_eq!(id.primary_key(), "23");
        assert!("nodot".parse::<Identifier>().is_err());
    }
}
