//! Queue message type for change notifications.
//!
//! Wire form: `{action}:{identifier}` where action is `update` or `delete`.
//! Producers enqueue one message per entity change; the drain cycle
//! consumes them in order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::identifier::Identifier;

/// Separator between the action and the identifier.
pub const ACTION_SEPARATOR: char = ':';

/// Type of queued action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAction {
    /// Entity was created or changed; re-index it
    Update,
    /// Entity was removed; drop its document
    Delete,
}

impl QueueAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueAction::Update => "update",
            QueueAction::Delete => "delete",
        }
    }

    /// Parse from string, returning None for unknown actions.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "update" => Some(QueueAction::Update),
            "delete" => Some(QueueAction::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for QueueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed queue message.
///
/// The identifier is kept in wire form; it is decoded when the pending
/// actions are flushed, so a malformed identifier only affects itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    /// What should happen to the entity
    pub action: QueueAction,

    /// Wire-form identifier of the entity
    pub identifier: String,
}

impl QueueMessage {
    /// Create an update message for an entity
    pub fn for_update(identifier: &Identifier) -> Self {
        Self {
            action: QueueAction::Update,
            identifier: identifier.encode(),
        }
    }

    /// Create a delete message for an entity
    pub fn for_delete(identifier: &Identifier) -> Self {
        Self {
            action: QueueAction::Delete,
            identifier: identifier.encode(),
        }
    }

    /// Parse the wire form, splitting on the first `:`.
    pub fn parse(message: &str) -> Result<Self, MessageError> {
        let (action, identifier) = message
            .split_once(ACTION_SEPARATOR)
            .ok_or_else(|| MessageError::MalformedMessage(message.to_string()))?;

        let action = QueueAction::parse(action)
            .ok_or_else(|| MessageError::UnrecognizedAction(action.to_string()))?;

        Ok(Self {
            action,
            identifier: identifier.to_string(),
        })
    }

    /// Encode to the wire form.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.action, ACTION_SEPARATOR, self.identifier)
    }
}

impl fmt::Display for QueueMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.action, ACTION_SEPARATOR, self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let msg = QueueMessage::parse("update:blog.post.42").unwrap();
        assert_eq!(msg.action, QueueAction::Update);
        assert_eq!(msg.identifier, "blog.post.42");
    }

    #[test]
    fn test_parse_delete() {
        let msg = QueueMessage::parse("delete:a.1").unwrap();
        assert_eq!(msg.action, QueueAction::Delete);
        assert_eq!(msg.identifier, "a.1");
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        let msg = QueueMessage::parse("update:urn:x.1").unwrap();
        assert_eq!(msg.action, QueueAction::Update);
        assert_eq!(msg.identifier, "urn:x.1");
    }

    #[test]
    fn test_parse_missing_colon() {
        let err = QueueMessage::parse("update blog.post.42").unwrap_err();
        assert!(matches!(err, MessageError::MalformedMessage(_)));
    }

    #[test]
    fn test_parse_unrecognized_action() {
        let err = QueueMessage::parse("upsert:blog.post.42").unwrap_err();
        assert_eq!(err, MessageError::UnrecognizedAction("upsert".to_string()));

        // Actions are case-sensitive on the wire
        assert!(QueueMessage::parse("UPDATE:blog.post.42").is_err());
    }

    #[test]
    fn test_encode_matches_wire_format() {
        let id = Identifier::new("blog.post", "42").unwrap();
        assert_eq!(QueueMessage::for_update(&id).encode(), "update:blog.post.42");
        assert_eq!(QueueMessage::for_delete(&id).to_string(), "delete:blog.post.42");
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(serde_json::to_string(&QueueAction::Update).unwrap(), "\"update\"");
        let action: QueueAction = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(action, QueueAction::Delete);
    }
}
