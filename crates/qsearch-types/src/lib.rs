//! # qsearch-types
//!
//! Shared domain types for the queued search system.
//!
//! This crate defines the data structures and wire formats used by every
//! other crate in the workspace:
//! - Identifiers: the compact `"<entity-type>.<primary-key>"` form
//! - Queue messages: `"<action>:<identifier>"` change notifications
//! - Entities: the documents resolved from the repository at flush time
//! - Settings: layered configuration for the `qsearch` binary
//!
//! ## Usage
//!
//! ```rust
//! use qsearch_types::{Identifier, QueueMessage, QueueAction};
//!
//! let msg = QueueMessage::parse("update:blog.post.42").unwrap();
//! assert_eq!(msg.action, QueueAction::Update);
//!
//! let id = Identifier::decode(&msg.identifier).unwrap();
//! assert_eq!(id.entity_type(), "blog.post");
//! assert_eq!(id.primary_key(), "42");
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod identifier;
pub mod message;

pub use config::Settings;
pub use entity::Entity;
pub use error::{ConfigError, MessageError};
pub use identifier::Identifier;
pub use message::{QueueAction, QueueMessage};
