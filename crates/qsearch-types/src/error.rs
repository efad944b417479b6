//! Error types shared across the queued search system.

use thiserror::Error;

/// Errors raised while decoding queue messages and identifiers.
///
/// Every variant is recoverable: the offending message or identifier is
/// logged and skipped, never fatal to a drain cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Message has no `:` separating action from identifier
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Action is neither `update` nor `delete`
    #[error("Unrecognized action: {0}")]
    UnrecognizedAction(String),

    /// Identifier cannot be split into entity type and primary key
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying config source failed to load or deserialize
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    /// A loaded value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
