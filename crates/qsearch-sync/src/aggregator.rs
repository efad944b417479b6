//! Pending action aggregation.
//!
//! Folds the ordered message stream into two disjoint sets of wire
//! identifiers. The last action seen for an identifier wins: an update
//! after a delete cancels the delete (the entity was re-added), a delete
//! after an update cancels the update (the document just goes away).

use std::collections::HashSet;

use tracing::debug;

use qsearch_types::QueueAction;

/// Deduplicated, mutually exclusive pending updates and deletes.
///
/// Invariant: no identifier is in both sets. `apply` is the only mutator.
#[derive(Debug, Default, Clone)]
pub struct PendingActions {
    updates: HashSet<String>,
    deletes: HashSet<String>,
}

impl PendingActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one action. Must be called in dequeue order.
    pub fn apply(&mut self, action: QueueAction, identifier: &str) {
        match action {
            QueueAction::Update => {
                self.deletes.remove(identifier);
                self.updates.insert(identifier.to_string());
                debug!(identifier, "Added to the update list");
            }
            QueueAction::Delete => {
                self.updates.remove(identifier);
                self.deletes.insert(identifier.to_string());
                debug!(identifier, "Added to the delete list");
            }
        }
    }

    /// Identifiers whose latest action is an update.
    pub fn updates(&self) -> &HashSet<String> {
        &self.updates
    }

    /// Identifiers whose latest action is a delete.
    pub fn deletes(&self) -> &HashSet<String> {
        &self.deletes
    }

    /// Total identifiers pending across both sets.
    pub fn len(&self) -> usize {
        self.updates.len() + self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deletes.is_empty()
    }
}
