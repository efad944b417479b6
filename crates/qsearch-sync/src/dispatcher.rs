//! Batch dispatch of pending actions.
//!
//! Runs after the whole backlog has been aggregated. Identifiers are
//! grouped by entity type so each index receives one batched update per
//! type instead of one call per entity.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error, warn};

use qsearch_types::{Entity, Identifier};

use crate::error::RepositoryError;
use crate::handler::SearchIndexHandler;
use crate::registry::IndexRegistry;
use crate::repository::EntityRepository;
use crate::report::PassReport;

/// Pending identifiers grouped by entity type, both in ascending order.
type EntityBatches = BTreeMap<String, Vec<Identifier>>;

/// Issues grouped update/delete calls to the registered indexes.
pub struct BatchDispatcher {
    registry: Arc<dyn IndexRegistry>,
    repository: Arc<dyn EntityRepository>,
    /// Handlers that received calls since the last commit
    touched: Vec<Arc<dyn SearchIndexHandler>>,
}

impl BatchDispatcher {
    pub fn new(registry: Arc<dyn IndexRegistry>, repository: Arc<dyn EntityRepository>) -> Self {
        Self {
            registry,
            repository,
            touched: Vec::new(),
        }
    }

    /// Partition wire identifiers by entity type.
    ///
    /// Identifiers that cannot be decoded are logged and counted.
    fn group_by_type(identifiers: &HashSet<String>, report: &mut PassReport) -> EntityBatches {
        let mut batches = EntityBatches::new();

        for raw in identifiers {
            match Identifier::decode(raw) {
                Ok(identifier) => batches
                    .entry(identifier.entity_type().to_string())
                    .or_default()
                    .push(identifier),
                Err(e) => {
                    error!(identifier = %raw, error = %e, "Unable to parse identifier, skipping");
                    report.malformed += 1;
                }
            }
        }

        for group in batches.values_mut() {
            group.sort_unstable();
        }
        batches
    }

    fn resolve(&self, entity_type: &str) -> Option<Arc<dyn SearchIndexHandler>> {
        match self.registry.resolve(entity_type) {
            Ok(handler) => Some(handler),
            Err(e) => {
                error!(entity_type, error = %e, "Couldn't find a registered index, skipping group");
                None
            }
        }
    }

    /// Remember a handler for the commit. Call before issuing it a write.
    fn touch(&mut self, handler: &Arc<dyn SearchIndexHandler>) {
        if !self.touched.iter().any(|h| Arc::ptr_eq(h, handler)) {
            self.touched.push(handler.clone());
        }
    }

    /// Re-index every pending update, one batch per entity type.
    ///
    /// Entities the repository cannot resolve are dropped from their
    /// batch; the rest of the batch is still written.
    pub fn flush_updates(&mut self, updates: &HashSet<String>) -> PassReport {
        let mut report = PassReport::new();
        let batches = Self::group_by_type(updates, &mut report);

        for (entity_type, identifiers) in batches {
            report.groups += 1;

            let Some(handler) = self.resolve(&entity_type) else {
                report.skipped_groups += 1;
                continue;
            };

            let entities: Vec<Entity> = identifiers
                .iter()
                .filter_map(|identifier| self.fetch(identifier, &mut report))
                .collect();

            if entities.is_empty() {
                debug!(entity_type = %entity_type, "No entities left to update");
                continue;
            }

            self.touch(&handler);
            report.backend_calls += 1;
            match handler.batch_update(&entities) {
                Ok(written) => {
                    report.applied += written;
                    debug!(
                        entity_type = %entity_type,
                        handler = %handler.name(),
                        pks = %join_keys(entities.iter().map(|e| e.primary_key.as_str())),
                        "Updated objects"
                    );
                }
                Err(e) => {
                    report.errors += 1;
                    error!(
                        entity_type = %entity_type,
                        handler = %handler.name(),
                        count = entities.len(),
                        error = %e,
                        "Batch update failed"
                    );
                }
            }
        }

        report
    }

    fn fetch(&self, identifier: &Identifier, report: &mut PassReport) -> Option<Entity> {
        match self
            .repository
            .fetch(identifier.entity_type(), identifier.primary_key())
        {
            Ok(entity) => Some(entity),
            Err(RepositoryError::NotFound(_)) => {
                warn!(identifier = %identifier, "Couldn't load entity, somehow it went missing");
                report.dropped += 1;
                None
            }
            Err(e) => {
                error!(identifier = %identifier, error = %e, "Couldn't load entity");
                report.dropped += 1;
                None
            }
        }
    }

    /// Remove every pending delete from its index.
    ///
    /// Removal is keyed by the wire identifier alone, so entities that
    /// are already gone from the repository are still removed.
    pub fn flush_deletes(&mut self, deletes: &HashSet<String>) -> PassReport {
        let mut report = PassReport::new();
        let batches = Self::group_by_type(deletes, &mut report);

        for (entity_type, identifiers) in batches {
            report.groups += 1;

            let Some(handler) = self.resolve(&entity_type) else {
                report.skipped_groups += 1;
                continue;
            };

            let mut removed = Vec::with_capacity(identifiers.len());
            for identifier in &identifiers {
                self.touch(&handler);
                report.backend_calls += 1;
                match handler.remove(&identifier.encode()) {
                    Ok(()) => {
                        report.applied += 1;
                        removed.push(identifier.primary_key());
                    }
                    Err(e) => {
                        report.errors += 1;
                        error!(identifier = %identifier, error = %e, "Remove failed");
                    }
                }
            }

            debug!(
                entity_type = %entity_type,
                handler = %handler.name(),
                pks = %join_keys(removed.into_iter()),
                "Deleted objects"
            );
        }

        report
    }

    /// Commit every handler that received calls, once each.
    ///
    /// Returns (succeeded, failed).
    pub fn commit(&mut self) -> (usize, usize) {
        let mut committed = 0;
        let mut failed = 0;

        for handler in self.touched.drain(..) {
            match handler.commit() {
                Ok(()) => {
                    committed += 1;
                    debug!(handler = %handler.name(), "Committed");
                }
                Err(e) => {
                    failed += 1;
                    error!(handler = %handler.name(), error = %e, "Commit failed");
                }
            }
        }

        (committed, failed)
    }
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    keys.collect::<Vec<_>>().join(", ")
}
