//! Command implementations for the qsearch binary.
//!
//! Handles:
//! - process: Run one drain-and-flush cycle against the configured queue
//! - enqueue/put/delete: Producer side, feeding the queue
//! - status/search: Inspect the queue and the index

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use qsearch_index::{EntitySearcher, SearchHit, SearchIndex, SearchIndexConfig, SearchIndexer, SearchOptions};
use qsearch_storage::Storage;
use qsearch_sync::{CycleReport, DrainCycle, HandlerRegistry, StorageQueue, SyncConfig, TantivyIndexHandler};
use qsearch_types::{Entity, Identifier, QueueAction, QueueMessage, Settings};

use crate::cli::ActionArg;

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    db_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(db_path) = db_path_override {
        settings.db_path = db_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }

    Ok(settings)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let db_path = settings.expanded_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let storage = Storage::open(&db_path)
        .with_context(|| format!("Failed to open storage at {}", db_path.display()))?;
    Ok(Arc::new(storage))
}

fn open_index(settings: &Settings) -> Result<SearchIndex> {
    let index_path = settings.expanded_search_index_path();
    let config = SearchIndexConfig::new(&index_path).with_memory_mb(settings.writer_memory_mb);

    SearchIndex::open_or_create(config)
        .with_context(|| format!("Failed to open search index at {}", index_path.display()))
}

fn queue_action(action: ActionArg) -> QueueAction {
    match action {
        ActionArg::Update => QueueAction::Update,
        ActionArg::Delete => QueueAction::Delete,
    }
}

/// Split a `key=value` field assignment.
///
/// Values that parse as JSON scalars (numbers, booleans, null) keep
/// their type; anything else is stored as a string.
pub fn parse_field(assignment: &str) -> Result<(String, serde_json::Value)> {
    let (key, raw) = assignment
        .split_once('=')
        .with_context(|| format!("Field must be KEY=VALUE: {}", assignment))?;

    if key.is_empty() {
        anyhow::bail!("Field name is empty: {}", assignment);
    }

    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) if !value.is_object() && !value.is_array() && !value.is_string() => value,
        _ => serde_json::Value::String(raw.to_string()),
    };
    Ok((key.to_string(), value))
}

/// Run one drain cycle with a Tantivy handler for every indexed type.
pub fn process_queue(settings: &Settings) -> Result<CycleReport> {
    let storage = open_storage(settings)?;
    let index = open_index(settings)?;
    let indexer = Arc::new(SearchIndexer::new(&index).context("Failed to open index writer")?);

    if settings.indexed_types.is_empty() {
        warn!("No indexed types configured, every group will be skipped");
    }

    let handler = Arc::new(TantivyIndexHandler::new(indexer));
    let registry = HandlerRegistry::with_types(settings.indexed_types.iter().cloned(), handler);
    let queue = StorageQueue::new(storage.clone(), settings.queue_name.as_str());

    info!(
        queue = %settings.queue_name,
        types = ?registry.registered_types(),
        "Processing queue"
    );

    let report = DrainCycle::new(
        SyncConfig::from_settings(settings),
        Arc::new(queue),
        Arc::new(registry),
        storage.clone(),
    )
    .run();

    // Persist the consumed queue before the process exits
    storage.flush().context("Failed to flush storage")?;

    Ok(report)
}

/// Handle the `process` command.
pub fn handle_process(settings: &Settings, json: bool) -> Result<()> {
    let report = process_queue(settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Queue: {}", report.queue_name);
    println!(
        "  Messages read: {} ({} rejected, {} read errors)",
        report.messages_read, report.messages_rejected, report.read_errors
    );
    println!(
        "  Pending: {} updates, {} deletes",
        report.pending_updates, report.pending_deletes
    );
    println!(
        "  Updated: {} in {} batches ({} dropped, {} groups skipped)",
        report.updates.applied,
        report.updates.backend_calls,
        report.updates.dropped,
        report.updates.skipped_groups
    );
    println!(
        "  Deleted: {} ({} groups skipped)",
        report.deletes.applied, report.deletes.skipped_groups
    );
    println!("  Commits: {} ({} failed)", report.commits, report.commit_errors);
    println!("  Duration: {}ms", report.duration_ms());
    Ok(())
}

/// Push a raw message without touching the entity store.
pub fn enqueue_message(
    settings: &Settings,
    action: ActionArg,
    identifier: &Identifier,
) -> Result<u64> {
    let raw = QueueMessage {
        action: queue_action(action),
        identifier: identifier.encode(),
    }
    .encode();

    let storage = open_storage(settings)?;
    let sequence = storage.enqueue(&settings.queue_name, &raw)?;
    info!(queue = %settings.queue_name, sequence, message = %raw, "Enqueued");
    Ok(sequence)
}

/// Store an entity, queueing its update.
pub fn put_entity(settings: &Settings, identifier: &Identifier, fields: &[String]) -> Result<Entity> {
    let mut entity = Entity::new(identifier);
    for assignment in fields {
        let (key, value) = parse_field(assignment)?;
        entity = entity.with_field(key, value);
    }

    let storage = open_storage(settings)?;
    storage.put_entity(&settings.queue_name, &entity)?;
    Ok(entity)
}

/// Delete an entity, queueing its removal.
///
/// Returns whether the entity existed.
pub fn delete_entity(settings: &Settings, identifier: &Identifier) -> Result<bool> {
    let storage = open_storage(settings)?;
    Ok(storage.delete_entity(&settings.queue_name, identifier)?)
}

/// Show queue and storage status.
pub fn show_status(settings: &Settings, limit: usize) -> Result<()> {
    let storage = open_storage(settings)?;
    let stats = storage.get_stats()?;
    let pending = storage.queue_len(&settings.queue_name)?;

    println!("Database: {}", settings.expanded_db_path().display());
    println!("Queue '{}': {} pending", settings.queue_name, pending);
    for (sequence, message) in storage.peek_queue(&settings.queue_name, limit)? {
        println!("  [{}] {}", sequence, message);
    }
    if pending > limit {
        println!("  ... {} more", pending - limit);
    }
    println!("Entities: {}", stats.entity_count);
    println!("Queued messages (all queues): {}", stats.queued_message_count);
    println!("Disk usage: {} bytes", stats.disk_usage_bytes);
    Ok(())
}

/// Search the index.
pub fn search_index(
    settings: &Settings,
    query: &str,
    entity_type: Option<&str>,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    let index = open_index(settings)?;
    let searcher = EntitySearcher::new(&index)?;

    let mut options = SearchOptions::default().with_limit(limit);
    if let Some(entity_type) = entity_type {
        options = options.with_entity_type(entity_type);
    }

    Ok(searcher.search(query, options)?)
}

/// Handle the `search` command.
pub fn handle_search(
    settings: &Settings,
    query: &str,
    entity_type: Option<&str>,
    limit: usize,
) -> Result<()> {
    let hits = search_index(settings, query, entity_type, limit)?;

    if hits.is_empty() {
        println!("No results for '{}'", query);
        return Ok(());
    }

    for hit in hits {
        println!("{:>8.3}  {}", hit.score, hit.doc_id);
    }
    Ok(())
}
