//! Drain-and-flush cycle.
//!
//! One cycle reads the queue's current backlog message by message, folds
//! it into [`PendingActions`], then flushes the result through the
//! [`BatchDispatcher`]. Nothing survives between cycles except what is
//! left in the queue and the index.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use qsearch_types::{QueueMessage, Settings};

use crate::aggregator::PendingActions;
use crate::dispatcher::BatchDispatcher;
use crate::error::QueueError;
use crate::queue::MessageQueue;
use crate::registry::IndexRegistry;
use crate::report::CycleReport;
use crate::repository::EntityRepository;

/// Configuration handed to each drain cycle.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Queue the cycle drains
    pub queue_name: String,
    /// Log filter the host installs for the cycle
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_name: "search_queue".to_string(),
            log_level: "error".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            queue_name: settings.queue_name.clone(),
            log_level: settings.log_level.clone(),
        }
    }

    pub fn with_queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }
}

/// Phase of a drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Draining,
    Flushing,
    Done,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleState::Draining => write!(f, "draining"),
            CycleState::Flushing => write!(f, "flushing"),
            CycleState::Done => write!(f, "done"),
        }
    }
}

/// A single drain-and-flush run.
///
/// Consumed by [`DrainCycle::run`]; a new cycle starts with empty state.
pub struct DrainCycle {
    config: SyncConfig,
    queue: Arc<dyn MessageQueue>,
    dispatcher: BatchDispatcher,
    pending: PendingActions,
    state: CycleState,
    report: CycleReport,
}

impl DrainCycle {
    pub fn new(
        config: SyncConfig,
        queue: Arc<dyn MessageQueue>,
        registry: Arc<dyn IndexRegistry>,
        repository: Arc<dyn EntityRepository>,
    ) -> Self {
        let report = CycleReport::new(config.queue_name.clone());
        Self {
            config,
            queue,
            dispatcher: BatchDispatcher::new(registry, repository),
            pending: PendingActions::new(),
            state: CycleState::Draining,
            report,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Drain the backlog, flush it and return the totals.
    ///
    /// Never fails: every error is logged, counted and skipped.
    pub fn run(mut self) -> CycleReport {
        info!(queue = %self.config.queue_name, "Starting drain cycle");
        self.report.started_at = Utc::now();

        self.log_backlog();

        while self.state != CycleState::Done {
            self.step();
        }

        self.report.finished_at = Utc::now();
        let totals = self.report.totals();
        info!(
            queue = %self.report.queue_name,
            read = self.report.messages_read,
            rejected = self.report.messages_rejected,
            updated = self.report.updates.applied,
            deleted = self.report.deletes.applied,
            backend_calls = totals.backend_calls,
            backend_errors = totals.errors,
            duration_ms = self.report.duration_ms(),
            "Drain cycle complete"
        );
        self.report
    }

    /// Advance the state machine by one transition or one message.
    fn step(&mut self) {
        match self.state {
            CycleState::Draining => {
                if !self.read_next() {
                    self.report.pending_updates = self.pending.updates().len();
                    self.report.pending_deletes = self.pending.deletes().len();
                    self.state = CycleState::Flushing;
                }
            }
            CycleState::Flushing => {
                self.flush();
                self.state = CycleState::Done;
            }
            CycleState::Done => {}
        }
    }

    fn log_backlog(&self) {
        match self.queue.len() {
            Ok(0) => info!(queue = %self.config.queue_name, "Not enough items in the queue"),
            Ok(n) => debug!(queue = %self.config.queue_name, count = n, "Messages waiting"),
            Err(e) => warn!(queue = %self.config.queue_name, error = %e, "Couldn't read queue length"),
        }
    }

    /// Read and apply one message. Returns false once draining is over.
    fn read_next(&mut self) -> bool {
        let raw = match self.queue.read() {
            Ok(raw) => raw,
            Err(QueueError::Empty) => {
                debug!(queue = %self.config.queue_name, "Queue drained");
                return false;
            }
            Err(e) => {
                error!(queue = %self.config.queue_name, error = %e, "Queue read failed, flushing what was read");
                self.report.read_errors += 1;
                return false;
            }
        };

        self.report.messages_read += 1;
        match QueueMessage::parse(&raw) {
            Ok(message) => self.pending.apply(message.action, &message.identifier),
            Err(e) => {
                error!(message = %raw, error = %e, "Dropping message");
                self.report.messages_rejected += 1;
            }
        }
        true
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            debug!("Nothing to flush");
            return;
        }

        self.report.updates = self.dispatcher.flush_updates(self.pending.updates());
        self.report.deletes = self.dispatcher.flush_deletes(self.pending.deletes());

        let (commits, commit_errors) = self.dispatcher.commit();
        self.report.commits = commits;
        self.report.commit_errors = commit_errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::dispatcher::tests::{MapRepository, RecordingHandler};
    use crate::registry::HandlerRegistry;

    /// In-memory queue that can fail after a number of reads.
    struct VecQueue {
        messages: Mutex<VecDeque<String>>,
        fail_after: Option<usize>,
        reads: Mutex<usize>,
    }

    impl VecQueue {
        fn new(messages: &[&str]) -> Self {
            Self {
                messages: Mutex::new(messages.iter().map(|s| s.to_string()).collect()),
                fail_after: None,
                reads: Mutex::new(0),
            }
        }

        fn remaining(&self) -> usize {
            self.messages.lock().unwrap().len()
        }
    }

    impl MessageQueue for VecQueue {
        fn name(&self) -> &str {
            "test_queue"
        }

        fn len(&self) -> Result<usize, QueueError> {
            Ok(self.messages.lock().unwrap().len())
        }

        fn read(&self) -> Result<String, QueueError> {
            let mut reads = self.reads.lock().unwrap();
            if self.fail_after == Some(*reads) {
                return Err(QueueError::Backend("connection reset".to_string()));
            }
            *reads += 1;
            self.messages.lock().unwrap().pop_front().ok_or(QueueError::Empty)
        }
    }

    fn run_cycle(
        queue: Arc<VecQueue>,
        types: &[&str],
        repository: MapRepository,
    ) -> (CycleReport, Arc<RecordingHandler>) {
        let handler = Arc::new(RecordingHandler::default());
        let registry = HandlerRegistry::with_types(types.iter().copied(), handler.clone());
        let cycle = DrainCycle::new(
            SyncConfig::default().with_queue_name("test_queue"),
            queue,
            Arc::new(registry),
            Arc::new(repository),
        );
        assert_eq!(cycle.state(), CycleState::Draining);
        (cycle.run(), handler)
    }

    #[test]
    fn test_cancelled_update_is_flushed_as_delete() {
        let queue = Arc::new(VecQueue::new(&[
            "update:a.1",
            "delete:a.2",
            "update:a.1",
            "delete:a.1",
        ]));

        let (report, handler) = run_cycle(queue.clone(), &["a"], MapRepository::with(&["a.1"]));

        assert_eq!(report.messages_read, 4);
        assert_eq!(report.pending_updates, 0);
        assert_eq!(report.pending_deletes, 2);
        assert!(handler.batches().is_empty());
        assert_eq!(handler.removed(), vec!["a.1", "a.2"]);
        assert_eq!(report.commits, 1);
        assert_eq!(queue.remaining(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_updates_batched_per_type() {
        let queue = Arc::new(VecQueue::new(&[
            "update:a.2",
            "update:b.1",
            "update:a.1",
            "update:a.2",
        ]));
        let repository = MapRepository::with(&["a.1", "a.2", "b.1"]);

        let (report, handler) = run_cycle(queue, &["a", "b"], repository);

        assert_eq!(handler.batches(), vec![vec!["a.1", "a.2"], vec!["b.1"]]);
        assert_eq!(report.pending_updates, 3);
        assert_eq!(report.updates.applied, 3);
        assert_eq!(report.updates.backend_calls, 2);
        assert!(report.has_updates());
    }

    #[test]
    fn test_bad_messages_are_dropped() {
        let queue = Arc::new(VecQueue::new(&[
            "no-colon-here",
            "upsert:a.1",
            "update:nodot",
            "update:a.1",
        ]));

        let (report, handler) = run_cycle(queue, &["a"], MapRepository::with(&["a.1"]));

        assert_eq!(report.messages_read, 4);
        assert_eq!(report.messages_rejected, 2);
        // Identifiers are only decoded at flush time
        assert_eq!(report.updates.malformed, 1);
        assert_eq!(handler.batches(), vec![vec!["a.1"]]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_unregistered_type_does_not_block_sibling() {
        let queue = Arc::new(VecQueue::new(&["update:x.1", "update:y.1", "delete:x.2"]));

        let (report, handler) = run_cycle(queue, &["y"], MapRepository::with(&["x.1", "y.1"]));

        assert_eq!(handler.batches(), vec![vec!["y.1"]]);
        assert!(handler.removed().is_empty());
        assert_eq!(report.updates.skipped_groups, 1);
        assert_eq!(report.deletes.skipped_groups, 1);
    }

    #[test]
    fn test_empty_queue() {
        let queue = Arc::new(VecQueue::new(&[]));

        let (report, handler) = run_cycle(queue, &["a"], MapRepository::default());

        assert_eq!(report.messages_read, 0);
        assert_eq!(report.commits, 0);
        assert!(handler.batches().is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_read_failure_still_flushes() {
        let mut queue = VecQueue::new(&["delete:a.1", "delete:a.2", "delete:a.3"]);
        queue.fail_after = Some(2);
        let queue = Arc::new(queue);

        let (report, handler) = run_cycle(queue.clone(), &["a"], MapRepository::default());

        assert_eq!(report.read_errors, 1);
        assert_eq!(report.messages_read, 2);
        assert_eq!(handler.removed(), vec!["a.1", "a.2"]);
        assert_eq!(queue.remaining(), 1);
    }

    #[test]
    fn test_invalid_utf8_message_does_not_end_drain() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let storage = Arc::new(qsearch_storage::Storage::open(temp_dir.path()).unwrap());
        storage.enqueue("test_queue", "delete:a.1").unwrap();
        storage.enqueue("test_queue", [0x64, 0xff, 0x3a]).unwrap();
        storage.enqueue("test_queue", "delete:a.2").unwrap();

        let handler = Arc::new(RecordingHandler::default());
        let registry = HandlerRegistry::with_types(["a"], handler.clone());
        let queue = crate::queue::StorageQueue::new(storage.clone(), "test_queue");
        let report = DrainCycle::new(
            SyncConfig::default().with_queue_name("test_queue"),
            Arc::new(queue),
            Arc::new(registry),
            Arc::new(MapRepository::default()),
        )
        .run();

        assert_eq!(report.read_errors, 0);
        assert_eq!(report.messages_read, 3);
        assert_eq!(report.messages_rejected, 1);
        assert_eq!(handler.removed(), vec!["a.1", "a.2"]);
        assert_eq!(storage.queue_len("test_queue").unwrap(), 0);
    }

    #[test]
    fn test_sync_config_from_settings() {
        let settings = Settings {
            queue_name: "other_queue".to_string(),
            log_level: "debug".to_string(),
            ..Default::default()
        };

        let config = SyncConfig::from_settings(&settings);
        assert_eq!(config.queue_name, "other_queue");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_cycle_state_display() {
        assert_eq!(CycleState::Draining.to_string(), "draining");
        assert_eq!(CycleState::Flushing.to_string(), "flushing");
        assert_eq!(CycleState::Done.to_string(), "done");
    }
}
