//! Totals reported by a drain cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one flush pass (updates or deletes).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Entity-type groups visited
    pub groups: usize,
    /// Groups skipped because no index is registered for the type
    pub skipped_groups: usize,
    /// Identifiers skipped because they could not be decoded
    pub malformed: usize,
    /// Entities dropped because the repository could not resolve them
    pub dropped: usize,
    /// Entities indexed (update pass) or documents removed (delete pass)
    pub applied: usize,
    /// Backend calls issued
    pub backend_calls: usize,
    /// Backend calls that failed
    pub errors: usize,
}

impl PassReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another pass into this one.
    pub fn merge(&mut self, other: &PassReport) {
        self.groups += other.groups;
        self.skipped_groups += other.skipped_groups;
        self.malformed += other.malformed;
        self.dropped += other.dropped;
        self.applied += other.applied;
        self.backend_calls += other.backend_calls;
        self.errors += other.errors;
    }

    /// Whether anything was skipped, dropped or failed.
    pub fn has_problems(&self) -> bool {
        self.skipped_groups + self.malformed + self.dropped + self.errors > 0
    }
}

/// Summary of one drain-and-flush cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    /// Queue the cycle drained
    pub queue_name: String,
    /// When draining started (milliseconds since epoch for JSON compatibility)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    /// When the cycle reached Done
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
    /// Messages read from the queue
    pub messages_read: usize,
    /// Messages dropped as malformed or with an unrecognized action
    pub messages_rejected: usize,
    /// Queue read failures other than the empty signal
    pub read_errors: usize,
    /// Identifiers pending update after deduplication
    pub pending_updates: usize,
    /// Identifiers pending delete after deduplication
    pub pending_deletes: usize,
    /// Update pass totals
    pub updates: PassReport,
    /// Delete pass totals
    pub deletes: PassReport,
    /// Index commits that succeeded
    pub commits: usize,
    /// Index commits that failed
    pub commit_errors: usize,
}

impl CycleReport {
    pub fn new(queue_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            queue_name: queue_name.into(),
            started_at: now,
            finished_at: now,
            messages_read: 0,
            messages_rejected: 0,
            read_errors: 0,
            pending_updates: 0,
            pending_deletes: 0,
            updates: PassReport::new(),
            deletes: PassReport::new(),
            commits: 0,
            commit_errors: 0,
        }
    }

    /// Whether the flush changed the index.
    pub fn has_updates(&self) -> bool {
        self.updates.applied + self.deletes.applied > 0
    }

    /// Both flush passes added together.
    pub fn totals(&self) -> PassReport {
        let mut totals = self.updates.clone();
        totals.merge(&self.deletes);
        totals
    }

    /// Whether every message and pending identifier was applied cleanly.
    pub fn is_clean(&self) -> bool {
        self.messages_rejected == 0
            && self.read_errors == 0
            && self.commit_errors == 0
            && !self.totals().has_problems()
    }

    /// Wall-clock duration of the cycle in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
