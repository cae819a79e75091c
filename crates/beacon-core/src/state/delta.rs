//! Delta records and the bounded delta log.

use crate::state::domain::StateChange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of deltas retained for incremental resync.
pub const DELTA_LOG_CAPACITY: usize = 100;

/// A single recorded state transition between two consecutive versions.
/// Immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    /// Version the state reached after this transition.
    pub version: u64,
    /// When the transition was committed.
    pub timestamp: DateTime<Utc>,
    /// The domain change itself; flattened so a serialized delta reads
    /// `{version, timestamp, domain, changes, removals}`.
    #[serde(flatten)]
    pub change: StateChange,
}

/// Fixed-capacity ring buffer of the most recent deltas, oldest evicted
/// first in O(1).
///
/// If the log is non-empty, its oldest entry's version is the smallest
/// version incremental resync can serve; anything older needs a full
/// resync.
#[derive(Debug, Clone)]
pub struct DeltaLog {
    entries: VecDeque<Delta>,
    capacity: usize,
}

impl DeltaLog {
    /// Create a log with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DELTA_LOG_CAPACITY)
    }

    /// Create a log bounded to `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a delta, evicting the oldest entry once full.
    pub fn push(&mut self, delta: Delta) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(delta);
    }

    /// Version of the oldest retained delta.
    pub fn oldest_version(&self) -> Option<u64> {
        self.entries.front().map(|delta| delta.version)
    }

    /// All retained deltas with a version strictly greater than the given
    /// one, in ascending version order.
    pub fn deltas_after(&self, version: u64) -> Vec<Delta> {
        self.entries.iter().filter(|delta| delta.version > version).cloned().collect()
    }

    /// Number of retained deltas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no deltas.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DeltaLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::domain::Phase;

    fn delta(version: u64) -> Delta {
        Delta {
            version,
            timestamp: Utc::now(),
            change: StateChange::Phase { changes: Phase::Idle },
        }
    }

    #[test]
    fn test_push_evicts_oldest_at_capacity() {
        let mut log = DeltaLog::with_capacity(3);
        for version in 1..=5 {
            log.push(delta(version));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.oldest_version(), Some(3));
    }

    #[test]
    fn test_deltas_after_is_ascending() {
        let mut log = DeltaLog::with_capacity(10);
        for version in 1..=6 {
            log.push(delta(version));
        }
        let tail: Vec<u64> = log.deltas_after(3).iter().map(|d| d.version).collect();
        assert_eq!(tail, vec![4, 5, 6]);
        assert!(log.deltas_after(6).is_empty());
    }

    #[test]
    fn test_empty_log() {
        let log = DeltaLog::new();
        assert!(log.is_empty());
        assert_eq!(log.oldest_version(), None);
    }

    #[test]
    fn test_delta_serializes_flat() {
        let entry = delta(7);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["version"], 7);
        assert_eq!(json["domain"], "phase");
        assert_eq!(json["changes"], "idle");
        assert!(json.get("change").is_none());
    }
}
