//! Checkpoint data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable snapshot of a file's content at a point in time.
///
/// A checkpoint record and the content blob it references are never
/// mutated after creation; they are only deleted wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Unique checkpoint identifier.
    pub id: String,
    /// Absolute or workspace-relative path the checkpoint belongs to.
    pub file_path: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Originating agent; `None` for system-generated safety backups.
    pub agent_id: Option<String>,
    /// Human-readable description.
    pub summary: String,
    /// Short content fingerprint (first 12 hex chars of SHA-256), for
    /// deduplication and debugging, not used as a lookup key.
    pub content_hash: String,
    /// Reference to the persisted content blob, relative to the
    /// checkpoint directory.
    pub content_ref: String,
    /// Content length in bytes.
    pub size: u64,
}

/// Aggregate statistics over the checkpoint index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointStats {
    /// Total number of recorded checkpoints.
    pub checkpoint_count: usize,
    /// Number of distinct files with at least one checkpoint.
    pub file_count: usize,
    /// Sum of all checkpoint content sizes in bytes.
    pub total_size_bytes: u64,
}

/// Result of restoring a checkpoint to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    /// Path that was overwritten.
    pub file_path: String,
    /// Creation time of the checkpoint that was restored.
    pub restored_from: DateTime<Utc>,
    /// Id of the checkpoint that was restored.
    pub checkpoint_id: String,
}

/// Result of a retention cleanup sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    /// Checkpoints removed by this sweep.
    pub deleted_count: usize,
    /// Deletions that failed and were skipped.
    pub failed_count: usize,
}
