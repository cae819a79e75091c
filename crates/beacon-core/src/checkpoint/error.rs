//! Error types for checkpoint operations.

use thiserror::Error;

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur during checkpoint operations.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Checkpoint id is not present in the index.
    #[error("Checkpoint not found: {0}")]
    NotFound(String),

    /// Deletion blocked by the configured per-file retention floor.
    #[error("Retention floor reached for {path}: {count} checkpoint(s) recorded, floor is {floor}")]
    RetentionFloor {
        /// File the blocked checkpoint belongs to.
        path: String,
        /// Checkpoints currently recorded for the file.
        count: usize,
        /// Configured minimum that must always remain.
        floor: usize,
    },

    /// Underlying read/write/mkdir failure, including index/storage drift.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Index document could not be serialized or parsed.
    #[error("Index error: {0}")]
    Index(#[from] serde_json::Error),

    /// Directory or index bootstrap failure.
    #[error("Failed to initialize checkpoint store: {0}")]
    Initialization(String),
}
