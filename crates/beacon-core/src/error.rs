//! Error types for Beacon Core.

use crate::checkpoint::CheckpointError;
use thiserror::Error;

/// Core error type for Beacon operations.
#[derive(Error, Debug)]
pub enum BeaconError {
    /// Checkpoint subsystem errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Beacon operations.
pub type Result<T> = std::result::Result<T, BeaconError>;
