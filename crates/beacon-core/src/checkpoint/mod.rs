//! Durable checkpoint/undo store for file revisions.
//!
//! This module provides a content-addressed history of file snapshots with
//! retention policy and safe, non-destructive restore.
//!
//! # Example
//!
//! ```rust,no_run
//! use beacon_core::checkpoint::CheckpointService;
//! use beacon_core::config::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let service = CheckpointService::open("/workspace", &config)?;
//!
//! let checkpoint = service
//!     .create_checkpoint("src/main.rs", "fn main() {}", Some("agent-1"), "Before edit")
//!     .await?;
//!
//! // Later, roll the file back. The current content is backed up first.
//! service.restore_checkpoint(&checkpoint.id).await?;
//! # Ok(())
//! # }
//! ```

mod content_store;
mod error;
mod index;
mod models;
mod service;
mod sweeper;

pub use error::{CheckpointError, Result};
pub use index::CheckpointIndex;
pub use models::{Checkpoint, CheckpointStats, CleanupReport, RestoreOutcome};
pub use service::CheckpointService;
pub use sweeper::CleanupSweeper;
