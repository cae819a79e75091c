//! Beacon Core - checkpoint and state-synchronization backend for an
//! AI-agent development dashboard.
//!
//! This crate provides the two core subsystems of Beacon:
//! - A durable checkpoint/undo store for file revisions, with retention
//!   policy and safe, non-destructive restore
//! - A versioned in-memory state layer with a bounded delta log, so
//!   reconnecting observers catch up incrementally where possible
//!
//! # Example
//!
//! ```rust,no_run
//! use beacon_core::checkpoint::CheckpointService;
//! use beacon_core::config::Config;
//! use beacon_core::state::{Phase, StateManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let checkpoints = CheckpointService::open("/workspace", &config)?;
//! checkpoints
//!     .create_checkpoint("src/main.rs", "fn main() {}", Some("agent-1"), "Before edit")
//!     .await?;
//!
//! let state = StateManager::new();
//! state.subscribe(|delta| {
//!     println!("v{}: {}", delta.version, delta.change.domain());
//!     Ok(())
//! });
//! state.update_phase(Phase::Planning);
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod state;

pub use checkpoint::{
    Checkpoint, CheckpointError, CheckpointService, CheckpointStats, CleanupReport,
    CleanupSweeper, RestoreOutcome,
};
pub use config::{Config, RetentionConfig};
pub use error::{BeaconError, Result};
pub use state::{
    apply_delta, compute_diff, AgentState, AgentStatus, DashboardState, Delta, DeltaLog,
    FileActivity, FileState, Phase, SecurityMode, SecurityState, StateChange, StateManager,
    StateSnapshot, SubscriptionId, SwarmState, SyncResponse, ValueDiff,
};
