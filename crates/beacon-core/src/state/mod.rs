//! Versioned state synchronization for dashboard observers.
//!
//! An in-memory authoritative state aggregate, a bounded delta log, and a
//! manager that lets reconnecting observers catch up incrementally, with a
//! full-snapshot fallback when the log no longer reaches far enough back.

pub mod delta;
pub mod diff;
pub mod domain;
pub mod manager;
pub mod store;

pub use delta::{Delta, DeltaLog, DELTA_LOG_CAPACITY};
pub use diff::{apply_delta, compute_diff, ValueDiff};
pub use domain::{
    AgentState, AgentStatus, FileActivity, FileState, Phase, SecurityMode, SecurityState,
    StateChange, SwarmState,
};
pub use manager::{StateManager, StateSnapshot, SubscriptionId, SyncResponse};
pub use store::DashboardState;
