//! Typed state domains and the state-change sum type.
//!
//! The dashboard state is partitioned into six named domains: two keyed
//! collections (`agents`, `files`) and four scalars (`phase`,
//! `isAutoMode`, `swarm`, `security`). A [`StateChange`] carries one
//! domain's update with a typed payload, so domain dispatch is exhaustive
//! at compile time instead of string-matched at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Runtime status of an agent shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Agent is connected but has no work.
    Idle,
    /// Agent is reasoning about its next action.
    Thinking,
    /// Agent is executing a task.
    Working,
    /// Agent is waiting on an approval or a lock.
    Blocked,
    /// Agent has disconnected.
    Offline,
}

impl Default for AgentStatus {
    fn default() -> Self {
        Self::Idle
    }
}

/// Observable state of one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    /// Current runtime status.
    pub status: AgentStatus,
    /// Task the agent is working on, if any.
    pub current_task: Option<String>,
    /// Model backing the agent, if known.
    pub model: Option<String>,
}

/// What an agent is currently doing with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileActivity {
    /// No agent is touching the file.
    Idle,
    /// An agent is reading the file.
    Reading,
    /// An agent is editing the file.
    Editing,
}

impl Default for FileActivity {
    fn default() -> Self {
        Self::Idle
    }
}

/// Observable state of one tracked file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileState {
    /// Current activity on the file.
    pub status: FileActivity,
    /// Agent responsible for the activity, if any.
    pub agent_id: Option<String>,
}

/// Overall phase of the agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No run in progress.
    Idle,
    /// Agents are planning work.
    Planning,
    /// Agents are executing the plan.
    Executing,
    /// Results are under review.
    Reviewing,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Aggregate state of the agent swarm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmState {
    /// Whether a swarm run is active.
    pub active: bool,
    /// Number of agents in the swarm.
    pub total_agents: u32,
    /// Tasks queued but not yet assigned.
    pub pending_tasks: u32,
}

/// How aggressively operations are gated behind approvals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// Only allow-listed operations run unattended.
    Safe,
    /// Risky operations prompt for approval.
    Prompt,
    /// All mutating operations are blocked.
    Locked,
}

impl Default for SecurityMode {
    fn default() -> Self {
        Self::Safe
    }
}

/// Security posture of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityState {
    /// Active gating mode.
    pub mode: SecurityMode,
    /// Approvals currently awaiting a decision.
    pub pending_approvals: u32,
}

/// One domain's state transition.
///
/// For keyed domains, `changes` maps keys to upserted values; a `None`
/// value deletes the key, as do entries in `removals`. For scalar domains,
/// `changes` replaces the domain's value wholesale. Serialized deltas keep
/// the `{domain, changes, removals}` wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "camelCase")]
pub enum StateChange {
    /// Upserts/removals in the `agents` domain.
    Agents {
        /// Keyed upserts; `None` deletes the key.
        changes: BTreeMap<String, Option<AgentState>>,
        /// Keys to delete.
        #[serde(default)]
        removals: Vec<String>,
    },
    /// Upserts/removals in the `files` domain.
    Files {
        /// Keyed upserts; `None` deletes the key.
        changes: BTreeMap<String, Option<FileState>>,
        /// Keys to delete.
        #[serde(default)]
        removals: Vec<String>,
    },
    /// Replacement of the run phase.
    Phase {
        /// New phase value.
        changes: Phase,
    },
    /// Replacement of the auto-mode flag.
    #[serde(rename = "isAutoMode")]
    AutoMode {
        /// New flag value.
        changes: bool,
    },
    /// Replacement of the swarm aggregate.
    Swarm {
        /// New swarm value.
        changes: SwarmState,
    },
    /// Replacement of the security posture.
    Security {
        /// New security value.
        changes: SecurityState,
    },
}

impl StateChange {
    /// Wire name of the domain this change targets.
    pub fn domain(&self) -> &'static str {
        match self {
            Self::Agents { .. } => "agents",
            Self::Files { .. } => "files",
            Self::Phase { .. } => "phase",
            Self::AutoMode { .. } => "isAutoMode",
            Self::Swarm { .. } => "swarm",
            Self::Security { .. } => "security",
        }
    }
}
