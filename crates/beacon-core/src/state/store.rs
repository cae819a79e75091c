//! Authoritative in-memory dashboard state.

use crate::state::domain::{
    AgentState, FileState, Phase, SecurityState, StateChange, SwarmState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The full mutable application state, organized into named domains.
///
/// The aggregate always reflects exactly the cumulative effect of all
/// applied changes; it is mutated only through [`DashboardState::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    /// Connected agents, by id.
    pub agents: BTreeMap<String, AgentState>,
    /// Tracked files, by path.
    pub files: BTreeMap<String, FileState>,
    /// Overall run phase.
    pub phase: Phase,
    /// Whether agents proceed without per-step confirmation.
    pub is_auto_mode: bool,
    /// Swarm aggregate.
    pub swarm: SwarmState,
    /// Security posture.
    pub security: SecurityState,
}

impl DashboardState {
    /// Apply one domain change: keyed upserts with null-as-delete plus
    /// explicit removals, or wholesale scalar replacement.
    pub fn apply(&mut self, change: &StateChange) {
        match change {
            StateChange::Agents { changes, removals } => {
                apply_keyed(&mut self.agents, changes, removals);
            }
            StateChange::Files { changes, removals } => {
                apply_keyed(&mut self.files, changes, removals);
            }
            StateChange::Phase { changes } => self.phase = *changes,
            StateChange::AutoMode { changes } => self.is_auto_mode = *changes,
            StateChange::Swarm { changes } => self.swarm = *changes,
            StateChange::Security { changes } => self.security = changes.clone(),
        }
    }
}

fn apply_keyed<T: Clone>(
    target: &mut BTreeMap<String, T>,
    changes: &BTreeMap<String, Option<T>>,
    removals: &[String],
) {
    for (key, value) in changes {
        match value {
            Some(value) => {
                target.insert(key.clone(), value.clone());
            }
            None => {
                target.remove(key);
            }
        }
    }
    for key in removals {
        target.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::domain::AgentStatus;

    fn busy_agent() -> AgentState {
        AgentState {
            status: AgentStatus::Working,
            current_task: Some("refactor".to_string()),
            model: None,
        }
    }

    #[test]
    fn test_apply_keyed_upsert_and_removal() {
        let mut state = DashboardState::default();

        let mut changes = BTreeMap::new();
        changes.insert("a1".to_string(), Some(busy_agent()));
        state.apply(&StateChange::Agents { changes, removals: Vec::new() });
        assert_eq!(state.agents["a1"].status, AgentStatus::Working);

        state.apply(&StateChange::Agents {
            changes: BTreeMap::new(),
            removals: vec!["a1".to_string()],
        });
        assert!(!state.agents.contains_key("a1"));
    }

    #[test]
    fn test_apply_null_value_deletes_key() {
        let mut state = DashboardState::default();

        let mut changes = BTreeMap::new();
        changes.insert("a1".to_string(), Some(busy_agent()));
        state.apply(&StateChange::Agents { changes, removals: Vec::new() });

        let mut changes = BTreeMap::new();
        changes.insert("a1".to_string(), None);
        state.apply(&StateChange::Agents { changes, removals: Vec::new() });
        assert!(state.agents.is_empty());
    }

    #[test]
    fn test_apply_scalar_replaces_wholesale() {
        let mut state = DashboardState::default();
        state.apply(&StateChange::Phase { changes: Phase::Planning });
        assert_eq!(state.phase, Phase::Planning);

        state.apply(&StateChange::AutoMode { changes: true });
        assert!(state.is_auto_mode);

        let swarm = SwarmState { active: true, total_agents: 3, pending_tasks: 1 };
        state.apply(&StateChange::Swarm { changes: swarm });
        assert_eq!(state.swarm, swarm);
    }

    #[test]
    fn test_removal_of_absent_key_is_noop() {
        let mut state = DashboardState::default();
        state.apply(&StateChange::Files {
            changes: BTreeMap::new(),
            removals: vec!["missing.txt".to_string()],
        });
        assert!(state.files.is_empty());
    }
}
