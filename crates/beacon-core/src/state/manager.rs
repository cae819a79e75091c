//! State manager: mutation, delta emission, subscriber notification, and
//! resync decisions.

use crate::state::delta::{Delta, DeltaLog};
use crate::state::domain::{
    AgentState, FileState, Phase, SecurityState, StateChange, SwarmState,
};
use crate::state::store::DashboardState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Full materialized state at a version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    /// Version the snapshot reflects.
    pub version: u64,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// The state itself.
    pub state: DashboardState,
}

/// Answer to a "what changed since version V" query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Deltas to apply, in ascending version order.
    pub deltas: Vec<Delta>,
    /// Set when the requested version predates the retained log; the
    /// caller must fetch a full snapshot instead.
    pub full_resync_needed: bool,
}

/// Handle identifying a registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&Delta) -> anyhow::Result<()> + Send + Sync>;

struct ManagerState {
    version: u64,
    state: DashboardState,
    log: DeltaLog,
}

/// Orchestrates state mutation over the in-memory store and delta log.
///
/// State is purely transient: a fresh process starts at version 0 with an
/// empty log. All mutation goes through [`StateManager::update_state`];
/// subscribers are notified synchronously, in subscription order, and a
/// failing subscriber never aborts delivery to the rest.
pub struct StateManager {
    inner: Mutex<ManagerState>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl StateManager {
    /// Create a manager with empty state at version 0.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ManagerState {
                version: 0,
                state: DashboardState::default(),
                log: DeltaLog::new(),
            }),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Commit one domain change.
    ///
    /// Increments the version by exactly 1, applies the change to the
    /// store, appends the resulting delta to the log (evicting the oldest
    /// entry once full), and notifies all subscribers with the new delta.
    pub fn update_state(&self, change: StateChange) -> Delta {
        let delta = {
            let mut inner = lock(&self.inner);
            inner.version += 1;
            let delta = Delta { version: inner.version, timestamp: Utc::now(), change };
            inner.state.apply(&delta.change);
            inner.log.push(delta.clone());
            delta
        };
        self.notify(&delta);
        delta
    }

    /// Full materialized state with the current version.
    pub fn snapshot(&self) -> StateSnapshot {
        let inner = lock(&self.inner);
        StateSnapshot {
            version: inner.version,
            timestamp: Utc::now(),
            state: inner.state.clone(),
        }
    }

    /// Deltas needed to catch up from `since_version`.
    ///
    /// Returns an empty list when the caller is already up to date, the
    /// retained deltas in ascending order when the log still covers the
    /// requested version, or `full_resync_needed` when it no longer does.
    pub fn deltas_since(&self, since_version: u64) -> SyncResponse {
        let inner = lock(&self.inner);
        if since_version >= inner.version {
            return SyncResponse { deltas: Vec::new(), full_resync_needed: false };
        }
        match inner.log.oldest_version() {
            Some(oldest) if since_version + 1 >= oldest => SyncResponse {
                deltas: inner.log.deltas_after(since_version),
                full_resync_needed: false,
            },
            _ => SyncResponse { deltas: Vec::new(), full_resync_needed: true },
        }
    }

    /// Register a subscriber invoked with every committed delta.
    pub fn subscribe(
        &self,
        callback: impl Fn(&Delta) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        lock(&self.subscribers).push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        lock(&self.subscribers).retain(|(entry, _)| *entry != id);
    }

    /// Replace the run phase.
    pub fn update_phase(&self, phase: Phase) -> Delta {
        self.update_state(StateChange::Phase { changes: phase })
    }

    /// Replace the auto-mode flag.
    pub fn set_auto_mode(&self, enabled: bool) -> Delta {
        self.update_state(StateChange::AutoMode { changes: enabled })
    }

    /// Upsert one agent.
    pub fn update_agent(&self, agent_id: impl Into<String>, state: AgentState) -> Delta {
        let mut changes = BTreeMap::new();
        changes.insert(agent_id.into(), Some(state));
        self.update_state(StateChange::Agents { changes, removals: Vec::new() })
    }

    /// Remove one agent.
    pub fn remove_agent(&self, agent_id: impl Into<String>) -> Delta {
        self.update_state(StateChange::Agents {
            changes: BTreeMap::new(),
            removals: vec![agent_id.into()],
        })
    }

    /// Upsert one tracked file.
    pub fn update_file(&self, path: impl Into<String>, state: FileState) -> Delta {
        let mut changes = BTreeMap::new();
        changes.insert(path.into(), Some(state));
        self.update_state(StateChange::Files { changes, removals: Vec::new() })
    }

    /// Remove one tracked file.
    pub fn remove_file(&self, path: impl Into<String>) -> Delta {
        self.update_state(StateChange::Files {
            changes: BTreeMap::new(),
            removals: vec![path.into()],
        })
    }

    /// Replace the swarm aggregate.
    pub fn update_swarm(&self, swarm: SwarmState) -> Delta {
        self.update_state(StateChange::Swarm { changes: swarm })
    }

    /// Replace the security posture.
    pub fn update_security(&self, security: SecurityState) -> Delta {
        self.update_state(StateChange::Security { changes: security })
    }

    fn notify(&self, delta: &Delta) {
        // No lock is held during fan-out; callbacks may re-enter the manager.
        let subscribers: Vec<(SubscriptionId, Subscriber)> = lock(&self.subscribers).clone();
        for (id, callback) in subscribers {
            if let Err(e) = callback(delta) {
                warn!(
                    subscription = id.0,
                    version = delta.version,
                    error = %e,
                    "State subscriber failed"
                );
            }
        }
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
