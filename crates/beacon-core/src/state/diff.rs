//! Pure helpers for client-side state reconciliation.
//!
//! These operate on plain JSON objects and carry no versioning side
//! effects, so an observer can mirror the manager's merge rules against
//! its own copy of the state.

use crate::state::delta::Delta;
use crate::state::domain::StateChange;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Structural difference between two plain objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueDiff {
    /// Keys whose values changed or were added, with their new values.
    pub changes: Map<String, Value>,
    /// Keys present in the old object but absent from the new one.
    pub removals: Vec<String>,
}

impl ValueDiff {
    /// Whether the two objects were identical.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.removals.is_empty()
    }
}

/// Compare two plain objects structurally, by deep value equality.
pub fn compute_diff(old: &Map<String, Value>, new: &Map<String, Value>) -> ValueDiff {
    let mut diff = ValueDiff::default();
    for (key, value) in new {
        if old.get(key) != Some(value) {
            diff.changes.insert(key.clone(), value.clone());
        }
    }
    for key in old.keys() {
        if !new.contains_key(key) {
            diff.removals.push(key.clone());
        }
    }
    diff
}

/// Apply a delta to an arbitrary state object, mirroring the store's
/// domain-aware merge rules.
///
/// Keyed domains get per-key upserts (null-as-delete) and removals; scalar
/// domains are replaced wholesale. A non-object state is returned
/// untouched.
pub fn apply_delta(state: &Value, delta: &Delta) -> Value {
    let mut next = state.clone();
    if let Some(root) = next.as_object_mut() {
        let domain = delta.change.domain();
        match &delta.change {
            StateChange::Agents { changes, removals } => {
                apply_keyed(root, domain, changes, removals);
            }
            StateChange::Files { changes, removals } => {
                apply_keyed(root, domain, changes, removals);
            }
            StateChange::Phase { changes } => apply_scalar(root, domain, changes),
            StateChange::AutoMode { changes } => apply_scalar(root, domain, changes),
            StateChange::Swarm { changes } => apply_scalar(root, domain, changes),
            StateChange::Security { changes } => apply_scalar(root, domain, changes),
        }
    }
    next
}

fn apply_keyed<T: Serialize>(
    root: &mut Map<String, Value>,
    domain: &str,
    changes: &BTreeMap<String, Option<T>>,
    removals: &[String],
) {
    let slot = root.entry(domain.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Some(target) = slot.as_object_mut() {
        for (key, value) in changes {
            match value {
                Some(value) => {
                    let encoded = serde_json::to_value(value).unwrap_or(Value::Null);
                    target.insert(key.clone(), encoded);
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
}

fn apply_scalar<T: Serialize>(root: &mut Map<String, Value>, domain: &str, value: &T) {
    root.insert(
        domain.to_string(),
        serde_json::to_value(value).unwrap_or(Value::Null),
    );
}
