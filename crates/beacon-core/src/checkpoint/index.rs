//! Persisted checkpoint catalog.
//!
//! The index is the single source of truth for checkpoint metadata. It is
//! one JSON document, fully loaded into memory on startup and atomically
//! rewritten after every mutation.

use crate::checkpoint::error::Result;
use crate::checkpoint::models::Checkpoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Current on-disk format version.
const INDEX_FORMAT_VERSION: u32 = 1;

fn default_format_version() -> u32 {
    INDEX_FORMAT_VERSION
}

/// Catalog mapping checkpoint ids to metadata and file paths to ordered
/// id lists (insertion order = creation order).
///
/// Invariant: every id in a `file_map` entry exists in `checkpoints`, and
/// every checkpoint's path appears in `file_map`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointIndex {
    /// On-disk format version.
    #[serde(default = "default_format_version")]
    pub version: u32,
    /// All recorded checkpoints, by id.
    pub checkpoints: BTreeMap<String, Checkpoint>,
    /// Ordered checkpoint ids per file path.
    pub file_map: BTreeMap<String, Vec<String>>,
}

impl CheckpointIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            checkpoints: BTreeMap::new(),
            file_map: BTreeMap::new(),
        }
    }

    /// Record a checkpoint, appending its id to the file's ordered list.
    pub fn insert(&mut self, checkpoint: Checkpoint) {
        self.file_map
            .entry(checkpoint.file_path.clone())
            .or_default()
            .push(checkpoint.id.clone());
        self.checkpoints.insert(checkpoint.id.clone(), checkpoint);
    }

    /// Remove a checkpoint from both maps, dropping the file entry when it
    /// becomes empty.
    pub fn remove(&mut self, id: &str) -> Option<Checkpoint> {
        let checkpoint = self.checkpoints.remove(id)?;
        if let Some(ids) = self.file_map.get_mut(&checkpoint.file_path) {
            ids.retain(|entry| entry != id);
            if ids.is_empty() {
                self.file_map.remove(&checkpoint.file_path);
            }
        }
        Some(checkpoint)
    }

    /// All checkpoints recorded for a file, newest first.
    pub fn for_file(&self, file_path: &str) -> Vec<Checkpoint> {
        let mut entries: Vec<Checkpoint> = self
            .file_map
            .get(file_path)
            .into_iter()
            .flatten()
            .filter_map(|id| self.checkpoints.get(id).cloned())
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    /// Number of checkpoints currently recorded for a file.
    pub fn count_for_file(&self, file_path: &str) -> usize {
        self.file_map.get(file_path).map_or(0, Vec::len)
    }
}

impl Default for CheckpointIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Load/persist backend for the index document.
#[derive(Debug)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Create a store for the index document at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the index, or return an empty one when no document exists yet.
    pub fn load(&self) -> Result<CheckpointIndex> {
        if !self.path.exists() {
            return Ok(CheckpointIndex::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Rewrite the full index document atomically (tmp file + rename).
    pub fn persist(&self, index: &CheckpointIndex) -> Result<()> {
        let json = serde_json::to_string_pretty(index)?;
        atomic_write(&self.path, &json)
    }
}

/// Write content to a file atomically.
fn atomic_write(file_path: &Path, content: &str) -> Result<()> {
    let temp_suffix = Uuid::new_v4().simple().to_string();
    let temp_filename = format!(
        "{}.tmp.{}",
        file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("index"),
        temp_suffix
    );
    let temp_path = file_path
        .parent()
        .map_or_else(|| PathBuf::from(&temp_filename), |dir| dir.join(&temp_filename));

    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&temp_path, file_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
