//! Configuration for Beacon Core.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Retention policy for the checkpoint store.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Age beyond which unprotected checkpoints are eligible for cleanup.
    #[serde(default = "default_max_age_ms")]
    pub max_age_ms: u64,
    /// Floor below which deletion is refused, per file.
    #[serde(default = "default_min_checkpoints_per_file")]
    pub min_checkpoints_per_file: usize,
    /// Soft cap triggering eviction of the oldest checkpoints, per file.
    #[serde(default = "default_max_checkpoints_per_file")]
    pub max_checkpoints_per_file: usize,
    /// Advisory storage budget in megabytes; reported, never enforced by
    /// eviction.
    #[serde(default = "default_max_storage_mb")]
    pub max_storage_mb: u64,
    /// Period of the background cleanup sweep.
    #[serde(default = "default_auto_cleanup_interval_ms")]
    pub auto_cleanup_interval_ms: u64,
}

fn default_max_age_ms() -> u64 {
    7 * 24 * 60 * 60 * 1000 // 7 days
}

fn default_min_checkpoints_per_file() -> usize {
    3
}

fn default_max_checkpoints_per_file() -> usize {
    50
}

fn default_max_storage_mb() -> u64 {
    500
}

fn default_auto_cleanup_interval_ms() -> u64 {
    10 * 60 * 1000 // 10 minutes
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_ms: default_max_age_ms(),
            min_checkpoints_per_file: default_min_checkpoints_per_file(),
            max_checkpoints_per_file: default_max_checkpoints_per_file(),
            max_storage_mb: default_max_storage_mb(),
            auto_cleanup_interval_ms: default_auto_cleanup_interval_ms(),
        }
    }
}

/// Root configuration for Beacon Core.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Checkpoint directory override. Relative paths are resolved against
    /// the workspace root.
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,
    /// Checkpoint retention policy.
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Config {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| crate::error::BeaconError::Config(e.to_string()))
    }

    /// Checkpoint directory for a workspace, defaulting to
    /// `.beacon/_internals/checkpoints` under the workspace root.
    pub fn resolve_checkpoint_dir(&self, workspace_root: &Path) -> PathBuf {
        match &self.checkpoint_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => workspace_root.join(dir),
            None => workspace_root.join(".beacon").join("_internals").join("checkpoints"),
        }
    }
}
