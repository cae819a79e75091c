//! Checkpoint service: creation, retrieval, restore, deletion, and
//! retention cleanup over the content store and index.

use crate::checkpoint::content_store::{fingerprint, storage_key, ContentStore};
use crate::checkpoint::error::{CheckpointError, Result};
use crate::checkpoint::index::{CheckpointIndex, IndexStore};
use crate::checkpoint::models::{Checkpoint, CheckpointStats, CleanupReport, RestoreOutcome};
use crate::config::{Config, RetentionConfig};
use chrono::Utc;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Filename of the persisted index document.
const INDEX_FILE: &str = "index.json";

/// Service orchestrating the checkpoint store.
///
/// The index is guarded by a mutex held across every read-modify-write, so
/// interleaved create/delete calls on one service instance cannot lose
/// updates. Construct once and share via `Arc`.
pub struct CheckpointService {
    workspace_root: PathBuf,
    retention: RetentionConfig,
    content: ContentStore,
    index_store: IndexStore,
    index: Mutex<CheckpointIndex>,
}

impl CheckpointService {
    /// Open the checkpoint store for a workspace, creating the checkpoint
    /// directory and loading the index document.
    ///
    /// # Errors
    /// Returns `Initialization` if the directory cannot be created or the
    /// index document cannot be read.
    pub fn open(workspace_root: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let workspace_root = workspace_root.as_ref().to_path_buf();
        let checkpoint_dir = config.resolve_checkpoint_dir(&workspace_root);

        let content = ContentStore::new(&checkpoint_dir);
        fs::create_dir_all(content.files_dir()).map_err(|e| {
            CheckpointError::Initialization(format!(
                "{}: {e}",
                checkpoint_dir.display()
            ))
        })?;

        let index_store = IndexStore::new(checkpoint_dir.join(INDEX_FILE));
        let index = index_store
            .load()
            .map_err(|e| CheckpointError::Initialization(e.to_string()))?;

        Ok(Self {
            workspace_root,
            retention: config.retention.clone(),
            content,
            index_store,
            index: Mutex::new(index),
        })
    }

    /// Create a checkpoint of the given content for a file.
    ///
    /// The content blob is persisted and the index rewritten before this
    /// returns, so a returned checkpoint is always durable.
    ///
    /// # Arguments
    /// * `file_path` - Absolute or workspace-relative path being snapshotted
    /// * `content` - The file content to preserve
    /// * `agent_id` - Originating agent, if any
    /// * `summary` - Human-readable description
    pub async fn create_checkpoint(
        &self,
        file_path: &str,
        content: &str,
        agent_id: Option<&str>,
        summary: &str,
    ) -> Result<Checkpoint> {
        let mut index = self.index.lock().await;
        let checkpoint = self.record_checkpoint(&mut index, file_path, content, agent_id, summary)?;
        self.index_store.persist(&index)?;

        debug!(
            checkpoint_id = %checkpoint.id,
            file_path = %file_path,
            size = checkpoint.size,
            "Recorded checkpoint"
        );
        Ok(checkpoint)
    }

    /// All checkpoints for a file, newest first.
    pub async fn get_checkpoints(&self, file_path: &str) -> Vec<Checkpoint> {
        self.index.lock().await.for_file(file_path)
    }

    /// Look up a checkpoint by id.
    ///
    /// # Errors
    /// Returns `NotFound` if the id is absent from the index.
    pub async fn get_checkpoint(&self, id: &str) -> Result<Checkpoint> {
        self.index
            .lock()
            .await
            .checkpoints
            .get(id)
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(id.to_string()))
    }

    /// Read the content preserved by a checkpoint.
    ///
    /// # Errors
    /// Returns `NotFound` if the id is absent from the index, or `Storage`
    /// if the referenced blob is missing or unreadable.
    pub async fn get_checkpoint_content(&self, id: &str) -> Result<String> {
        let content_ref = {
            let index = self.index.lock().await;
            index
                .checkpoints
                .get(id)
                .map(|cp| cp.content_ref.clone())
                .ok_or_else(|| CheckpointError::NotFound(id.to_string()))?
        };
        self.content.read(&content_ref)
    }

    /// Restore a checkpoint's content to its file path.
    ///
    /// If the file currently holds non-empty content, a safety backup
    /// checkpoint of that content is recorded first (`agent_id = None`,
    /// summary referencing the target's timestamp), so an overwrite never
    /// permanently discards prior content. A missing file is treated as
    /// empty and gets no backup. Parent directories are created as needed.
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown, or `Storage` on I/O failure.
    pub async fn restore_checkpoint(&self, id: &str) -> Result<RestoreOutcome> {
        let mut index = self.index.lock().await;
        let target = index
            .checkpoints
            .get(id)
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(id.to_string()))?;

        let absolute = self.resolve_path(&target.file_path);
        let current = match fs::read_to_string(&absolute) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        if !current.is_empty() {
            let summary = format!(
                "Safety backup before restore to {}",
                target.timestamp.to_rfc3339()
            );
            let backup =
                self.record_checkpoint(&mut index, &target.file_path, &current, None, &summary)?;
            self.index_store.persist(&index)?;
            debug!(
                checkpoint_id = %backup.id,
                file_path = %target.file_path,
                "Recorded safety backup before restore"
            );
        }

        let restored = self.content.read(&target.content_ref)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&absolute, &restored)?;

        info!(
            checkpoint_id = %target.id,
            file_path = %target.file_path,
            "Restored checkpoint"
        );
        Ok(RestoreOutcome {
            file_path: target.file_path,
            restored_from: target.timestamp,
            checkpoint_id: target.id,
        })
    }

    /// Delete a checkpoint and its content blob.
    ///
    /// Deletion is only permitted when the file has strictly more
    /// checkpoints than the retention floor; the check is path-wide, not
    /// tied to which checkpoint is targeted.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, `RetentionFloor` when the
    /// floor blocks the deletion, or `Storage` on I/O failure.
    pub async fn delete_checkpoint(&self, id: &str) -> Result<()> {
        let mut index = self.index.lock().await;
        let target = index
            .checkpoints
            .get(id)
            .cloned()
            .ok_or_else(|| CheckpointError::NotFound(id.to_string()))?;

        let count = index.count_for_file(&target.file_path);
        let floor = self.retention.min_checkpoints_per_file;
        if count <= floor {
            return Err(CheckpointError::RetentionFloor {
                path: target.file_path,
                count,
                floor,
            });
        }

        self.content.remove(&target.content_ref)?;
        index.remove(id);
        self.index_store.persist(&index)?;

        info!(checkpoint_id = %id, file_path = %target.file_path, "Deleted checkpoint");
        Ok(())
    }

    /// Run a retention cleanup sweep.
    ///
    /// Per file, checkpoints are listed newest-first and the newest
    /// `min_checkpoints_per_file` are always retained. Among the remainder,
    /// anything older than `max_age_ms` is deleted; independently, entries
    /// beyond `max_checkpoints_per_file` are evicted oldest-first. Both
    /// candidate sets are computed against the same upfront listing, then
    /// unioned. Individual deletion failures are logged and skipped.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        let mut index = self.index.lock().await;
        let now = Utc::now();
        let floor = self.retention.min_checkpoints_per_file;
        let cap = self.retention.max_checkpoints_per_file.max(floor);
        let max_age_ms = self.retention.max_age_ms;

        let mut doomed: Vec<Checkpoint> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for entries in index.file_map.keys().map(|path| index.for_file(path)) {
            for checkpoint in entries.iter().skip(floor) {
                let age_ms = (now - checkpoint.timestamp).num_milliseconds();
                if age_ms > max_age_ms as i64 && seen.insert(checkpoint.id.clone()) {
                    doomed.push(checkpoint.clone());
                }
            }
            for checkpoint in entries.iter().skip(cap) {
                if seen.insert(checkpoint.id.clone()) {
                    doomed.push(checkpoint.clone());
                }
            }
        }

        let mut report = CleanupReport::default();
        for checkpoint in doomed {
            match self.content.remove(&checkpoint.content_ref) {
                Ok(()) => {
                    index.remove(&checkpoint.id);
                    report.deleted_count += 1;
                }
                Err(e) => {
                    warn!(
                        checkpoint_id = %checkpoint.id,
                        error = %e,
                        "Failed to delete checkpoint during cleanup"
                    );
                    report.failed_count += 1;
                }
            }
        }

        if report.deleted_count > 0 {
            self.index_store.persist(&index)?;
            info!(
                deleted = report.deleted_count,
                failed = report.failed_count,
                "Cleanup sweep removed expired checkpoints"
            );
        }
        Ok(report)
    }

    /// Aggregate statistics over the index.
    pub async fn get_stats(&self) -> CheckpointStats {
        let index = self.index.lock().await;
        CheckpointStats {
            checkpoint_count: index.checkpoints.len(),
            file_count: index.file_map.len(),
            total_size_bytes: index.checkpoints.values().map(|cp| cp.size).sum(),
        }
    }

    /// Retention configuration this service enforces.
    pub fn retention(&self) -> &RetentionConfig {
        &self.retention
    }

    /// Build a checkpoint record and persist its content blob. The caller
    /// is responsible for persisting the index afterwards.
    fn record_checkpoint(
        &self,
        index: &mut CheckpointIndex,
        file_path: &str,
        content: &str,
        agent_id: Option<&str>,
        summary: &str,
    ) -> Result<Checkpoint> {
        let timestamp = Utc::now();
        let key = storage_key(&self.workspace_root, file_path);
        let content_ref = self.content.write(&key, timestamp, content)?;

        let checkpoint = Checkpoint {
            id: format!("checkpoint-{}", Uuid::new_v4().simple()),
            file_path: file_path.to_string(),
            timestamp,
            agent_id: agent_id.map(ToString::to_string),
            summary: summary.to_string(),
            content_hash: fingerprint(content),
            content_ref,
            size: content.len() as u64,
        };
        index.insert(checkpoint.clone());
        Ok(checkpoint)
    }

    fn resolve_path(&self, file_path: &str) -> PathBuf {
        let path = Path::new(file_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}
