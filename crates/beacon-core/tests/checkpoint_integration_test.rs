//! Integration tests for checkpoint workflow scenarios.
//!
//! These tests verify end-to-end checkpoint functionality including:
//! - Creation, retrieval, and content round-trips
//! - Non-destructive restore with safety backups
//! - Retention floor enforcement and cleanup sweeps
//! - Index persistence across service instances

use beacon_core::checkpoint::{CheckpointError, CheckpointService, CleanupSweeper};
use beacon_core::config::{Config, RetentionConfig};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn config_with_retention(retention: RetentionConfig) -> Config {
    Config { checkpoint_dir: None, retention }
}

fn relaxed_retention() -> RetentionConfig {
    RetentionConfig {
        min_checkpoints_per_file: 0,
        ..RetentionConfig::default()
    }
}

#[tokio::test]
async fn test_create_and_read_back_content() {
    let temp_dir = TempDir::new().unwrap();
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(relaxed_retention()))
            .unwrap();

    let checkpoint = service
        .create_checkpoint("src/main.rs", "fn main() {}", Some("agent-1"), "Before edit")
        .await
        .unwrap();

    assert!(checkpoint.id.starts_with("checkpoint-"));
    assert_eq!(checkpoint.file_path, "src/main.rs");
    assert_eq!(checkpoint.agent_id, Some("agent-1".to_string()));
    assert_eq!(checkpoint.summary, "Before edit");
    assert_eq!(checkpoint.size, "fn main() {}".len() as u64);
    assert_eq!(checkpoint.content_hash.len(), 12);

    let content = service.get_checkpoint_content(&checkpoint.id).await.unwrap();
    assert_eq!(content, "fn main() {}");

    let retrieved = service.get_checkpoint(&checkpoint.id).await.unwrap();
    assert_eq!(retrieved, checkpoint);
}

#[tokio::test]
async fn test_list_is_sorted_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(relaxed_retention()))
            .unwrap();

    service.create_checkpoint("a.txt", "one", None, "v1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    service.create_checkpoint("a.txt", "two", None, "v2").await.unwrap();

    let listed = service.get_checkpoints("a.txt").await;
    let summaries: Vec<&str> = listed.iter().map(|cp| cp.summary.as_str()).collect();
    assert_eq!(summaries, vec!["v2", "v1"]);
    assert!(listed[0].timestamp > listed[1].timestamp);

    assert!(service.get_checkpoints("other.txt").await.is_empty());
}

#[tokio::test]
async fn test_restore_overwrites_and_backs_up_current_content() {
    let temp_dir = TempDir::new().unwrap();
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(relaxed_retention()))
            .unwrap();

    let file = temp_dir.path().join("notes.txt");
    fs::write(&file, "original").unwrap();

    let checkpoint = service
        .create_checkpoint("notes.txt", "original", Some("agent-1"), "Before edit")
        .await
        .unwrap();

    // The agent edits the file after the checkpoint.
    fs::write(&file, "edited").unwrap();

    let outcome = service.restore_checkpoint(&checkpoint.id).await.unwrap();
    assert_eq!(outcome.checkpoint_id, checkpoint.id);
    assert_eq!(outcome.file_path, "notes.txt");
    assert_eq!(outcome.restored_from, checkpoint.timestamp);

    // The file holds the restored content.
    assert_eq!(fs::read_to_string(&file).unwrap(), "original");

    // The overwritten content survives as a system-generated safety backup.
    let listed = service.get_checkpoints("notes.txt").await;
    assert_eq!(listed.len(), 2);
    let backup = &listed[0];
    assert_eq!(backup.agent_id, None);
    assert!(backup.summary.starts_with("Safety backup before restore to "));
    assert_eq!(service.get_checkpoint_content(&backup.id).await.unwrap(), "edited");
}

#[tokio::test]
async fn test_restore_missing_file_makes_no_backup() {
    let temp_dir = TempDir::new().unwrap();
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(relaxed_retention()))
            .unwrap();

    let checkpoint = service
        .create_checkpoint("deep/nested/new.txt", "payload", None, "snapshot")
        .await
        .unwrap();

    // File was never written to disk; restore must create parent
    // directories and skip the safety backup.
    service.restore_checkpoint(&checkpoint.id).await.unwrap();

    let restored = temp_dir.path().join("deep/nested/new.txt");
    assert_eq!(fs::read_to_string(&restored).unwrap(), "payload");
    assert_eq!(service.get_checkpoints("deep/nested/new.txt").await.len(), 1);
}

#[tokio::test]
async fn test_delete_blocked_at_retention_floor() {
    let temp_dir = TempDir::new().unwrap();
    let retention = RetentionConfig { min_checkpoints_per_file: 2, ..RetentionConfig::default() };
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(retention)).unwrap();

    let first = service.create_checkpoint("a.txt", "one", None, "v1").await.unwrap();
    let second = service.create_checkpoint("a.txt", "two", None, "v2").await.unwrap();

    // Exactly at the floor: every deletion is refused, regardless of target.
    for id in [&first.id, &second.id] {
        let result = service.delete_checkpoint(id).await;
        assert!(matches!(
            result,
            Err(CheckpointError::RetentionFloor { count: 2, floor: 2, .. })
        ));
    }

    // One above the floor: deleting the oldest succeeds.
    service.create_checkpoint("a.txt", "three", None, "v3").await.unwrap();
    service.delete_checkpoint(&first.id).await.unwrap();

    assert!(matches!(
        service.get_checkpoint(&first.id).await,
        Err(CheckpointError::NotFound(_))
    ));
    assert_eq!(service.get_checkpoints("a.txt").await.len(), 2);
}

#[tokio::test]
async fn test_cleanup_deletes_aged_checkpoints_and_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let retention = RetentionConfig {
        min_checkpoints_per_file: 2,
        max_age_ms: 1,
        ..RetentionConfig::default()
    };
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(retention)).unwrap();

    for summary in ["v1", "v2", "v3", "v4", "v5"] {
        service.create_checkpoint("a.txt", summary, None, summary).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(20)).await;

    let report = service.cleanup().await.unwrap();
    assert_eq!(report.deleted_count, 3);
    assert_eq!(report.failed_count, 0);

    // The newest two survive the sweep even though they are past max age.
    let summaries: Vec<String> =
        service.get_checkpoints("a.txt").await.iter().map(|cp| cp.summary.clone()).collect();
    assert_eq!(summaries, vec!["v5", "v4"]);

    // Running again with no new checkpoints deletes nothing.
    let report = service.cleanup().await.unwrap();
    assert_eq!(report.deleted_count, 0);
}

#[tokio::test]
async fn test_cleanup_evicts_oldest_beyond_cap() {
    let temp_dir = TempDir::new().unwrap();
    let retention = RetentionConfig {
        min_checkpoints_per_file: 1,
        max_checkpoints_per_file: 3,
        ..RetentionConfig::default()
    };
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(retention)).unwrap();

    for summary in ["v1", "v2", "v3", "v4", "v5"] {
        service.create_checkpoint("a.txt", summary, None, summary).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let report = service.cleanup().await.unwrap();
    assert_eq!(report.deleted_count, 2);

    let summaries: Vec<String> =
        service.get_checkpoints("a.txt").await.iter().map(|cp| cp.summary.clone()).collect();
    assert_eq!(summaries, vec!["v5", "v4", "v3"]);
}

#[tokio::test]
async fn test_stats_aggregate_index() {
    let temp_dir = TempDir::new().unwrap();
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(relaxed_retention()))
            .unwrap();

    service.create_checkpoint("a.txt", "12345", None, "v1").await.unwrap();
    service.create_checkpoint("a.txt", "678", None, "v2").await.unwrap();
    service.create_checkpoint("b.txt", "90", None, "v1").await.unwrap();

    let stats = service.get_stats().await;
    assert_eq!(stats.checkpoint_count, 3);
    assert_eq!(stats.file_count, 2);
    assert_eq!(stats.total_size_bytes, 10);
}

#[tokio::test]
async fn test_unknown_id_errors() {
    let temp_dir = TempDir::new().unwrap();
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(relaxed_retention()))
            .unwrap();

    for result in [
        service.get_checkpoint("checkpoint-missing").await.err(),
        service.get_checkpoint_content("checkpoint-missing").await.err(),
        service.restore_checkpoint("checkpoint-missing").await.err(),
        service.delete_checkpoint("checkpoint-missing").await.err(),
    ] {
        assert!(matches!(result, Some(CheckpointError::NotFound(_))));
    }
}

#[tokio::test]
async fn test_missing_blob_is_a_storage_error() {
    let temp_dir = TempDir::new().unwrap();
    let service =
        CheckpointService::open(temp_dir.path(), &config_with_retention(relaxed_retention()))
            .unwrap();

    let checkpoint = service.create_checkpoint("a.txt", "payload", None, "v1").await.unwrap();

    // Drift the storage out from under the index.
    let blob = temp_dir
        .path()
        .join(".beacon/_internals/checkpoints")
        .join(&checkpoint.content_ref);
    fs::remove_file(blob).unwrap();

    let result = service.get_checkpoint_content(&checkpoint.id).await;
    assert!(matches!(result, Err(CheckpointError::Storage(_))));
}

#[tokio::test]
async fn test_index_persists_across_service_instances() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_with_retention(relaxed_retention());

    let checkpoint = {
        let service = CheckpointService::open(temp_dir.path(), &config).unwrap();
        service.create_checkpoint("src/lib.rs", "pub fn f() {}", Some("agent-2"), "v1").await.unwrap()
    };

    let reopened = CheckpointService::open(temp_dir.path(), &config).unwrap();
    let listed = reopened.get_checkpoints("src/lib.rs").await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], checkpoint);
    assert_eq!(
        reopened.get_checkpoint_content(&checkpoint.id).await.unwrap(),
        "pub fn f() {}"
    );
}

#[tokio::test]
async fn test_sweeper_runs_cleanup_and_stops() {
    let temp_dir = TempDir::new().unwrap();
    let retention = RetentionConfig {
        min_checkpoints_per_file: 1,
        max_age_ms: 1,
        auto_cleanup_interval_ms: 20,
        ..RetentionConfig::default()
    };
    let service = Arc::new(
        CheckpointService::open(temp_dir.path(), &config_with_retention(retention)).unwrap(),
    );

    for summary in ["v1", "v2", "v3"] {
        service.create_checkpoint("a.txt", summary, None, summary).await.unwrap();
    }

    let sweeper = CleanupSweeper::new(Arc::clone(&service));
    sweeper.start().await;
    assert!(sweeper.is_running().await);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(service.get_checkpoints("a.txt").await.len(), 1);

    sweeper.shutdown().await;
    assert!(!sweeper.is_running().await);
}
