//! Immutable blob storage for checkpoint content.
//!
//! Blobs live under `<checkpoint_dir>/files/<sanitized-path>/<timestamp>.txt`
//! with UTF-8 text semantics. A blob is written once at checkpoint creation
//! and never rewritten.

use crate::checkpoint::error::{CheckpointError, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Directory name for content blobs under the checkpoint directory.
const FILES_DIR: &str = "files";

/// Blob storage rooted at the checkpoint directory.
#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a content store rooted at the checkpoint directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding all content blobs.
    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    /// Persist content as a new immutable blob.
    ///
    /// The blob is named by a high-resolution creation timestamp; if a blob
    /// with that name already exists the timestamp is bumped until a free
    /// slot is found, so rapid successive snapshots of one file never
    /// overwrite each other.
    ///
    /// # Returns
    /// The blob reference, relative to the checkpoint directory.
    pub fn write(
        &self,
        storage_key: &str,
        timestamp: DateTime<Utc>,
        content: &str,
    ) -> Result<String> {
        let dir = self.files_dir().join(storage_key);
        fs::create_dir_all(&dir)?;

        let mut stamp = timestamp.timestamp_micros();
        let mut blob_path = dir.join(format!("{stamp}.txt"));
        while blob_path.exists() {
            stamp += 1;
            blob_path = dir.join(format!("{stamp}.txt"));
        }

        fs::write(&blob_path, content)?;
        Ok(format!("{FILES_DIR}/{storage_key}/{stamp}.txt"))
    }

    /// Read a blob back as text.
    ///
    /// # Errors
    /// Returns `Storage` if the referenced blob is missing or unreadable,
    /// which indicates the index and storage have drifted.
    pub fn read(&self, content_ref: &str) -> Result<String> {
        fs::read_to_string(self.root.join(content_ref)).map_err(CheckpointError::from)
    }

    /// Delete a blob. A blob that is already gone is not an error.
    pub fn remove(&self, content_ref: &str) -> Result<()> {
        match fs::remove_file(self.root.join(content_ref)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Derive a filesystem-safe storage key from a checkpoint file path.
///
/// The path is taken relative to the workspace root where possible, path
/// separators become `_`, and characters outside `[A-Za-z0-9._-]` are
/// stripped. `..` and root components are dropped, so a key can never
/// escape the blob directory.
pub fn storage_key(workspace_root: &Path, file_path: &str) -> String {
    let path = Path::new(file_path);
    let relative = path.strip_prefix(workspace_root).unwrap_or(path);

    let mut key = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            if !key.is_empty() {
                key.push('_');
            }
            for ch in part.to_string_lossy().chars() {
                if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                    key.push(ch);
                }
            }
        }
    }

    if key.is_empty() {
        key.push_str("root");
    }
    key
}

/// Short content fingerprint: first 12 hex chars of the SHA-256 digest.
pub fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_key_relative_path() {
        let root = Path::new("/workspace");
        assert_eq!(storage_key(root, "src/main.rs"), "src_main.rs");
    }

    #[test]
    fn test_storage_key_absolute_path_under_root() {
        let root = Path::new("/workspace");
        assert_eq!(storage_key(root, "/workspace/src/lib.rs"), "src_lib.rs");
    }

    #[test]
    fn test_storage_key_strips_unsafe_characters() {
        let root = Path::new("/workspace");
        assert_eq!(storage_key(root, "a b/c:d.txt"), "ab_cd.txt");
    }

    #[test]
    fn test_storage_key_drops_parent_components() {
        let root = Path::new("/workspace");
        assert_eq!(storage_key(root, "../../etc/passwd"), "etc_passwd");
    }

    #[test]
    fn test_storage_key_empty_falls_back() {
        let root = Path::new("/workspace");
        assert_eq!(storage_key(root, ""), "root");
    }

    #[test]
    fn test_fingerprint_is_short_hex() {
        let hash = fingerprint("hello");
        assert_eq!(hash.len(), 12);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, fingerprint("hello"));
        assert_ne!(hash, fingerprint("world"));
    }

    #[test]
    fn test_write_read_remove_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = ContentStore::new(temp_dir.path());

        let content_ref = store.write("src_main.rs", Utc::now(), "fn main() {}").unwrap();
        assert!(content_ref.starts_with("files/src_main.rs/"));
        assert_eq!(store.read(&content_ref).unwrap(), "fn main() {}");

        store.remove(&content_ref).unwrap();
        assert!(store.read(&content_ref).is_err());
        // Removing an already-gone blob is not an error.
        store.remove(&content_ref).unwrap();
    }

    #[test]
    fn test_write_same_instant_gets_distinct_blobs() {
        let temp_dir = TempDir::new().unwrap();
        let store = ContentStore::new(temp_dir.path());

        let now = Utc::now();
        let first = store.write("a.txt", now, "one").unwrap();
        let second = store.write("a.txt", now, "two").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.read(&first).unwrap(), "one");
        assert_eq!(store.read(&second).unwrap(), "two");
    }
}
