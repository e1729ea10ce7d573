//! File-backed key/value storage for the durable scope.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::errors::AuthError;
use crate::domain::ports::KeyValueStore;

/// Key/value store kept as a flat TOML table on disk.
///
/// Entries are cached in memory after [`open`](Self::open); every batch write
/// rewrites the file atomically.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens the store at `path`, loading any entries already there.
    ///
    /// A file that cannot be parsed is treated as empty and replaced on the
    /// next write.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                toml::from_str::<BTreeMap<String, String>>(&content).unwrap_or_else(|e| {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Stored entries are malformed, starting empty"
                    );
                    BTreeMap::new()
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored entries yet");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(AuthError::retrieval_failed(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: BTreeMap<String, String>) -> Result<(), AuthError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &entries))
            .await
            .map_err(|e| AuthError::storage_failed(format!("write task failed: {e}")))?
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), AuthError> {
        let mut guard = self.entries.lock().await;
        let mut next = guard.clone();
        for (key, value) in entries {
            next.insert((*key).to_string(), value.clone());
        }

        self.persist(next.clone()).await?;
        *guard = next;
        debug!(count = entries.len(), "Stored entries");
        Ok(())
    }

    async fn remove_entries(&self, keys: &[&str]) -> Result<(), AuthError> {
        let mut guard = self.entries.lock().await;
        if !keys.iter().any(|k| guard.contains_key(*k)) {
            return Ok(());
        }

        let mut next = guard.clone();
        for key in keys {
            next.remove(*key);
        }

        self.persist(next.clone()).await?;
        *guard = next;
        debug!(count = keys.len(), "Removed entries");
        Ok(())
    }
}

fn write_atomically(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), AuthError> {
    let content = toml::to_string(entries)
        .map_err(|e| AuthError::storage_failed(format!("failed to encode entries: {e}")))?;

    let parent = path
        .parent()
        .ok_or_else(|| AuthError::storage_failed("storage path has no parent directory"))?;
    std::fs::create_dir_all(parent).map_err(|e| AuthError::storage_failed(e.to_string()))?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| AuthError::storage_failed(e.to_string()))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| AuthError::storage_failed(e.to_string()))?;
    temp_file
        .persist(path)
        .map_err(|e| AuthError::storage_failed(e.error.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");

        let store = FileKeyValueStore::open(&path).await.unwrap();
        store
            .set_entries(&[("authToken", "abc".to_string()), ("userId", "7".to_string())])
            .await
            .unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("authToken").await.unwrap(), Some("abc".to_string()));
        assert_eq!(reopened.get("userId").await.unwrap(), Some("7".to_string()));
    }

    #[tokio::test]
    async fn test_remove_entries_rewrites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        let store = FileKeyValueStore::open(&path).await.unwrap();
        store
            .set_entries(&[("authToken", "abc".to_string()), ("theme", "dark".to_string())])
            .await
            .unwrap();

        store.remove_entries(&["authToken", "missing"]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("authToken"));
        assert!(content.contains("theme"));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_and_not_created_by_noop_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.toml");
        let store = FileKeyValueStore::open(&path).await.unwrap();

        store.remove_entries(&["authToken"]).await.unwrap();

        assert!(!store.contains("authToken").await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_malformed_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "authToken = [").unwrap();

        let store = FileKeyValueStore::open(&path).await.unwrap();

        assert_eq!(store.get("authToken").await.unwrap(), None);
    }
}
