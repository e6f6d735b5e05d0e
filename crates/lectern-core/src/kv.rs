//! Persisted key-value state
//!
//! The reading app keeps a handful of small values (last-read position,
//! display settings, the asset sync record) in a key-value store. Every
//! local-sync attempt clears the app-state keys so a fresh database never
//! pairs with stale reading state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::asset::SyncResult;
use crate::error::SyncError;

/// Key holding the JSON-encoded [`SyncRecord`](crate::asset::SyncRecord).
pub const KEY_SYNC_RECORD: &str = "asset.syncRecord";

/// App-state keys removed on every local-sync attempt.
pub const APP_STATE_KEYS: &[&str] = &[
    "reading.versionUid",
    "reading.bookOsisId",
    "reading.chapterNum",
    "reading.scrollOffset",
    "settings.fontScale",
];

/// Small persisted key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> SyncResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> SyncResult<()>;

    /// Remove a key. Absence is not an error.
    async fn remove(&self, key: &str) -> SyncResult<()>;

    /// Remove several keys in one call. Absent keys are skipped.
    async fn remove_many(&self, keys: &[&str]) -> SyncResult<()>;
}

/// Key-value store backed by a single JSON file.
///
/// The whole map is held in memory and rewritten on every mutation; the
/// store only ever carries a handful of short strings.
pub struct FsKeyValueStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FsKeyValueStore {
    /// Open the store at `path`, loading any existing contents.
    pub async fn open(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| SyncError::Storage(format!("corrupt store file: {e}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(FsKeyValueStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FsKeyValueStore {
    async fn get(&self, key: &str) -> SyncResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> SyncResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> SyncResult<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> SyncResult<()> {
        let mut entries = self.entries.lock().await;
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FsKeyValueStore::open(&path).await.unwrap();
        store.put("reading.bookOsisId", "Gen").await.unwrap();
        drop(store);

        let store = FsKeyValueStore::open(&path).await.unwrap();
        assert_eq!(
            store.get("reading.bookOsisId").await.unwrap().as_deref(),
            Some("Gen")
        );
    }

    #[tokio::test]
    async fn remove_many_tolerates_absent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsKeyValueStore::open(dir.path().join("store.json"))
            .await
            .unwrap();
        store.put("reading.chapterNum", "3").await.unwrap();

        store.remove_many(APP_STATE_KEYS).await.unwrap();
        assert_eq!(store.get("reading.chapterNum").await.unwrap(), None);
    }
}
