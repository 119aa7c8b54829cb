//! File System Key-Value Storage
//!
//! Information Hiding:
//! - File paths and naming scheme hidden from users
//! - Directory structure management hidden behind interface
//! - Persistence mechanism independent of storage trait users

use super::KeyValueStore;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// File system storage - each key is a JSON file
/// Files are stored as {base_path}/{key}.json
pub struct FileSystemStore {
    base_path: PathBuf,
}

impl FileSystemStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        // Create base directory if it doesn't exist
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ChatError::StorageUnavailable(format!(
                "failed to create storage directory {:?}: {}",
                base_path, e
            ))
        })?;

        Ok(Self { base_path })
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ChatError::StorageUnavailable(format!(
                "key '{}' is not a valid file name",
                key
            )));
        }
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileSystemStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;

        match fs::read_to_string(&path).await {
            Ok(value) => {
                tracing::debug!(
                    "[FileSystemStore] Read '{}' ({} bytes) from {:?}",
                    key,
                    value.len(),
                    path
                );
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("[FileSystemStore] Key '{}' does not exist", key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;

        // Write to a sibling file and rename so readers never see a torn value
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;

        tracing::debug!(
            "[FileSystemStore] Wrote '{}' ({} bytes) to {:?}",
            key,
            value.len(),
            path
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("[FileSystemStore] Deleted '{}' at {:?}", key, path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    "[FileSystemStore] Key '{}' does not exist, nothing to delete",
                    key
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(key.to_string());
                }
            }
        }

        tracing::debug!("[FileSystemStore] Listed {} keys", keys.len());
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        store.put("chatCache", "{}").await.unwrap();
        assert_eq!(store.get("chatCache").await.unwrap().as_deref(), Some("{}"));
        assert!(temp_dir.path().join("chatCache.json").exists());
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert!(store.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        store.put("current", "[]").await.unwrap();
        store.delete("current").await.unwrap();
        assert!(store.get("current").await.unwrap().is_none());

        // Deleting again is a no-op
        store.delete("current").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        let err = store.put("../escape", "x").await.unwrap_err();
        assert!(matches!(err, ChatError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(temp_dir.path().to_path_buf()).await.unwrap();

        store.put("chatCache", "{}").await.unwrap();
        store.put("usageTotals", "{}").await.unwrap();

        let keys = store.keys().await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"chatCache".to_string()));
        assert!(keys.contains(&"usageTotals".to_string()));
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = FileSystemStore::new(path.clone()).await.unwrap();
            store.put("current", r#"["Q: hi","A: hello"]"#).await.unwrap();
        }

        {
            let store = FileSystemStore::new(path).await.unwrap();
            let value = store.get("current").await.unwrap();
            assert_eq!(value.as_deref(), Some(r#"["Q: hi","A: hello"]"#));
        }
    }
}
