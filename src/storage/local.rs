//! Local filesystem storage implementation.
//!
//! Every write goes to a temporary sibling first and is renamed into place,
//! so readers never observe a half-written index, feed or read state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Config, Index, ReadState};
use crate::storage::{ReadStateStore, SiteStorage};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    output_dir: PathBuf,
    state_dir: PathBuf,
    index_file: String,
    feed_file: String,
    read_state_key: String,
}

impl LocalStorage {
    /// Create a LocalStorage with default file names under one directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root = root_dir.into();
        let config = Config::default();
        Self {
            output_dir: root.clone(),
            state_dir: root,
            index_file: config.paths.index_file,
            feed_file: config.paths.feed_file,
            read_state_key: config.client.read_state_key,
        }
    }

    /// Create a LocalStorage laid out as configured.
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.paths.output_dir.clone(),
            state_dir: config.paths.state_dir.clone(),
            index_file: config.paths.index_file.clone(),
            feed_file: config.paths.feed_file.clone(),
            read_state_key: config.client.read_state_key.clone(),
        }
    }

    /// Location of the persisted read state.
    pub fn read_state_path(&self) -> PathBuf {
        self.state_dir.join(format!("{}.json", self.read_state_key))
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(&self.index_file)
    }

    pub fn feed_path(&self) -> PathBuf {
        self.output_dir.join(&self.feed_file)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match self.read_bytes(path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SiteStorage for LocalStorage {
    async fn write_index(&self, index: &Index) -> Result<()> {
        let path = self.index_path();
        self.write_json(&path, index).await?;
        log::debug!("Index written to {}", path.display());
        Ok(())
    }

    async fn load_index(&self) -> Result<Option<Index>> {
        self.read_json(&self.index_path()).await
    }

    async fn write_feed(&self, feed: &str) -> Result<()> {
        let path = self.feed_path();
        self.write_bytes(&path, feed.as_bytes()).await?;
        log::debug!("Feed written to {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl ReadStateStore for LocalStorage {
    async fn load_read_state(&self) -> Result<Option<ReadState>> {
        let path = self.read_state_path();
        match self.read_json::<ReadState>(&path).await {
            Ok(state) => Ok(state),
            Err(AppError::Json(e)) => {
                log::warn!(
                    "Read state at {} is unreadable ({}); starting fresh",
                    path.display(),
                    e
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn save_read_state(&self, state: &ReadState) -> Result<()> {
        self.write_json(&self.read_state_path(), state).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::SymbolMark;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let path = tmp.path().join("nested/test.txt");
        storage.write_bytes(&path, b"hello").await.unwrap();
        let data = storage.read_bytes(&path).await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes(&tmp.path().join("nope.txt")).await.unwrap();
        assert!(data.is_none());
        assert!(storage.load_index().await.unwrap().is_none());
        assert!(storage.load_read_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_index_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let index = Index {
            last_updated: "2026-02-16T00:00:00.000Z".to_string(),
            symbols: BTreeMap::new(),
        };
        storage.write_index(&index).await.unwrap();
        assert_eq!(storage.load_index().await.unwrap(), Some(index));
    }

    #[tokio::test]
    async fn test_read_state_under_fixed_key() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut state = ReadState::default();
        state.advance(
            "BTC",
            &SymbolMark {
                date: "2026-02-16".to_string(),
                note_time: String::new(),
            },
        );
        storage.save_read_state(&state).await.unwrap();

        assert!(tmp.path().join("ich-read-state.json").exists());
        assert_eq!(storage.load_read_state().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_unparsable_read_state_is_absent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(storage.read_state_path(), "{ broken").unwrap();

        assert!(storage.load_read_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_config_layout() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.output_dir = tmp.path().join("dist");
        config.paths.state_dir = tmp.path().join("state");

        let storage = LocalStorage::from_config(&config);
        storage.write_feed("<feed/>").await.unwrap();

        let written = std::fs::read_to_string(tmp.path().join("dist/feed.xml")).unwrap();
        assert_eq!(written, "<feed/>");
        assert_eq!(
            storage.read_state_path(),
            tmp.path().join("state/ich-read-state.json")
        );
    }
}
