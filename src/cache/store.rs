//! Cache namespace storage.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::Response;
use crate::error::Result;

/// Named partitions of cached responses, keyed by request identity.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Names of every existing namespace.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Create `namespace` if it does not exist yet.
    async fn open(&self, namespace: &str) -> Result<()>;

    /// Drop a namespace with all its entries; `false` if it was absent.
    async fn delete(&self, namespace: &str) -> Result<bool>;

    async fn put(&self, namespace: &str, key: &str, response: Response) -> Result<()>;

    async fn match_in(&self, namespace: &str, key: &str) -> Result<Option<Response>>;

    /// Look `key` up across every namespace.
    async fn match_any(&self, key: &str) -> Result<Option<Response>>;
}

/// In-process cache store.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    namespaces: RwLock<BTreeMap<String, HashMap<String, Response>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.namespaces.read().await.keys().cloned().collect())
    }

    async fn open(&self, namespace: &str) -> Result<()> {
        self.namespaces
            .write()
            .await
            .entry(namespace.to_string())
            .or_default();
        Ok(())
    }

    async fn delete(&self, namespace: &str) -> Result<bool> {
        Ok(self.namespaces.write().await.remove(namespace).is_some())
    }

    async fn put(&self, namespace: &str, key: &str, response: Response) -> Result<()> {
        self.namespaces
            .write()
            .await
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), response);
        Ok(())
    }

    async fn match_in(&self, namespace: &str, key: &str) -> Result<Option<Response>> {
        Ok(self
            .namespaces
            .read()
            .await
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn match_any(&self, key: &str) -> Result<Option<Response>> {
        Ok(self
            .namespaces
            .read()
            .await
            .values()
            .find_map(|entries| entries.get(key))
            .cloned())
    }
}
