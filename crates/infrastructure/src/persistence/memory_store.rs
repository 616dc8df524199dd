//! In-memory key-value store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use storekeeper_application::ports::{SecureKeyValueStore, StorageError};
use tokio::sync::RwLock;

/// Volatile store; the session lasts as long as the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureKeyValueStore for MemoryKeyValueStore {
    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        Ok(self.entries.read().await.clone())
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        self.entries.write().await.clone_from(entries);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_write_replaces_contents() {
        let store = MemoryKeyValueStore::new();
        store.set("auth_token", "A1").await.unwrap();
        store.set("user_id", "u1").await.unwrap();

        store
            .write_all(&BTreeMap::from([("auth_token".to_string(), "A2".to_string())]))
            .await
            .unwrap();

        assert_eq!(
            store.read_all().await.unwrap(),
            BTreeMap::from([("auth_token".to_string(), "A2".to_string())])
        );
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = MemoryKeyValueStore::new();
        store.set("auth_token", "A1").await.unwrap();

        store.delete_all().await.unwrap();
        store.delete_all().await.unwrap();

        assert!(store.read_all().await.unwrap().is_empty());
    }
}
