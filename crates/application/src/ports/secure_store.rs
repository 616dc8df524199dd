//! Secure key-value store port
//!
//! Defines the interface for the encrypted local storage that holds the
//! session between runs.

use std::collections::BTreeMap;

use async_trait::async_trait;

/// Errors that can occur in the secure store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Encryption or decryption failed.
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// The store cannot be used at all (no key, no storage directory).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Encrypted string key-value storage.
///
/// `write_all` replaces the whole contents in one step: after it returns,
/// a reader sees either the previous contents or the new ones, never a mix.
#[async_trait]
pub trait SecureKeyValueStore: Send + Sync {
    /// Reads every entry. A store that was never written reads as empty.
    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError>;

    /// Replaces every entry with `entries`.
    ///
    /// # Errors
    /// Returns an error if the contents cannot be encrypted or written.
    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError>;

    /// Removes every entry. Removing from an empty store succeeds.
    async fn delete_all(&self) -> Result<(), StorageError>;

    /// Gets a single value.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut entries = self.read_all().await?;
        Ok(entries.remove(key))
    }

    /// Sets a single value, keeping the other entries.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    /// Removes a single value, keeping the other entries.
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_single_key_helpers() {
        let store = MemoryStore::default();
        store.set("auth_token", "A1").await.unwrap();
        store.set("user_id", "u1").await.unwrap();

        assert_eq!(store.get("auth_token").await.unwrap().as_deref(), Some("A1"));

        store.delete("auth_token").await.unwrap();
        assert_eq!(store.get("auth_token").await.unwrap(), None);
        assert_eq!(store.get("user_id").await.unwrap().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_delete_missing_key_does_not_write() {
        let store = MemoryStore::default();
        store.delete("nothing").await.unwrap();
        assert_eq!(store.write_count(), 0);
    }
}
