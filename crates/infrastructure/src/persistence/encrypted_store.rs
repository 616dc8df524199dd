//! Encrypted file-based key-value store.
//!
//! Entries are serialized to JSON and sealed with AES-256-GCM. The data
//! file holds `nonce || ciphertext`; the 32-byte key lives in its own file
//! next to it. Both files are created with owner-only permissions.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, OsRng, rand_core::RngCore},
};
use async_trait::async_trait;
use storekeeper_application::ports::{SecureKeyValueStore, StorageError};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

const DATA_FILE: &str = "session.enc";
const KEY_FILE: &str = "session.key";
const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

type Key = Zeroizing<[u8; KEY_SIZE]>;

/// Key-value store persisted as an encrypted file.
///
/// Operations on one instance are serialized; a write is staged in a
/// temporary file and renamed into place, so a crash mid-write leaves the
/// previous contents intact.
#[derive(Debug)]
pub struct EncryptedFileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl EncryptedFileStore {
    /// Creates a store keeping its files in `dir`.
    ///
    /// Nothing is touched on disk until the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the directory holding the store's files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_key(&self) -> Result<Option<Key>, StorageError> {
        let Some(mut bytes) = Self::read_optional(&self.key_path()).await? else {
            return Ok(None);
        };
        if bytes.len() != KEY_SIZE {
            bytes.zeroize();
            return Err(StorageError::Crypto("key file is corrupt".to_string()));
        }
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Some(key))
    }

    async fn load_or_create_key(&self) -> Result<Key, StorageError> {
        if let Some(key) = self.load_key().await? {
            return Ok(key);
        }
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.fill_bytes(key.as_mut());
        write_private(&self.key_path(), key.as_ref()).await?;
        debug!(dir = %self.dir.display(), "Generated session encryption key");
        Ok(key)
    }

    fn cipher(key: &Key) -> Result<Aes256Gcm, StorageError> {
        Aes256Gcm::new_from_slice(key.as_ref())
            .map_err(|e| StorageError::Crypto(format!("cipher init failed: {e}")))
    }

    fn decrypt(key: &Key, sealed: &[u8]) -> Result<BTreeMap<String, String>, StorageError> {
        if sealed.len() < NONCE_SIZE {
            return Err(StorageError::Crypto("encrypted file is truncated".to_string()));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);

        let plaintext = Zeroizing::new(
            Self::cipher(key)?
                .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
                .map_err(|e| StorageError::Crypto(format!("decryption failed: {e}")))?,
        );

        serde_json::from_slice(&plaintext)
            .map_err(|e| StorageError::Serialization(format!("decrypted data is not valid: {e}")))
    }

    fn encrypt(key: &Key, entries: &BTreeMap<String, String>) -> Result<Vec<u8>, StorageError> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(entries).map_err(|e| StorageError::Serialization(e.to_string()))?,
        );

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = Self::cipher(key)?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|e| StorageError::Crypto(format!("encryption failed: {e}")))?;

        let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }
}

#[async_trait]
impl SecureKeyValueStore for EncryptedFileStore {
    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let _guard = self.lock.lock().await;

        let Some(sealed) = Self::read_optional(&self.data_path()).await? else {
            return Ok(BTreeMap::new());
        };
        let Some(key) = self.load_key().await? else {
            return Err(StorageError::Crypto(
                "encrypted session exists but its key is missing".to_string(),
            ));
        };
        Self::decrypt(&key, &sealed)
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;

        tokio::fs::create_dir_all(&self.dir).await?;
        let key = self.load_or_create_key().await?;
        let sealed = Self::encrypt(&key, entries)?;
        write_private(&self.data_path(), &sealed).await
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;

        secure_delete(&self.data_path()).await?;
        secure_delete(&self.key_path()).await
    }
}

/// Writes `bytes` to `path` through a temporary file with owner-only permissions.
async fn write_private(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    set_private_permissions(&tmp).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(unix)]
async fn set_private_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_private_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}

/// Overwrites a file with random bytes, then removes it. A missing file is fine.
async fn secure_delete(path: &Path) -> Result<(), StorageError> {
    let size = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut noise = vec![0u8; usize::try_from(size).unwrap_or(0)];
    OsRng.fill_bytes(&mut noise);
    if let Err(e) = tokio::fs::write(path, &noise).await {
        warn!(path = %path.display(), error = %e, "Failed to overwrite file before removal");
    }

    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
