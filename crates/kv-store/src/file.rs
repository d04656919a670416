//! File-backed store, one file per key

use crate::error::{Result, StoreError};
use crate::KeyValueStore;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A store that keeps each value in its own file under `dir`.
///
/// File names are the SHA-256 hex digest of the key, so arbitrary keys map to
/// safe, fixed-length names. Values are written to a temporary file and
/// renamed into place, making every `set` a whole-entry replacement.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    quota: u64,
    /// File name -> value size in bytes
    sizes: RwLock<HashMap<String, u64>>,
    used: AtomicU64,
}

impl FileStore {
    /// Create a store rooted at `dir` with a quota of `quota` value bytes
    pub fn new(dir: PathBuf, quota: u64) -> Self {
        Self {
            dir,
            quota,
            sizes: RwLock::new(HashMap::new()),
            used: AtomicU64::new(0),
        }
    }

    /// Ensure the directory exists and account for values already on disk
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let mut sizes = self.sizes.write().await;
        sizes.clear();

        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_leftover_tmp(&name) {
                // Interrupted write from a previous run
                if let Err(e) = fs::remove_file(entry.path()).await {
                    warn!(file = %name, error = %e, "Failed to remove leftover temp file");
                }
                continue;
            }
            if !is_entry_name(&name) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                sizes.insert(name, metadata.len());
            }
        }

        let used: u64 = sizes.values().sum();
        self.used.store(used, Ordering::Relaxed);
        info!(dir = ?self.dir, entries = sizes.len(), used, quota = self.quota, "File store initialized");
        Ok(())
    }

    /// Directory holding the stored values
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bytes currently counted against the quota
    pub fn used_bytes(&self) -> u64 {
        self.used.load(Ordering::Relaxed)
    }

    /// Number of stored values
    pub async fn len(&self) -> usize {
        self.sizes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sizes.read().await.is_empty()
    }

    /// File name used for a key
    pub fn file_name(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn is_entry_name(name: &str) -> bool {
    name.len() == 64 && name.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_leftover_tmp(name: &str) -> bool {
    name.strip_suffix(".tmp").is_some_and(is_entry_name)
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.dir.join(Self::file_name(key));
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read stored value");
                Err(e.into())
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let name = Self::file_name(key);
        let size = value.len() as u64;

        let mut sizes = self.sizes.write().await;
        let replaced = sizes.get(&name).copied().unwrap_or(0);
        let required = self.used.load(Ordering::Relaxed) - replaced + size;
        if required > self.quota {
            return Err(StoreError::QuotaExceeded {
                required,
                quota: self.quota,
            });
        }

        let path = self.dir.join(&name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        let written = match fs::write(&tmp, value).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        sizes.insert(name, size);
        self.used.store(required, Ordering::Relaxed);
        debug!(key, size, "Stored value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let name = Self::file_name(key);

        let mut sizes = self.sizes.write().await;
        match fs::remove_file(self.dir.join(&name)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(size) = sizes.remove(&name) {
            self.used.fetch_sub(size, Ordering::Relaxed);
        }
        debug!(key, "Deleted value");
        Ok(())
    }
}
