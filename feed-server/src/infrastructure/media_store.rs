use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::post::MediaUpload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredMedia {
    pub(crate) key: String,
    pub(crate) size: u64,
}

/// Where uploaded post media lives. Keys are opaque to callers.
#[async_trait]
pub(crate) trait MediaStore: Send + Sync {
    async fn store(&self, upload: &MediaUpload) -> Result<StoredMedia, DomainError>;
    /// Removing a key that is already gone is not an error.
    async fn delete(&self, key: &str) -> Result<(), DomainError>;
}

/// Media kept as flat files in one directory, named `<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub(crate) struct LocalMediaStore {
    base_path: PathBuf,
}

impl LocalMediaStore {
    pub(crate) async fn new(base_path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;

        info!(path = %base_path.display(), "media store initialized");
        Ok(Self { base_path })
    }

    #[cfg(test)]
    pub(crate) fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DomainError> {
        if !is_valid_key(key) {
            return Err(DomainError::Validation {
                field: "media_key",
                message: "must be a plain file name",
            });
        }
        Ok(self.base_path.join(key))
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.contains("..")
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '.')
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, upload: &MediaUpload) -> Result<StoredMedia, DomainError> {
        let extension = upload.extension();
        let key = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{extension}", Uuid::new_v4())
        };
        let path = self.path_for(&key)?;

        fs::write(&path, &upload.data).await?;

        debug!(key = %key, size = upload.size(), "stored media");
        Ok(StoredMedia {
            key,
            size: upload.size(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "deleted media");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DomainError::MediaStorage(err)),
        }
    }
}

/// Keeps blobs in a map; used by service tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MemoryMediaStore {
    blobs: std::sync::Arc<std::sync::Mutex<std::collections::BTreeMap<String, Vec<u8>>>>,
    fail_store: std::sync::Arc<std::sync::atomic::AtomicBool>,
    next_id: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl MemoryMediaStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .expect("blobs mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub(crate) fn fail_store(&self, fail: bool) {
        self.fail_store
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn store(&self, upload: &MediaUpload) -> Result<StoredMedia, DomainError> {
        if self.fail_store.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(DomainError::MediaStorage(std::io::Error::other("disk full")));
        }
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        let key = format!("media-{id}.{}", upload.extension());
        self.blobs
            .lock()
            .expect("blobs mutex poisoned")
            .insert(key.clone(), upload.data.clone());
        Ok(StoredMedia {
            key,
            size: upload.size(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.blobs.lock().expect("blobs mutex poisoned").remove(key);
        Ok(())
    }
}
