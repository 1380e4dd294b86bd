//! Offline audio blob storage on the local file system

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::BlobStorage,
};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// ENOSPC on unix, ERROR_DISK_FULL on windows.
const DISK_FULL_CODES: [i32; 2] = [28, 112];

/// One file per song id under a dedicated directory.
///
/// File names are the SHA-256 of the key so arbitrary backend identifiers are
/// safe on every file system.
pub struct FileBlobStorage {
    root: PathBuf,
}

impl FileBlobStorage {
    /// Blob storage under the platform data directory.
    pub fn new() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("manufy")
            .join("audio_files");

        Self { root }
    }

    /// Blob storage rooted at a custom directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!("{}.blob", hex::encode(digest)))
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        match e.raw_os_error() {
            Some(code) if DISK_FULL_CODES.contains(&code) => {
                BridgeError::QuotaExceeded(e.to_string())
            }
            _ => BridgeError::Io(e),
        }
    }
}

impl Default for FileBlobStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStorage for FileBlobStorage {
    async fn write(&self, key: &str, data: Bytes) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(Self::map_io_error)?;

        let path = self.path_for(key);
        let partial = path.with_extension("part");

        fs::write(&partial, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        fs::rename(&partial, &path)
            .await
            .map_err(Self::map_io_error)?;

        debug!(key = key, size = data.len(), "Stored audio blob");
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Bytes>> {
        match fs::read(self.path_for(key)).await {
            Ok(data) => {
                debug!(key = key, size = data.len(), "Read audio blob");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!(key = key, "Removed audio blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        fs::try_exists(self.path_for(key))
            .await
            .map_err(Self::map_io_error)
    }
}
