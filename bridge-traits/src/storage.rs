//! Storage Abstractions
//!
//! Two separately namespaced durable stores: a key-value preferences store for
//! favorites, playlists and settings, and a blob store for offline audio.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Abstracts platform-specific preferences storage:
/// - Desktop: SQLite-backed table
/// - Mobile: UserDefaults / SharedPreferences
/// - Web: localStorage
///
/// Writes are best-effort; no transactional guarantee is offered across keys.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn save_quality(store: &dyn SettingsStore) -> Result<()> {
///     store.set_string("quality_mode", "fast").await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Store a boolean value
    async fn set_bool(&self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    async fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;

    /// Flush pending writes to durable storage
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Durable blob storage for downloaded audio.
///
/// Keys are song identifiers. Presence of a key means the song is available
/// offline. No eviction policy is applied; concurrent writes to the same key
/// are not serialized and the last writer wins.
///
/// Implementations should report exhausted capacity as
/// [`BridgeError::QuotaExceeded`](crate::error::BridgeError::QuotaExceeded).
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Write (or overwrite) the blob stored under `key`.
    async fn write(&self, key: &str, data: Bytes) -> Result<()>;

    /// Read the blob stored under `key`, `Ok(None)` when absent.
    async fn read(&self, key: &str) -> Result<Option<Bytes>>;

    /// Remove the blob stored under `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Check for a blob without reading it.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read(key).await?.is_some())
    }
}
