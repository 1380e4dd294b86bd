//! Offline audio blobs keyed by song id.

use crate::error::{PlaybackError, Result};
use bridge_traits::storage::BlobStorage;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Thin typed facade over [`BlobStorage`] that speaks the playback error
/// taxonomy. No eviction; concurrent writes to one id are last-writer-wins.
#[derive(Clone)]
pub struct OfflineBlobStore {
    storage: Arc<dyn BlobStorage>,
}

impl OfflineBlobStore {
    pub fn new(storage: Arc<dyn BlobStorage>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn save(&self, song_id: &str, data: Bytes) -> Result<()> {
        self.storage
            .write(song_id, data)
            .await
            .map_err(PlaybackError::storage)?;
        debug!("Saved offline audio");
        Ok(())
    }

    pub async fn get(&self, song_id: &str) -> Result<Option<Bytes>> {
        self.storage
            .read(song_id)
            .await
            .map_err(PlaybackError::storage)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, song_id: &str) -> Result<()> {
        self.storage
            .remove(song_id)
            .await
            .map_err(PlaybackError::storage)?;
        debug!("Deleted offline audio");
        Ok(())
    }

    pub async fn contains(&self, song_id: &str) -> Result<bool> {
        self.storage
            .contains(song_id)
            .await
            .map_err(PlaybackError::storage)
    }
}
