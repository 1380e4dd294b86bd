//! Saving songs for offline playback.

use crate::cache::OfflineBlobStore;
use crate::error::{PlaybackError, Result};
use crate::resolver::SongResolver;
use bridge_traits::http::HttpClient;
use bytes::BytesMut;
use core_library::normalize::youtube_video_id;
use core_library::Song;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Notification};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Deadline for downloading one song.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineOutcome {
    Saved { bytes: u64 },
    AlreadyOffline,
    /// The song stays playable through the session memo but was not stored.
    SessionOnly { reason: String },
}

/// Downloads resolved audio into the blob store.
///
/// Saving never fails the caller: any error degrades to
/// [`OfflineOutcome::SessionOnly`] and a warning notification.
pub struct OfflineSaver {
    http: Arc<dyn HttpClient>,
    blobs: OfflineBlobStore,
    resolver: Arc<SongResolver>,
    events: EventBus,
    download_timeout: Duration,
}

impl OfflineSaver {
    pub fn new(
        http: Arc<dyn HttpClient>,
        blobs: OfflineBlobStore,
        resolver: Arc<SongResolver>,
        events: EventBus,
    ) -> Self {
        Self {
            http,
            blobs,
            resolver,
            events,
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    #[instrument(skip(self, song), fields(song_id = %song.id))]
    pub async fn save(&self, song: &Song) -> OfflineOutcome {
        if matches!(self.blobs.contains(&song.id).await, Ok(true)) {
            debug!("Already available offline");
            return OfflineOutcome::AlreadyOffline;
        }

        match self.download_and_store(song).await {
            Ok(Some(bytes)) => {
                info!(bytes, "Saved for offline playback");
                self.emit(LibraryEvent::SavedOffline {
                    song_id: song.id.clone(),
                    bytes,
                });
                OfflineOutcome::Saved { bytes }
            }
            Ok(None) => OfflineOutcome::AlreadyOffline,
            Err(err) => self.degrade(song, err),
        }
    }

    /// Delete the stored audio for `song_id`. Missing audio is not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, song_id: &str) -> Result<()> {
        match self.blobs.delete(song_id).await {
            Ok(()) => {
                self.emit(LibraryEvent::OfflineRemoved {
                    song_id: song_id.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to delete offline audio");
                let _ = self.events.emit(CoreEvent::Notification(Notification::warning(
                    err.class().as_str(),
                    err.user_message(),
                )));
                Err(err)
            }
        }
    }

    pub async fn is_offline(&self, song_id: &str) -> bool {
        matches!(self.blobs.contains(song_id).await, Ok(true))
    }

    /// `Ok(None)` when the resolver already served the song from the store.
    async fn download_and_store(&self, song: &Song) -> Result<Option<u64>> {
        let resolved = self.resolver.resolve(song).await?;
        let Some(url) = resolved.url().map(str::to_string) else {
            return Ok(None);
        };

        if youtube_video_id(&url).is_some() {
            return Err(PlaybackError::NotFound(format!(
                "{} (streaming-only source)",
                song.title
            )));
        }

        let data = tokio::time::timeout(self.download_timeout, self.download(&url))
            .await
            .map_err(|_| PlaybackError::Timeout(self.download_timeout))??;

        if data.is_empty() {
            return Err(PlaybackError::NotFound(song.title.clone()));
        }

        let bytes = data.len() as u64;
        self.blobs.save(&song.id, data.freeze()).await?;
        Ok(Some(bytes))
    }

    async fn download(&self, url: &str) -> Result<BytesMut> {
        let mut stream = self
            .http
            .download_stream(url.to_string())
            .await
            .map_err(PlaybackError::network)?;

        let mut data = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.map_err(PlaybackError::network)?);
        }
        Ok(data)
    }

    fn degrade(&self, song: &Song, err: PlaybackError) -> OfflineOutcome {
        warn!(error = %err, "Offline save failed; keeping song for this session only");
        let reason = err.to_string();

        self.emit(LibraryEvent::OfflineSaveFailed {
            song_id: song.id.clone(),
            reason: reason.clone(),
        });
        let _ = self.events.emit(CoreEvent::Notification(Notification::warning(
            err.class().as_str(),
            format!("\"{}\" is available for this session only.", song.title),
        )));

        OfflineOutcome::SessionOnly { reason }
    }

    fn emit(&self, event: LibraryEvent) {
        let _ = self.events.emit(CoreEvent::Library(event));
    }
}
