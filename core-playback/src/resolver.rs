//! # Song Resolver
//!
//! Turns a song descriptor into something the audio output can play. Sources
//! are tried strictly in order and the first hit wins:
//!
//! 1. offline blob store (no network)
//! 2. session memo of previously resolved URLs
//! 3. an absolute `audio_url` already on the descriptor
//! 4. remote search on title + artist + quality hint
//!
//! Only step 4 populates the memo.

use crate::cache::OfflineBlobStore;
use crate::error::{PlaybackError, Result};
use crate::search::SearchClient;
use bridge_traits::playback::AudioSource;
use core_library::{QualityMode, Song};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOrigin {
    Offline,
    Memo,
    Direct,
    Search,
}

#[derive(Debug, Clone)]
pub struct ResolvedAudio {
    pub source: AudioSource,
    pub origin: ResolutionOrigin,
}

impl ResolvedAudio {
    pub fn is_offline(&self) -> bool {
        self.origin == ResolutionOrigin::Offline
    }

    /// The playable URL for remote sources.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            AudioSource::Remote { url, .. } => Some(url),
            AudioSource::Blob { .. } => None,
        }
    }
}

/// Search term appended to resolution queries for each quality mode.
pub fn quality_hint(mode: QualityMode) -> &'static str {
    match mode {
        QualityMode::Fast => "audio",
        QualityMode::HighFidelity => "official audio hq",
    }
}

pub struct SongResolver {
    blobs: OfflineBlobStore,
    search: Arc<SearchClient>,
    memo: RwLock<HashMap<String, String>>,
    quality: RwLock<QualityMode>,
}

impl SongResolver {
    pub fn new(blobs: OfflineBlobStore, search: Arc<SearchClient>) -> Self {
        Self {
            blobs,
            search,
            memo: RwLock::new(HashMap::new()),
            quality: RwLock::new(QualityMode::default()),
        }
    }

    pub fn with_quality_mode(self, mode: QualityMode) -> Self {
        *self.quality.write() = mode;
        self
    }

    pub fn quality_mode(&self) -> QualityMode {
        *self.quality.read()
    }

    pub fn set_quality_mode(&self, mode: QualityMode) {
        *self.quality.write() = mode;
    }

    #[instrument(skip(self, song), fields(song_id = %song.id))]
    pub async fn resolve(&self, song: &Song) -> Result<ResolvedAudio> {
        match self.blobs.get(&song.id).await {
            Ok(Some(data)) => {
                debug!(bytes = data.len(), "Resolved from offline store");
                return Ok(ResolvedAudio {
                    source: AudioSource::Blob {
                        key: song.id.clone(),
                        data,
                    },
                    origin: ResolutionOrigin::Offline,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Offline lookup failed; falling back to network"),
        }

        if let Some(url) = self.memoized(&song.id) {
            debug!("Resolved from session memo");
            return Ok(remote(url, ResolutionOrigin::Memo));
        }

        if song.has_absolute_audio_url() {
            if let Some(url) = &song.audio_url {
                debug!("Using direct audio URL");
                return Ok(remote(url.clone(), ResolutionOrigin::Direct));
            }
        }

        let url = self.resolve_remote(song).await?;
        self.memo.write().insert(song.id.clone(), url.clone());
        info!("Resolved via search");
        Ok(remote(url, ResolutionOrigin::Search))
    }

    /// Resolve ahead of time so a later `resolve` is served from memory.
    ///
    /// Songs already offline, memoized or carrying a direct URL are skipped.
    /// Failures are logged at debug and otherwise ignored.
    #[instrument(skip(self, song), fields(song_id = %song.id))]
    pub async fn preload(&self, song: &Song) {
        if self.memoized(&song.id).is_some() || song.has_absolute_audio_url() {
            return;
        }
        if matches!(self.blobs.contains(&song.id).await, Ok(true)) {
            return;
        }

        match self.resolve_remote(song).await {
            Ok(url) => {
                self.memo.write().insert(song.id.clone(), url);
                debug!("Preloaded next song");
            }
            Err(e) => debug!(error = %e, "Preload failed"),
        }
    }

    pub fn memoized(&self, song_id: &str) -> Option<String> {
        self.memo.read().get(song_id).cloned()
    }

    pub fn forget(&self, song_id: &str) {
        self.memo.write().remove(song_id);
    }

    pub fn clear_memo(&self) {
        self.memo.write().clear();
    }

    pub fn memo_len(&self) -> usize {
        self.memo.read().len()
    }

    async fn resolve_remote(&self, song: &Song) -> Result<String> {
        let query = format!(
            "{} {}",
            song.search_terms(),
            quality_hint(self.quality_mode())
        );

        let results = self.search.search(&query).await?;
        results
            .into_iter()
            .next()
            .and_then(|hit| hit.audio_url)
            .ok_or_else(|| PlaybackError::NotFound(song.title.clone()))
    }
}

fn remote(url: String, origin: ResolutionOrigin) -> ResolvedAudio {
    ResolvedAudio {
        source: AudioSource::remote(url),
        origin,
    }
}
