//! Audio output bridge.
//!
//! The host owns the actual media element (HTML audio, AVPlayer, a native
//! sink). The core drives it through [`AudioOutput`] and receives its
//! notifications as [`AudioOutputEvent`] values pushed by the host.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Source handed to the audio output.
#[derive(Clone)]
pub enum AudioSource {
    /// Offline audio read from blob storage; no network access required.
    Blob { key: String, data: Bytes },
    /// Remote HTTP(S) stream fetched by the host.
    Remote {
        url: String,
        headers: HashMap<String, String>,
    },
}

impl AudioSource {
    pub fn remote(url: impl Into<String>) -> Self {
        AudioSource::Remote {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::Remote { .. })
    }

    /// Locally addressable URI for blob sources, the URL for remote ones.
    pub fn uri(&self) -> String {
        match self {
            AudioSource::Blob { key, .. } => format!("blob:manufy/{}", key),
            AudioSource::Remote { url, .. } => url.clone(),
        }
    }
}

impl fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioSource::Blob { key, data } => f
                .debug_struct("Blob")
                .field("key", key)
                .field("bytes", &data.len())
                .finish(),
            AudioSource::Remote { url, .. } => f.debug_struct("Remote").field("url", url).finish(),
        }
    }
}

/// Notifications emitted by the host's media element.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioOutputEvent {
    /// Playback actually started (or resumed).
    Started,
    /// Playback paused by the host or the user.
    Paused,
    /// The current track reached its end.
    Ended,
    /// Periodic position report.
    TimeUpdated { position: Duration },
    /// Media metadata became available.
    MetadataLoaded { duration: Duration },
    /// The element failed to load or decode the source.
    Errored { message: String },
}

/// The single audio output owned by the playback controller.
#[async_trait::async_trait]
pub trait AudioOutput: Send + Sync {
    /// Replace the current source. Does not start playback.
    async fn load(&self, source: AudioSource) -> Result<()>;

    /// Start or resume playback of the loaded source.
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Stop playback and unload the source.
    async fn stop(&self) -> Result<()>;

    /// Volume normalized to `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;
}
