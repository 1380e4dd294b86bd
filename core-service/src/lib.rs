//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings,
//! blob storage, audio output) into the shared Rust core and exposes a single
//! [`CoreService`] for the UI layer. Desktop apps typically enable the
//! `desktop-shims` feature, which fills in any bridge the host leaves out.

pub mod error;
pub mod generator;
pub mod service;

pub use error::{CoreError, Result};
pub use generator::{GeminiPlaylistGenerator, PlaylistGenerator, StaticPlaylistGenerator};
pub use service::CoreService;

pub use core_library::{
    FavoriteToggle, GenreCard, Playlist, PlaylistId, PlaylistKind, QualityMode, Song,
    UserPlaylist,
};
pub use core_playback::{OfflineOutcome, PlaybackError, PlaybackSnapshot};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder};
pub use core_runtime::events::{CoreEvent, LibraryEvent, Notification, PlaybackStatus};

/// Convenience bootstrapper for desktop hosts.
///
/// Reads `MANUFY_*` overrides from the environment and fills every missing
/// bridge with the desktop default.
///
/// ```ignore
/// let output: Arc<dyn AudioOutput> = Arc::new(MyOutput::new());
/// let core = core_service::bootstrap_desktop(output).await?;
/// let songs = core.search("cumbia").await?;
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(
    output: std::sync::Arc<dyn bridge_traits::playback::AudioOutput>,
) -> Result<CoreService> {
    let config = CoreConfig::builder().with_env().build()?;
    CoreService::new(config, output).await
}
