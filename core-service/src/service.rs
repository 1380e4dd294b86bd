//! The [`CoreService`] façade.

use crate::error::Result;
use crate::generator::{GeminiPlaylistGenerator, PlaylistGenerator, StaticPlaylistGenerator};
use bridge_traits::playback::{AudioOutput, AudioOutputEvent};
use core_library::{
    seed, FavoriteToggle, Favorites, GenreCard, Playlist, PlaylistId, PlaylistLibrary,
    Preferences, QualityMode, Song, UserPlaylist,
};
use core_playback::{
    CacheKey, OfflineBlobStore, OfflineOutcome, OfflineSaver, PlaybackConfig,
    PlaybackController, PlaybackError, PlaybackSnapshot, ResponseCache, SearchClient,
    SongResolver,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{
    CoreEvent, EventBus, EventStream, LibraryEvent, Notification, PlaybackStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

struct ServiceInner {
    config: CoreConfig,
    events: EventBus,
    search: Arc<SearchClient>,
    resolver: Arc<SongResolver>,
    controller: Arc<PlaybackController>,
    offline: OfflineSaver,
    favorites: Favorites,
    playlists: PlaylistLibrary,
    preferences: Preferences,
    generator: Arc<dyn PlaylistGenerator>,
    generated: ResponseCache<Vec<Playlist>>,
}

/// Primary façade exposed to host applications.
///
/// Construct once at startup with [`CoreService::new`] and call
/// [`CoreService::shutdown`] before exit. Cloning is cheap and shares state.
#[derive(Clone)]
pub struct CoreService {
    inner: Arc<ServiceInner>,
}

impl CoreService {
    /// Wire the service from a validated config and the host's audio output.
    ///
    /// A configured AI key selects the Gemini generator; otherwise playlists
    /// come from seed data.
    pub async fn new(config: CoreConfig, output: Arc<dyn AudioOutput>) -> Result<Self> {
        let generator: Arc<dyn PlaylistGenerator> = match &config.ai_api_key {
            Some(key) => Arc::new(GeminiPlaylistGenerator::new(
                config.http_client.clone(),
                key.clone(),
            )),
            None => Arc::new(StaticPlaylistGenerator),
        };
        Self::with_generator(config, output, generator).await
    }

    pub async fn with_generator(
        config: CoreConfig,
        output: Arc<dyn AudioOutput>,
        generator: Arc<dyn PlaylistGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        let playback = PlaybackConfig::from_core(&config)?;
        let events = EventBus::default();

        let search_cache = Arc::new(ResponseCache::new(
            playback.response_cache_ttl,
            config.clock.clone(),
        ));
        let search = Arc::new(SearchClient::new(
            config.http_client.clone(),
            &playback,
            search_cache,
        ));

        let preferences = Preferences::load(config.settings_store.clone()).await;
        let favorites = Favorites::load(config.settings_store.clone()).await;
        let playlists = PlaylistLibrary::load(config.settings_store.clone()).await;

        let blobs = OfflineBlobStore::new(config.blob_storage.clone());
        let resolver = Arc::new(
            SongResolver::new(blobs.clone(), search.clone())
                .with_quality_mode(preferences.quality_mode()),
        );
        let controller = Arc::new(PlaybackController::new(
            output,
            resolver.clone(),
            events.clone(),
            playback.history_limit,
            playback.restart_threshold,
        ));
        let offline = OfflineSaver::new(
            config.http_client.clone(),
            blobs,
            resolver.clone(),
            events.clone(),
        );
        let generated = ResponseCache::new(playback.response_cache_ttl, config.clock.clone());

        info!(
            backend = %config.backend_url,
            ai = generator.is_remote(),
            quality = %preferences.quality_mode(),
            "Core service ready"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                events,
                search,
                resolver,
                controller,
                offline,
                favorites,
                playlists,
                preferences,
                generator,
                generated,
            }),
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> EventStream {
        self.inner.events.stream()
    }

    // ------------------------------------------------------------------
    // Search & browse
    // ------------------------------------------------------------------

    /// Search the backend. Failures are also surfaced as a notification.
    pub async fn search(&self, query: &str) -> Result<Vec<Song>> {
        self.inner
            .search
            .search(query)
            .await
            .map_err(|err| self.notify_playback_error(err).into())
    }

    pub fn genres(&self) -> Vec<GenreCard> {
        seed::genres()
    }

    pub fn placeholder_song(&self) -> Song {
        seed::placeholder_song()
    }

    /// Playlists for a browse category. Never fails: generator errors fall
    /// back to seed content, which is not cached.
    #[instrument(skip(self))]
    pub async fn generated_playlists(&self, category: &str) -> Vec<Playlist> {
        let key = CacheKey::ai(category);
        if let Some(playlists) = self.inner.generated.read(&key) {
            debug!("Serving generated playlists from cache");
            return playlists;
        }

        match self.inner.generator.generate(category).await {
            Ok(playlists) if !playlists.is_empty() => {
                self.inner.generated.write(key, playlists.clone());
                playlists
            }
            Ok(_) => seed::fallback_playlists(category),
            Err(e) => {
                warn!(error = %e, "Playlist generation failed; using fallback content");
                seed::fallback_playlists(category)
            }
        }
    }

    // ------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------

    /// Play `song` with `queue` as the surrounding listing, then preload the
    /// next entry in the background.
    pub async fn play(&self, song: Song, queue: Vec<Song>) -> Result<()> {
        self.inner.controller.select(song, queue).await?;
        self.spawn_preload_next();
        Ok(())
    }

    pub async fn toggle_play_pause(&self) -> Result<PlaybackStatus> {
        Ok(self.inner.controller.toggle_play_pause().await?)
    }

    pub async fn next(&self) -> Result<()> {
        self.inner.controller.next().await?;
        self.spawn_preload_next();
        Ok(())
    }

    pub async fn previous(&self) -> Result<()> {
        Ok(self.inner.controller.previous().await?)
    }

    pub async fn seek(&self, position: Duration) -> Result<()> {
        Ok(self.inner.controller.seek(position).await?)
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        Ok(self.inner.controller.set_volume(volume).await?)
    }

    pub async fn stop(&self) -> Result<()> {
        Ok(self.inner.controller.stop().await?)
    }

    /// Forward an audio output notification to the controller.
    pub async fn handle_output_event(&self, event: AudioOutputEvent) -> Result<()> {
        let preload = matches!(event, AudioOutputEvent::Started | AudioOutputEvent::Ended);
        self.inner.controller.handle_output_event(event).await?;

        if preload && self.inner.controller.status() == PlaybackStatus::Playing {
            self.spawn_preload_next();
        }
        Ok(())
    }

    /// Resolve the next queue entry ahead of time. Failures are ignored.
    pub async fn preload_next(&self) {
        if let Some(next) = self.inner.controller.next_in_queue() {
            self.inner.resolver.preload(&next).await;
        }
    }

    pub fn playback(&self) -> PlaybackSnapshot {
        self.inner.controller.snapshot()
    }

    pub fn recently_played(&self) -> Vec<Song> {
        self.inner.controller.history()
    }

    pub fn queue(&self) -> Vec<Song> {
        self.inner.controller.queue()
    }

    pub fn quality_mode(&self) -> QualityMode {
        self.inner.preferences.quality_mode()
    }

    pub async fn set_quality_mode(&self, mode: QualityMode) {
        self.inner.preferences.set_quality_mode(mode).await;
        self.inner.resolver.set_quality_mode(mode);
        info!(quality = %mode, "Quality mode changed");
    }

    // ------------------------------------------------------------------
    // Favorites & offline
    // ------------------------------------------------------------------

    /// Add or remove a favorite. Adding saves the song for offline playback
    /// (best-effort); removing deletes its offline audio.
    #[instrument(skip(self, song), fields(song_id = %song.id))]
    pub async fn toggle_favorite(&self, song: &Song) -> FavoriteToggle {
        let outcome = self.inner.favorites.toggle(song).await;

        match outcome {
            FavoriteToggle::Added => {
                self.emit(LibraryEvent::FavoriteAdded {
                    song_id: song.id.clone(),
                });
                match self.inner.offline.save(song).await {
                    OfflineOutcome::SessionOnly { reason } => {
                        debug!(reason = %reason, "Favorite kept for this session only")
                    }
                    other => debug!(outcome = ?other, "Favorite saved offline"),
                }
            }
            FavoriteToggle::Removed => {
                self.emit(LibraryEvent::FavoriteRemoved {
                    song_id: song.id.clone(),
                });
                if let Err(e) = self.inner.offline.remove(&song.id).await {
                    warn!(error = %e, "Offline audio left behind for removed favorite");
                }
            }
        }
        outcome
    }

    pub async fn is_favorite(&self, song_id: &str) -> bool {
        self.inner.favorites.contains(song_id).await
    }

    pub async fn favorites(&self) -> Vec<Song> {
        self.inner.favorites.list().await
    }

    pub async fn is_available_offline(&self, song_id: &str) -> bool {
        self.inner.offline.is_offline(song_id).await
    }

    // ------------------------------------------------------------------
    // User playlists
    // ------------------------------------------------------------------

    pub async fn create_playlist(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<UserPlaylist> {
        let playlist = self.inner.playlists.create(name, description).await?;
        self.emit(LibraryEvent::PlaylistCreated {
            playlist_id: playlist.id.to_string(),
            name: playlist.name.clone(),
        });
        Ok(playlist)
    }

    pub async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<UserPlaylist> {
        let playlist = self.inner.playlists.rename(id, name).await?;
        self.playlist_updated(id);
        Ok(playlist)
    }

    pub async fn set_playlist_description(
        &self,
        id: PlaylistId,
        description: Option<String>,
    ) -> Result<UserPlaylist> {
        let playlist = self.inner.playlists.set_description(id, description).await?;
        self.playlist_updated(id);
        Ok(playlist)
    }

    pub async fn add_to_playlist(&self, id: PlaylistId, song: &Song) -> Result<UserPlaylist> {
        let playlist = self.inner.playlists.add_song(id, song).await?;
        self.playlist_updated(id);
        Ok(playlist)
    }

    pub async fn remove_from_playlist(
        &self,
        id: PlaylistId,
        song_id: &str,
    ) -> Result<UserPlaylist> {
        let playlist = self.inner.playlists.remove_song(id, song_id).await?;
        self.playlist_updated(id);
        Ok(playlist)
    }

    pub async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        self.inner.playlists.delete(id).await?;
        self.emit(LibraryEvent::PlaylistDeleted {
            playlist_id: id.to_string(),
        });
        Ok(())
    }

    pub async fn playlist(&self, id: PlaylistId) -> Option<UserPlaylist> {
        self.inner.playlists.get(id).await
    }

    pub async fn playlists(&self) -> Vec<UserPlaylist> {
        self.inner.playlists.list().await
    }

    /// Browse cards for the user's playlists.
    pub async fn playlist_cards(&self) -> Vec<Playlist> {
        self.inner.playlists.summaries().await
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Stop playback and flush the settings store.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        if let Err(e) = self.inner.controller.stop().await {
            warn!(error = %e, "Audio output did not stop cleanly");
        }
        self.inner.config.settings_store.flush().await?;
        info!("Core service shut down");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn spawn_preload_next(&self) {
        let Some(next) = self.inner.controller.next_in_queue() else {
            return;
        };
        let resolver = self.inner.resolver.clone();
        tokio::spawn(async move {
            resolver.preload(&next).await;
        });
    }

    fn notify_playback_error(&self, err: PlaybackError) -> PlaybackError {
        if err.is_user_facing() {
            warn!(error = %err, "Search failed");
            let _ = self
                .inner
                .events
                .emit(CoreEvent::Notification(Notification::error(
                    err.class().as_str(),
                    err.user_message(),
                )));
        }
        err
    }

    fn playlist_updated(&self, id: PlaylistId) {
        self.emit(LibraryEvent::PlaylistUpdated {
            playlist_id: id.to_string(),
        });
    }

    fn emit(&self, event: LibraryEvent) {
        let _ = self.inner.events.emit(CoreEvent::Library(event));
    }
}
