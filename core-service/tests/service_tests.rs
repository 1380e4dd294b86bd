//! End-to-end tests for the service façade over in-memory bridges.

use async_trait::async_trait;
use bridge_desktop::SqliteSettingsStore;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{ByteStream, HttpClient, HttpRequest, HttpResponse};
use bridge_traits::playback::{AudioOutput, AudioOutputEvent, AudioSource};
use bridge_traits::storage::{BlobStorage, SettingsStore};
use bytes::Bytes;
use core_library::seed::fallback_playlists;
use core_service::{
    CoreConfig, CoreError, CoreEvent, CoreService, FavoriteToggle, LibraryEvent, Playlist,
    PlaylistGenerator, PlaylistKind, PlaybackStatus, QualityMode, Song,
};
use futures::StreamExt;
use mockall::mock;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;

// ============================================================================
// Fakes
// ============================================================================

/// Records requests and answers every search with one playable hit.
#[derive(Default)]
struct StubHttp {
    requests: Mutex<Vec<String>>,
}

impl StubHttp {
    fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for StubHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().push(request.url.clone());
        let body = json!({
            "results": [{
                "title": "Resultado",
                "artist": "Artista",
                "audio_url": "https://cdn.example/resultado.mp3"
            }]
        });
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    async fn download_stream(&self, _url: String) -> BridgeResult<ByteStream> {
        let chunks: Vec<BridgeResult<Bytes>> = vec![
            Ok(Bytes::from_static(b"ID3")),
            Ok(Bytes::from_static(b"audio-frames")),
        ];
        Ok(futures::stream::iter(chunks).boxed())
    }
}

#[derive(Default)]
struct MemoryBlobs {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl MemoryBlobs {
    fn has(&self, key: &str) -> bool {
        self.blobs.lock().contains_key(key)
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobs {
    async fn write(&self, key: &str, data: Bytes) -> BridgeResult<()> {
        self.blobs.lock().insert(key.to_string(), data);
        Ok(())
    }

    async fn read(&self, key: &str) -> BridgeResult<Option<Bytes>> {
        Ok(self.blobs.lock().get(key).cloned())
    }

    async fn remove(&self, key: &str) -> BridgeResult<()> {
        self.blobs.lock().remove(key);
        Ok(())
    }
}

#[derive(Default)]
struct SilentOutput {
    loaded: Mutex<Vec<String>>,
    stopped: Mutex<bool>,
}

#[async_trait]
impl AudioOutput for SilentOutput {
    async fn load(&self, source: AudioSource) -> BridgeResult<()> {
        self.loaded.lock().push(source.uri());
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn seek(&self, _position: std::time::Duration) -> BridgeResult<()> {
        Ok(())
    }

    async fn stop(&self) -> BridgeResult<()> {
        *self.stopped.lock() = true;
        Ok(())
    }

    async fn set_volume(&self, _volume: f32) -> BridgeResult<()> {
        Ok(())
    }
}

mock! {
    Generator {}

    #[async_trait]
    impl PlaylistGenerator for Generator {
        async fn generate(&self, category: &str) -> core_service::Result<Vec<Playlist>>;
        fn is_remote(&self) -> bool;
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Fixture {
    service: CoreService,
    http: Arc<StubHttp>,
    blobs: Arc<MemoryBlobs>,
    output: Arc<SilentOutput>,
    settings: Arc<dyn SettingsStore>,
}

async fn fixture_with(
    settings: Option<Arc<dyn SettingsStore>>,
    generator: Option<Arc<dyn PlaylistGenerator>>,
) -> Fixture {
    let http = Arc::new(StubHttp::default());
    let blobs = Arc::new(MemoryBlobs::default());
    let output = Arc::new(SilentOutput::default());
    let settings = match settings {
        Some(settings) => settings,
        None => Arc::new(SqliteSettingsStore::in_memory().await.unwrap()),
    };

    let config = CoreConfig::builder()
        .backend_url("https://api.example")
        .http_client(http.clone())
        .blob_storage(blobs.clone())
        .settings_store(settings.clone())
        .data_dir(std::env::temp_dir().join("manufy-service-tests"))
        .build()
        .unwrap();

    let service = match generator {
        Some(generator) => CoreService::with_generator(config, output.clone(), generator)
            .await
            .unwrap(),
        None => CoreService::new(config, output.clone()).await.unwrap(),
    };

    Fixture {
        service,
        http,
        blobs,
        output,
        settings,
    }
}

async fn fixture() -> Fixture {
    fixture_with(None, None).await
}

fn direct(id: &str) -> Song {
    Song::new(id, format!("Song {id}"), "Artist", "https://img.example/c.jpg")
        .with_audio_url(format!("https://cdn.example/{id}.mp3"))
}

fn library_events(rx: &mut Receiver<CoreEvent>) -> Vec<LibraryEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Library(event) = event {
            events.push(event);
        }
    }
    events
}

fn generated(id: &str) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: "Generada".to_string(),
        image_url: "https://picsum.photos/seed/generada/300/300".to_string(),
        description: None,
        kind: PlaylistKind::Playlist,
    }
}

// ============================================================================
// Favorites & offline
// ============================================================================

#[tokio::test]
async fn favorite_saves_offline_and_unfavorite_deletes_blob() {
    let f = fixture().await;
    let song = direct("a");
    let mut rx = f.service.events().subscribe();

    assert_eq!(f.service.toggle_favorite(&song).await, FavoriteToggle::Added);
    assert!(f.service.is_favorite("a").await);
    assert!(f.blobs.has("a"));
    assert!(f.service.is_available_offline("a").await);

    assert_eq!(
        f.service.toggle_favorite(&song).await,
        FavoriteToggle::Removed
    );
    assert!(!f.service.is_favorite("a").await);
    assert!(!f.blobs.has("a"));

    let events = library_events(&mut rx);
    assert!(events.contains(&LibraryEvent::FavoriteAdded {
        song_id: "a".into()
    }));
    assert!(events.contains(&LibraryEvent::SavedOffline {
        song_id: "a".into(),
        bytes: 15
    }));
    assert!(events.contains(&LibraryEvent::FavoriteRemoved {
        song_id: "a".into()
    }));
    assert!(events.contains(&LibraryEvent::OfflineRemoved {
        song_id: "a".into()
    }));
}

#[tokio::test]
async fn favorites_survive_restart() {
    let f = fixture().await;
    f.service.toggle_favorite(&direct("a")).await;
    f.service.toggle_favorite(&direct("b")).await;

    let restarted = fixture_with(Some(f.settings.clone()), None).await;
    let ids: Vec<String> = restarted
        .service
        .favorites()
        .await
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
}

// ============================================================================
// Generated playlists
// ============================================================================

#[tokio::test]
async fn without_ai_key_static_playlists_are_served() {
    let f = fixture().await;
    assert_eq!(
        f.service.generated_playlists("Rock").await,
        fallback_playlists("Rock")
    );
    assert!(f.http.requests().is_empty());
}

#[tokio::test]
async fn generated_playlists_are_cached_per_category() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .times(1)
        .returning(|_| Ok(vec![generated("rock-generada")]));
    generator.expect_is_remote().return_const(true);

    let f = fixture_with(None, Some(Arc::new(generator))).await;

    let first = f.service.generated_playlists("Rock").await;
    let second = f.service.generated_playlists("  rock ").await;
    assert_eq!(first, vec![generated("rock-generada")]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn generator_failure_falls_back_without_caching() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .times(2)
        .returning(|_| Err(CoreError::Generation("quota exhausted".into())));
    generator.expect_is_remote().return_const(true);

    let f = fixture_with(None, Some(Arc::new(generator))).await;

    assert_eq!(
        f.service.generated_playlists("Jazz").await,
        fallback_playlists("Jazz")
    );
    assert_eq!(
        f.service.generated_playlists("Jazz").await,
        fallback_playlists("Jazz")
    );
}

// ============================================================================
// Search & playback
// ============================================================================

#[tokio::test]
async fn blank_search_does_not_hit_backend() {
    let f = fixture().await;
    assert!(f.service.search("   ").await.unwrap().is_empty());
    assert!(f.http.requests().is_empty());
}

#[tokio::test]
async fn search_normalizes_backend_hits() {
    let f = fixture().await;
    let songs = f.service.search("cumbia").await.unwrap();

    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].title, "Resultado");
    assert_eq!(
        songs[0].audio_url.as_deref(),
        Some("https://cdn.example/resultado.mp3")
    );
    assert_eq!(f.http.requests(), vec!["https://api.example/buscar?q=cumbia"]);
}

#[tokio::test]
async fn quality_mode_persists_and_steers_resolution() {
    let f = fixture().await;
    assert_eq!(f.service.quality_mode(), QualityMode::Fast);

    f.service.set_quality_mode(QualityMode::HighFidelity).await;

    let restarted = fixture_with(Some(f.settings.clone()), None).await;
    assert_eq!(restarted.service.quality_mode(), QualityMode::HighFidelity);

    let unresolved = Song::new("x", "Bolero", "Trio", "https://img.example/x.jpg");
    restarted
        .service
        .play(unresolved.clone(), vec![unresolved])
        .await
        .unwrap();

    let requests = restarted.http.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains("official%20audio%20hq"));
}

#[tokio::test]
async fn ended_track_advances_to_next_in_queue() {
    let f = fixture().await;
    let queue = vec![direct("a"), direct("b")];

    f.service.play(queue[0].clone(), queue.clone()).await.unwrap();
    assert_eq!(f.service.playback().status, PlaybackStatus::Playing);

    f.service
        .handle_output_event(AudioOutputEvent::Ended)
        .await
        .unwrap();

    let snapshot = f.service.playback();
    assert_eq!(snapshot.status, PlaybackStatus::Playing);
    assert_eq!(snapshot.current.map(|s| s.id).as_deref(), Some("b"));
    assert_eq!(
        *f.output.loaded.lock(),
        vec![
            "https://cdn.example/a.mp3".to_string(),
            "https://cdn.example/b.mp3".to_string()
        ]
    );

    let history: Vec<String> = f
        .service
        .recently_played()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(history, vec!["b", "a"]);
}

#[tokio::test]
async fn shutdown_stops_playback() {
    let f = fixture().await;
    f.service.play(direct("a"), vec![direct("a")]).await.unwrap();

    f.service.shutdown().await.unwrap();

    assert_eq!(f.service.playback().status, PlaybackStatus::Idle);
    assert!(*f.output.stopped.lock());
}

// ============================================================================
// User playlists
// ============================================================================

#[tokio::test]
async fn playlist_lifecycle_emits_library_events() {
    let f = fixture().await;
    let mut rx = f.service.events().subscribe();

    let playlist = f
        .service
        .create_playlist("  Viaje  ", Some("Para la ruta".into()))
        .await
        .unwrap();
    assert_eq!(playlist.name, "Viaje");

    f.service
        .add_to_playlist(playlist.id, &direct("a"))
        .await
        .unwrap();
    let renamed = f
        .service
        .rename_playlist(playlist.id, "Viaje largo")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Viaje largo");
    assert_eq!(renamed.songs.len(), 1);

    f.service.delete_playlist(playlist.id).await.unwrap();
    assert!(f.service.playlist(playlist.id).await.is_none());

    let id = playlist.id.to_string();
    assert_eq!(
        library_events(&mut rx),
        vec![
            LibraryEvent::PlaylistCreated {
                playlist_id: id.clone(),
                name: "Viaje".into()
            },
            LibraryEvent::PlaylistUpdated {
                playlist_id: id.clone()
            },
            LibraryEvent::PlaylistUpdated {
                playlist_id: id.clone()
            },
            LibraryEvent::PlaylistDeleted { playlist_id: id },
        ]
    );
}

#[tokio::test]
async fn blank_playlist_name_is_rejected() {
    let f = fixture().await;
    let err = f.service.create_playlist("   ", None).await.unwrap_err();
    assert!(matches!(err, CoreError::Library(_)));
    assert!(f.service.playlists().await.is_empty());
}

#[tokio::test]
async fn unknown_playlist_is_not_found() {
    let f = fixture().await;
    let err = f
        .service
        .delete_playlist(core_service::PlaylistId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Library(_)));
}

#[test]
fn bridge_errors_convert_into_core_errors() {
    let err: CoreError = BridgeError::NotAvailable("offline".into()).into();
    assert!(matches!(err, CoreError::Bridge(_)));
}
