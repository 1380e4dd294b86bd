//! Shared fakes for the playback integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::{ByteStream, HttpClient, HttpRequest, HttpResponse};
use bridge_traits::playback::{AudioOutput, AudioSource};
use bridge_traits::storage::BlobStorage;
use bridge_traits::time::SystemClock;
use bytes::Bytes;
use core_library::Song;
use core_playback::{
    OfflineBlobStore, OfflineSaver, PlaybackConfig, PlaybackController, ResponseCache,
    SearchClient, SongResolver,
};
use core_runtime::events::{CoreEvent, EventBus};
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

// ============================================================================
// Audio output
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OutputCommand {
    Load(String),
    Play,
    Pause,
    Seek(Duration),
    Stop,
    Volume(f32),
}

#[derive(Default)]
pub struct FakeOutput {
    commands: Mutex<Vec<OutputCommand>>,
    reject_play: AtomicBool,
}

impl FakeOutput {
    pub fn reject_play(&self, reject: bool) {
        self.reject_play.store(reject, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<OutputCommand> {
        self.commands.lock().clone()
    }

    pub fn loaded(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                OutputCommand::Load(uri) => Some(uri),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn load(&self, source: AudioSource) -> Result<()> {
        self.commands.lock().push(OutputCommand::Load(source.uri()));
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        if self.reject_play.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(
                "NotAllowedError: play() requires a user gesture".into(),
            ));
        }
        self.commands.lock().push(OutputCommand::Play);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.commands.lock().push(OutputCommand::Pause);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        self.commands.lock().push(OutputCommand::Seek(position));
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.commands.lock().push(OutputCommand::Stop);
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.commands.lock().push(OutputCommand::Volume(volume));
        Ok(())
    }
}

// ============================================================================
// Blob storage
// ============================================================================

#[derive(Default)]
pub struct MemoryBlobs {
    blobs: Mutex<HashMap<String, Bytes>>,
    reject_writes: AtomicBool,
    reject_reads: AtomicBool,
}

impl MemoryBlobs {
    pub fn insert(&self, key: &str, data: &'static [u8]) {
        self.blobs
            .lock()
            .insert(key.to_string(), Bytes::from_static(data));
    }

    pub fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }

    pub fn reject_reads(&self) {
        self.reject_reads.store(true, Ordering::SeqCst);
    }

    pub fn has(&self, key: &str) -> bool {
        self.blobs.lock().contains_key(key)
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobs {
    async fn write(&self, key: &str, data: Bytes) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::QuotaExceeded("storage quota exceeded".into()));
        }
        self.blobs.lock().insert(key.to_string(), data);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Bytes>> {
        if self.reject_reads.load(Ordering::SeqCst) {
            return Err(BridgeError::DatabaseError("blob store unavailable".into()));
        }
        Ok(self.blobs.lock().get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.blobs.lock().remove(key);
        Ok(())
    }
}

// ============================================================================
// Search backend
// ============================================================================

/// Answers `/buscar` with the first route whose needle appears in `q`.
#[derive(Default)]
pub struct FakeBackend {
    routes: Mutex<Vec<(String, Value)>>,
    downloads: Mutex<HashMap<String, Bytes>>,
    delay: Mutex<Duration>,
    hang: AtomicBool,
    searches: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn route(&self, needle: &str, body: Value) {
        self.routes.lock().push((needle.to_lowercase(), body));
    }

    pub fn download(&self, url: &str, data: &'static [u8]) {
        self.downloads
            .lock()
            .insert(url.to_string(), Bytes::from_static(data));
    }

    pub fn delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl HttpClient for FakeBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        let url = url::Url::parse(&request.url)
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
        let query = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        self.queries.lock().push(query.clone());

        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let lowered = query.to_lowercase();
        let body = self
            .routes
            .lock()
            .iter()
            .find(|(needle, _)| lowered.contains(needle.as_str()))
            .map(|(_, body)| body.clone())
            .unwrap_or_else(|| Value::Array(Vec::new()));

        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(serde_json::to_vec(&body).unwrap()),
        })
    }

    async fn download_stream(&self, url: String) -> Result<ByteStream> {
        let data = self
            .downloads
            .lock()
            .get(&url)
            .cloned()
            .ok_or_else(|| BridgeError::Connection(format!("no route to {}", url)))?;

        let (head, tail) = data.split_at(data.len() / 2);
        let chunks = vec![
            Ok(Bytes::copy_from_slice(head)),
            Ok(Bytes::copy_from_slice(tail)),
        ];
        Ok(futures::stream::iter(chunks).boxed())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub controller: Arc<PlaybackController>,
    pub resolver: Arc<SongResolver>,
    pub search: Arc<SearchClient>,
    pub saver: OfflineSaver,
    pub output: Arc<FakeOutput>,
    pub backend: Arc<FakeBackend>,
    pub blobs: Arc<MemoryBlobs>,
    pub events: EventBus,
}

pub fn harness() -> Harness {
    let config = PlaybackConfig::for_default_backend().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let blobs = Arc::new(MemoryBlobs::default());
    let output = Arc::new(FakeOutput::default());
    let events = EventBus::new(256);

    let cache = Arc::new(ResponseCache::new(
        config.response_cache_ttl,
        Arc::new(SystemClock),
    ));
    let search = Arc::new(SearchClient::new(backend.clone(), &config, cache));
    let blob_store = OfflineBlobStore::new(blobs.clone());
    let resolver = Arc::new(SongResolver::new(blob_store.clone(), search.clone()));
    let controller = Arc::new(PlaybackController::new(
        output.clone(),
        resolver.clone(),
        events.clone(),
        config.history_limit,
        config.restart_threshold,
    ));
    let saver = OfflineSaver::new(backend.clone(), blob_store, resolver.clone(), events.clone());

    Harness {
        controller,
        resolver,
        search,
        saver,
        output,
        backend,
        blobs,
        events,
    }
}

pub fn song(id: &str) -> Song {
    Song::new(
        id,
        format!("Song {}", id.to_uppercase()),
        "Bad Bunny",
        format!("https://img.example.com/{}.jpg", id),
    )
}

/// A song that resolves without touching the network.
pub fn direct(id: &str) -> Song {
    song(id).with_audio_url(format!("https://cdn.example.com/{}.mp3", id))
}

pub fn drain(rx: &mut Receiver<CoreEvent>) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
