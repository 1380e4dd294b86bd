//! Resolution order, memoization and preloading.

mod common;

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{ByteStream, HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::SystemClock;
use bytes::Bytes;
use common::{direct, harness, song, MemoryBlobs};
use core_library::QualityMode;
use core_playback::{
    OfflineBlobStore, PlaybackConfig, PlaybackError, ResolutionOrigin, ResponseCache,
    SearchClient, SongResolver,
};
use mockall::mock;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        async fn download_stream(&self, url: String) -> BridgeResult<ByteStream>;
    }
}

fn ok_json(body: serde_json::Value) -> BridgeResult<HttpResponse> {
    Ok(HttpResponse {
        status: 200,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    })
}

fn resolver_with(http: MockHttp, blobs: Arc<MemoryBlobs>) -> SongResolver {
    let config = PlaybackConfig::for_default_backend().unwrap();
    let cache = Arc::new(ResponseCache::new(
        config.response_cache_ttl,
        Arc::new(SystemClock),
    ));
    let search = Arc::new(SearchClient::new(Arc::new(http), &config, cache));
    SongResolver::new(OfflineBlobStore::new(blobs), search)
}

#[tokio::test]
async fn offline_blob_wins_without_network() {
    let mut http = MockHttp::new();
    http.expect_execute().never();

    let blobs = Arc::new(MemoryBlobs::default());
    blobs.insert("s1", b"offline-bytes");
    let resolver = resolver_with(http, blobs);

    let resolved = resolver.resolve(&direct("s1")).await.unwrap();
    assert_eq!(resolved.origin, ResolutionOrigin::Offline);
    assert_eq!(resolved.source.uri(), "blob:manufy/s1");
    assert!(resolved.url().is_none());
}

#[tokio::test]
async fn second_resolution_is_served_from_memo() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| ok_json(json!([{ "title": "Monaco", "file_path": "/stream/monaco.mp3" }])));

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()));
    let target = song("monaco");

    let first = resolver.resolve(&target).await.unwrap();
    assert_eq!(first.origin, ResolutionOrigin::Search);
    assert_eq!(first.url(), Some("https://manufyvezla.xyz/stream/monaco.mp3"));

    let second = resolver.resolve(&target).await.unwrap();
    assert_eq!(second.origin, ResolutionOrigin::Memo);
    assert_eq!(second.url(), first.url());
    assert_eq!(resolver.memo_len(), 1);
}

#[tokio::test]
async fn absolute_url_is_returned_unchanged() {
    let mut http = MockHttp::new();
    http.expect_execute().never();

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()));
    let resolved = resolver.resolve(&direct("s1")).await.unwrap();

    assert_eq!(resolved.origin, ResolutionOrigin::Direct);
    assert_eq!(resolved.url(), Some("https://cdn.example.com/s1.mp3"));
    assert_eq!(resolver.memo_len(), 0);
}

#[tokio::test]
async fn relative_descriptor_url_goes_through_search() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| ok_json(json!([{ "title": "x", "url": "https://cdn.example.com/x.mp3" }])));

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()));
    let relative = song("x").with_audio_url("/stream/x.mp3");

    let resolved = resolver.resolve(&relative).await.unwrap();
    assert_eq!(resolved.origin, ResolutionOrigin::Search);
}

#[tokio::test]
async fn result_without_playable_field_is_not_found() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| ok_json(json!([{ "title": "Cover only", "foto": "https://img/1.jpg" }])));

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()));
    let err = resolver.resolve(&song("abc")).await.unwrap_err();

    assert!(matches!(err, PlaybackError::NotFound(_)));
    assert_eq!(resolver.memo_len(), 0);
}

#[tokio::test]
async fn empty_results_are_not_found() {
    let mut http = MockHttp::new();
    http.expect_execute().returning(|_| ok_json(json!([])));

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()));
    assert!(matches!(
        resolver.resolve(&song("zzz")).await,
        Err(PlaybackError::NotFound(_))
    ));
}

#[tokio::test]
async fn server_errors_are_network_failures() {
    let mut http = MockHttp::new();
    http.expect_execute().returning(|_| {
        Ok(HttpResponse {
            status: 502,
            headers: HashMap::new(),
            body: Bytes::from_static(b"Bad Gateway"),
        })
    });

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()));
    let err = resolver.resolve(&song("s1")).await.unwrap_err();
    assert!(err.is_network_error());
}

#[tokio::test]
async fn quality_hint_and_bypass_header_reach_the_backend() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|request| {
            request.url.starts_with("https://manufyvezla.xyz/buscar?q=")
                && request.url.contains("official%20audio%20hq")
                && request.headers.get("bypass-tunnel-reminder").map(String::as_str) == Some("true")
        })
        .times(1)
        .returning(|_| ok_json(json!([{ "title": "t", "audioUrl": "https://cdn/t.mp3" }])));

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()))
        .with_quality_mode(QualityMode::HighFidelity);
    resolver.resolve(&song("t")).await.unwrap();
}

#[tokio::test]
async fn blob_read_failure_is_treated_as_a_miss() {
    let mut http = MockHttp::new();
    http.expect_execute().never();

    let blobs = Arc::new(MemoryBlobs::default());
    blobs.reject_reads();
    let resolver = resolver_with(http, blobs);

    let resolved = resolver.resolve(&direct("s1")).await.unwrap();
    assert_eq!(resolved.origin, ResolutionOrigin::Direct);
}

#[tokio::test]
async fn preload_populates_memo_and_swallows_failures() {
    let h = harness();
    h.backend.route("song a", json!([{ "title": "A", "audio_url": "/a.mp3" }]));

    h.resolver.preload(&song("a")).await;
    assert_eq!(
        h.resolver.memoized("a").as_deref(),
        Some("https://manufyvezla.xyz/a.mp3")
    );

    // No route for "b": the backend answers with an empty list.
    h.resolver.preload(&song("b")).await;
    assert!(h.resolver.memoized("b").is_none());

    let searches = h.backend.searches();
    h.resolver.preload(&song("a")).await;
    h.resolver.preload(&direct("c")).await;
    assert_eq!(h.backend.searches(), searches);
}

#[tokio::test]
async fn transport_error_does_not_poison_memo() {
    let mut http = MockHttp::new();
    let mut calls = 0;
    http.expect_execute().times(2).returning(move |_| {
        calls += 1;
        if calls == 1 {
            Err(BridgeError::Connection("connection reset".into()))
        } else {
            ok_json(json!([{ "title": "r", "url": "https://cdn/r.mp3" }]))
        }
    });

    let resolver = resolver_with(http, Arc::new(MemoryBlobs::default()));
    assert!(resolver.resolve(&song("r")).await.is_err());
    assert_eq!(
        resolver.resolve(&song("r")).await.unwrap().origin,
        ResolutionOrigin::Search
    );
}
