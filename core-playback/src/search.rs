//! Client for the backend `/buscar` endpoint.

use crate::cache::{CacheKey, ResponseCache};
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use bridge_traits::http::{HttpClient, HttpRequest};
use core_library::normalize::normalize_results;
use core_library::Song;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Issues searches against the backend and memoizes the normalized results.
///
/// Each request is bounded by the configured timeout; expiry drops the
/// in-flight future, which aborts the underlying HTTP call.
pub struct SearchClient {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    origin: Url,
    bypass_header: Option<(String, String)>,
    timeout: Duration,
    cache: Arc<ResponseCache<Vec<Song>>>,
}

impl SearchClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        config: &PlaybackConfig,
        cache: Arc<ResponseCache<Vec<Song>>>,
    ) -> Self {
        Self {
            http,
            endpoint: config.search_endpoint(),
            origin: config.backend.clone(),
            bypass_header: config.bypass_header.clone(),
            timeout: config.search_timeout,
            cache,
        }
    }

    /// Search with the response cache in front.
    ///
    /// Blank queries return an empty list without touching the network. Only
    /// non-empty result sets are cached.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Song>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let key = CacheKey::search(query);
        if let Some(songs) = self.cache.read(&key) {
            debug!(results = songs.len(), "Serving search from cache");
            return Ok(songs);
        }

        let songs = self.fetch(query).await?;
        if !songs.is_empty() {
            self.cache.write(key, songs.clone());
        }
        Ok(songs)
    }

    /// Search without consulting the cache.
    pub async fn fetch(&self, query: &str) -> Result<Vec<Song>> {
        let url = self.request_url(query);
        let mut request = HttpRequest::get(url.as_str()).timeout(self.timeout);
        if let Some((name, value)) = &self.bypass_header {
            request = request.header(name.as_str(), value.as_str());
        }

        debug!(url = %url, "Querying search backend");
        let response = tokio::time::timeout(self.timeout, self.http.execute(request))
            .await
            .map_err(|_| {
                warn!(timeout = ?self.timeout, "Search request timed out");
                PlaybackError::Timeout(self.timeout)
            })?
            .map_err(PlaybackError::network)?;

        if !response.is_success() {
            warn!(status = response.status, "Search backend returned an error");
            return Err(PlaybackError::NetworkFailure(format!(
                "search backend returned HTTP {}",
                response.status
            )));
        }

        let body: Value = response.json().map_err(|e| {
            PlaybackError::NetworkFailure(format!("malformed search response: {}", e))
        })?;

        let songs = normalize_results(&body, &self.origin);
        info!(results = songs.len(), "Search completed");
        Ok(songs)
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn request_url(&self, query: &str) -> String {
        format!("{}?q={}", self.endpoint, urlencoding::encode(query))
    }
}
