//! Playback layer settings derived from [`CoreConfig`].

use crate::error::{PlaybackError, Result};
use core_runtime::config::{
    CoreConfig, DEFAULT_BACKEND_URL, DEFAULT_BYPASS_HEADER, DEFAULT_HISTORY_LIMIT,
    DEFAULT_RESPONSE_CACHE_TTL, DEFAULT_RESTART_THRESHOLD, DEFAULT_SEARCH_TIMEOUT,
};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Backend origin; relative audio paths are joined against it
    pub backend: Url,
    pub bypass_header: Option<(String, String)>,
    pub search_timeout: Duration,
    pub response_cache_ttl: Duration,
    pub history_limit: usize,
    pub restart_threshold: Duration,
}

impl PlaybackConfig {
    /// Defaults for everything but the backend origin.
    pub fn new(backend: Url) -> Self {
        Self {
            backend,
            bypass_header: Some((
                DEFAULT_BYPASS_HEADER.0.to_string(),
                DEFAULT_BYPASS_HEADER.1.to_string(),
            )),
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            response_cache_ttl: DEFAULT_RESPONSE_CACHE_TTL,
            history_limit: DEFAULT_HISTORY_LIMIT,
            restart_threshold: DEFAULT_RESTART_THRESHOLD,
        }
    }

    /// Defaults pointed at the public backend.
    pub fn for_default_backend() -> Result<Self> {
        Ok(Self::new(parse_backend(DEFAULT_BACKEND_URL)?))
    }

    pub fn from_core(config: &CoreConfig) -> Result<Self> {
        Ok(Self {
            backend: parse_backend(&config.backend_url)?,
            bypass_header: config.bypass_header.clone(),
            search_timeout: config.search_timeout,
            response_cache_ttl: config.response_cache_ttl,
            history_limit: config.history_limit,
            restart_threshold: config.restart_threshold,
        })
    }

    pub fn with_backend(mut self, backend: &str) -> Result<Self> {
        self.backend = parse_backend(backend)?;
        Ok(self)
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    /// `{backend}/buscar` without a trailing slash on the origin.
    pub fn search_endpoint(&self) -> String {
        format!("{}/buscar", self.backend.as_str().trim_end_matches('/'))
    }
}

fn parse_backend(raw: &str) -> Result<Url> {
    Url::parse(raw)
        .map_err(|e| PlaybackError::Internal(format!("Invalid backend URL '{}': {}", raw, e)))
}
