//! # Core Configuration Module
//!
//! Builder-based configuration for the Manufy core.
//!
//! ## Overview
//!
//! [`CoreConfigBuilder`] collects backend settings, timeouts and the injected
//! bridges, then validates everything in [`build`](CoreConfigBuilder::build)
//! so misconfiguration fails at startup instead of on first use.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - backend search and audio downloads
//! - `SettingsStore` - favorites, playlists, preferences
//! - `BlobStorage` - offline audio
//!
//! When the `desktop-shims` feature is enabled, desktop defaults
//! (`ReqwestHttpClient`, `SqliteSettingsStore`, `FileBlobStorage`) are injected
//! for any bridge that was not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .with_env()
//!     .search_timeout(Duration::from_secs(20))
//!     .data_dir("/var/lib/manufy")
//!     .build()?;
//! ```
//!
//! ## Environment
//!
//! [`CoreConfigBuilder::with_env`] reads:
//! - `MANUFY_BACKEND_URL`
//! - `MANUFY_AI_API_KEY`, falling back to `GEMINI_API_KEY`
//! - `MANUFY_SEARCH_TIMEOUT_SECS`

use crate::error::{Error, Result};
use bridge_traits::{BlobStorage, Clock, HttpClient, SettingsStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default search backend origin.
pub const DEFAULT_BACKEND_URL: &str = "https://manufyvezla.xyz";

/// Header sent with every backend request to skip the tunnel interstitial.
pub const DEFAULT_BYPASS_HEADER: (&str, &str) = ("bypass-tunnel-reminder", "true");

pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(25);
pub const DEFAULT_RESPONSE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

const MAX_SEARCH_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_HISTORY_LIMIT: usize = 500;

/// Core configuration for the Manufy core.
///
/// Construct through [`CoreConfig::builder`].
#[derive(Clone)]
pub struct CoreConfig {
    /// Search backend origin, e.g. `https://manufyvezla.xyz`
    pub backend_url: String,

    /// Static header attached to backend requests
    pub bypass_header: Option<(String, String)>,

    /// Deadline for a single remote search; expiry aborts the request
    pub search_timeout: Duration,

    /// Freshness window of the response cache
    pub response_cache_ttl: Duration,

    /// Maximum entries kept in the recently-played list
    pub history_limit: usize,

    /// "Previous" restarts the current track while the position is at or below this
    pub restart_threshold: Duration,

    /// API key for AI-generated playlist metadata; `None` selects static content
    pub ai_api_key: Option<String>,

    /// Directory holding the preferences database and offline audio
    pub data_dir: PathBuf,

    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub blob_storage: Arc<dyn BlobStorage>,
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("backend_url", &self.backend_url)
            .field(
                "bypass_header",
                &self.bypass_header.as_ref().map(|(name, _)| name),
            )
            .field("search_timeout", &self.search_timeout)
            .field("response_cache_ttl", &self.response_cache_ttl)
            .field("history_limit", &self.history_limit)
            .field("restart_threshold", &self.restart_threshold)
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("data_dir", &self.data_dir)
            .field("http_client", &"HttpClient { ... }")
            .field("settings_store", &"SettingsStore { ... }")
            .field("blob_storage", &"BlobStorage { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Whether AI-generated content is available.
    pub fn has_ai(&self) -> bool {
        self.ai_api_key.is_some()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.backend_url).map_err(|e| {
            Error::Config(format!(
                "Backend URL '{}' is not a valid URL: {}",
                self.backend_url, e
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Backend URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.search_timeout.is_zero() || self.search_timeout > MAX_SEARCH_TIMEOUT {
            return Err(Error::Config(format!(
                "Search timeout must be between 1ms and {}s, got {:?}",
                MAX_SEARCH_TIMEOUT.as_secs(),
                self.search_timeout
            )));
        }

        if self.response_cache_ttl.is_zero() {
            return Err(Error::Config(
                "Response cache TTL must be greater than zero".to_string(),
            ));
        }

        if self.history_limit == 0 || self.history_limit > MAX_HISTORY_LIMIT {
            return Err(Error::Config(format!(
                "History limit must be between 1 and {}, got {}",
                MAX_HISTORY_LIMIT, self.history_limit
            )));
        }

        if let Some((name, _)) = &self.bypass_header {
            if name.trim().is_empty() {
                return Err(Error::Config(
                    "Bypass header name cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("manufy")
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, purpose: &str, host_hint: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required for {}. \
             Desktop: enable the 'desktop-shims' feature. \
             Other hosts: {}.",
            capability, purpose, host_hint
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing(
        "HttpClient",
        "backend search and downloads",
        "inject a fetch/URLSession based client",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_blob_storage(data_dir: &std::path::Path) -> Result<Arc<dyn BlobStorage>> {
    Ok(Arc::new(bridge_desktop::FileBlobStorage::with_root(
        data_dir.join("audio_files"),
    )))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_blob_storage(_data_dir: &std::path::Path) -> Result<Arc<dyn BlobStorage>> {
    Err(capability_missing(
        "BlobStorage",
        "offline audio",
        "inject an IndexedDB or app-sandbox backed store",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(data_dir: &std::path::Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let db_path = data_dir.join("preferences.db");

    let init_store = |path: PathBuf| -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    // block_on panics inside an active runtime, so hop to a plain thread.
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(db_path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(db_path)?,
    };

    Ok(Arc::new(store))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_data_dir: &std::path::Path) -> Result<Arc<dyn SettingsStore>> {
    Err(capability_missing(
        "SettingsStore",
        "favorites and playlists",
        "inject a localStorage or UserDefaults backed store",
    ))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    backend_url: Option<String>,
    bypass_header: Option<Option<(String, String)>>,
    search_timeout: Option<Duration>,
    response_cache_ttl: Option<Duration>,
    history_limit: Option<usize>,
    restart_threshold: Option<Duration>,
    ai_api_key: Option<String>,
    data_dir: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    blob_storage: Option<Arc<dyn BlobStorage>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    /// Apply overrides from the process environment.
    ///
    /// Unset or empty variables leave the builder untouched. An unparsable
    /// timeout is ignored with a warning.
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`with_env`](Self::with_env) with an injectable lookup.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = read("MANUFY_BACKEND_URL") {
            self.backend_url = Some(url);
        }

        if let Some(key) = read("MANUFY_AI_API_KEY").or_else(|| read("GEMINI_API_KEY")) {
            self.ai_api_key = Some(key);
        }

        if let Some(raw) = read("MANUFY_SEARCH_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.search_timeout = Some(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid MANUFY_SEARCH_TIMEOUT_SECS"),
            }
        }

        self
    }

    pub fn backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    /// Override the tunnel-bypass header.
    pub fn bypass_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.bypass_header = Some(Some((name.into(), value.into())));
        self
    }

    /// Send no extra header to the backend.
    pub fn without_bypass_header(mut self) -> Self {
        self.bypass_header = Some(None);
        self
    }

    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = Some(timeout);
        self
    }

    pub fn response_cache_ttl(mut self, ttl: Duration) -> Self {
        self.response_cache_ttl = Some(ttl);
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn restart_threshold(mut self, threshold: Duration) -> Self {
        self.restart_threshold = Some(threshold);
        self
    }

    pub fn ai_api_key(mut self, key: impl Into<String>) -> Self {
        self.ai_api_key = Some(key.into());
        self
    }

    /// Directory used by the desktop defaults for the preferences database
    /// and the offline audio files.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn blob_storage(mut self, storage: Arc<dyn BlobStorage>) -> Self {
        self.blob_storage = Some(storage);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   desktop default is available
    /// - [`Error::Config`] when a value is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let data_dir = self.data_dir.unwrap_or_else(default_data_dir);

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let blob_storage = match self.blob_storage {
            Some(storage) => storage,
            None => provide_default_blob_storage(&data_dir)?,
        };

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(&data_dir)?,
        };

        let bypass_header = self.bypass_header.unwrap_or_else(|| {
            Some((
                DEFAULT_BYPASS_HEADER.0.to_string(),
                DEFAULT_BYPASS_HEADER.1.to_string(),
            ))
        });

        let config = CoreConfig {
            backend_url: self
                .backend_url
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            bypass_header,
            search_timeout: self.search_timeout.unwrap_or(DEFAULT_SEARCH_TIMEOUT),
            response_cache_ttl: self.response_cache_ttl.unwrap_or(DEFAULT_RESPONSE_CACHE_TTL),
            history_limit: self.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            restart_threshold: self.restart_threshold.unwrap_or(DEFAULT_RESTART_THRESHOLD),
            ai_api_key: self.ai_api_key,
            data_dir,
            http_client,
            settings_store,
            blob_storage,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        };

        config.validate()?;

        Ok(config)
    }
}
