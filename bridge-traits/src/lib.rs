//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host must implement.
//!
//! ## Overview
//!
//! The core never talks to the network, the disk or a media element directly.
//! Every such capability is a trait defined here and injected at startup:
//!
//! - [`HttpClient`](http::HttpClient) - Backend search, AI metadata, audio downloads
//! - [`SettingsStore`](storage::SettingsStore) - Favorites, playlists, preferences
//! - [`BlobStorage`](storage::BlobStorage) - Offline audio keyed by song id
//! - [`AudioOutput`](playback::AudioOutput) - The single media element
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! Desktop adapters live in `bridge-desktop`.
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let http_client = config.http_client
//!     .ok_or_else(|| CoreError::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Desktop: enable the desktop-shims feature.".to_string(),
//!     })?;
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc`.

pub mod error;
pub mod http;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use playback::{AudioOutput, AudioOutputEvent, AudioSource};
pub use storage::{BlobStorage, SettingsStore};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, SystemClock};
