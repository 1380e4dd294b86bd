//! # Song Resolution & Playback
//!
//! Turns song descriptors into playable audio and drives the host's audio
//! output.
//!
//! ## Overview
//!
//! - [`cache`]: the offline blob store and the time-boxed response cache
//! - [`search`]: the `/buscar` client with boundary normalization
//! - [`resolver`]: offline → memo → direct URL → remote search
//! - [`controller`]: the Idle/Loading/Playing/Paused state machine with
//!   queue navigation and recently played history
//! - [`offline`]: saving resolved songs into the blob store

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod offline;
pub mod queue;
pub mod resolver;
pub mod search;

pub use cache::{CacheKey, OfflineBlobStore, ResponseCache};
pub use config::PlaybackConfig;
pub use controller::{PlaybackController, PlaybackSnapshot};
pub use error::{ErrorClass, PlaybackError, Result};
pub use offline::{OfflineOutcome, OfflineSaver};
pub use queue::{PlayQueue, RecentHistory};
pub use resolver::{quality_hint, ResolutionOrigin, ResolvedAudio, SongResolver};
pub use search::SearchClient;
