//! # Library Module
//!
//! The user's side of the music client: the song and playlist models, the
//! boundary normalization of backend search results, favorites, user
//! playlists, listening preferences and the static seed content shown when
//! nothing better is available.
//!
//! Everything that persists goes through the host's
//! [`SettingsStore`](bridge_traits::storage::SettingsStore) as JSON. Persistence
//! is best-effort: a failed write is logged and the in-memory state stands.

pub mod error;
pub mod favorites;
pub mod models;
pub mod normalize;
mod persist;
pub mod playlists;
pub mod preferences;
pub mod seed;

pub use error::{LibraryError, Result};
pub use favorites::{FavoriteToggle, Favorites};
pub use models::{GenreCard, Playlist, PlaylistId, PlaylistKind, QualityMode, Song, UserPlaylist};
pub use playlists::PlaylistLibrary;
pub use preferences::Preferences;
