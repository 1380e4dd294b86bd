//! Favorite songs
//!
//! Most-recently-favorited first. The list lives in memory and is mirrored to
//! the settings store after every change.

use crate::models::Song;
use crate::persist::JsonSlot;
use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

pub const FAVORITES_KEY: &str = "favorites.v1";

/// Outcome of [`Favorites::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}

impl FavoriteToggle {
    pub fn is_added(self) -> bool {
        matches!(self, FavoriteToggle::Added)
    }
}

pub struct Favorites {
    slot: JsonSlot<Vec<Song>>,
    songs: Mutex<Vec<Song>>,
}

impl Favorites {
    /// Load favorites from the settings store.
    pub async fn load(settings: Arc<dyn SettingsStore>) -> Self {
        let slot = JsonSlot::new(settings, FAVORITES_KEY);
        let songs: Vec<Song> = slot.load().await;
        info!(count = songs.len(), "Loaded favorites");

        Self {
            slot,
            songs: Mutex::new(songs),
        }
    }

    #[instrument(skip(self, song), fields(song_id = %song.id))]
    pub async fn toggle(&self, song: &Song) -> FavoriteToggle {
        let mut songs = self.songs.lock().await;

        let outcome = if let Some(index) = songs.iter().position(|s| s.id == song.id) {
            songs.remove(index);
            FavoriteToggle::Removed
        } else {
            songs.insert(0, song.clone());
            FavoriteToggle::Added
        };

        self.slot.save(&songs).await;
        outcome
    }

    /// Remove by id; returns whether the song was a favorite.
    pub async fn remove(&self, song_id: &str) -> bool {
        let mut songs = self.songs.lock().await;
        let before = songs.len();
        songs.retain(|s| s.id != song_id);

        let removed = songs.len() != before;
        if removed {
            self.slot.save(&songs).await;
        }
        removed
    }

    pub async fn contains(&self, song_id: &str) -> bool {
        self.songs.lock().await.iter().any(|s| s.id == song_id)
    }

    pub async fn list(&self) -> Vec<Song> {
        self.songs.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.songs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.songs.lock().await.is_empty()
    }
}
