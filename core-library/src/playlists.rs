//! User-created playlists

use crate::error::{LibraryError, Result};
use crate::models::{Playlist, PlaylistId, Song, UserPlaylist};
use crate::persist::JsonSlot;
use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

pub const PLAYLISTS_KEY: &str = "playlists.v1";

/// In-memory playlist collection mirrored to the settings store.
///
/// Mutations validate input and report unknown ids; persistence failures are
/// logged and never undo the in-memory change.
pub struct PlaylistLibrary {
    slot: JsonSlot<Vec<UserPlaylist>>,
    playlists: Mutex<Vec<UserPlaylist>>,
}

impl PlaylistLibrary {
    pub async fn load(settings: Arc<dyn SettingsStore>) -> Self {
        let slot = JsonSlot::new(settings, PLAYLISTS_KEY);
        let playlists: Vec<UserPlaylist> = slot.load().await;
        info!(count = playlists.len(), "Loaded user playlists");

        Self {
            slot,
            playlists: Mutex::new(playlists),
        }
    }

    #[instrument(skip(self, description))]
    pub async fn create(&self, name: &str, description: Option<String>) -> Result<UserPlaylist> {
        let description = description.filter(|d| !d.trim().is_empty());
        let playlist = UserPlaylist::new(name.trim(), description);
        playlist
            .validate()
            .map_err(|message| LibraryError::InvalidInput {
                field: "name".to_string(),
                message,
            })?;

        let mut playlists = self.playlists.lock().await;
        playlists.push(playlist.clone());
        self.slot.save(&playlists).await;

        info!(playlist_id = %playlist.id, "Created playlist");
        Ok(playlist)
    }

    pub async fn rename(&self, id: PlaylistId, name: &str) -> Result<UserPlaylist> {
        self.update(id, |playlist| {
            let previous = std::mem::replace(&mut playlist.name, name.trim().to_string());
            if let Err(message) = playlist.validate() {
                playlist.name = previous;
                return Err(LibraryError::InvalidInput {
                    field: "name".to_string(),
                    message,
                });
            }
            Ok(true)
        })
        .await
    }

    pub async fn set_description(
        &self,
        id: PlaylistId,
        description: Option<String>,
    ) -> Result<UserPlaylist> {
        let description = description.filter(|d| !d.trim().is_empty());
        self.update(id, move |playlist| {
            playlist.description = description;
            Ok(true)
        })
        .await
    }

    /// Append a song. Adding a song already in the playlist is a no-op.
    pub async fn add_song(&self, id: PlaylistId, song: &Song) -> Result<UserPlaylist> {
        self.update(id, |playlist| {
            if playlist.songs.iter().any(|s| s.id == song.id) {
                debug!(song_id = %song.id, "Song already in playlist");
                return Ok(false);
            }
            playlist.songs.push(song.clone());
            Ok(true)
        })
        .await
    }

    pub async fn remove_song(&self, id: PlaylistId, song_id: &str) -> Result<UserPlaylist> {
        self.update(id, |playlist| {
            let before = playlist.songs.len();
            playlist.songs.retain(|s| s.id != song_id);
            Ok(playlist.songs.len() != before)
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: PlaylistId) -> Result<()> {
        let mut playlists = self.playlists.lock().await;
        let index = playlists
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| LibraryError::playlist_not_found(id))?;

        playlists.remove(index);
        self.slot.save(&playlists).await;
        info!("Deleted playlist");
        Ok(())
    }

    pub async fn get(&self, id: PlaylistId) -> Option<UserPlaylist> {
        self.playlists
            .lock()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub async fn list(&self) -> Vec<UserPlaylist> {
        self.playlists.lock().await.clone()
    }

    /// Browse-card view of every user playlist.
    pub async fn summaries(&self) -> Vec<Playlist> {
        self.playlists
            .lock()
            .await
            .iter()
            .map(UserPlaylist::summary)
            .collect()
    }

    /// Apply `change` to one playlist; it returns whether anything changed.
    async fn update<F>(&self, id: PlaylistId, change: F) -> Result<UserPlaylist>
    where
        F: FnOnce(&mut UserPlaylist) -> Result<bool>,
    {
        let mut playlists = self.playlists.lock().await;
        let playlist = playlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LibraryError::playlist_not_found(id))?;

        if !change(playlist)? {
            return Ok(playlist.clone());
        }

        playlist.touch();
        let updated = playlist.clone();
        self.slot.save(&playlists).await;
        Ok(updated)
    }
}
