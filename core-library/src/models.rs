//! Domain models for the catalogue and the user's library

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Identifier of a user-created playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub Uuid);

impl PlaylistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlaylistId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// Song descriptor shared by search results, queues, favorites and playlists.
///
/// `id` is the backend identifier and is unique within a session.
/// `audio_url` may be absent, relative or absolute; the resolver decides how
/// to turn it into something playable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub cover_url: String,
    /// Seconds; 0 until measured by the audio output
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl Song {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        cover_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            cover_url: cover_url.into(),
            duration: 0,
            audio_url: None,
        }
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration = seconds;
        self
    }

    /// Whether `audio_url` is already an absolute http(s) URL.
    pub fn has_absolute_audio_url(&self) -> bool {
        self.audio_url
            .as_deref()
            .and_then(|raw| url::Url::parse(raw).ok())
            .is_some_and(|u| matches!(u.scheme(), "http" | "https"))
    }

    /// Search terms that identify this song on the backend.
    pub fn search_terms(&self) -> String {
        let title = self.title.trim();
        let artist = self.artist.trim();
        if artist.is_empty() {
            title.to_string()
        } else {
            format!("{} {}", title, artist)
        }
    }
}

/// Kind of a browsable collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    Playlist,
    Artist,
    Album,
}

/// Browsable collection summary (seed data, AI-generated or user-created)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: PlaylistKind,
}

/// A playlist the user created; persisted across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPlaylist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub songs: Vec<Song>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserPlaylist {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: PlaylistId::new(),
            name: name.into(),
            description,
            songs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Playlist name cannot be empty".to_string());
        }
        if self.name.chars().count() > 100 {
            return Err("Playlist name cannot exceed 100 characters".to_string());
        }
        Ok(())
    }

    /// Cover: the first song's artwork, or the seeded fallback image.
    pub fn image_url(&self) -> String {
        self.songs
            .first()
            .map(|s| s.cover_url.clone())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| crate::seed::playlist_placeholder_image(&self.id.to_string()))
    }

    pub fn total_duration(&self) -> u64 {
        self.songs.iter().map(|s| u64::from(s.duration)).sum()
    }

    pub fn summary(&self) -> Playlist {
        Playlist {
            id: self.id.to_string(),
            name: self.name.clone(),
            image_url: self.image_url(),
            description: self.description.clone(),
            kind: PlaylistKind::Playlist,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}

/// Browse category card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreCard {
    pub name: String,
    /// Accent colour tag used by the host theme
    pub color: String,
    pub image_url: String,
}

/// Listening quality preference; steers the remote search hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMode {
    /// Low-fidelity sources that start quickly
    #[default]
    Fast,
    /// Slower, higher-fidelity sources
    HighFidelity,
}

impl QualityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityMode::Fast => "fast",
            QualityMode::HighFidelity => "high_fidelity",
        }
    }
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" | "low" => Ok(QualityMode::Fast),
            "high_fidelity" | "hifi" | "high" => Ok(QualityMode::HighFidelity),
            other => Err(format!("Unknown quality mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_json_uses_camel_case() {
        let song = Song::new("abc", "Tití Me Preguntó", "Bad Bunny", "https://img/1.jpg")
            .with_audio_url("/stream/abc.mp3");
        let json = serde_json::to_value(&song).unwrap();

        assert_eq!(json["coverUrl"], "https://img/1.jpg");
        assert_eq!(json["audioUrl"], "/stream/abc.mp3");
        assert_eq!(json["duration"], 0);
    }

    #[test]
    fn absolute_audio_url_detection() {
        let base = Song::new("a", "t", "a", "");
        assert!(!base.has_absolute_audio_url());
        assert!(!base.clone().with_audio_url("/stream/a.mp3").has_absolute_audio_url());
        assert!(!base.clone().with_audio_url("blob:xyz").has_absolute_audio_url());
        assert!(base
            .with_audio_url("https://cdn.example.com/a.mp3")
            .has_absolute_audio_url());
    }

    #[test]
    fn search_terms_join_title_and_artist() {
        assert_eq!(
            Song::new("a", " Monaco ", "Bad Bunny", "").search_terms(),
            "Monaco Bad Bunny"
        );
        assert_eq!(Song::new("a", "Monaco", " ", "").search_terms(), "Monaco");
    }

    #[test]
    fn playlist_kind_serializes_as_type() {
        let playlist = Playlist {
            id: "p1".to_string(),
            name: "Top Latino".to_string(),
            image_url: "https://img".to_string(),
            description: None,
            kind: PlaylistKind::Album,
        };
        let json = serde_json::to_value(&playlist).unwrap();
        assert_eq!(json["type"], "album");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn user_playlist_validation_and_cover() {
        let mut playlist = UserPlaylist::new("  ", None);
        assert!(playlist.validate().is_err());

        playlist.name = "Road trip".to_string();
        assert!(playlist.validate().is_ok());
        assert!(playlist.image_url().starts_with("https://picsum.photos/seed/"));

        playlist
            .songs
            .push(Song::new("s", "t", "a", "https://img/s.jpg").with_duration(200));
        playlist.songs.push(Song::new("u", "t", "a", "").with_duration(100));
        assert_eq!(playlist.image_url(), "https://img/s.jpg");
        assert_eq!(playlist.total_duration(), 300);
        assert_eq!(playlist.summary().kind, PlaylistKind::Playlist);
    }

    #[test]
    fn quality_mode_round_trips_through_str() {
        assert_eq!("fast".parse::<QualityMode>().unwrap(), QualityMode::Fast);
        assert_eq!(
            "HIGH_FIDELITY".parse::<QualityMode>().unwrap(),
            QualityMode::HighFidelity
        );
        assert!("ultra".parse::<QualityMode>().is_err());
        assert_eq!(QualityMode::default(), QualityMode::Fast);
    }
}
