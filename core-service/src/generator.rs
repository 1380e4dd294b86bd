//! Playlist metadata for browse categories.
//!
//! [`GeminiPlaylistGenerator`] asks a text-generation API for playlist ideas;
//! [`StaticPlaylistGenerator`] serves the seeded fallback and is used when no
//! API key is configured or generation fails.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use core_library::seed::{fallback_playlists, playlist_placeholder_image, slug};
use core_library::{Playlist, PlaylistKind};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const GENERATION_TIMEOUT: Duration = Duration::from_secs(20);

#[async_trait]
pub trait PlaylistGenerator: Send + Sync {
    /// Playlists for a browse category. An empty list counts as failure.
    async fn generate(&self, category: &str) -> Result<Vec<Playlist>>;

    /// Whether results come from a remote service.
    fn is_remote(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticPlaylistGenerator;

#[async_trait]
impl PlaylistGenerator for StaticPlaylistGenerator {
    async fn generate(&self, category: &str) -> Result<Vec<Playlist>> {
        Ok(fallback_playlists(category))
    }

    fn is_remote(&self) -> bool {
        false
    }
}

pub struct GeminiPlaylistGenerator {
    http: Arc<dyn HttpClient>,
    api_key: String,
    endpoint: String,
}

impl GeminiPlaylistGenerator {
    pub fn new(http: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            endpoint: GEMINI_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn prompt(category: &str) -> String {
        format!(
            "Genera 3 playlists para la categoría musical \"{}\". Responde solo con un \
             arreglo JSON de objetos con los campos \"name\", \"description\" y \"type\" \
             (uno de \"playlist\", \"artist\" o \"album\").",
            category
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeneratedPlaylist {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[async_trait]
impl PlaylistGenerator for GeminiPlaylistGenerator {
    #[instrument(skip(self))]
    async fn generate(&self, category: &str) -> Result<Vec<Playlist>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": Self::prompt(category) }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let request = HttpRequest::new(HttpMethod::Post, self.endpoint.as_str())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)?
            .timeout(GENERATION_TIMEOUT);

        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let response = self.http.execute_with_retry(request, policy).await?;

        if !response.is_success() {
            warn!(status = response.status, "Playlist generation request failed");
            return Err(CoreError::Generation(format!("HTTP {}", response.status)));
        }

        let parsed: GenerateResponse = response.json()?;
        let text = parsed
            .candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .find_map(|p| p.text)
            .ok_or_else(|| CoreError::Generation("response carried no text".to_string()))?;

        let playlists = parse_generated(category, &text)?;
        debug!(count = playlists.len(), "Generated playlists");
        Ok(playlists)
    }
}

/// Parse the model's JSON array, tolerating a Markdown code fence around it.
fn parse_generated(category: &str, text: &str) -> Result<Vec<Playlist>> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    let generated: Vec<GeneratedPlaylist> = serde_json::from_str(unfenced.trim())
        .map_err(|e| CoreError::Generation(format!("unparseable model output: {}", e)))?;

    let base = slug(category);
    let playlists: Vec<Playlist> = generated
        .into_iter()
        .filter(|p| !p.name.trim().is_empty())
        .map(|p| {
            let id = format!("{}-{}", base, slug(&p.name));
            let kind = match p.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
                Some("artist") => PlaylistKind::Artist,
                Some("album") => PlaylistKind::Album,
                _ => PlaylistKind::Playlist,
            };
            Playlist {
                image_url: playlist_placeholder_image(&id),
                name: p.name.trim().to_string(),
                description: p.description.filter(|d| !d.trim().is_empty()),
                kind,
                id,
            }
        })
        .collect();

    if playlists.is_empty() {
        return Err(CoreError::Generation("model returned no playlists".to_string()));
    }
    Ok(playlists)
}
