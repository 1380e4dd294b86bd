//! Boundary normalization of backend search results.
//!
//! The search backend has shipped several result shapes over time (Spanish
//! and English field names, YouTube-only hits, server-relative stream paths).
//! Everything is folded into one [`Song`] here so nothing downstream has to
//! probe optional fields.

use crate::models::Song;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use url::Url;

const ID_KEYS: &[&str] = &["id", "videoId", "video_id", "file_id"];
/// Id fields that carry a YouTube video id when no stream field is present.
const VIDEO_ID_KEYS: &[&str] = &["id", "videoId", "video_id"];
const TITLE_KEYS: &[&str] = &["title", "titulo", "name", "nombre"];
const ARTIST_KEYS: &[&str] = &["artist", "artista", "author", "autor", "channel", "uploader"];
const COVER_KEYS: &[&str] = &[
    "cover", "coverUrl", "cover_url", "foto", "thumbnail", "imagen", "image",
];
const AUDIO_KEYS: &[&str] = &[
    "audioUrl",
    "audio_url",
    "url",
    "audio",
    "stream_url",
    "link",
    "file_path",
    "path",
];
const DURATION_KEYS: &[&str] = &["duration", "duracion"];
const LIST_KEYS: &[&str] = &["results", "resultados", "data", "items"];

const UNKNOWN_ARTIST: &str = "Artista desconocido";

/// Normalize a whole `/buscar` response body.
///
/// Accepts a bare array or an object wrapping the array under a common key.
/// Entries without a title are dropped.
pub fn normalize_results(body: &Value, origin: &Url) -> Vec<Song> {
    let items = match body {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    items
        .iter()
        .filter_map(|item| normalize_hit(item, origin))
        .collect()
}

/// Normalize a single result object.
pub fn normalize_hit(hit: &Value, origin: &Url) -> Option<Song> {
    let map = hit.as_object()?;

    let title = first_string(map, TITLE_KEYS)?;
    let artist = first_string(map, ARTIST_KEYS).unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

    let mut audio_url = first_string(map, AUDIO_KEYS).and_then(|raw| qualify_url(origin, &raw));
    let explicit_id = first_string(map, ID_KEYS);

    if audio_url.is_none() {
        audio_url = first_string(map, VIDEO_ID_KEYS).map(|id| youtube_watch_url(&id));
    }

    let id = explicit_id
        .or_else(|| audio_url.as_deref().and_then(youtube_video_id))
        .unwrap_or_else(|| derived_id(&title, &artist));

    let cover_url = first_string(map, COVER_KEYS)
        .and_then(|raw| qualify_url(origin, &raw))
        .unwrap_or_else(|| crate::seed::playlist_placeholder_image(&id));

    let duration = DURATION_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(parse_duration))
        .unwrap_or(0);

    Some(Song {
        id,
        title,
        artist,
        cover_url,
        duration,
        audio_url,
    })
}

/// Turn an absolute, scheme-relative or server-relative reference into an
/// absolute URL against `origin`. Blank input yields `None`.
pub fn qualify_url(origin: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(absolute) = Url::parse(raw) {
        return Some(absolute.to_string());
    }

    origin.join(raw).ok().map(|u| u.to_string())
}

pub fn youtube_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Extract the video id from `youtube.com/watch?v=` or `youtu.be/` URLs.
pub fn youtube_video_id(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    match host {
        "youtube.com" | "music.youtube.com" => parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned()),
        "youtu.be" => parsed
            .path_segments()?
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
    .filter(|id| !id.is_empty())
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Seconds from a number, a numeric string, or `m:ss` / `h:mm:ss`.
fn parse_duration(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|secs| u32::try_from(secs).ok()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<f64>() {
                return (secs >= 0.0).then(|| secs.round() as u32);
            }
            s.split(':').try_fold(0u32, |acc, part| {
                let part: u32 = part.parse().ok()?;
                acc.checked_mul(60)?.checked_add(part)
            })
        }
        _ => None,
    }
}

fn derived_id(title: &str, artist: &str) -> String {
    let digest = Sha256::digest(format!("{}\u{1f}{}", title.to_lowercase(), artist.to_lowercase()));
    hex::encode(&digest[..8])
}
