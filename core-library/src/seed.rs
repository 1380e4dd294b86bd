//! Static catalogue content shipped with the client.
//!
//! Used for the browse screen and whenever AI-generated content is unavailable.

use crate::models::{GenreCard, Playlist, PlaylistKind, Song};

const GENRES: &[(&str, &str, &str)] = &[
    ("Pop Global", "bg-pink-600", "popc"),
    ("Hip-Hop 2025", "bg-orange-600", "hiphopc"),
    ("Reggaetón Hits", "bg-blue-600", "podc"),
    ("Indie Rock", "bg-emerald-600", "newc"),
    ("Top Latino", "bg-indigo-600", "foryc"),
    ("Relax & Chill", "bg-sky-600", "relaxc"),
];

fn picsum(seed: &str, size: u32) -> String {
    format!("https://picsum.photos/seed/{}/{}", seed, size)
}

/// Browse categories in display order.
pub fn genres() -> Vec<GenreCard> {
    GENRES
        .iter()
        .map(|(name, color, seed)| GenreCard {
            name: name.to_string(),
            color: color.to_string(),
            image_url: picsum(seed, 150),
        })
        .collect()
}

/// Shown in the player before anything was selected.
pub fn placeholder_song() -> Song {
    Song::new(
        "current",
        "¿Qué vas a escuchar?",
        "Selecciona una pista",
        picsum("manufy", 600),
    )
}

/// Seeded stand-in cover for playlists without artwork.
pub fn playlist_placeholder_image(seed: &str) -> String {
    picsum(seed, 300)
}

/// Lowercase, dash-separated identifier fragment; keeps non-ASCII letters.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Static playlists for a category, used when no generator is available.
pub fn fallback_playlists(category: &str) -> Vec<Playlist> {
    let category = category.trim();
    let base = slug(category);
    let base = if base.is_empty() { "mix".to_string() } else { base };

    [
        ("Esenciales", "Lo imprescindible de", PlaylistKind::Playlist),
        ("Novedades", "Lanzamientos recientes de", PlaylistKind::Playlist),
        ("Clásicos", "Los temas que definieron", PlaylistKind::Album),
    ]
    .into_iter()
    .map(|(label, blurb, kind)| {
        let id = format!("{}-{}", base, slug(label));
        Playlist {
            image_url: picsum(&id, 300),
            name: format!("{} {}", category, label),
            description: Some(format!("{} {}", blurb, category)),
            kind,
            id,
        }
    })
    .collect()
}
