//! Play queue and recently played list.

use core_library::Song;
use std::collections::VecDeque;

/// Ordered songs of the listing a selection was made from, plus the index of
/// the current entry. Navigation wraps in both directions.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    songs: Vec<Song>,
    index: Option<usize>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue and point it at `current`. A song missing from
    /// `songs` is put at the front.
    pub fn replace(&mut self, mut songs: Vec<Song>, current: &Song) {
        let index = match songs.iter().position(|s| s.id == current.id) {
            Some(index) => index,
            None => {
                songs.insert(0, current.clone());
                0
            }
        };
        self.songs = songs;
        self.index = Some(index);
    }

    /// Move the cursor to the entry with `song_id`; returns whether it exists.
    pub fn select(&mut self, song_id: &str) -> bool {
        match self.songs.iter().position(|s| s.id == song_id) {
            Some(index) => {
                self.index = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&Song> {
        self.index.and_then(|i| self.songs.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    /// Entry after the current one, wrapping to the first.
    pub fn peek_next(&self) -> Option<&Song> {
        let len = self.songs.len();
        if len == 0 {
            return None;
        }
        let next = self.index.map_or(0, |i| (i + 1) % len);
        self.songs.get(next)
    }

    /// Entry before the current one, wrapping to the last.
    pub fn peek_previous(&self) -> Option<&Song> {
        let len = self.songs.len();
        if len == 0 {
            return None;
        }
        let previous = match self.index {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.songs.get(previous)
    }

    /// Record a measured duration on the queued copy of a song.
    pub fn set_duration(&mut self, song_id: &str, seconds: u32) {
        for song in self.songs.iter_mut().filter(|s| s.id == song_id) {
            song.duration = seconds;
        }
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn clear(&mut self) {
        self.songs.clear();
        self.index = None;
    }
}

/// Most-recent-first, bounded, unique by song id.
#[derive(Debug, Clone)]
pub struct RecentHistory {
    limit: usize,
    songs: VecDeque<Song>,
}

impl RecentHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            songs: VecDeque::new(),
        }
    }

    pub fn push(&mut self, song: Song) {
        self.songs.retain(|s| s.id != song.id);
        self.songs.push_front(song);
        self.songs.truncate(self.limit);
    }

    pub fn to_vec(&self) -> Vec<Song> {
        self.songs.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn clear(&mut self) {
        self.songs.clear();
    }
}
