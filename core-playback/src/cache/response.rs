//! Time-boxed memo of remote responses.
//!
//! An entry is fresh while `now - stored_at` does not exceed the TTL. Stale
//! entries are never evicted proactively; they are ignored on read and
//! replaced by the next successful write.

use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Namespaced cache key. Queries are compared case-insensitively with
/// surrounding and repeated whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: &'static str,
    query: String,
}

impl CacheKey {
    pub fn new(namespace: &'static str, query: &str) -> Self {
        let query = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self { namespace, query }
    }

    /// Search results for a free-text query.
    pub fn search(query: &str) -> Self {
        Self::new("search", query)
    }

    /// Generated playlists for a category.
    pub fn ai(category: &str) -> Self {
        Self::new("ai", category)
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.query)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub payload: V,
    pub stored_at: DateTime<Utc>,
}

pub struct ResponseCache<V> {
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Fresh payload for `key`, if any.
    pub fn read(&self, key: &CacheKey) -> Option<V> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;

        let age = self.clock.now().signed_duration_since(entry.stored_at);
        // Entries stamped in the future (clock moved back) count as fresh.
        let fresh = age
            .to_std()
            .map(|age| age <= self.ttl)
            .unwrap_or(true);

        if fresh {
            trace!(key = %key, "Response cache hit");
            Some(entry.payload.clone())
        } else {
            trace!(key = %key, "Response cache entry stale");
            None
        }
    }

    pub fn write(&self, key: CacheKey, payload: V) {
        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now(),
        };
        self.entries.write().insert(key, entry);
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
