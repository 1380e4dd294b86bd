//! # Caches
//!
//! - [`OfflineBlobStore`]: downloaded audio keyed by song id, durable.
//! - [`ResponseCache`]: time-boxed memo of remote responses, session-scoped.

pub mod blob;
pub mod response;

pub use blob::OfflineBlobStore;
pub use response::{CacheEntry, CacheKey, ResponseCache};
