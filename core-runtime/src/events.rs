//! # Event Bus System
//!
//! Typed, broadcast-based events for decoupled communication between the
//! playback controller, the library and the host UI.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps per-domain enums
//! - **EventBus**: central `tokio::sync::broadcast` channel
//! - **EventStream**: receiver wrapper with filtering
//!
//! ```text
//! ┌────────────────────┐   emit   ┌──────────┐  subscribe  ┌───────────┐
//! │ PlaybackController ├─────────>│          ├────────────>│  Host UI  │
//! └────────────────────┘          │ EventBus │             └───────────┘
//! ┌────────────────────┐   emit   │          │  subscribe  ┌───────────┐
//! │   Library/Service  ├─────────>│          ├────────────>│  Toasts   │
//! └────────────────────┘          └──────────┘             └───────────┘
//! ```
//!
//! ## Notifications
//!
//! Every user-visible failure (network, not found, storage, playback) is
//! reported as a transient [`CoreEvent::Notification`]. Nothing on the bus is
//! fatal and nothing triggers a retry.
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, Notification};
//!
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//! bus.emit(CoreEvent::Notification(Notification::error(
//!     "network_failure",
//!     "Could not reach the server",
//! )))
//! .ok();
//! assert!(matches!(rx.try_recv(), Ok(CoreEvent::Notification(_))));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError, error::SendError};

pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback controller events
    Playback(PlaybackEvent),
    /// Favorites, playlists and offline availability
    Library(LibraryEvent),
    /// Transient user-facing message
    Notification(Notification),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Notification(n) => &n.message,
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Library(LibraryEvent::OfflineSaveFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Notification(n) => n.level,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Library(LibraryEvent::SavedOffline { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Player lifecycle as observed by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Playing,
    Paused,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Loading => "loading",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Events related to audio playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Controller moved between states.
    StateChanged {
        from: PlaybackStatus,
        to: PlaybackStatus,
    },
    /// A new song started playing.
    Started {
        song_id: String,
        title: String,
        /// Whether the audio came from the offline blob store.
        offline: bool,
    },
    Paused {
        song_id: String,
        position_ms: u64,
    },
    Resumed {
        song_id: String,
        position_ms: u64,
    },
    Stopped,
    /// Track reached its end naturally.
    Completed {
        song_id: String,
    },
    PositionChanged {
        song_id: String,
        position_ms: u64,
        duration_ms: u64,
    },
    /// Duration reported by the audio output metadata.
    DurationKnown {
        song_id: String,
        duration_ms: u64,
    },
    Error {
        song_id: Option<String>,
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StateChanged { .. } => "Playback state changed",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::DurationKnown { .. } => "Track duration known",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to favorites, user playlists and offline copies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    FavoriteAdded { song_id: String },
    FavoriteRemoved { song_id: String },
    PlaylistCreated { playlist_id: String, name: String },
    PlaylistUpdated { playlist_id: String },
    PlaylistDeleted { playlist_id: String },
    /// Audio persisted to the blob store; available offline from now on.
    SavedOffline { song_id: String, bytes: u64 },
    /// Saving failed; the song stays playable for this session only.
    OfflineSaveFailed { song_id: String, reason: String },
    /// Offline copy deleted.
    OfflineRemoved { song_id: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::FavoriteAdded { .. } => "Added to favorites",
            LibraryEvent::FavoriteRemoved { .. } => "Removed from favorites",
            LibraryEvent::PlaylistCreated { .. } => "Playlist created",
            LibraryEvent::PlaylistUpdated { .. } => "Playlist updated",
            LibraryEvent::PlaylistDeleted { .. } => "Playlist deleted",
            LibraryEvent::SavedOffline { .. } => "Saved for offline playback",
            LibraryEvent::OfflineSaveFailed { .. } => "Available for this session only",
            LibraryEvent::OfflineRemoved { .. } => "Offline copy removed",
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// A transient, dismissable message for the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub level: EventSeverity,
    /// Stable machine-readable category (e.g. `network_failure`).
    pub kind: String,
    pub message: String,
}

impl Notification {
    pub fn new(level: EventSeverity, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn info(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventSeverity::Info, kind, message)
    }

    pub fn warning(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventSeverity::Warning, kind, message)
    }

    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventSeverity::Error, kind, message)
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus yields another producer for the same channel. Slow
/// subscribers receive `RecvError::Lagged`.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns an error if there are no active subscribers; callers in the
    /// core ignore it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe through an [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus};
///
/// let bus = EventBus::default();
/// let toasts = bus.stream().filter(|event| matches!(event, CoreEvent::Notification(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: &str) -> CoreEvent {
        CoreEvent::Playback(PlaybackEvent::Started {
            song_id: id.to_string(),
            title: "Song".to_string(),
            offline: false,
        })
    }

    #[tokio::test]
    async fn test_emission_without_subscribers_errors() {
        let bus = EventBus::new(8);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.emit(started("a")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.emit(started("x")).unwrap(), 2);
        assert_eq!(a.recv().await.unwrap(), started("x"));
        assert_eq!(b.recv().await.unwrap(), started("x"));
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(8);
        let mut toasts = bus
            .stream()
            .filter(|e| matches!(e, CoreEvent::Notification(_)));

        bus.emit(started("a")).unwrap();
        bus.emit(CoreEvent::Notification(Notification::warning(
            "not_found",
            "No playable result",
        )))
        .unwrap();

        match toasts.recv().await.unwrap() {
            CoreEvent::Notification(n) => {
                assert_eq!(n.kind, "not_found");
                assert_eq!(n.level, EventSeverity::Warning);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(toasts.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut rx = bus.stream();

        for i in 0..5 {
            bus.emit(started(&i.to_string())).unwrap();
        }

        assert!(matches!(rx.try_recv(), Some(Err(RecvError::Lagged(_)))));
    }

    #[test]
    fn test_event_severity() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            song_id: None,
            message: "boom".to_string(),
        });
        assert_eq!(error.severity(), EventSeverity::Error);

        let degraded = CoreEvent::Library(LibraryEvent::OfflineSaveFailed {
            song_id: "a".to_string(),
            reason: "quota".to_string(),
        });
        assert_eq!(degraded.severity(), EventSeverity::Warning);
        assert_eq!(degraded.description(), "Available for this session only");

        let position = CoreEvent::Playback(PlaybackEvent::PositionChanged {
            song_id: "a".to_string(),
            position_ms: 1,
            duration_ms: 2,
        });
        assert_eq!(position.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Playback(PlaybackEvent::StateChanged {
            from: PlaybackStatus::Idle,
            to: PlaybackStatus::Loading,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Playback");
        assert_eq!(json["payload"]["event"], "StateChanged");
        assert_eq!(json["payload"]["to"], "loading");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
