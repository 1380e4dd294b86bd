//! # Playback Error Types
//!
//! Every failure the resolution and playback layer can report. The first
//! four variants are the user-facing taxonomy; each is turned into a
//! transient notification at the controller boundary and none is retried.

use bridge_traits::error::BridgeError;
use core_runtime::events::PlaybackStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during resolution and playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Taxonomy
    // ========================================================================
    /// The request was rejected or the transport failed.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The request did not complete within the deadline and was aborted.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered but yielded no usable audio reference.
    #[error("No playable audio found for {0}")]
    NotFound(String),

    /// Blob storage rejected a read or write.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// The audio output rejected a command.
    #[error("Playback failed: {0}")]
    PlaybackFailure(String),

    // ========================================================================
    // Control Flow
    // ========================================================================
    /// Operation not allowed in the current controller state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: PlaybackStatus,
    },

    /// A newer selection replaced this one before it completed.
    #[error("Selection superseded by a newer request")]
    Superseded,

    #[error("Queue is empty")]
    EmptyQueue,

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Network,
    NotFound,
    Storage,
    Playback,
    Other,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Network => "network_failure",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Storage => "storage_failure",
            ErrorClass::Playback => "playback_failure",
            ErrorClass::Other => "error",
        }
    }
}

impl PlaybackError {
    pub fn network(err: BridgeError) -> Self {
        match err {
            BridgeError::Timeout(message) => PlaybackError::NetworkFailure(format!(
                "timed out: {}",
                message
            )),
            other => PlaybackError::NetworkFailure(other.to_string()),
        }
    }

    pub fn storage(err: BridgeError) -> Self {
        PlaybackError::StorageFailure(err.to_string())
    }

    pub fn output(err: BridgeError) -> Self {
        PlaybackError::PlaybackFailure(err.to_string())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            PlaybackError::NetworkFailure(_) | PlaybackError::Timeout(_) => ErrorClass::Network,
            PlaybackError::NotFound(_) => ErrorClass::NotFound,
            PlaybackError::StorageFailure(_) => ErrorClass::Storage,
            PlaybackError::PlaybackFailure(_) => ErrorClass::Playback,
            _ => ErrorClass::Other,
        }
    }

    /// Class reported when selecting a song fails. A resolution that never
    /// answered leaves nothing to play, so it surfaces as a playback failure.
    pub fn selection_class(&self) -> ErrorClass {
        match self {
            PlaybackError::Timeout(_) => ErrorClass::Playback,
            other => other.class(),
        }
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        self.class() == ErrorClass::Network
    }

    /// Whether the error should reach the user as a notification.
    ///
    /// Superseded selections and state rejections are expected during normal
    /// interaction and stay silent.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            PlaybackError::Superseded | PlaybackError::InvalidState { .. }
        )
    }

    /// Short message for the transient notification.
    pub fn user_message(&self) -> String {
        match self {
            PlaybackError::NetworkFailure(_) => {
                "Could not reach the music server. Check your connection.".to_string()
            }
            PlaybackError::Timeout(_) => {
                "The music server took too long to answer.".to_string()
            }
            PlaybackError::NotFound(title) => format!("No playable audio found for \"{}\".", title),
            PlaybackError::StorageFailure(_) => {
                "Offline storage is unavailable. Available for this session only.".to_string()
            }
            PlaybackError::PlaybackFailure(_) => "Playback could not start.".to_string(),
            PlaybackError::EmptyQueue => "Nothing queued.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
