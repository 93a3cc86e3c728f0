//! # Playback Error Types
//!
//! Errors surfaced by the playback core. Only `play` can fail from the
//! application's point of view; every other command either applies or is a
//! silent no-op.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The source URI is missing, empty or cannot be parsed.
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// The engine could not load the media. Carries the engine's message.
    #[error("Failed to load source: {0}")]
    LoadFailed(String),

    /// The player factory refused to create a handle.
    #[error("Failed to create player: {0}")]
    HandleCreation(String),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// A newer `play` or a `stop` replaced the source before it became ready.
    #[error("Playback request superseded")]
    Superseded,

    /// The controller worker is gone.
    #[error("Playback controller is not running")]
    ControllerClosed,
}

impl PlaybackError {
    /// Returns `true` if the error is about the source itself rather than
    /// the state of the player.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidSource(_) | PlaybackError::LoadFailed(_)
        )
    }

    /// Returns `true` if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::LoadFailed(_) | PlaybackError::HandleCreation(_)
        )
    }
}

impl From<BridgeError> for PlaybackError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::LoadFailed(message) => PlaybackError::LoadFailed(message),
            other => PlaybackError::HandleCreation(other.to_string()),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(PlaybackError::InvalidSource("".into()).is_source_error());
        assert!(PlaybackError::LoadFailed("404".into()).is_source_error());
        assert!(!PlaybackError::Superseded.is_source_error());

        assert!(PlaybackError::LoadFailed("timeout".into()).is_transient());
        assert!(!PlaybackError::InvalidSource("x".into()).is_transient());
        assert!(!PlaybackError::ControllerClosed.is_transient());
    }

    #[test]
    fn test_from_bridge_error() {
        let load: PlaybackError = BridgeError::LoadFailed("codec".into()).into();
        assert_eq!(load, PlaybackError::LoadFailed("codec".into()));

        let other: PlaybackError = BridgeError::NotAvailable("engine".into()).into();
        assert!(matches!(other, PlaybackError::HandleCreation(msg) if msg.contains("engine")));
    }
}
