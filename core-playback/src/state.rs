//! Session phases and derived playback state.

use bridge_traits::{MediaDuration, TimeControlStatus};
use core_runtime::events::PlaybackState;
use serde::{Deserialize, Serialize};

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No source.
    #[default]
    Idle,
    /// A handle exists but has not reported ready.
    Loading,
    /// The handle is ready; playing, paused or buffering.
    Ready,
    /// The item played to its end.
    Ended,
    /// The last source failed to load. Behaves like `Idle`.
    Failed,
}

impl SessionPhase {
    /// Phases in which pause/resume/seek reach the handle.
    pub fn accepts_transport(&self) -> bool {
        matches!(self, SessionPhase::Loading | SessionPhase::Ready)
    }
}

/// Derive the listener-facing state.
///
/// The engine's time-control status wins when known. Before the engine has
/// reported anything, requested playback counts as buffering.
pub fn derive_state(
    phase: SessionPhase,
    time_control: Option<TimeControlStatus>,
    desired_playing: bool,
) -> PlaybackState {
    match (phase, time_control) {
        (SessionPhase::Idle | SessionPhase::Failed, _) => PlaybackState::Unknown,
        (SessionPhase::Ended, _) => PlaybackState::Ended,
        (_, Some(TimeControlStatus::Playing)) => PlaybackState::Playing,
        (_, Some(TimeControlStatus::WaitingToPlay)) => PlaybackState::Buffering,
        (SessionPhase::Loading, _) if desired_playing => PlaybackState::Buffering,
        (_, None) if desired_playing => PlaybackState::Buffering,
        (SessionPhase::Loading, None) => PlaybackState::Unknown,
        _ => PlaybackState::Paused,
    }
}

/// Point-in-time view of the session, for diagnostics.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub state: PlaybackState,
    pub uri: Option<String>,
    pub position: f64,
    pub duration: MediaDuration,
    pub desired_playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_and_ended() {
        assert_eq!(
            derive_state(SessionPhase::Idle, Some(TimeControlStatus::Playing), true),
            PlaybackState::Unknown
        );
        assert_eq!(
            derive_state(SessionPhase::Ended, Some(TimeControlStatus::Playing), false),
            PlaybackState::Ended
        );
    }

    #[test]
    fn test_loading() {
        assert_eq!(
            derive_state(SessionPhase::Loading, None, true),
            PlaybackState::Buffering
        );
        assert_eq!(
            derive_state(SessionPhase::Loading, None, false),
            PlaybackState::Unknown
        );
        assert_eq!(
            derive_state(SessionPhase::Loading, Some(TimeControlStatus::Paused), false),
            PlaybackState::Paused
        );
    }

    #[test]
    fn test_ready_follows_engine() {
        assert_eq!(
            derive_state(SessionPhase::Ready, Some(TimeControlStatus::Playing), true),
            PlaybackState::Playing
        );
        assert_eq!(
            derive_state(SessionPhase::Ready, Some(TimeControlStatus::WaitingToPlay), true),
            PlaybackState::Buffering
        );
        assert_eq!(
            derive_state(SessionPhase::Ready, Some(TimeControlStatus::Paused), true),
            PlaybackState::Paused
        );
        assert_eq!(
            derive_state(SessionPhase::Ready, None, false),
            PlaybackState::Paused
        );
        assert_eq!(
            derive_state(SessionPhase::Ready, None, true),
            PlaybackState::Buffering
        );
    }

    #[test]
    fn test_transport_phases() {
        assert!(SessionPhase::Loading.accepts_transport());
        assert!(SessionPhase::Ready.accepts_transport());
        assert!(!SessionPhase::Ended.accepts_transport());
        assert!(!SessionPhase::Failed.accepts_transport());
    }
}
