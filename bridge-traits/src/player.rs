//! Native player bridge traits.
//!
//! A host platform wraps its media engine (AVPlayer, ExoPlayer, a desktop
//! decoder pipeline, ...) behind [`PlayerHandle`] and hands out new handles
//! through a [`PlayerFactory`]. The core never talks to the engine in any
//! other way.
//!
//! Engine callbacks (status, time control, end of media, ...) are reported
//! through the [`PlayerEventSink`] passed to [`PlayerFactory::create`]. The
//! sink is bound to exactly one handle. Once the core tears that handle down
//! it revokes the sink, and anything the engine reports afterwards is
//! discarded at the sink instead of leaking into the next session.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for one handle's lifetime.
///
/// Every handle created by the core gets a fresh identifier; events and
/// timer ticks carry it so the core can drop anything addressed to a handle
/// that has since been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Media duration as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MediaDuration {
    /// The item has not reported a duration yet.
    #[default]
    Unknown,
    /// Unbounded duration (live stream).
    Indefinite,
    /// Finite duration in seconds.
    Finite(f64),
}

impl MediaDuration {
    /// Map a raw engine value in seconds.
    ///
    /// Infinite values are live streams; NaN and negative values are treated
    /// as not yet known.
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds.is_infinite() && seconds > 0.0 {
            MediaDuration::Indefinite
        } else if seconds.is_finite() && seconds >= 0.0 {
            MediaDuration::Finite(seconds)
        } else {
            MediaDuration::Unknown
        }
    }

    /// Finite duration in seconds, if any.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            MediaDuration::Finite(s) => Some(*s),
            _ => None,
        }
    }

    /// Value published to listeners: seconds, or `-1` when unknown or live.
    pub fn as_event_seconds(&self) -> f64 {
        self.seconds().unwrap_or(-1.0)
    }

    /// Returns `true` for live (unbounded) streams.
    pub fn is_live(&self) -> bool {
        matches!(self, MediaDuration::Indefinite)
    }
}

/// Readiness of the media item loaded in a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerStatus {
    /// The item is ready to play.
    ReadyToPlay,
    /// The item failed to load; the message comes from the engine.
    Failed { message: String },
}

/// Engine time-control status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeControlStatus {
    Paused,
    /// Playback was requested but the engine is waiting for data.
    WaitingToPlay,
    Playing,
}

/// Asynchronous notifications a handle reports through its sink.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleEvent {
    Status(PlayerStatus),
    TimeControl(TimeControlStatus),
    DurationChanged(MediaDuration),
    RateChanged(f32),
    /// The item played to its end.
    Ended,
}

type Deliver = dyn Fn(PlaybackSessionId, HandleEvent) + Send + Sync;

/// Callback slot bound to a single handle.
///
/// Cloning is cheap; all clones share the same revocation flag.
#[derive(Clone)]
pub struct PlayerEventSink {
    session_id: PlaybackSessionId,
    revoked: Arc<AtomicBool>,
    deliver: Arc<Deliver>,
}

impl PlayerEventSink {
    /// Create a sink that forwards events for `session_id` to `deliver`.
    pub fn new<F>(session_id: PlaybackSessionId, deliver: F) -> Self
    where
        F: Fn(PlaybackSessionId, HandleEvent) + Send + Sync + 'static,
    {
        Self {
            session_id,
            revoked: Arc::new(AtomicBool::new(false)),
            deliver: Arc::new(deliver),
        }
    }

    /// Identifier of the handle this sink belongs to.
    pub fn session_id(&self) -> PlaybackSessionId {
        self.session_id
    }

    /// Report an engine event. Returns `false` if the sink was revoked and
    /// the event was discarded.
    pub fn emit(&self, event: HandleEvent) -> bool {
        if self.is_revoked() {
            return false;
        }
        (self.deliver)(self.session_id, event);
        true
    }

    /// Stop forwarding. Takes effect immediately for every clone.
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for PlayerEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerEventSink")
            .field("session_id", &self.session_id)
            .field("revoked", &self.is_revoked())
            .finish()
    }
}

/// One native media player instance playing one URI.
#[async_trait::async_trait]
pub trait PlayerHandle: Send + Sync {
    /// Begin or resume playback.
    async fn play(&mut self) -> Result<()>;

    /// Pause without releasing the item.
    async fn pause(&mut self) -> Result<()>;

    /// Seek to an absolute position in seconds. Clamping to the item's
    /// bounds is left to the engine.
    async fn seek(&mut self, seconds: f64) -> Result<()>;

    /// Stop playback.
    async fn stop(&mut self) -> Result<()>;

    /// Release native resources. The handle is dropped right after.
    async fn release(&mut self) -> Result<()>;

    /// Current playback position in seconds.
    fn current_position(&self) -> f64;

    /// Duration of the loaded item.
    fn duration(&self) -> MediaDuration;

    /// Current playback rate (0.0 when paused).
    fn rate(&self) -> f32;
}

/// Creates player handles.
#[async_trait::async_trait]
pub trait PlayerFactory: Send + Sync {
    /// Create a handle for `uri` and start loading it. Status changes must be
    /// reported through `sink`, never synchronously from inside this call.
    async fn create(&self, uri: &str, sink: PlayerEventSink) -> Result<Box<dyn PlayerHandle>>;
}
