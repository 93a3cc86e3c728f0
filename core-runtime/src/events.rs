//! # Event Bus System
//!
//! Fan-out of player state, progress and duration events using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: [`AudioEvent`] and the derived [`PlaybackState`]
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐    emit     ┌───────────┐    subscribe   ┌────────────┐
//! │ Controller worker├────────────>│ EventBus  ├───────────────>│ Subscriber │
//! └──────────────────┘             │ (broadcast│                └────────────┘
//!                                  │  channel) │    subscribe   ┌────────────┐
//!                                  │           ├───────────────>│ Subscriber │
//!                                  └───────────┘                └────────────┘
//! ```
//!
//! Every event is produced by the single controller worker, so each
//! subscriber observes events in production order. Delivery is at most once:
//! a subscriber that subscribes late sees only later events, and a subscriber
//! that falls behind receives `RecvError::Lagged` instead of blocking the
//! producer.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AudioEvent, EventBus, PlaybackState};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.emit(AudioEvent::PlaybackState(PlaybackState::Playing)).ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.name(), "player-state");
//! # }
//! ```
//!
//! ## Wire format
//!
//! Events serialize as `{"type": <name>, "payload": <value>}` so a bridge
//! layer can forward them to an application unchanged:
//!
//! | Event | `type` | `payload` |
//! |-------|--------|-----------|
//! | `PlaybackState` | `player-state` | `"unknown"`, `"buffering"`, `"paused"`, `"playing"`, `"ended"` |
//! | `Progress` | `player-progress` | `12.5` |
//! | `Duration` | `player-duration` | `215.0`, or `-1` when unknown |

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Player state as seen by listeners.
///
/// Always derived from the engine's time-control status and the session's
/// intent, never stored as the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Unknown,
    Buffering,
    Paused,
    Playing,
    Ended,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Unknown => "unknown",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Paused => "paused",
            PlaybackState::Playing => "playing",
            PlaybackState::Ended => "ended",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event published to listeners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum AudioEvent {
    /// Derived player state changed.
    #[serde(rename = "player-state")]
    PlaybackState(PlaybackState),

    /// Periodic position sample while playing, in seconds. Never negative.
    #[serde(rename = "player-progress")]
    Progress(f64),

    /// Duration of the current item in seconds, or `-1` when unknown or live.
    #[serde(rename = "player-duration")]
    Duration(f64),
}

impl AudioEvent {
    /// Event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            AudioEvent::PlaybackState(_) => "player-state",
            AudioEvent::Progress(_) => "player-progress",
            AudioEvent::Duration(_) => "player-duration",
        }
    }

    /// Returns `true` for the high-frequency progress samples.
    pub fn is_progress(&self) -> bool {
        matches!(self, AudioEvent::Progress(_))
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to audio events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AudioEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when nobody is listening. Producers treat that error as a
    /// no-op.
    pub fn emit(&self, event: AudioEvent) -> Result<usize, SendError<AudioEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<AudioEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
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

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&AudioEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with predicate filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{AudioEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
///
/// // Everything except progress samples
/// let stream = EventStream::new(event_bus.subscribe()).filter(|event| !event.is_progress());
/// ```
pub struct EventStream {
    receiver: Receiver<AudioEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<AudioEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&AudioEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &AudioEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` once the bus is gone.
    pub async fn recv(&mut self) -> Result<AudioEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<AudioEvent, RecvError>> {
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

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(AudioEvent::Progress(1.0)).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = AudioEvent::PlaybackState(PlaybackState::Playing);
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_no_replay() {
        let bus = EventBus::new(10);
        let _early = bus.subscribe();
        bus.emit(AudioEvent::Duration(-1.0)).ok();

        let mut late = EventStream::new(bus.subscribe());
        assert!(late.try_recv().is_none());

        bus.emit(AudioEvent::Duration(200.0)).ok();
        assert_eq!(
            late.try_recv().unwrap().unwrap(),
            AudioEvent::Duration(200.0)
        );
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe()).filter(|event| !event.is_progress());

        bus.emit(AudioEvent::Progress(0.25)).ok();
        bus.emit(AudioEvent::PlaybackState(PlaybackState::Paused)).ok();

        let received = stream.recv().await.unwrap();
        assert_eq!(received, AudioEvent::PlaybackState(PlaybackState::Paused));
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());

        for i in 0..5 {
            bus.emit(AudioEvent::Progress(i as f64)).ok();
        }

        for i in 0..5 {
            assert_eq!(
                stream.recv().await.unwrap(),
                AudioEvent::Progress(i as f64)
            );
        }
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for i in 0..5 {
            bus.emit(AudioEvent::Progress(i as f64)).ok();
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_wire_format() {
        let state = serde_json::to_value(AudioEvent::PlaybackState(PlaybackState::Playing)).unwrap();
        assert_eq!(
            state,
            serde_json::json!({"type": "player-state", "payload": "playing"})
        );

        let progress = serde_json::to_value(AudioEvent::Progress(12.5)).unwrap();
        assert_eq!(
            progress,
            serde_json::json!({"type": "player-progress", "payload": 12.5})
        );

        let duration = serde_json::to_value(AudioEvent::Duration(-1.0)).unwrap();
        assert_eq!(duration["type"], "player-duration");
        assert_eq!(duration["payload"], -1.0);
    }

    #[test]
    fn test_event_names_match_serde() {
        for event in [
            AudioEvent::PlaybackState(PlaybackState::Ended),
            AudioEvent::Progress(0.0),
            AudioEvent::Duration(3.0),
        ] {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn test_playback_state_strings() {
        assert_eq!(PlaybackState::Buffering.as_str(), "buffering");
        assert_eq!(PlaybackState::default(), PlaybackState::Unknown);
        assert_eq!(PlaybackState::Ended.to_string(), "ended");
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::default();
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_closed_when_bus_dropped() {
        let bus = EventBus::new(4);
        let mut stream = EventStream::new(bus.subscribe());
        drop(bus);

        assert!(matches!(stream.recv().await, Err(RecvError::Closed)));
    }
}
