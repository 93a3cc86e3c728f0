//! # Host Bridge Traits
//!
//! Platform abstraction traits that each host platform implements for the
//! now-playing core.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the
//! platform. Each trait is a capability the core needs but cannot implement
//! portably: the media engine, the lock-screen surface, artwork download and
//! the OS audio session.
//!
//! ## Traits
//!
//! ### Playback
//! - [`PlayerFactory`](player::PlayerFactory) / [`PlayerHandle`](player::PlayerHandle) - Native media engine
//! - [`PlayerEventSink`](player::PlayerEventSink) - Callback slot bound to one handle
//!
//! ### OS Integration
//! - [`NowPlayingSurface`](now_playing::NowPlayingSurface) - Lock screen / notification metadata
//! - [`RemoteCommandHandler`](now_playing::RemoteCommandHandler) - Transport commands coming back from the OS
//! - [`AudioSessionControl`](audio_session::AudioSessionControl) - Session activation and remote-control reception
//! - [`ArtworkFetcher`](artwork::ArtworkFetcher) - Artwork download and decode
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Engine | Surface |
//! |----------|--------|---------|
//! | iOS      | AVPlayer | MPNowPlayingInfoCenter |
//! | Android  | ExoPlayer | MediaSession + notification |
//! | Desktop  | host supplied | `bridge-desktop` in-memory surface |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert engine errors into it and keep the engine's message, since
//! load failures are reported to the application verbatim.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`. Handles are driven from a single
//! worker task, but sinks may be invoked from any engine thread.

pub mod artwork;
pub mod audio_session;
pub mod error;
pub mod logging;
pub mod now_playing;
pub mod player;

pub use error::BridgeError;

// Re-export commonly used types
pub use artwork::{ArtworkFetcher, ArtworkImage};
pub use audio_session::AudioSessionControl;
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use now_playing::{
    Interruption, NowPlayingInfo, NowPlayingProperty, NowPlayingSurface, NowPlayingUpdate,
    RemoteCommand, RemoteCommandHandler, RemoteCommandKind, RemoteCommandStatus,
};
pub use player::{
    HandleEvent, MediaDuration, PlaybackSessionId, PlayerEventSink, PlayerFactory, PlayerHandle,
    PlayerStatus, TimeControlStatus,
};
