//! # Playback Session Core
//!
//! Drives a single native media player and keeps listeners and the OS
//! now-playing surface consistent with it.
//!
//! ## Overview
//!
//! This module handles:
//! - The session state machine (`Idle → Loading → Ready → Ended`, `Failed`)
//! - Serialized command handling for application and remote commands
//! - Progress sampling while playing
//! - Merge-style now-playing updates, artwork fetching and remote seek
//!   enablement
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackBridges, PlayerController, Source, SourceMetadata};
//! use core_runtime::config::PlayerConfig;
//!
//! let controller = PlayerController::spawn(
//!     PlaybackBridges::new(player_factory, surface),
//!     PlayerConfig::default(),
//! );
//! let mut events = controller.subscribe();
//!
//! controller
//!     .play(Source::new("https://cdn.example.com/ep1.mp3", SourceMetadata::new("Episode 1")))
//!     .await?;
//! ```

pub mod artwork_cache;
pub mod controller;
pub mod error;
pub mod now_playing;
pub mod remote;
pub mod session;
pub mod source;
pub mod state;
pub mod ticker;

pub use artwork_cache::ArtworkCache;
pub use controller::{Command, CommandOrigin, CommandOutcome, PlaybackBridges, PlayerController};
pub use error::{PlaybackError, Result};
pub use now_playing::{NowPlayingPublisher, NowPlayingSnapshot};
pub use remote::RemoteCommandRouter;
pub use source::{Source, SourceMetadata};
pub use state::{derive_state, SessionPhase, SessionSnapshot};
pub use ticker::ProgressTicker;
