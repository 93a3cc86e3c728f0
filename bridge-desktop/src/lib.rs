//! # Desktop Bridge Implementations
//!
//! Default implementations of the host bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `ArtworkFetcher` using `reqwest`, decoded with `image`
//! - `NowPlayingSurface` kept in memory, with command injection for hosts
//!   that route media keys themselves
//! - `AudioSessionControl` as no-op (desktop has no audio session category)
//!
//! Player engines are not provided here; hosts inject their own
//! `PlayerFactory`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HttpArtworkFetcher, InMemoryNowPlayingSurface, NoopAudioSession};
//! use core_playback::PlaybackBridges;
//! use std::sync::Arc;
//!
//! let bridges = PlaybackBridges::new(factory, Arc::new(InMemoryNowPlayingSurface::new()))
//!     .with_artwork_fetcher(Arc::new(HttpArtworkFetcher::new()?))
//!     .with_audio_session(Arc::new(NoopAudioSession::new()));
//! ```

mod artwork;
mod audio_session;
mod surface;

pub use artwork::{decode_artwork, HttpArtworkFetcher, DEFAULT_MAX_ARTWORK_BYTES};
pub use audio_session::NoopAudioSession;
pub use surface::InMemoryNowPlayingSurface;
