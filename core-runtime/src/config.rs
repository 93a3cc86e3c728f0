//! # Player Configuration Module
//!
//! ## Overview
//!
//! [`PlayerConfig`] holds the tunables of the playback core: progress sampling
//! rate, channel sizes, artwork cache size and a couple of behaviour switches.
//! It is built with a builder and validated fail-fast, so a bad value is
//! reported at startup instead of surfacing as odd runtime behaviour.
//!
//! Host bridges are not part of this struct; `core-service` bundles them in
//! `CoreDependencies`.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::PlayerConfig;
//! use std::time::Duration;
//!
//! let config = PlayerConfig::builder()
//!     .progress_interval(Duration::from_millis(500))
//!     .fetch_artwork(false)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.progress_interval(), Duration::from_millis(500));
//! ```
//!
//! The struct is also deserializable; missing fields take their defaults:
//!
//! ```
//! use core_runtime::config::PlayerConfig;
//!
//! let config: PlayerConfig = serde_json::from_str(r#"{"autoplay": false}"#).unwrap();
//! assert!(!config.autoplay);
//! assert_eq!(config.event_buffer_size, 100);
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default progress sampling interval (4 Hz).
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 250;
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_ARTWORK_CACHE_CAPACITY: usize = 16;

const MIN_PROGRESS_INTERVAL_MS: u64 = 10;
const MAX_PROGRESS_INTERVAL_MS: u64 = 10_000;

/// Playback core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Interval between progress samples while playing, in milliseconds.
    pub progress_interval_ms: u64,

    /// Per-subscriber event buffer. Slower subscribers lag.
    pub event_buffer_size: usize,

    /// Bound of the controller's command queue.
    pub command_queue_capacity: usize,

    /// Number of decoded artwork images kept in memory.
    pub artwork_cache_capacity: usize,

    /// Start playback as soon as a new source is loaded.
    pub autoplay: bool,

    /// Download artwork for the now-playing surface.
    pub fetch_artwork: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
            artwork_cache_capacity: DEFAULT_ARTWORK_CACHE_CAPACITY,
            autoplay: true,
            fetch_artwork: true,
        }
    }
}

impl PlayerConfig {
    /// Creates a new builder seeded with the defaults.
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Progress interval is between 10 ms and 10 s
    /// - Channel and cache sizes are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval_ms < MIN_PROGRESS_INTERVAL_MS {
            return Err(Error::Config(format!(
                "Progress interval must be at least {}ms",
                MIN_PROGRESS_INTERVAL_MS
            )));
        }

        if self.progress_interval_ms > MAX_PROGRESS_INTERVAL_MS {
            return Err(Error::Config(format!(
                "Progress interval exceeds maximum of {}ms",
                MAX_PROGRESS_INTERVAL_MS
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.command_queue_capacity == 0 {
            return Err(Error::Config(
                "Command queue capacity must be greater than 0".to_string(),
            ));
        }

        if self.artwork_cache_capacity == 0 {
            return Err(Error::Config(
                "Artwork cache capacity must be greater than 0. \
                 Use .fetch_artwork(false) to disable artwork instead."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`PlayerConfig`].
#[derive(Debug, Clone, Default)]
pub struct PlayerConfigBuilder {
    config: PlayerConfig,
}

impl PlayerConfigBuilder {
    /// Sets the progress sampling interval.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    pub fn command_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.command_queue_capacity = capacity;
        self
    }

    pub fn artwork_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.artwork_cache_capacity = capacity;
        self
    }

    pub fn autoplay(mut self, enabled: bool) -> Self {
        self.config.autoplay = enabled;
        self
    }

    pub fn fetch_artwork(mut self, enabled: bool) -> Self {
        self.config.fetch_artwork = enabled;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn build(self) -> Result<PlayerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
