//! OS audio session bridge.
//!
//! Covers the platform bookkeeping around one active playback session:
//! - **iOS**: `AVAudioSession` category/activation and
//!   `begin/endReceivingRemoteControlEvents`
//! - **Android**: audio focus and the foreground media service
//! - **Desktop**: usually nothing
//!
//! The core activates the session when a new source starts and deactivates it
//! on `stop`. Errors are logged by the core and never reach the caller.

use crate::error::Result;

#[async_trait::async_trait]
pub trait AudioSessionControl: Send + Sync {
    /// Configure the playback category, activate the session and start
    /// receiving remote-control events.
    async fn activate(&self) -> Result<()>;

    /// Deactivate the session and stop receiving remote-control events.
    async fn deactivate(&self) -> Result<()>;
}
