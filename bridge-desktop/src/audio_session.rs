//! Desktop audio session.

use async_trait::async_trait;
use bridge_traits::{error::Result, AudioSessionControl};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Desktop platforms have no audio session to configure; this only tracks
/// whether the core currently holds one.
#[derive(Debug, Default)]
pub struct NoopAudioSession {
    active: AtomicBool,
}

impl NoopAudioSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSessionControl for NoopAudioSession {
    async fn activate(&self) -> Result<()> {
        if !self.active.swap(true, Ordering::SeqCst) {
            debug!("Audio session activated");
        }
        Ok(())
    }

    async fn deactivate(&self) -> Result<()> {
        if self.active.swap(false, Ordering::SeqCst) {
            debug!("Audio session deactivated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracks_activation() {
        let session = NoopAudioSession::new();
        assert!(!session.is_active());

        session.activate().await.unwrap();
        session.activate().await.unwrap();
        assert!(session.is_active());

        session.deactivate().await.unwrap();
        assert!(!session.is_active());
    }
}
