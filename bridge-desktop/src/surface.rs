//! In-process now-playing surface.
//!
//! Desktop hosts without a system media integration (or headless tools and
//! tests) use this surface to see exactly what the core publishes. It keeps
//! the merged [`NowPlayingInfo`], the enabled transport commands and the
//! attached handler, and lets the host inject transport commands the way an
//! OS media key or lock screen would.

use async_trait::async_trait;
use bridge_traits::{
    error::Result, Interruption, NowPlayingInfo, NowPlayingSurface, NowPlayingUpdate,
    RemoteCommand, RemoteCommandHandler, RemoteCommandKind, RemoteCommandStatus,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Default)]
pub struct InMemoryNowPlayingSurface {
    info: RwLock<Option<NowPlayingInfo>>,
    commands: RwLock<HashMap<RemoteCommandKind, bool>>,
    handler: RwLock<Option<Arc<dyn RemoteCommandHandler>>>,
}

impl InMemoryNowPlayingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the surface currently shows; `None` when cleared.
    pub fn info(&self) -> Option<NowPlayingInfo> {
        self.info.read().clone()
    }

    pub fn is_command_enabled(&self, command: RemoteCommandKind) -> bool {
        self.commands.read().get(&command).copied().unwrap_or(false)
    }

    pub fn has_handler(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Deliver a transport command as the OS would.
    ///
    /// Disabled commands never reach the handler.
    pub async fn send_command(&self, command: RemoteCommand) -> RemoteCommandStatus {
        if !self.is_command_enabled(command.kind()) {
            debug!(?command, "Remote command disabled");
            return RemoteCommandStatus::CommandFailed;
        }
        let Some(handler) = self.handler.read().clone() else {
            return RemoteCommandStatus::NoActionableSession;
        };
        handler.handle_command(command).await
    }

    /// Deliver an audio interruption as the OS would.
    pub async fn send_interruption(&self, interruption: Interruption) {
        let handler = self.handler.read().clone();
        if let Some(handler) = handler {
            handler.handle_interruption(interruption).await;
        }
    }
}

#[async_trait]
impl NowPlayingSurface for InMemoryNowPlayingSurface {
    async fn update(&self, update: NowPlayingUpdate) -> Result<()> {
        trace!(properties = update.len(), "Now-playing update");
        self.info
            .write()
            .get_or_insert_with(NowPlayingInfo::default)
            .apply(&update);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        debug!("Now-playing cleared");
        *self.info.write() = None;
        Ok(())
    }

    async fn set_command_enabled(&self, command: RemoteCommandKind, enabled: bool) -> Result<()> {
        debug!(?command, enabled, "Remote command toggled");
        self.commands.write().insert(command, enabled);
        Ok(())
    }

    fn attach_remote_handler(&self, handler: Arc<dyn RemoteCommandHandler>) {
        *self.handler.write() = Some(handler);
    }
}
