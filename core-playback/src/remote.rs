//! Routes OS transport commands into the controller queue.

use crate::controller::{Command, CommandOrigin, CommandOutcome, WeakPlayerController};
use bridge_traits::{Interruption, RemoteCommand, RemoteCommandHandler, RemoteCommandStatus};
use tracing::debug;

/// [`RemoteCommandHandler`] attached to the now-playing surface.
///
/// Remote commands take the same path as application commands and never
/// touch session state directly. Holds only a weak controller reference, so
/// a surface that outlives the controller reports `CommandFailed`.
pub struct RemoteCommandRouter {
    controller: WeakPlayerController,
}

impl RemoteCommandRouter {
    pub(crate) fn new(controller: WeakPlayerController) -> Self {
        Self { controller }
    }
}

fn to_command(command: RemoteCommand) -> Command {
    match command {
        RemoteCommand::Play => Command::Resume,
        RemoteCommand::Pause => Command::Pause,
        RemoteCommand::TogglePlayPause => Command::TogglePlayPause,
        RemoteCommand::Stop => Command::Stop,
        RemoteCommand::ChangePlaybackPosition(seconds) => Command::SeekTo(seconds),
    }
}

#[async_trait::async_trait]
impl RemoteCommandHandler for RemoteCommandRouter {
    async fn handle_command(&self, command: RemoteCommand) -> RemoteCommandStatus {
        let Some(controller) = self.controller.upgrade() else {
            return RemoteCommandStatus::CommandFailed;
        };

        debug!(?command, "Remote command");
        let is_stop = matches!(command, RemoteCommand::Stop);
        match controller
            .dispatch(to_command(command), CommandOrigin::Remote)
            .await
        {
            Ok(CommandOutcome::NoActionableSession) if !is_stop => {
                RemoteCommandStatus::NoActionableSession
            }
            Ok(_) => RemoteCommandStatus::Success,
            Err(e) => {
                debug!(error = %e, "Remote command failed");
                RemoteCommandStatus::CommandFailed
            }
        }
    }

    async fn handle_interruption(&self, interruption: Interruption) {
        let Some(controller) = self.controller.upgrade() else {
            return;
        };

        debug!(?interruption, "Audio interruption");
        controller
            .dispatch(Command::Interruption(interruption), CommandOrigin::Remote)
            .await
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_mapping() {
        assert!(matches!(to_command(RemoteCommand::Play), Command::Resume));
        assert!(matches!(to_command(RemoteCommand::Pause), Command::Pause));
        assert!(matches!(
            to_command(RemoteCommand::TogglePlayPause),
            Command::TogglePlayPause
        ));
        assert!(matches!(to_command(RemoteCommand::Stop), Command::Stop));
        assert!(matches!(
            to_command(RemoteCommand::ChangePlaybackPosition(12.0)),
            Command::SeekTo(s) if s == 12.0
        ));
    }
}
