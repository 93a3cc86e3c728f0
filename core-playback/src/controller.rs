//! # Player Controller
//!
//! Serializes every input of the playback core through one queue.
//!
//! ## Overview
//!
//! [`PlayerController`] is the cloneable front door. Each command is posted as
//! a [`Message`] on a bounded `tokio::sync::mpsc` channel and answered through
//! a `oneshot`. A single [`ControllerWorker`] task owns the
//! [`Session`](crate::session::Session) and applies messages one at a time.
//! Player callbacks, progress ticks, artwork results and remote commands all
//! enter through the same queue, so there is exactly one order of events.
//!
//! ```text
//! app ──┐
//!       │  Command   ┌───────────────┐          ┌─────────┐
//! OS ───┼───────────>│ mpsc (bounded)├─────────>│ Session │──> EventBus
//!       │  Player    └───────────────┘  worker  └─────────┘──> NowPlayingSurface
//! sink ─┤  Tick
//! ticker┘  ArtworkLoaded
//! ```
//!
//! Background producers (sinks, tickers, artwork tasks, the remote router)
//! only hold weak senders. Dropping the last `PlayerController` closes the
//! queue; the worker then stops playback and exits.

use crate::error::{PlaybackError, Result};
use crate::remote::RemoteCommandRouter;
use crate::session::Session;
use crate::source::{Source, SourceMetadata};
use crate::state::SessionSnapshot;
use bridge_traits::{
    ArtworkFetcher, ArtworkImage, AudioSessionControl, HandleEvent, Interruption,
    NowPlayingSurface, PlaybackSessionId, PlayerFactory, RemoteCommandHandler,
};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{AudioEvent, EventBus, EventStream, Receiver};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Host capabilities the playback core drives.
#[derive(Clone)]
pub struct PlaybackBridges {
    pub player_factory: Arc<dyn PlayerFactory>,
    pub surface: Arc<dyn NowPlayingSurface>,
    pub artwork_fetcher: Option<Arc<dyn ArtworkFetcher>>,
    pub audio_session: Option<Arc<dyn AudioSessionControl>>,
}

impl PlaybackBridges {
    pub fn new(player_factory: Arc<dyn PlayerFactory>, surface: Arc<dyn NowPlayingSurface>) -> Self {
        Self {
            player_factory,
            surface,
            artwork_fetcher: None,
            audio_session: None,
        }
    }

    pub fn with_artwork_fetcher(mut self, fetcher: Arc<dyn ArtworkFetcher>) -> Self {
        self.artwork_fetcher = Some(fetcher);
        self
    }

    pub fn with_audio_session(mut self, session: Arc<dyn AudioSessionControl>) -> Self {
        self.audio_session = Some(session);
        self
    }
}

impl fmt::Debug for PlaybackBridges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackBridges")
            .field("player_factory", &"PlayerFactory { ... }")
            .field("surface", &"NowPlayingSurface { ... }")
            .field("artwork_fetcher", &self.artwork_fetcher.is_some())
            .field("audio_session", &self.audio_session.is_some())
            .finish()
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    Application,
    /// Lock screen, notification, headset buttons or an interruption.
    Remote,
}

/// Commands applied to the session.
#[derive(Debug, Clone)]
pub enum Command {
    Play(Source),
    Pause,
    Resume,
    TogglePlayPause,
    SeekTo(f64),
    Update(SourceMetadata),
    Stop,
    Interruption(Interruption),
    Snapshot,
}

/// How the session disposed of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Applied, or accepted as a no-op.
    Applied,
    /// There was no source to act on.
    NoActionableSession,
    Snapshot(SessionSnapshot),
}

pub(crate) type Responder = oneshot::Sender<Result<CommandOutcome>>;

/// Everything the worker consumes.
#[derive(Debug)]
pub(crate) enum Message {
    Command {
        command: Command,
        origin: CommandOrigin,
        reply: Responder,
    },
    Player {
        session_id: PlaybackSessionId,
        event: HandleEvent,
    },
    Tick {
        session_id: PlaybackSessionId,
    },
    ArtworkLoaded {
        uri: String,
        image: Option<Arc<ArtworkImage>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ============================================================================
// Controller
// ============================================================================

/// Cloneable handle to the playback core.
#[derive(Clone)]
pub struct PlayerController {
    sender: mpsc::Sender<Message>,
    events: EventBus,
}

impl PlayerController {
    /// Start the worker task and attach the remote command router to the
    /// surface.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(bridges: PlaybackBridges, config: PlayerConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.command_queue_capacity.max(1));
        let events = EventBus::new(config.event_buffer_size.max(1));
        let controller = Self {
            sender,
            events: events.clone(),
        };

        let router = RemoteCommandRouter::new(controller.downgrade());
        bridges.surface.attach_remote_handler(Arc::new(router));

        let session = Session::new(bridges, config, events, controller.sender.downgrade());
        tokio::spawn(ControllerWorker { receiver, session }.run());

        controller
    }

    /// Play `source`.
    ///
    /// Resolves once the source is ready. The same URI as the current source
    /// resumes playback and resolves immediately.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidSource`] for an empty or unparseable URI
    /// - [`PlaybackError::HandleCreation`] if no player could be created
    /// - [`PlaybackError::LoadFailed`] if the engine could not load the media
    /// - [`PlaybackError::Superseded`] if another source or `stop` came first
    pub async fn play(&self, source: Source) -> Result<()> {
        self.dispatch(Command::Play(source), CommandOrigin::Application)
            .await
            .map(|_| ())
    }

    pub async fn pause(&self) {
        self.send_quietly(Command::Pause).await;
    }

    pub async fn resume(&self) {
        self.send_quietly(Command::Resume).await;
    }

    pub async fn toggle_play_pause(&self) {
        self.send_quietly(Command::TogglePlayPause).await;
    }

    /// Seek to an absolute position. Negative or non-finite values are
    /// ignored; values past the end are left to the engine.
    pub async fn seek_to(&self, seconds: f64) {
        self.send_quietly(Command::SeekTo(seconds)).await;
    }

    /// Replace the current source's metadata without touching playback.
    pub async fn update(&self, metadata: SourceMetadata) {
        self.send_quietly(Command::Update(metadata)).await;
    }

    /// Release the player and clear the now-playing surface.
    pub async fn stop(&self) {
        self.send_quietly(Command::Stop).await;
    }

    /// Current session state; an idle snapshot once the worker is gone.
    pub async fn snapshot(&self) -> SessionSnapshot {
        match self
            .dispatch(Command::Snapshot, CommandOrigin::Application)
            .await
        {
            Ok(CommandOutcome::Snapshot(snapshot)) => snapshot,
            _ => SessionSnapshot::default(),
        }
    }

    pub fn subscribe(&self) -> Receiver<AudioEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Remote command handler bound to this controller, for hosts that
    /// receive transport commands outside the now-playing surface.
    pub fn remote_handler(&self) -> Arc<dyn RemoteCommandHandler> {
        Arc::new(RemoteCommandRouter::new(self.downgrade()))
    }

    /// Stop playback and end the worker. Later commands are ignored.
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.sender.send(Message::Shutdown { reply }).await.is_ok() {
            done.await.ok();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) fn downgrade(&self) -> WeakPlayerController {
        WeakPlayerController {
            sender: self.sender.downgrade(),
            events: self.events.clone(),
        }
    }

    pub(crate) async fn dispatch(
        &self,
        command: Command,
        origin: CommandOrigin,
    ) -> Result<CommandOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.sender
            .send(Message::Command {
                command,
                origin,
                reply,
            })
            .await
            .map_err(|_| PlaybackError::ControllerClosed)?;

        outcome.await.map_err(|_| PlaybackError::ControllerClosed)?
    }

    async fn send_quietly(&self, command: Command) {
        if let Err(e) = self.dispatch(command, CommandOrigin::Application).await {
            debug!(error = %e, "Command dropped");
        }
    }
}

impl fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerController")
            .field("closed", &self.is_closed())
            .field("events", &self.events)
            .finish()
    }
}

/// Controller reference that does not keep the worker alive.
#[derive(Clone)]
pub(crate) struct WeakPlayerController {
    sender: mpsc::WeakSender<Message>,
    events: EventBus,
}

impl WeakPlayerController {
    pub(crate) fn upgrade(&self) -> Option<PlayerController> {
        self.sender.upgrade().map(|sender| PlayerController {
            sender,
            events: self.events.clone(),
        })
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Owns the session and applies queued messages in order.
pub(crate) struct ControllerWorker {
    receiver: mpsc::Receiver<Message>,
    session: Session,
}

impl ControllerWorker {
    pub(crate) async fn run(mut self) {
        self.session.start().await;
        debug!("Player controller started");

        while let Some(message) = self.receiver.recv().await {
            let shutdown = matches!(message, Message::Shutdown { .. });
            self.session.handle(message).await;
            if shutdown {
                info!("Player controller shut down");
                return;
            }
        }

        // Every controller was dropped.
        self.session.shutdown().await;
        info!("Player controller closed");
    }
}
