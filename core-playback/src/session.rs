//! # Session State Machine
//!
//! The single mutable root of the playback core. Owned by the controller
//! worker and never shared.
//!
//! A session holds at most one [`ActiveSource`]: the source, the player
//! handle created for it and everything learned from that handle. Starting a
//! new source always tears the old handle down first (sink revoked, ticker
//! stopped, handle stopped and released) before the next handle is created.
//! Messages carry the [`PlaybackSessionId`] of the handle they belong to and
//! anything addressed to a replaced handle is dropped.

use crate::artwork_cache::ArtworkCache;
use crate::controller::{
    Command, CommandOrigin, CommandOutcome, Message, PlaybackBridges, Responder,
};
use crate::error::PlaybackError;
use crate::now_playing::{NowPlayingPublisher, NowPlayingSnapshot};
use crate::source::{Source, SourceMetadata};
use crate::state::{derive_state, SessionPhase, SessionSnapshot};
use crate::ticker::ProgressTicker;
use bridge_traits::{
    ArtworkFetcher, ArtworkImage, AudioSessionControl, HandleEvent, Interruption, MediaDuration,
    PlaybackSessionId, PlayerEventSink, PlayerFactory, PlayerHandle, PlayerStatus,
    TimeControlStatus,
};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{AudioEvent, EventBus, PlaybackState};
use core_runtime::logging::redact_uri;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::WeakSender;
use tracing::{debug, info, trace, warn};

/// The source currently loaded, with its handle.
struct ActiveSource {
    source: Source,
    session_id: PlaybackSessionId,
    handle: Box<dyn PlayerHandle>,
    sink: PlayerEventSink,
    ticker: Option<ProgressTicker>,
    desired_playing: bool,
    last_position: f64,
    duration: MediaDuration,
    rate: f32,
    time_control: Option<TimeControlStatus>,
    /// Reply of the `play` call waiting for readiness.
    pending_play: Option<Responder>,
}

impl ActiveSource {
    fn sample_position(&self) -> f64 {
        sanitize_position(self.handle.current_position())
    }

    fn snapshot(&self) -> NowPlayingSnapshot<'_> {
        NowPlayingSnapshot {
            source: &self.source,
            elapsed: self.last_position,
            duration: self.duration,
            rate: self.rate,
        }
    }
}

pub(crate) struct Session {
    current: Option<ActiveSource>,
    phase: SessionPhase,
    last_state: PlaybackState,
    publisher: NowPlayingPublisher,
    events: EventBus,
    factory: Arc<dyn PlayerFactory>,
    audio_session: Option<Arc<dyn AudioSessionControl>>,
    artwork_fetcher: Option<Arc<dyn ArtworkFetcher>>,
    artwork_cache: ArtworkCache,
    config: PlayerConfig,
    queue: WeakSender<Message>,
}

impl Session {
    pub(crate) fn new(
        bridges: PlaybackBridges,
        config: PlayerConfig,
        events: EventBus,
        queue: WeakSender<Message>,
    ) -> Self {
        Self {
            current: None,
            phase: SessionPhase::Idle,
            last_state: PlaybackState::Unknown,
            publisher: NowPlayingPublisher::new(bridges.surface, events.clone()),
            events,
            factory: bridges.player_factory,
            audio_session: bridges.audio_session,
            artwork_fetcher: bridges.artwork_fetcher,
            artwork_cache: ArtworkCache::new(config.artwork_cache_capacity),
            config,
            queue,
        }
    }

    pub(crate) async fn start(&mut self) {
        self.publisher.enable_transport_commands().await;
    }

    pub(crate) async fn shutdown(&mut self) {
        self.stop().await;
    }

    pub(crate) async fn handle(&mut self, message: Message) {
        match message {
            Message::Command {
                command,
                origin,
                reply,
            } => self.handle_command(command, origin, reply).await,
            Message::Player { session_id, event } => {
                self.handle_player_event(session_id, event).await
            }
            Message::Tick { session_id } => self.handle_tick(session_id),
            Message::ArtworkLoaded { uri, image } => self.handle_artwork(uri, image).await,
            Message::Shutdown { reply } => {
                self.stop().await;
                reply.send(()).ok();
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let active = self.current.as_ref();
        SessionSnapshot {
            phase: self.phase,
            state: self.last_state,
            uri: active.map(|a| a.source.uri.clone()),
            position: active.map(ActiveSource::sample_position).unwrap_or(0.0),
            duration: active.map(|a| a.duration).unwrap_or_default(),
            desired_playing: active.map(|a| a.desired_playing).unwrap_or(false),
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn handle_command(&mut self, command: Command, origin: CommandOrigin, reply: Responder) {
        trace!(?command, ?origin, "Applying command");

        let outcome = match command {
            Command::Play(source) => {
                self.play(source, reply).await;
                return;
            }
            Command::Pause => self.pause().await,
            Command::Resume => self.resume().await,
            Command::TogglePlayPause => self.toggle_play_pause().await,
            Command::SeekTo(seconds) => self.seek_to(seconds).await,
            Command::Update(metadata) => self.update(metadata).await,
            Command::Stop => {
                self.stop().await;
                CommandOutcome::Applied
            }
            Command::Interruption(Interruption::Began) => {
                debug!("Audio interruption began, pausing");
                self.pause().await
            }
            Command::Interruption(Interruption::Ended) => CommandOutcome::Applied,
            Command::Snapshot => CommandOutcome::Snapshot(self.snapshot()),
        };

        reply.send(Ok(outcome)).ok();
    }

    async fn play(&mut self, source: Source, reply: Responder) {
        let source = match source.normalized() {
            Ok(source) => source,
            Err(e) => {
                warn!(error = %e, "Rejecting source");
                reply.send(Err(e)).ok();
                return;
            }
        };

        if let Some(active) = &self.current {
            if active.source.uri == source.uri {
                debug!("Same source requested, resuming");
                let outcome = self.resume().await;
                reply.send(Ok(outcome)).ok();
                return;
            }
        }

        self.teardown(PlaybackError::Superseded).await;

        let session_id = PlaybackSessionId::new();
        let sink = self.event_sink(session_id);
        info!(uri = %redact_uri(&source.uri), %session_id, "Loading source");

        let handle = match self.factory.create(&source.uri, sink.clone()).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Player creation failed");
                sink.revoke();
                self.fail().await;
                reply.send(Err(PlaybackError::from(e))).ok();
                return;
            }
        };

        self.activate_audio_session().await;

        self.phase = SessionPhase::Loading;
        self.last_state = PlaybackState::Unknown;
        self.current = Some(ActiveSource {
            source,
            session_id,
            handle,
            sink,
            ticker: None,
            desired_playing: false,
            last_position: 0.0,
            duration: MediaDuration::Unknown,
            rate: 0.0,
            time_control: None,
            pending_play: Some(reply),
        });

        self.publisher.reset_duration().await;
        self.request_artwork();
        if self.config.autoplay {
            self.start_playback().await;
        }
        self.refresh_state();
        self.publish().await;
    }

    async fn pause(&mut self) -> CommandOutcome {
        let Some(active) = self.current.as_mut() else {
            return CommandOutcome::NoActionableSession;
        };
        let engine_playing = active.time_control == Some(TimeControlStatus::Playing);
        if !self.phase.accepts_transport() || (!active.desired_playing && !engine_playing) {
            return CommandOutcome::Applied;
        }

        active.desired_playing = false;
        active.ticker = None;
        if let Err(e) = active.handle.pause().await {
            warn!(error = %e, "Player pause failed");
        }
        active.last_position = active.sample_position();
        active.rate = 0.0;

        self.refresh_state();
        self.publish().await;
        CommandOutcome::Applied
    }

    async fn resume(&mut self) -> CommandOutcome {
        let Some(active) = self.current.as_ref() else {
            return CommandOutcome::NoActionableSession;
        };
        // The engine may have paused on its own (route change, stall).
        let engine_paused = active.time_control == Some(TimeControlStatus::Paused);
        if !self.phase.accepts_transport() || (active.desired_playing && !engine_paused) {
            return CommandOutcome::Applied;
        }

        self.start_playback().await;
        self.refresh_state();
        self.publish().await;
        CommandOutcome::Applied
    }

    async fn toggle_play_pause(&mut self) -> CommandOutcome {
        match self.current.as_ref().map(|a| a.desired_playing) {
            None => CommandOutcome::NoActionableSession,
            Some(true) => self.pause().await,
            Some(false) => self.resume().await,
        }
    }

    async fn seek_to(&mut self, seconds: f64) -> CommandOutcome {
        let Some(active) = self.current.as_mut() else {
            return CommandOutcome::NoActionableSession;
        };
        if !seconds.is_finite() || seconds < 0.0 {
            debug!(seconds, "Ignoring invalid seek position");
            return CommandOutcome::Applied;
        }
        if !self.phase.accepts_transport() {
            return CommandOutcome::Applied;
        }

        if let Err(e) = active.handle.seek(seconds).await {
            warn!(seconds, error = %e, "Player seek failed");
        }
        active.last_position = seconds;

        self.publish().await;
        CommandOutcome::Applied
    }

    async fn update(&mut self, metadata: SourceMetadata) -> CommandOutcome {
        let Some(active) = self.current.as_mut() else {
            return CommandOutcome::NoActionableSession;
        };

        debug!(title = %metadata.title, "Updating metadata");
        active.source.metadata = metadata;

        self.request_artwork();
        self.publish().await;
        CommandOutcome::Applied
    }

    async fn stop(&mut self) {
        let had_session = self.current.is_some() || self.phase != SessionPhase::Idle;

        self.teardown(PlaybackError::Superseded).await;
        self.phase = SessionPhase::Idle;
        self.last_state = PlaybackState::Unknown;

        if had_session {
            info!("Playback stopped");
            self.release_platform().await;
        }
    }

    // ========================================================================
    // Player events
    // ========================================================================

    async fn handle_player_event(&mut self, session_id: PlaybackSessionId, event: HandleEvent) {
        let Some(active) = self.current.as_mut() else {
            trace!(%session_id, ?event, "Dropping player event without a session");
            return;
        };
        if active.session_id != session_id {
            trace!(%session_id, ?event, "Dropping stale player event");
            return;
        }

        match event {
            HandleEvent::Status(PlayerStatus::ReadyToPlay) => self.on_ready().await,
            HandleEvent::Status(PlayerStatus::Failed { message }) => {
                self.on_load_failed(message).await
            }
            HandleEvent::TimeControl(status) => {
                active.time_control = Some(status);
                active.rate = active.handle.rate();
                active.last_position = active.sample_position();
                self.refresh_state();
                self.publish().await;
            }
            HandleEvent::DurationChanged(duration) => {
                active.duration = duration;
                self.publisher.update_duration(duration).await;
                self.publish().await;
            }
            HandleEvent::RateChanged(rate) => {
                active.rate = rate;
                self.publish().await;
            }
            HandleEvent::Ended => self.on_ended().await,
        }
    }

    async fn on_ready(&mut self) {
        if self.phase != SessionPhase::Loading {
            return;
        }
        let Some(active) = self.current.as_mut() else {
            return;
        };

        self.phase = SessionPhase::Ready;
        if let Some(reply) = active.pending_play.take() {
            reply.send(Ok(CommandOutcome::Applied)).ok();
        }
        active.duration = active.handle.duration();
        let duration = active.duration;
        info!(session_id = %active.session_id, ?duration, "Source ready");

        self.publisher.update_duration(duration).await;
        self.refresh_state();
        self.publish().await;
    }

    async fn on_load_failed(&mut self, message: String) {
        match self.current.as_mut().and_then(|a| a.pending_play.take()) {
            Some(reply) => {
                warn!(%message, "Source failed to load");
                reply.send(Err(PlaybackError::LoadFailed(message))).ok();
            }
            None => warn!(%message, "Player failed during playback"),
        }
        self.teardown(PlaybackError::Superseded).await;
        self.fail().await;
    }

    async fn on_ended(&mut self) {
        let Some(active) = self.current.as_mut() else {
            return;
        };

        info!(session_id = %active.session_id, "Reached end of media");
        self.phase = SessionPhase::Ended;
        active.desired_playing = false;
        active.ticker = None;
        active.rate = 0.0;
        active.last_position = active
            .duration
            .seconds()
            .unwrap_or_else(|| active.sample_position());

        self.refresh_state();
        self.publish().await;
    }

    fn handle_tick(&mut self, session_id: PlaybackSessionId) {
        let Some(active) = self.current.as_mut() else {
            return;
        };
        if active.session_id != session_id || !active.desired_playing {
            trace!(%session_id, "Dropping tick");
            return;
        }

        let position = active.sample_position();
        active.last_position = position;
        self.events.emit(AudioEvent::Progress(position)).ok();
    }

    async fn handle_artwork(&mut self, uri: String, image: Option<Arc<ArtworkImage>>) {
        self.artwork_cache.finish_fetch(&uri, image.clone());
        let Some(image) = image else {
            return;
        };

        let wanted = self
            .current
            .as_ref()
            .and_then(|a| a.source.artwork())
            .is_some_and(|current| current == uri);
        if !wanted {
            trace!("Artwork arrived for a previous source");
            return;
        }

        self.publisher.set_artwork(&uri, image);
        self.publish().await;
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Ask the handle to play and start the ticker.
    async fn start_playback(&mut self) {
        let Some(active) = self.current.as_mut() else {
            return;
        };

        active.desired_playing = true;
        if let Err(e) = active.handle.play().await {
            warn!(error = %e, "Player play failed");
        }
        if active.ticker.is_none() {
            let session_id = active.session_id;
            active.ticker = Some(ProgressTicker::start(
                self.config.progress_interval(),
                self.queue.clone(),
                move || Message::Tick { session_id },
            ));
        }
    }

    /// Drop the current source. A pending `play` is rejected with `reason`.
    async fn teardown(&mut self, reason: PlaybackError) {
        let Some(mut active) = self.current.take() else {
            return;
        };

        active.sink.revoke();
        active.ticker = None;
        if let Some(reply) = active.pending_play.take() {
            reply.send(Err(reason)).ok();
        }

        if let Err(e) = active.handle.stop().await {
            debug!(error = %e, "Player stop failed during teardown");
        }
        if let Err(e) = active.handle.release().await {
            warn!(error = %e, "Player release failed");
        }
        debug!(session_id = %active.session_id, "Player released");
    }

    /// Enter `Failed` once the player is gone; listeners see `Unknown`.
    async fn fail(&mut self) {
        self.phase = SessionPhase::Failed;
        self.refresh_state();
        self.release_platform().await;
    }

    async fn release_platform(&mut self) {
        self.publisher.clear().await;
        if let Some(audio_session) = &self.audio_session {
            if let Err(e) = audio_session.deactivate().await {
                warn!(error = %e, "Audio session deactivation failed");
            }
        }
    }

    async fn activate_audio_session(&self) {
        if let Some(audio_session) = &self.audio_session {
            if let Err(e) = audio_session.activate().await {
                warn!(error = %e, "Audio session activation failed");
            }
        }
    }

    /// Emit a state event if the derived state changed.
    fn refresh_state(&mut self) {
        let (time_control, desired_playing) = self
            .current
            .as_ref()
            .map(|a| (a.time_control, a.desired_playing))
            .unwrap_or((None, false));

        let state = derive_state(self.phase, time_control, desired_playing);
        if state == self.last_state {
            return;
        }

        debug!(%state, "Playback state changed");
        self.last_state = state;
        self.events.emit(AudioEvent::PlaybackState(state)).ok();
    }

    async fn publish(&mut self) {
        if let Some(active) = self.current.as_ref() {
            self.publisher.publish(active.snapshot()).await;
        }
    }

    fn request_artwork(&mut self) {
        if !self.config.fetch_artwork {
            return;
        }
        let Some(uri) = self
            .current
            .as_ref()
            .and_then(|a| a.source.artwork())
            .map(str::to_string)
        else {
            return;
        };

        if self.publisher.has_artwork(&uri) {
            return;
        }
        if let Some(image) = self.artwork_cache.get(&uri) {
            self.publisher.set_artwork(&uri, image);
            return;
        }
        let Some(fetcher) = self.artwork_fetcher.clone() else {
            return;
        };
        if !self.artwork_cache.begin_fetch(&uri) {
            return;
        }

        let queue = self.queue.clone();
        tokio::spawn(async move {
            let image = fetcher.fetch(&uri).await.map(Arc::new);
            if image.is_none() {
                debug!(uri = %redact_uri(&uri), "Artwork unavailable");
            }
            if let Some(sender) = queue.upgrade() {
                sender.send(Message::ArtworkLoaded { uri, image }).await.ok();
            }
        });
    }

    /// Sink that posts a handle's callbacks onto the queue.
    fn event_sink(&self, session_id: PlaybackSessionId) -> PlayerEventSink {
        let queue = self.queue.clone();
        let runtime = tokio::runtime::Handle::try_current().ok();

        PlayerEventSink::new(session_id, move |session_id, event| {
            let Some(sender) = queue.upgrade() else {
                return;
            };
            match sender.try_send(Message::Player { session_id, event }) {
                Ok(()) | Err(TrySendError::Closed(_)) => {}
                Err(TrySendError::Full(message)) => match &runtime {
                    Some(runtime) => {
                        runtime.spawn(async move {
                            sender.send(message).await.ok();
                        });
                    }
                    None => warn!("Command queue full, dropping player event"),
                },
            }
        })
    }
}

fn sanitize_position(position: f64) -> f64 {
    if position.is_finite() && position > 0.0 {
        position
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_position() {
        assert_eq!(sanitize_position(12.5), 12.5);
        assert_eq!(sanitize_position(-0.3), 0.0);
        assert_eq!(sanitize_position(f64::NAN), 0.0);
        assert_eq!(sanitize_position(f64::INFINITY), 0.0);
    }
}
