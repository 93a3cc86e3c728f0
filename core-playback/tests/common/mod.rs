//! Scripted fakes shared by the integration tests.
//!
//! The fake player never reports anything on its own except time-control
//! changes in answer to play/pause once it is ready. Tests drive readiness,
//! failures, duration and end of media through [`HandleProbe`].

#![allow(dead_code)]

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, HandleEvent, MediaDuration, NowPlayingInfo, NowPlayingSurface, NowPlayingUpdate,
    PlayerEventSink, PlayerFactory, PlayerHandle, PlayerStatus, RemoteCommandHandler,
    RemoteCommandKind, TimeControlStatus,
};
use core_playback::{PlaybackBridges, PlayerController, Source, SourceMetadata};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{AudioEvent, Receiver};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Fake player
// ============================================================================

#[derive(Debug, Default)]
pub struct HandleState {
    pub uri: String,
    pub ready: bool,
    pub play_requested: bool,
    pub position: f64,
    pub duration: MediaDuration,
    pub rate: f32,
    pub calls: Vec<&'static str>,
    pub released: bool,
}

/// Test-side view of one created handle.
#[derive(Clone)]
pub struct HandleProbe {
    pub state: Arc<Mutex<HandleState>>,
    pub sink: PlayerEventSink,
}

impl HandleProbe {
    /// Report ready with `duration`, then playing if play was requested.
    pub fn ready(&self, duration: MediaDuration) {
        let play_requested = {
            let mut state = self.state.lock().unwrap();
            state.ready = true;
            state.duration = duration;
            state.play_requested
        };
        self.sink.emit(HandleEvent::Status(PlayerStatus::ReadyToPlay));
        if play_requested {
            self.sink
                .emit(HandleEvent::TimeControl(TimeControlStatus::Playing));
        }
    }

    pub fn fail(&self, message: &str) -> bool {
        self.sink.emit(HandleEvent::Status(PlayerStatus::Failed {
            message: message.to_string(),
        }))
    }

    pub fn emit(&self, event: HandleEvent) -> bool {
        self.sink.emit(event)
    }

    pub fn set_position(&self, position: f64) {
        self.state.lock().unwrap().position = position;
    }

    pub fn set_duration(&self, duration: MediaDuration) -> bool {
        self.state.lock().unwrap().duration = duration;
        self.sink.emit(HandleEvent::DurationChanged(duration))
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn is_released(&self) -> bool {
        self.state.lock().unwrap().released
    }

    pub fn uri(&self) -> String {
        self.state.lock().unwrap().uri.clone()
    }
}

struct FakeHandle {
    state: Arc<Mutex<HandleState>>,
    sink: PlayerEventSink,
}

#[async_trait::async_trait]
impl PlayerHandle for FakeHandle {
    async fn play(&mut self) -> BridgeResult<()> {
        let ready = {
            let mut state = self.state.lock().unwrap();
            state.calls.push("play");
            state.play_requested = true;
            state.rate = 1.0;
            state.ready
        };
        if ready {
            self.sink
                .emit(HandleEvent::TimeControl(TimeControlStatus::Playing));
        }
        Ok(())
    }

    async fn pause(&mut self) -> BridgeResult<()> {
        let ready = {
            let mut state = self.state.lock().unwrap();
            state.calls.push("pause");
            state.play_requested = false;
            state.rate = 0.0;
            state.ready
        };
        if ready {
            self.sink
                .emit(HandleEvent::TimeControl(TimeControlStatus::Paused));
        }
        Ok(())
    }

    async fn seek(&mut self, seconds: f64) -> BridgeResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("seek");
        state.position = seconds;
        Ok(())
    }

    async fn stop(&mut self) -> BridgeResult<()> {
        self.state.lock().unwrap().calls.push("stop");
        Ok(())
    }

    async fn release(&mut self) -> BridgeResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("release");
        state.released = true;
        Ok(())
    }

    fn current_position(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn duration(&self) -> MediaDuration {
        self.state.lock().unwrap().duration
    }

    fn rate(&self) -> f32 {
        self.state.lock().unwrap().rate
    }
}

#[derive(Default)]
pub struct FakePlayerFactory {
    handles: Mutex<Vec<HandleProbe>>,
    refuse_next: Mutex<Option<String>>,
}

impl FakePlayerFactory {
    pub fn count(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    pub fn handle(&self, index: usize) -> HandleProbe {
        self.handles.lock().unwrap()[index].clone()
    }

    pub fn live_handles(&self) -> usize {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .filter(|probe| !probe.is_released())
            .count()
    }

    pub fn refuse_next(&self, message: &str) {
        *self.refuse_next.lock().unwrap() = Some(message.to_string());
    }

    /// Yield until `count` handles exist.
    pub async fn wait_for(&self, count: usize) -> HandleProbe {
        for _ in 0..1_000 {
            if self.count() >= count {
                return self.handle(count - 1);
            }
            tokio::task::yield_now().await;
        }
        panic!("handle #{count} was never created");
    }
}

#[async_trait::async_trait]
impl PlayerFactory for FakePlayerFactory {
    async fn create(&self, uri: &str, sink: PlayerEventSink) -> BridgeResult<Box<dyn PlayerHandle>> {
        if let Some(message) = self.refuse_next.lock().unwrap().take() {
            return Err(BridgeError::NotAvailable(message));
        }

        let state = Arc::new(Mutex::new(HandleState {
            uri: uri.to_string(),
            ..Default::default()
        }));
        self.handles.lock().unwrap().push(HandleProbe {
            state: Arc::clone(&state),
            sink: sink.clone(),
        });
        Ok(Box::new(FakeHandle { state, sink }))
    }
}

// ============================================================================
// Recording surface
// ============================================================================

#[derive(Default)]
pub struct RecordingSurface {
    info: Mutex<NowPlayingInfo>,
    updates: Mutex<Vec<NowPlayingUpdate>>,
    enabled: Mutex<HashMap<RemoteCommandKind, bool>>,
    clears: Mutex<usize>,
    handler: Mutex<Option<Arc<dyn RemoteCommandHandler>>>,
}

impl RecordingSurface {
    pub fn info(&self) -> NowPlayingInfo {
        self.info.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<NowPlayingUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn is_enabled(&self, command: RemoteCommandKind) -> Option<bool> {
        self.enabled.lock().unwrap().get(&command).copied()
    }

    pub fn clears(&self) -> usize {
        *self.clears.lock().unwrap()
    }

    pub fn handler(&self) -> Arc<dyn RemoteCommandHandler> {
        self.handler
            .lock()
            .unwrap()
            .clone()
            .expect("remote handler attached")
    }
}

#[async_trait::async_trait]
impl NowPlayingSurface for RecordingSurface {
    async fn update(&self, update: NowPlayingUpdate) -> BridgeResult<()> {
        self.info.lock().unwrap().apply(&update);
        self.updates.lock().unwrap().push(update);
        Ok(())
    }

    async fn clear(&self) -> BridgeResult<()> {
        *self.info.lock().unwrap() = NowPlayingInfo::default();
        *self.clears.lock().unwrap() += 1;
        Ok(())
    }

    async fn set_command_enabled(&self, command: RemoteCommandKind, enabled: bool) -> BridgeResult<()> {
        self.enabled.lock().unwrap().insert(command, enabled);
        Ok(())
    }

    fn attach_remote_handler(&self, handler: Arc<dyn RemoteCommandHandler>) {
        *self.handler.lock().unwrap() = Some(handler);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub controller: PlayerController,
    pub factory: Arc<FakePlayerFactory>,
    pub surface: Arc<RecordingSurface>,
    pub events: Receiver<AudioEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_bridges(|bridges| bridges)
    }

    pub fn with_bridges(customize: impl FnOnce(PlaybackBridges) -> PlaybackBridges) -> Self {
        let factory = Arc::new(FakePlayerFactory::default());
        let surface = Arc::new(RecordingSurface::default());
        let bridges = customize(PlaybackBridges::new(factory.clone(), surface.clone()));
        let controller = PlayerController::spawn(bridges, PlayerConfig::default());
        let events = controller.subscribe();

        Self {
            controller,
            factory,
            surface,
            events,
        }
    }

    /// Start `play` in the background and return once its handle exists.
    pub async fn start(
        &self,
        source: Source,
    ) -> (
        tokio::task::JoinHandle<core_playback::Result<()>>,
        HandleProbe,
    ) {
        let expected = self.factory.count() + 1;
        let controller = self.controller.clone();
        let pending = tokio::spawn(async move { controller.play(source).await });
        let probe = self.factory.wait_for(expected).await;
        (pending, probe)
    }

    /// Play `source` through to ready with a finite duration.
    pub async fn play_ready(&self, source: Source, duration: f64) -> HandleProbe {
        let (pending, probe) = self.start(source).await;
        probe.ready(MediaDuration::Finite(duration));
        pending.await.unwrap().expect("play resolves once ready");
        self.flush().await;
        probe
    }

    /// Wait until every message queued so far has been applied.
    pub async fn flush(&self) {
        self.controller.snapshot().await;
    }

    /// Everything emitted so far.
    pub fn drain(&mut self) -> Vec<AudioEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Emitted events other than progress samples.
    pub fn drain_transitions(&mut self) -> Vec<AudioEvent> {
        self.drain()
            .into_iter()
            .filter(|event| !event.is_progress())
            .collect()
    }

    /// Next progress sample, skipping other events.
    pub async fn next_progress(&mut self) -> f64 {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("progress within 5s")
                .expect("event bus open");
            if let AudioEvent::Progress(position) = event {
                return position;
            }
        }
    }

    /// Assert nothing at all is emitted for a while.
    pub async fn assert_silent(&mut self) {
        let next = tokio::time::timeout(Duration::from_secs(2), self.events.recv()).await;
        assert!(next.is_err(), "unexpected event: {:?}", next);
    }

    /// Assert no progress sample is emitted for a while.
    pub async fn assert_no_progress(&mut self) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while let Ok(event) = tokio::time::timeout_at(deadline, self.events.recv()).await {
            let event = event.expect("event bus open");
            assert!(!event.is_progress(), "unexpected progress: {:?}", event);
        }
    }
}

pub fn episode(n: u32) -> Source {
    Source::new(
        format!("https://cdn.example.com/episodes/{n}.mp3"),
        SourceMetadata::new(format!("Episode {n}"))
            .with_artist("The Host")
            .with_album("The Show"),
    )
}
