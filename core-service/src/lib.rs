//! Core service facade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (player engine,
//! now-playing surface, artwork fetcher, audio session) into the playback
//! core. Desktop apps typically enable the `desktop-shims` feature (which
//! depends on `bridge-desktop`) and only supply a [`PlayerFactory`]; mobile
//! hosts inject every bridge themselves.

pub mod error;

pub use error::{CoreError, Result};

pub use core_playback::{SessionPhase, SessionSnapshot, Source, SourceMetadata};
pub use core_runtime::config::PlayerConfig;
pub use core_runtime::events::{AudioEvent, EventStream, PlaybackState, Receiver};

use bridge_traits::{
    ArtworkFetcher, AudioSessionControl, NowPlayingSurface, PlayerFactory, RemoteCommandHandler,
};
use core_playback::{PlaybackBridges, PlayerController};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
#[derive(Clone)]
pub struct CoreDependencies {
    pub player_factory: Arc<dyn PlayerFactory>,
    pub surface: Arc<dyn NowPlayingSurface>,
    pub artwork_fetcher: Option<Arc<dyn ArtworkFetcher>>,
    pub audio_session: Option<Arc<dyn AudioSessionControl>>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from the required bridges.
    pub fn new(player_factory: Arc<dyn PlayerFactory>, surface: Arc<dyn NowPlayingSurface>) -> Self {
        Self {
            player_factory,
            surface,
            artwork_fetcher: None,
            audio_session: None,
        }
    }

    pub fn builder() -> CoreDependenciesBuilder {
        CoreDependenciesBuilder::default()
    }
}

impl fmt::Debug for CoreDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreDependencies")
            .field("artwork_fetcher", &self.artwork_fetcher.is_some())
            .field("audio_session", &self.audio_session.is_some())
            .finish_non_exhaustive()
    }
}

impl From<CoreDependencies> for PlaybackBridges {
    fn from(deps: CoreDependencies) -> Self {
        let mut bridges = PlaybackBridges::new(deps.player_factory, deps.surface);
        bridges.artwork_fetcher = deps.artwork_fetcher;
        bridges.audio_session = deps.audio_session;
        bridges
    }
}

/// Collects bridges one by one and reports what is missing.
#[derive(Default)]
pub struct CoreDependenciesBuilder {
    player_factory: Option<Arc<dyn PlayerFactory>>,
    surface: Option<Arc<dyn NowPlayingSurface>>,
    artwork_fetcher: Option<Arc<dyn ArtworkFetcher>>,
    audio_session: Option<Arc<dyn AudioSessionControl>>,
}

impl CoreDependenciesBuilder {
    pub fn player_factory(mut self, factory: Arc<dyn PlayerFactory>) -> Self {
        self.player_factory = Some(factory);
        self
    }

    pub fn surface(mut self, surface: Arc<dyn NowPlayingSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn artwork_fetcher(mut self, fetcher: Arc<dyn ArtworkFetcher>) -> Self {
        self.artwork_fetcher = Some(fetcher);
        self
    }

    pub fn audio_session(mut self, session: Arc<dyn AudioSessionControl>) -> Self {
        self.audio_session = Some(session);
        self
    }

    /// Build the bundle.
    ///
    /// With `desktop-shims`, a missing surface, artwork fetcher or audio
    /// session is filled in from `bridge-desktop`.
    ///
    /// # Errors
    ///
    /// [`CoreError::CapabilityMissing`] when no player factory (or, without
    /// `desktop-shims`, no surface) was provided.
    pub fn build(self) -> Result<CoreDependencies> {
        #[cfg(feature = "desktop-shims")]
        let this = self.with_desktop_defaults()?;
        #[cfg(not(feature = "desktop-shims"))]
        let this = self;

        let player_factory = this.player_factory.ok_or_else(|| {
            CoreError::capability_missing("PlayerFactory", "a native player engine is required")
        })?;
        let surface = this.surface.ok_or_else(|| {
            CoreError::capability_missing(
                "NowPlayingSurface",
                "a lock-screen or notification surface is required",
            )
        })?;

        Ok(CoreDependencies {
            player_factory,
            surface,
            artwork_fetcher: this.artwork_fetcher,
            audio_session: this.audio_session,
        })
    }

    #[cfg(feature = "desktop-shims")]
    fn with_desktop_defaults(mut self) -> Result<Self> {
        if self.surface.is_none() {
            self.surface = Some(Arc::new(bridge_desktop::InMemoryNowPlayingSurface::new()));
        }
        if self.artwork_fetcher.is_none() {
            let fetcher = bridge_desktop::HttpArtworkFetcher::new()
                .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
            self.artwork_fetcher = Some(Arc::new(fetcher));
        }
        if self.audio_session.is_none() {
            self.audio_session = Some(Arc::new(bridge_desktop::NoopAudioSession::new()));
        }
        Ok(self)
    }
}

/// Primary facade exposed to host applications.
///
/// Cloning is cheap; every clone drives the same session. Playback stops
/// once the last clone is dropped or [`AudioService::shutdown`] is called.
#[derive(Clone)]
pub struct AudioService {
    controller: PlayerController,
}

impl AudioService {
    /// Validate `config` and start the playback core.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Runtime`] if `config` is invalid
    /// - [`CoreError::InitializationFailed`] outside a Tokio runtime
    pub fn new(deps: CoreDependencies, config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CoreError::InitializationFailed(
                "AudioService must be created inside a Tokio runtime".to_string(),
            ));
        }

        info!(
            progress_interval_ms = config.progress_interval_ms,
            autoplay = config.autoplay,
            "Starting audio service"
        );
        let controller = PlayerController::spawn(deps.into(), config);
        Ok(Self { controller })
    }

    /// Play `source`; resolves once it is ready to play.
    pub async fn play(&self, source: Source) -> Result<()> {
        Ok(self.controller.play(source).await?)
    }

    pub async fn pause(&self) {
        self.controller.pause().await;
    }

    pub async fn resume(&self) {
        self.controller.resume().await;
    }

    pub async fn toggle_play_pause(&self) {
        self.controller.toggle_play_pause().await;
    }

    pub async fn seek_to(&self, seconds: f64) {
        self.controller.seek_to(seconds).await;
    }

    pub async fn update(&self, metadata: SourceMetadata) {
        self.controller.update(metadata).await;
    }

    pub async fn stop(&self) {
        self.controller.stop().await;
    }

    pub fn subscribe(&self) -> Receiver<AudioEvent> {
        self.controller.subscribe()
    }

    pub fn events(&self) -> EventStream {
        self.controller.events()
    }

    /// Handler for hosts that receive transport commands themselves.
    pub fn remote_handler(&self) -> Arc<dyn RemoteCommandHandler> {
        self.controller.remote_handler()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.controller.snapshot().await
    }

    /// Stop playback and end the worker.
    pub async fn shutdown(&self) {
        self.controller.shutdown().await;
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }
}

impl fmt::Debug for AudioService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioService")
            .field("controller", &self.controller)
            .finish()
    }
}

/// Start an [`AudioService`] on desktop: `player_factory` plus the
/// `bridge-desktop` defaults for everything else.
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    player_factory: Arc<dyn PlayerFactory>,
    config: PlayerConfig,
) -> Result<AudioService> {
    let deps = CoreDependencies::builder()
        .player_factory(player_factory)
        .build()?;
    AudioService::new(deps, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        BridgeError, NowPlayingUpdate, PlayerEventSink, PlayerHandle, RemoteCommand,
        RemoteCommandKind, RemoteCommandStatus,
    };
    use core_playback::PlaybackError;
    use mockall::mock;

    mock! {
        Factory {}

        #[async_trait::async_trait]
        impl PlayerFactory for Factory {
            async fn create(&self, uri: &str, sink: PlayerEventSink) -> BridgeResult<Box<dyn PlayerHandle>>;
        }
    }

    mock! {
        Surface {}

        #[async_trait::async_trait]
        impl NowPlayingSurface for Surface {
            async fn update(&self, update: NowPlayingUpdate) -> BridgeResult<()>;
            async fn clear(&self) -> BridgeResult<()>;
            async fn set_command_enabled(&self, command: RemoteCommandKind, enabled: bool) -> BridgeResult<()>;
            fn attach_remote_handler(&self, handler: Arc<dyn RemoteCommandHandler>);
        }
    }

    fn refusing_factory() -> Arc<dyn PlayerFactory> {
        let mut factory = MockFactory::new();
        factory
            .expect_create()
            .returning(|_, _| Err(BridgeError::NotAvailable("no engine".into())));
        Arc::new(factory)
    }

    fn quiet_surface() -> Arc<dyn NowPlayingSurface> {
        let mut surface = MockSurface::new();
        surface.expect_update().returning(|_| Ok(()));
        surface.expect_clear().returning(|| Ok(()));
        surface.expect_set_command_enabled().returning(|_, _| Ok(()));
        surface.expect_attach_remote_handler().return_const(());
        Arc::new(surface)
    }

    #[test]
    fn test_missing_player_factory() {
        let err = CoreDependencies::builder()
            .surface(quiet_surface())
            .build()
            .unwrap_err();

        match err {
            CoreError::CapabilityMissing { capability, .. } => {
                assert_eq!(capability, "PlayerFactory")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_surface() {
        let err = CoreDependencies::builder()
            .player_factory(refusing_factory())
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::CapabilityMissing { ref capability, .. } if capability == "NowPlayingSurface"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_fill_gaps() {
        let deps = CoreDependencies::builder()
            .player_factory(refusing_factory())
            .build()
            .unwrap();

        assert!(deps.artwork_fetcher.is_some());
        assert!(deps.audio_session.is_some());
    }

    #[test]
    fn test_requires_runtime() {
        let deps = CoreDependencies::new(refusing_factory(), quiet_surface());
        let err = AudioService::new(deps, PlayerConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::InitializationFailed(_)));
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let deps = CoreDependencies::new(refusing_factory(), quiet_surface());
        let config = PlayerConfig {
            progress_interval_ms: 0,
            ..Default::default()
        };

        let err = AudioService::new(deps, config).unwrap_err();
        assert!(matches!(err, CoreError::Runtime(_)));
    }

    #[tokio::test]
    async fn test_engine_errors_surface_through_play() {
        let deps = CoreDependencies::new(refusing_factory(), quiet_surface());
        let service = AudioService::new(deps, PlayerConfig::default()).unwrap();

        let err = service
            .play(Source::new("https://example.com/a.mp3", SourceMetadata::new("A")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Playback(PlaybackError::HandleCreation(_))
        ));

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.phase, SessionPhase::Failed);
        assert_eq!(snapshot.state, PlaybackState::Unknown);
    }

    #[tokio::test]
    async fn test_remote_handler_without_session() {
        let deps = CoreDependencies::new(refusing_factory(), quiet_surface());
        let service = AudioService::new(deps, PlayerConfig::default()).unwrap();

        let handler = service.remote_handler();
        assert_eq!(
            handler.handle_command(RemoteCommand::Pause).await,
            RemoteCommandStatus::NoActionableSession
        );
        assert_eq!(
            handler.handle_command(RemoteCommand::Stop).await,
            RemoteCommandStatus::Success
        );

        service.shutdown().await;
        assert_eq!(
            handler.handle_command(RemoteCommand::Pause).await,
            RemoteCommandStatus::CommandFailed
        );
    }
}
