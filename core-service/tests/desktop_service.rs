//! Service wired with the desktop shims and an engine that is ready at once.
#![cfg(feature = "desktop-shims")]

use bridge_desktop::InMemoryNowPlayingSurface;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    HandleEvent, MediaDuration, PlayerEventSink, PlayerFactory, PlayerHandle, PlayerStatus,
    RemoteCommand, RemoteCommandKind, RemoteCommandStatus, TimeControlStatus,
};
use core_service::{
    AudioEvent, AudioService, CoreDependencies, PlaybackState, PlayerConfig, Source,
    SourceMetadata,
};
use std::sync::Arc;

struct InstantHandle {
    sink: PlayerEventSink,
    position: f64,
    playing: bool,
}

#[async_trait::async_trait]
impl PlayerHandle for InstantHandle {
    async fn play(&mut self) -> BridgeResult<()> {
        self.playing = true;
        self.sink.emit(HandleEvent::TimeControl(TimeControlStatus::Playing));
        Ok(())
    }

    async fn pause(&mut self) -> BridgeResult<()> {
        self.playing = false;
        self.sink.emit(HandleEvent::TimeControl(TimeControlStatus::Paused));
        Ok(())
    }

    async fn seek(&mut self, seconds: f64) -> BridgeResult<()> {
        self.position = seconds;
        Ok(())
    }

    async fn stop(&mut self) -> BridgeResult<()> {
        Ok(())
    }

    async fn release(&mut self) -> BridgeResult<()> {
        Ok(())
    }

    fn current_position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> MediaDuration {
        MediaDuration::Finite(240.0)
    }

    fn rate(&self) -> f32 {
        if self.playing {
            1.0
        } else {
            0.0
        }
    }
}

struct InstantFactory;

#[async_trait::async_trait]
impl PlayerFactory for InstantFactory {
    async fn create(&self, _uri: &str, sink: PlayerEventSink) -> BridgeResult<Box<dyn PlayerHandle>> {
        let ready = sink.clone();
        tokio::spawn(async move {
            ready.emit(HandleEvent::Status(PlayerStatus::ReadyToPlay));
        });
        Ok(Box::new(InstantHandle {
            sink,
            position: 0.0,
            playing: false,
        }))
    }
}

fn service() -> (AudioService, Arc<InMemoryNowPlayingSurface>) {
    let surface = Arc::new(InMemoryNowPlayingSurface::new());
    let deps = CoreDependencies::builder()
        .player_factory(Arc::new(InstantFactory))
        .surface(surface.clone())
        .build()
        .unwrap();
    let service = AudioService::new(deps, PlayerConfig::default()).unwrap();
    (service, surface)
}

#[tokio::test(start_paused = true)]
async fn test_media_keys_drive_playback() {
    let (service, surface) = service();
    let mut events = service.subscribe();

    service
        .play(Source::new(
            "https://cdn.example.com/track.mp3?token=secret",
            SourceMetadata::new("Track").with_artist("Artist"),
        ))
        .await
        .unwrap();
    service.snapshot().await;

    let info = surface.info().expect("surface shows the track");
    assert_eq!(info.title.as_deref(), Some("Track"));
    assert_eq!(info.text.as_deref(), Some("Artist"));
    assert_eq!(info.duration, Some(240.0));
    assert!(surface.is_command_enabled(RemoteCommandKind::ChangePlaybackPosition));

    assert_eq!(
        surface.send_command(RemoteCommand::Pause).await,
        RemoteCommandStatus::Success
    );
    assert_eq!(service.snapshot().await.state, PlaybackState::Paused);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&AudioEvent::Duration(240.0)));
    assert!(seen.contains(&AudioEvent::PlaybackState(PlaybackState::Playing)));
    assert_eq!(
        seen.last(),
        Some(&AudioEvent::PlaybackState(PlaybackState::Paused))
    );

    assert_eq!(
        surface.send_command(RemoteCommand::Stop).await,
        RemoteCommandStatus::Success
    );
    assert!(surface.info().is_none());
}
