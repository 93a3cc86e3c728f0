//! # Now-Playing Publisher
//!
//! Keeps the OS now-playing surface in sync with the session.
//!
//! The publisher remembers the last info it pushed and sends only the
//! properties that changed. Surfaces merge updates, so a position refresh
//! never erases artwork that is still loading. The publisher also owns the
//! duration events and the enablement of the remote seek command, because
//! both follow from the same duration value.
//!
//! Surface errors are logged and absorbed; the session never fails because
//! the lock screen did.

use crate::source::Source;
use bridge_traits::{
    ArtworkImage, MediaDuration, NowPlayingInfo, NowPlayingSurface, RemoteCommandKind,
};
use core_runtime::events::{AudioEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Commands enabled for as long as the surface exists.
const TRANSPORT_COMMANDS: [RemoteCommandKind; 4] = [
    RemoteCommandKind::Play,
    RemoteCommandKind::Pause,
    RemoteCommandKind::TogglePlayPause,
    RemoteCommandKind::Stop,
];

/// Playback values the publisher derives now-playing info from.
#[derive(Debug, Clone, Copy)]
pub struct NowPlayingSnapshot<'a> {
    pub source: &'a Source,
    pub elapsed: f64,
    pub duration: MediaDuration,
    pub rate: f32,
}

pub struct NowPlayingPublisher {
    surface: Arc<dyn NowPlayingSurface>,
    events: EventBus,
    published: NowPlayingInfo,
    /// Artwork shown for the current source, keyed by its URI.
    artwork: Option<(String, Arc<ArtworkImage>)>,
    last_duration: Option<f64>,
    seek_enabled: Option<bool>,
}

impl NowPlayingPublisher {
    pub fn new(surface: Arc<dyn NowPlayingSurface>, events: EventBus) -> Self {
        Self {
            surface,
            events,
            published: NowPlayingInfo::default(),
            artwork: None,
            last_duration: None,
            seek_enabled: None,
        }
    }

    /// Enable the transport commands and keep seek disabled until a finite
    /// duration is known.
    pub async fn enable_transport_commands(&mut self) {
        for command in TRANSPORT_COMMANDS {
            if let Err(e) = self.surface.set_command_enabled(command, true).await {
                warn!(?command, error = %e, "Failed to enable remote command");
            }
        }
        self.set_seek_enabled(false).await;
    }

    /// Info last pushed to the surface.
    pub fn published(&self) -> &NowPlayingInfo {
        &self.published
    }

    /// Push whatever changed since the last publish.
    pub async fn publish(&mut self, snapshot: NowPlayingSnapshot<'_>) {
        let next = self.build_info(snapshot);
        let update = self.published.diff(&next);
        if update.is_empty() {
            trace!("Now-playing unchanged");
            return;
        }

        debug!(properties = update.len(), "Publishing now-playing update");
        if let Err(e) = self.surface.update(update).await {
            warn!(error = %e, "Now-playing update failed");
        }
        // Remember what we asked for even on failure; the next diff is
        // computed against intent, not against an unknown surface state.
        self.published = next;
    }

    /// Artwork for `uri` became available.
    pub fn set_artwork(&mut self, uri: &str, image: Arc<ArtworkImage>) {
        self.artwork = Some((uri.to_string(), image));
    }

    /// Whether the publisher already shows artwork for `uri`.
    pub fn has_artwork(&self, uri: &str) -> bool {
        matches!(&self.artwork, Some((current, _)) if current == uri)
    }

    /// A new source is starting: announce `Duration(-1)` and disable seek.
    pub async fn reset_duration(&mut self) {
        self.last_duration = None;
        self.emit_duration(-1.0);
        self.set_seek_enabled(false).await;
    }

    /// Report the engine's current duration. Unchanged values emit nothing.
    pub async fn update_duration(&mut self, duration: MediaDuration) {
        self.emit_duration(duration.as_event_seconds());
        self.set_seek_enabled(duration.seconds().is_some()).await;
    }

    /// Remove the now-playing entry and forget everything published.
    pub async fn clear(&mut self) {
        if let Err(e) = self.surface.clear().await {
            warn!(error = %e, "Failed to clear now-playing surface");
        }
        self.published = NowPlayingInfo::default();
        self.artwork = None;
        self.last_duration = None;
        self.set_seek_enabled(false).await;
    }

    fn emit_duration(&mut self, seconds: f64) {
        if self.last_duration == Some(seconds) {
            return;
        }
        self.last_duration = Some(seconds);
        self.events.emit(AudioEvent::Duration(seconds)).ok();
    }

    async fn set_seek_enabled(&mut self, enabled: bool) {
        if self.seek_enabled == Some(enabled) {
            return;
        }
        self.seek_enabled = Some(enabled);
        if let Err(e) = self
            .surface
            .set_command_enabled(RemoteCommandKind::ChangePlaybackPosition, enabled)
            .await
        {
            warn!(enabled, error = %e, "Failed to toggle remote seek");
        }
    }

    fn build_info(&self, snapshot: NowPlayingSnapshot<'_>) -> NowPlayingInfo {
        let source = snapshot.source;
        let metadata = &source.metadata;

        let artwork = match (&self.artwork, metadata.artwork.as_deref()) {
            (Some((uri, image)), Some(current)) if uri == current => Some(Arc::clone(image)),
            _ => None,
        };

        NowPlayingInfo {
            asset_url: Some(source.uri.clone()),
            title: Some(metadata.title.clone()),
            artist: metadata.artist.clone(),
            album: metadata.album.clone(),
            album_artist: metadata.album_artist.clone(),
            text: metadata.notification_text().map(str::to_string),
            subtext: metadata.notification_subtext().map(str::to_string),
            artwork_url: metadata.artwork.clone(),
            artwork,
            elapsed_time: Some(snapshot.elapsed.max(0.0)),
            duration: snapshot.duration.seconds(),
            playback_rate: Some(snapshot.rate),
            is_live_stream: Some(snapshot.duration.is_live()),
        }
    }
}

impl std::fmt::Debug for NowPlayingPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NowPlayingPublisher")
            .field("published", &self.published)
            .field("last_duration", &self.last_duration)
            .field("seek_enabled", &self.seek_enabled)
            .finish()
    }
}
