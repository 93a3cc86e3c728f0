//! OS now-playing integration.
//!
//! Abstracts lock-screen / notification transport surfaces:
//! - **iOS**: `MPNowPlayingInfoCenter` + `MPRemoteCommandCenter`
//! - **Android**: `MediaSessionCompat` + `PlayerNotificationManager`
//! - **Desktop**: MPRIS / SMTC / `MPNowPlayingInfoCenter`
//!
//! Updates are merge-style: a [`NowPlayingUpdate`] lists only the properties
//! that changed, and a surface must leave every other property as it was.
//! Surfaces report transport-control invocations back through the
//! [`RemoteCommandHandler`] attached to them.

use crate::artwork::ArtworkImage;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Single now-playing property.
#[derive(Debug, Clone, PartialEq)]
pub enum NowPlayingProperty {
    AssetUrl(Option<String>),
    Title(Option<String>),
    Artist(Option<String>),
    Album(Option<String>),
    AlbumArtist(Option<String>),
    /// Notification body line (Android `contentText`).
    Text(Option<String>),
    /// Notification sub line (Android `subText`).
    Subtext(Option<String>),
    ArtworkUrl(Option<String>),
    Artwork(Option<Arc<ArtworkImage>>),
    ElapsedTime(f64),
    Duration(Option<f64>),
    PlaybackRate(f32),
    LiveStream(bool),
}

/// Full set of properties currently shown by a surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingInfo {
    pub asset_url: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub text: Option<String>,
    pub subtext: Option<String>,
    pub artwork_url: Option<String>,
    pub artwork: Option<Arc<ArtworkImage>>,
    pub elapsed_time: Option<f64>,
    pub duration: Option<f64>,
    pub playback_rate: Option<f32>,
    pub is_live_stream: Option<bool>,
}

impl NowPlayingInfo {
    /// Merge an update into this info, leaving untouched properties as-is.
    pub fn apply(&mut self, update: &NowPlayingUpdate) {
        for property in update.properties() {
            match property.clone() {
                NowPlayingProperty::AssetUrl(v) => self.asset_url = v,
                NowPlayingProperty::Title(v) => self.title = v,
                NowPlayingProperty::Artist(v) => self.artist = v,
                NowPlayingProperty::Album(v) => self.album = v,
                NowPlayingProperty::AlbumArtist(v) => self.album_artist = v,
                NowPlayingProperty::Text(v) => self.text = v,
                NowPlayingProperty::Subtext(v) => self.subtext = v,
                NowPlayingProperty::ArtworkUrl(v) => self.artwork_url = v,
                NowPlayingProperty::Artwork(v) => self.artwork = v,
                NowPlayingProperty::ElapsedTime(v) => self.elapsed_time = Some(v),
                NowPlayingProperty::Duration(v) => self.duration = v,
                NowPlayingProperty::PlaybackRate(v) => self.playback_rate = Some(v),
                NowPlayingProperty::LiveStream(v) => self.is_live_stream = Some(v),
            }
        }
    }

    /// Properties that differ between `self` and `next`, as an update that
    /// turns `self` into `next`.
    ///
    /// Artwork is compared by identity, not by content.
    pub fn diff(&self, next: &NowPlayingInfo) -> NowPlayingUpdate {
        let mut update = NowPlayingUpdate::new();

        if self.asset_url != next.asset_url {
            update.push(NowPlayingProperty::AssetUrl(next.asset_url.clone()));
        }
        if self.title != next.title {
            update.push(NowPlayingProperty::Title(next.title.clone()));
        }
        if self.artist != next.artist {
            update.push(NowPlayingProperty::Artist(next.artist.clone()));
        }
        if self.album != next.album {
            update.push(NowPlayingProperty::Album(next.album.clone()));
        }
        if self.album_artist != next.album_artist {
            update.push(NowPlayingProperty::AlbumArtist(next.album_artist.clone()));
        }
        if self.text != next.text {
            update.push(NowPlayingProperty::Text(next.text.clone()));
        }
        if self.subtext != next.subtext {
            update.push(NowPlayingProperty::Subtext(next.subtext.clone()));
        }
        if self.artwork_url != next.artwork_url {
            update.push(NowPlayingProperty::ArtworkUrl(next.artwork_url.clone()));
        }
        let same_artwork = match (&self.artwork, &next.artwork) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same_artwork {
            update.push(NowPlayingProperty::Artwork(next.artwork.clone()));
        }
        if let Some(elapsed) = next.elapsed_time {
            if self.elapsed_time != Some(elapsed) {
                update.push(NowPlayingProperty::ElapsedTime(elapsed));
            }
        }
        if self.duration != next.duration {
            update.push(NowPlayingProperty::Duration(next.duration));
        }
        if let Some(rate) = next.playback_rate {
            if self.playback_rate != Some(rate) {
                update.push(NowPlayingProperty::PlaybackRate(rate));
            }
        }
        if let Some(live) = next.is_live_stream {
            if self.is_live_stream != Some(live) {
                update.push(NowPlayingProperty::LiveStream(live));
            }
        }

        update
    }
}

/// Merge-style update pushed to a surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NowPlayingUpdate {
    properties: Vec<NowPlayingProperty>,
}

impl NowPlayingUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: NowPlayingProperty) -> Self {
        self.push(property);
        self
    }

    pub fn push(&mut self, property: NowPlayingProperty) {
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[NowPlayingProperty] {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }
}

/// Transport commands a surface can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteCommandKind {
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    ChangePlaybackPosition,
}

/// Transport command invoked from the OS surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    /// Stop and dismiss (e.g. the user swiped the notification away).
    Stop,
    /// Seek to an absolute position in seconds.
    ChangePlaybackPosition(f64),
}

impl RemoteCommand {
    pub fn kind(&self) -> RemoteCommandKind {
        match self {
            RemoteCommand::Play => RemoteCommandKind::Play,
            RemoteCommand::Pause => RemoteCommandKind::Pause,
            RemoteCommand::TogglePlayPause => RemoteCommandKind::TogglePlayPause,
            RemoteCommand::Stop => RemoteCommandKind::Stop,
            RemoteCommand::ChangePlaybackPosition(_) => RemoteCommandKind::ChangePlaybackPosition,
        }
    }
}

/// Result reported back to the OS for a remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommandStatus {
    Success,
    /// There is no active item to act on.
    NoActionableSession,
    CommandFailed,
}

/// OS audio interruption (incoming call, audio focus loss, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interruption {
    Began,
    Ended,
}

/// Receives remote commands and interruptions from the OS.
#[async_trait::async_trait]
pub trait RemoteCommandHandler: Send + Sync {
    async fn handle_command(&self, command: RemoteCommand) -> RemoteCommandStatus;

    async fn handle_interruption(&self, interruption: Interruption);
}

/// OS lock-screen / notification surface.
#[async_trait::async_trait]
pub trait NowPlayingSurface: Send + Sync {
    /// Merge `update` into the displayed info.
    async fn update(&self, update: NowPlayingUpdate) -> Result<()>;

    /// Remove the now-playing entry entirely.
    async fn clear(&self) -> Result<()>;

    /// Enable or disable a transport command.
    async fn set_command_enabled(&self, command: RemoteCommandKind, enabled: bool) -> Result<()>;

    /// Register the handler that receives transport invocations.
    fn attach_remote_handler(&self, handler: Arc<dyn RemoteCommandHandler>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn apply_keeps_untouched_properties() {
        let artwork = Arc::new(ArtworkImage::new(1, 1, Bytes::from_static(b"x")));
        let mut info = NowPlayingInfo {
            title: Some("T".into()),
            artwork: Some(Arc::clone(&artwork)),
            ..Default::default()
        };

        info.apply(&NowPlayingUpdate::new().with(NowPlayingProperty::ElapsedTime(12.0)));

        assert_eq!(info.title.as_deref(), Some("T"));
        assert!(info.artwork.is_some());
        assert_eq!(info.elapsed_time, Some(12.0));
    }

    #[test]
    fn diff_only_lists_changes() {
        let before = NowPlayingInfo {
            title: Some("T".into()),
            album: Some("A".into()),
            elapsed_time: Some(3.0),
            ..Default::default()
        };
        let after = NowPlayingInfo {
            title: Some("T2".into()),
            ..before.clone()
        };

        let update = before.diff(&after);
        assert_eq!(update.properties(), &[NowPlayingProperty::Title(Some("T2".into()))]);
        assert!(after.diff(&after).is_empty());
    }

    #[test]
    fn diff_then_apply_converges() {
        let before = NowPlayingInfo::default();
        let after = NowPlayingInfo {
            title: Some("T".into()),
            duration: Some(200.0),
            playback_rate: Some(1.0),
            is_live_stream: Some(false),
            ..Default::default()
        };

        let mut merged = before.clone();
        merged.apply(&before.diff(&after));
        assert_eq!(merged, after);
    }

    #[test]
    fn remote_command_kind() {
        assert_eq!(
            RemoteCommand::ChangePlaybackPosition(3.0).kind(),
            RemoteCommandKind::ChangePlaybackPosition
        );
        assert_eq!(RemoteCommand::Stop.kind(), RemoteCommandKind::Stop);
    }
}
