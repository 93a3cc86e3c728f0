//! Playable sources and their display metadata.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::{ParseError, Url};

/// Display metadata shown on the now-playing surface.
///
/// Replaced wholesale by `update`; never merged field by field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    /// Artwork URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<String>,
    /// Notification body line. Falls back to the artist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Notification sub line. Falls back to the album.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
}

impl SourceMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_album_artist(mut self, album_artist: impl Into<String>) -> Self {
        self.album_artist = Some(album_artist.into());
        self
    }

    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_subtext(mut self, subtext: impl Into<String>) -> Self {
        self.subtext = Some(subtext.into());
        self
    }

    pub fn notification_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.artist.as_deref())
    }

    pub fn notification_subtext(&self) -> Option<&str> {
        self.subtext.as_deref().or(self.album.as_deref())
    }
}

/// A playable audio item: a URI plus display metadata.
///
/// The URI is the identity of the source. Two sources with the same URI are
/// the same item, whatever their metadata says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    #[serde(flatten)]
    pub metadata: SourceMetadata,
}

impl Source {
    pub fn new(uri: impl Into<String>, metadata: SourceMetadata) -> Self {
        Self {
            uri: uri.into(),
            metadata,
        }
    }

    /// Validate the URI and return the source with its URI in canonical
    /// form. Absolute filesystem paths become `file://` URLs; relative
    /// references are kept as given and resolved by the engine.
    pub fn normalized(mut self) -> Result<Self> {
        self.uri = normalize_uri(&self.uri)?;
        Ok(self)
    }

    /// Artwork URI, if any.
    pub fn artwork(&self) -> Option<&str> {
        self.metadata.artwork.as_deref()
    }
}

/// Parse a source URI into the string used as the source identity.
///
/// Absolute URIs are returned in canonical form. Relative references such
/// as `a.mp3` are kept trimmed but otherwise untouched.
///
/// # Errors
///
/// Returns [`PlaybackError::InvalidSource`] for empty input and for
/// strings that are not URI references.
pub fn normalize_uri(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PlaybackError::InvalidSource("URI is empty".to_string()));
    }

    if Path::new(raw).is_absolute() {
        return Url::from_file_path(raw)
            .map(String::from)
            .map_err(|_| PlaybackError::InvalidSource(format!("Invalid file path: {}", raw)));
    }

    match Url::parse(raw) {
        Ok(url) => Ok(url.into()),
        Err(ParseError::RelativeUrlWithoutBase) if is_uri_reference(raw) => Ok(raw.to_string()),
        Err(e) => Err(PlaybackError::InvalidSource(format!("{}: {}", e, raw))),
    }
}

/// Rejects characters a URI reference never contains unescaped.
fn is_uri_reference(raw: &str) -> bool {
    !raw.chars().any(|c| {
        c.is_whitespace()
            || c.is_control()
            || matches!(c, '"' | '<' | '>' | '\\' | '^' | '`' | '{' | '|' | '}')
    })
}
