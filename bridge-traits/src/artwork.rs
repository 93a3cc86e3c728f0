//! Artwork fetching bridge.

use bytes::Bytes;
use std::fmt;

/// Decoded artwork ready to hand to a now-playing surface.
///
/// `data` keeps the original encoded bytes; the dimensions come from
/// decoding them, so a value of this type is known to be a valid image.
#[derive(Clone, PartialEq, Eq)]
pub struct ArtworkImage {
    pub width: u32,
    pub height: u32,
    /// MIME type sniffed from the payload, when recognized.
    pub mime_type: Option<String>,
    pub data: Bytes,
}

impl ArtworkImage {
    pub fn new(width: u32, height: u32, data: Bytes) -> Self {
        Self {
            width,
            height,
            mime_type: None,
            data,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Size of the encoded payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for ArtworkImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtworkImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Downloads and decodes artwork for the now-playing surface.
///
/// Failures are not errors from the core's point of view: an implementation
/// returns `None` and the surface simply keeps showing no artwork.
#[async_trait::async_trait]
pub trait ArtworkFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Option<ArtworkImage>;
}
