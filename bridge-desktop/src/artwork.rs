//! Artwork fetching over HTTP(S) and from local files.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    ArtworkFetcher, ArtworkImage,
};
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Largest artwork payload accepted, in bytes.
pub const DEFAULT_MAX_ARTWORK_BYTES: usize = 8 * 1024 * 1024;

/// Reqwest-based artwork fetcher.
///
/// Supports `http`, `https` and `file` URIs. The payload is decoded with the
/// `image` crate before it is handed out, so only images the surface can
/// actually show get through. Every failure ends in `None`.
pub struct HttpArtworkFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpArtworkFetcher {
    /// Create a fetcher with default timeouts.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(15))
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(2)
            .user_agent(concat!("nowplaying-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Use an existing client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_bytes: DEFAULT_MAX_ARTWORK_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn download(&self, url: &Url) -> Result<Bytes> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }
        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(BridgeError::OperationFailed(format!(
                    "Artwork too large: {} bytes",
                    length
                )));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
        self.check_size(body)
    }

    async fn read_file(&self, url: &Url) -> Result<Bytes> {
        let path = url
            .to_file_path()
            .map_err(|_| BridgeError::OperationFailed(format!("Not a local path: {}", url)))?;
        let data = tokio::fs::read(&path).await?;
        self.check_size(Bytes::from(data))
    }

    fn check_size(&self, data: Bytes) -> Result<Bytes> {
        if data.len() > self.max_bytes {
            return Err(BridgeError::OperationFailed(format!(
                "Artwork too large: {} bytes",
                data.len()
            )));
        }
        Ok(data)
    }

    async fn load(&self, uri: &str) -> Result<ArtworkImage> {
        let url = Url::parse(uri).map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
        let data = match url.scheme() {
            "http" | "https" => self.download(&url).await?,
            "file" => self.read_file(&url).await?,
            other => {
                return Err(BridgeError::NotAvailable(format!(
                    "Unsupported artwork scheme: {}",
                    other
                )))
            }
        };

        tokio::task::spawn_blocking(move || decode_artwork(data))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Decode task failed: {}", e)))?
    }
}

#[async_trait]
impl ArtworkFetcher for HttpArtworkFetcher {
    async fn fetch(&self, uri: &str) -> Option<ArtworkImage> {
        match self.load(uri).await {
            Ok(image) => {
                debug!(
                    width = image.width,
                    height = image.height,
                    bytes = image.byte_len(),
                    "Artwork loaded"
                );
                Some(image)
            }
            Err(e) => {
                warn!(error = %e, "Artwork fetch failed");
                None
            }
        }
    }
}

/// Decode `data` to learn its dimensions and MIME type.
pub fn decode_artwork(data: Bytes) -> Result<ArtworkImage> {
    let format = image::guess_format(&data)
        .map_err(|e| BridgeError::OperationFailed(format!("Unknown image format: {}", e)))?;
    let img = image::load_from_memory_with_format(&data, format)
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to decode image: {}", e)))?;

    Ok(ArtworkImage::new(img.width(), img.height(), data).with_mime_type(format.to_mime_type()))
}
