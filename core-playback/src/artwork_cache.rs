//! In-memory artwork cache.
//!
//! Keyed by artwork URI and independent of the session lifetime, so
//! replaying a recent item shows its artwork right away. A miss is never an
//! error; it only defers the artwork until a fetch completes.

use bridge_traits::ArtworkImage;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Bounded LRU of decoded artwork plus the set of URIs being fetched.
#[derive(Debug)]
pub struct ArtworkCache {
    inner: Mutex<CacheState>,
}

#[derive(Debug)]
struct CacheState {
    images: LruCache<String, Arc<ArtworkImage>>,
    in_flight: HashSet<String>,
}

impl ArtworkCache {
    /// Capacity is clamped to at least one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheState {
                images: LruCache::new(capacity),
                in_flight: HashSet::new(),
            }),
        }
    }

    /// Look up an image and mark it most recently used.
    pub fn get(&self, uri: &str) -> Option<Arc<ArtworkImage>> {
        self.inner.lock().images.get(uri).cloned()
    }

    /// Claim the right to fetch `uri`.
    ///
    /// Returns `false` if the image is already cached or another fetch for
    /// the same URI is still running.
    pub fn begin_fetch(&self, uri: &str) -> bool {
        let mut state = self.inner.lock();
        if state.images.contains(uri) || state.in_flight.contains(uri) {
            return false;
        }
        state.in_flight.insert(uri.to_string());
        true
    }

    /// Record the outcome of a fetch started with [`begin_fetch`](Self::begin_fetch).
    pub fn finish_fetch(&self, uri: &str, image: Option<Arc<ArtworkImage>>) {
        let mut state = self.inner.lock();
        state.in_flight.remove(uri);
        if let Some(image) = image {
            state.images.put(uri.to_string(), image);
        }
    }

    pub fn is_fetching(&self, uri: &str) -> bool {
        self.inner.lock().in_flight.contains(uri)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
