//! Cached metadata provider implementation
//!
//! This module provides a caching wrapper for metadata providers that keeps
//! successful lookups in memory for the lifetime of the wrapper.

use super::{MetadataProvider, MetadataRetrievalError, VideoMetadata};
use crate::extractor::VideoId;
use std::collections::HashMap;
use std::sync::Mutex;

/// A caching wrapper for metadata providers
///
/// This provider wraps another metadata provider and remembers its results
/// so that resubmitting the same video does not issue another request.
/// Nothing is persisted: the cache lives exactly as long as the session that
/// owns it. Failed lookups are not cached.
pub struct CachedMetadataProvider<P>
where
    P: MetadataProvider,
{
    /// The underlying metadata provider
    provider: P,
    /// Successful lookups keyed by video identifier
    cache: Mutex<HashMap<String, VideoMetadata>>,
}

impl<P> CachedMetadataProvider<P>
where
    P: MetadataProvider,
{
    /// Creates a new cached metadata provider wrapping the given provider
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let cached = CachedMetadataProvider::new(NoEmbedProvider::new());
    /// ```
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, id: &VideoId) -> Option<VideoMetadata> {
        // A poisoned lock only means another lookup panicked mid-insert
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(id.as_str()).cloned()
    }
}

impl<P> MetadataProvider for CachedMetadataProvider<P>
where
    P: MetadataProvider,
{
    fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata, MetadataRetrievalError> {
        if let Some(metadata) = self.cached(id) {
            log::debug!("Metadata cache hit for {}", id);
            return Ok(metadata);
        }

        let metadata = self.provider.fetch_metadata(id)?;

        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string(), metadata.clone());

        Ok(metadata)
    }
}
