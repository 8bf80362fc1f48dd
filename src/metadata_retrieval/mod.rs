/// Data structures and traits for video metadata retrieval.
///
/// This module provides the display metadata shown next to thumbnails
/// (title and description), the trait implemented by metadata providers, and
/// the fallback policy applied when a lookup fails.
mod cached;
mod noembed;
mod noembed_types;

pub use cached::CachedMetadataProvider;
pub use noembed::{DEFAULT_METADATA_ENDPOINT, NoEmbedProvider, watch_url};

use crate::extractor::VideoId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Description used when the metadata lookup is unavailable
pub const FALLBACK_DESCRIPTION: &str = "No description available.";

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataRetrievalError {
    /// Request to the metadata provider failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The provider does not know the requested video
    #[error("Video not found: {0}")]
    VideoNotFound(String),

    /// The API returned invalid or unexpected data
    #[error("API returned invalid data: {0}")]
    InvalidData(String),
}

/// Display metadata for a single video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// The video title
    pub title: String,
    /// A short description, naming the author when known
    pub description: String,
}

impl VideoMetadata {
    /// Builds metadata from a title and an optional author name
    pub fn from_lookup(title: String, author: Option<&str>) -> Self {
        let description = match author.map(str::trim).filter(|a| !a.is_empty()) {
            Some(author) => format!("Uploaded by {}", author),
            None => "Uploaded by an unknown author".to_string(),
        };

        Self { title, description }
    }

    /// The deterministic value shown when no metadata could be retrieved
    pub fn fallback(id: &VideoId) -> Self {
        Self {
            title: format!("Video {}", id),
            description: FALLBACK_DESCRIPTION.to_string(),
        }
    }
}

/// Trait for metadata providers that can fetch video information.
///
/// Providers are `Send + Sync` so lookups can run on a background thread
/// while thumbnails are already being displayed.
pub trait MetadataProvider: Send + Sync {
    /// Fetches display metadata for a video.
    ///
    /// # Arguments
    ///
    /// * `id` - The identifier of the video to look up
    ///
    /// # Returns
    ///
    /// A Result containing the VideoMetadata, or a MetadataRetrievalError
    fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata, MetadataRetrievalError>;
}

impl<P> MetadataProvider for std::sync::Arc<P>
where
    P: MetadataProvider + ?Sized,
{
    fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata, MetadataRetrievalError> {
        (**self).fetch_metadata(id)
    }
}

/// Fetches metadata, degrading to [`VideoMetadata::fallback`] on any failure
///
/// Failures are never propagated; they are logged as warnings for
/// diagnostics only.
pub fn fetch_or_fallback<P>(provider: &P, id: &VideoId) -> VideoMetadata
where
    P: MetadataProvider + ?Sized,
{
    match provider.fetch_metadata(id) {
        Ok(metadata) => metadata,
        Err(e) => {
            log::warn!("Metadata lookup for {} failed, using fallback: {}", id, e);
            VideoMetadata::fallback(id)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extractor::extract_video_id;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that always fails, counting how often it was asked
    #[derive(Default)]
    pub(crate) struct FailingProvider {
        pub calls: AtomicUsize,
    }

    impl MetadataProvider for FailingProvider {
        fn fetch_metadata(&self, _id: &VideoId) -> Result<VideoMetadata, MetadataRetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(MetadataRetrievalError::RequestError(
                "connection refused".to_string(),
            ))
        }
    }

    /// Provider answering with a fixed title and recording requested ids
    #[derive(Default)]
    pub(crate) struct StaticProvider {
        pub requested: Mutex<Vec<String>>,
    }

    impl MetadataProvider for StaticProvider {
        fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata, MetadataRetrievalError> {
            self.requested.lock().unwrap().push(id.to_string());
            Ok(VideoMetadata::from_lookup(
                format!("Title of {}", id),
                Some("Some Channel"),
            ))
        }
    }

    pub(crate) fn video_id() -> VideoId {
        extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_fallback_title() {
        let metadata = VideoMetadata::fallback(&video_id());
        assert_eq!(metadata.title, "Video dQw4w9WgXcQ");
        assert_eq!(metadata.description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn test_fetch_or_fallback_recovers_from_failure() {
        let provider = FailingProvider::default();
        let metadata = fetch_or_fallback(&provider, &video_id());

        assert_eq!(metadata, VideoMetadata::fallback(&video_id()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fetch_or_fallback_passes_success_through() {
        let provider = StaticProvider::default();
        let metadata = fetch_or_fallback(&provider, &video_id());

        assert_eq!(metadata.title, "Title of dQw4w9WgXcQ");
        assert_eq!(metadata.description, "Uploaded by Some Channel");
    }

    #[test]
    fn test_description_without_author() {
        let metadata = VideoMetadata::from_lookup("A title".to_string(), None);
        assert_eq!(metadata.description, "Uploaded by an unknown author");

        let metadata = VideoMetadata::from_lookup("A title".to_string(), Some("  "));
        assert_eq!(metadata.description, "Uploaded by an unknown author");
    }
}
