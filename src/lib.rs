//! thumb_grabber - Grab the thumbnails of a video from its URL
//!
//! This library extracts the video identifier from a pasted URL, lists the
//! thumbnail images available for it in every quality, looks up the video's
//! title in the background and saves the chosen thumbnails to disk.

mod cache;
mod catalog;
mod downloader;
mod extractor;
mod metadata_retrieval;
mod naming;
mod offline;
mod render;
mod session;
mod state;
mod temp;

use serde::Serialize;
use std::path::PathBuf;
use std::thread;
use thiserror::Error;

// Re-export error types
pub use cache::CacheError;
pub use downloader::DownloadError;
pub use metadata_retrieval::MetadataRetrievalError;
pub use naming::NamingError;
pub use offline::OfflineCacheError;

pub use catalog::{
    DEFAULT_CDN_BASE, QUALITY_VARIANTS, QualityVariant, THUMBNAIL_EXTENSION, ThumbnailCandidate,
    candidates, candidates_with_base, variant_by_suffix,
};
pub use downloader::{
    DownloadOutcome, FallbackOpener, HttpImageFetcher, ImageFetcher, SystemOpener, download_image,
};
pub use extractor::{VIDEO_ID_LENGTH, VideoId, extract_video_id};
pub use metadata_retrieval::{
    CachedMetadataProvider, DEFAULT_METADATA_ENDPOINT, FALLBACK_DESCRIPTION, MetadataProvider,
    NoEmbedProvider, VideoMetadata, fetch_or_fallback, watch_url,
};
pub use naming::{
    DEFAULT_NAME_FORMAT, format_filename, sanitize_filename, unique_destination, validate_format,
};
pub use offline::{
    AssetNetwork, AssetSource, CORE_ASSETS, CachedAsset, DEFAULT_CACHE_NAME, HttpAssetNetwork,
    OfflineCache,
};
pub use render::{
    ERROR_MESSAGE, IDLE_MESSAGE, render, render_cards, render_event_json, render_json,
    render_metadata_panel,
};
pub use session::{MetadataListener, Session};
pub use state::{
    Action, ActionKind, AppState, BINDINGS, DisplayState, InputEvent, Trigger, action_for,
    parse_event,
};

/// Top-level error type for thumb_grabber operations
#[derive(Debug, Error)]
pub enum ThumbGrabberError {
    /// Error in the configured filename format
    #[error("Naming error: {0}")]
    Naming(#[from] NamingError),

    /// Error while installing or reading the offline cache
    #[error("Offline cache error: {0}")]
    OfflineCache(#[from] OfflineCacheError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabberConfig {
    /// Base path of the thumbnail CDN
    pub cdn_base: String,
    /// Base URL of the oEmbed metadata service
    pub metadata_endpoint: String,
    /// Directory downloads are saved to
    pub output_dir: PathBuf,
    /// Format of saved filenames, see [`format_filename`]
    pub name_format: String,
    /// Name of the offline asset cache
    pub cache_name: String,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        // Like a browser, save into the user's download folder when there is one
        let output_dir = directories::UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            output_dir,
            name_format: DEFAULT_NAME_FORMAT.to_string(),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
        }
    }
}

impl GrabberConfig {
    /// Checks the settings that can be wrong without touching the network
    pub fn validate(&self) -> Result<(), ThumbGrabberError> {
        validate_format(&self.name_format)?;
        Ok(())
    }

    /// Whether saved filenames contain the looked-up title
    pub fn needs_title(&self) -> bool {
        self.name_format.contains("{title}")
    }
}

/// Progress event emitted while grabbing thumbnails
///
/// These events allow library users to display results as soon as they are
/// known: candidates are reported before the metadata lookup finishes.
/// Serialized, each event is an object tagged with its `event` name.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The input did not contain a recognizable video URL
    InvalidInput { input: String },

    /// Thumbnail candidates are ready to be shown
    CandidatesReady {
        id: VideoId,
        candidates: Vec<ThumbnailCandidate>,
    },

    /// Metadata (or its fallback) arrived
    MetadataReady { id: VideoId, metadata: VideoMetadata },

    /// A thumbnail download is starting
    Downloading {
        index: usize,
        total: usize,
        url: String,
    },

    /// A thumbnail download finished, possibly through the fallback
    Downloaded { outcome: DownloadOutcome },
}

/// Extracts the identifier from `input` and builds the resulting state
///
/// Candidates are reported through `progress_callback` right after
/// extraction. When a `provider` is given its lookup runs on a separate
/// thread at the same time; its result (or the fallback, should it fail or
/// panic) is reported afterwards and overlaid on the returned state.
///
/// # Examples
///
/// ```
/// use thumb_grabber::{grab_thumbnails, DisplayState, GrabberConfig};
///
/// let state = grab_thumbnails(
///     "https://youtu.be/dQw4w9WgXcQ",
///     &GrabberConfig::default(),
///     None,
///     |_| {},
/// );
/// assert_eq!(state.display(), DisplayState::Displaying);
/// assert_eq!(state.candidates().len(), 4);
/// ```
pub fn grab_thumbnails<F>(
    input: &str,
    config: &GrabberConfig,
    provider: Option<&dyn MetadataProvider>,
    mut progress_callback: F,
) -> AppState
where
    F: FnMut(ProgressEvent),
{
    let state = AppState::with_cdn_base(&config.cdn_base).submit(input);

    let Some(id) = state.current().cloned() else {
        progress_callback(ProgressEvent::InvalidInput {
            input: input.to_string(),
        });
        return state;
    };

    let Some(provider) = provider else {
        progress_callback(ProgressEvent::CandidatesReady {
            id,
            candidates: state.candidates().to_vec(),
        });
        return state;
    };

    thread::scope(|scope| {
        let lookup = scope.spawn(|| fetch_or_fallback(provider, &id));

        progress_callback(ProgressEvent::CandidatesReady {
            id: id.clone(),
            candidates: state.candidates().to_vec(),
        });

        let metadata = lookup.join().unwrap_or_else(|_| {
            log::warn!("Metadata lookup for {} panicked, using fallback", id);
            VideoMetadata::fallback(&id)
        });

        progress_callback(ProgressEvent::MetadataReady {
            id: id.clone(),
            metadata: metadata.clone(),
        });

        state.apply_metadata(metadata)
    })
}

/// Saves the given candidates of the displayed video into `config.output_dir`
///
/// Filenames follow `config.name_format`; the title placeholder uses the
/// state's metadata or, while none arrived, the fallback title. Every
/// download either saves the file or falls back to the opener.
pub fn save_candidates<I, O, F>(
    state: &AppState,
    indices: &[usize],
    config: &GrabberConfig,
    fetcher: &I,
    opener: &O,
    mut progress_callback: F,
) -> Vec<DownloadOutcome>
where
    I: ImageFetcher + ?Sized,
    O: FallbackOpener + ?Sized,
    F: FnMut(ProgressEvent),
{
    let Some(id) = state.current() else {
        return Vec::new();
    };

    let title = state
        .metadata()
        .cloned()
        .unwrap_or_else(|| VideoMetadata::fallback(id))
        .title;

    let selected: Vec<&ThumbnailCandidate> = indices
        .iter()
        .filter_map(|&i| state.candidates().get(i))
        .collect();

    let mut outcomes = Vec::with_capacity(selected.len());

    for (index, candidate) in selected.iter().enumerate() {
        progress_callback(ProgressEvent::Downloading {
            index,
            total: selected.len(),
            url: candidate.image_url.clone(),
        });

        let filename = format_filename(
            &config.name_format,
            id.as_str(),
            candidate.variant.suffix,
            &title,
            THUMBNAIL_EXTENSION,
        );

        let outcome = download_image(
            fetcher,
            opener,
            &candidate.image_url,
            &filename,
            &config.output_dir,
        );

        progress_callback(ProgressEvent::Downloaded {
            outcome: outcome.clone(),
        });
        outcomes.push(outcome);
    }

    outcomes
}

/// Grabs the candidates for `input` and saves the ones at `indices`
///
/// The title lookup only runs when `config.name_format` uses `{title}`;
/// otherwise saving starts as soon as the candidates are known.
pub fn download_thumbnails<I, O, F>(
    input: &str,
    config: &GrabberConfig,
    provider: Option<&dyn MetadataProvider>,
    indices: &[usize],
    fetcher: &I,
    opener: &O,
    mut progress_callback: F,
) -> (AppState, Vec<DownloadOutcome>)
where
    I: ImageFetcher + ?Sized,
    O: FallbackOpener + ?Sized,
    F: FnMut(ProgressEvent),
{
    let provider = provider.filter(|_| config.needs_title());

    let state = grab_thumbnails(input, config, provider, &mut progress_callback);
    let outcomes = save_candidates(
        &state,
        indices,
        config,
        fetcher,
        opener,
        &mut progress_callback,
    );

    (state, outcomes)
}

/// Installs the core assets into the configured offline cache
///
/// Returns the number of cached assets.
pub fn install_offline_cache<N>(
    config: &GrabberConfig,
    network: &N,
    origin: &str,
) -> Result<usize, ThumbGrabberError>
where
    N: AssetNetwork + ?Sized,
{
    let cache = OfflineCache::open(&config.cache_name)?;
    Ok(cache.install(network, origin)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::tests::{FailingProvider, StaticProvider};
    use crate::temp::create_temp_dir;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{self, Receiver};
    use std::time::Duration;

    const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    struct JpegFetcher;

    impl ImageFetcher for JpegFetcher {
        fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, DownloadError> {
            Ok(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'])
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl FallbackOpener for RecordingOpener {
        fn open(&self, url: &str) -> io::Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    /// Blocks until released, remembering whether the release came in time
    struct GatedProvider {
        gate: Mutex<Receiver<()>>,
        released: AtomicBool,
    }

    impl GatedProvider {
        fn new(gate: Receiver<()>) -> Self {
            Self {
                gate: Mutex::new(gate),
                released: AtomicBool::new(false),
            }
        }
    }

    impl MetadataProvider for GatedProvider {
        fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata, MetadataRetrievalError> {
            let released = self
                .gate
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(5))
                .is_ok();
            self.released.store(released, Ordering::SeqCst);

            Ok(VideoMetadata::from_lookup(format!("Gated {}", id), None))
        }
    }

    fn event_names(events: &[ProgressEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                ProgressEvent::InvalidInput { .. } => "invalid",
                ProgressEvent::CandidatesReady { .. } => "candidates",
                ProgressEvent::MetadataReady { .. } => "metadata",
                ProgressEvent::Downloading { .. } => "downloading",
                ProgressEvent::Downloaded { .. } => "downloaded",
            })
            .collect()
    }

    #[test]
    fn test_grab_reports_candidates_before_metadata() {
        let provider = StaticProvider::default();
        let mut events = Vec::new();

        let state = grab_thumbnails(
            WATCH_URL,
            &GrabberConfig::default(),
            Some(&provider),
            |e| events.push(e),
        );

        assert_eq!(event_names(&events), vec!["candidates", "metadata"]);
        assert_eq!(state.metadata().unwrap().title, "Title of dQw4w9WgXcQ");
    }

    #[test]
    fn test_grab_reports_candidates_while_lookup_is_in_flight() {
        let (release, gate) = mpsc::channel();
        let provider = GatedProvider::new(gate);
        let mut lines = Vec::new();

        grab_thumbnails(WATCH_URL, &GrabberConfig::default(), Some(&provider), |event| {
            if matches!(event, ProgressEvent::CandidatesReady { .. }) {
                release.send(()).unwrap();
            }
            lines.push(render_event_json(&event).unwrap());
        });

        assert!(
            provider.released.load(Ordering::SeqCst),
            "candidates were only reported after the lookup finished"
        );

        let candidates: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(candidates["event"], "candidates_ready");
        assert_eq!(candidates["id"], "dQw4w9WgXcQ");
        assert_eq!(candidates["candidates"].as_array().unwrap().len(), 4);

        let metadata: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(metadata["event"], "metadata_ready");
        assert_eq!(metadata["metadata"]["title"], "Gated dQw4w9WgXcQ");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_grab_with_failing_provider_uses_fallback() {
        let provider = FailingProvider::default();
        let mut events = Vec::new();

        let state = grab_thumbnails(
            "https://youtu.be/dQw4w9WgXcQ",
            &GrabberConfig::default(),
            Some(&provider),
            |e| events.push(e),
        );

        assert_eq!(state.candidates().len(), 4);
        assert_eq!(state.metadata().unwrap().title, "Video dQw4w9WgXcQ");
        let ProgressEvent::CandidatesReady { candidates, .. } = &events[0] else {
            panic!("candidates must be reported first");
        };
        assert_eq!(candidates.len(), 4);
    }

    #[test]
    fn test_grab_invalid_input() {
        let provider = StaticProvider::default();
        let mut events = Vec::new();

        let state = grab_thumbnails(
            "not a url",
            &GrabberConfig::default(),
            Some(&provider),
            |e| events.push(e),
        );

        assert_eq!(state.display(), DisplayState::Error);
        assert_eq!(event_names(&events), vec!["invalid"]);
        assert!(provider.requested.lock().unwrap().is_empty());
    }

    #[test]
    fn test_save_candidates_uses_name_format() {
        let dir = create_temp_dir("lib_test").unwrap();
        let config = GrabberConfig {
            output_dir: dir.to_path_buf(),
            name_format: "{id}-{quality}.{ext}".to_string(),
            ..GrabberConfig::default()
        };
        let state = AppState::default().submit(WATCH_URL);
        let opener = RecordingOpener::default();
        let mut events = Vec::new();

        let outcomes = save_candidates(&state, &[0, 2, 9], &config, &JpegFetcher, &opener, |e| {
            events.push(e)
        });

        assert_eq!(outcomes.len(), 2);
        assert!(dir.join("dQw4w9WgXcQ-maxresdefault.jpg").exists());
        assert!(dir.join("dQw4w9WgXcQ-hqdefault.jpg").exists());
        assert_eq!(
            event_names(&events),
            vec!["downloading", "downloaded", "downloading", "downloaded"]
        );
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_save_candidates_title_falls_back() {
        let dir = create_temp_dir("lib_test").unwrap();
        let config = GrabberConfig {
            output_dir: dir.to_path_buf(),
            name_format: "{title}.{ext}".to_string(),
            ..GrabberConfig::default()
        };
        let state = AppState::default().submit(WATCH_URL);

        save_candidates(
            &state,
            &[3],
            &config,
            &JpegFetcher,
            &RecordingOpener::default(),
            |_| {},
        );

        assert!(dir.join("Video dQw4w9WgXcQ.jpg").exists());
    }

    #[test]
    fn test_save_candidates_without_video_does_nothing() {
        let outcomes = save_candidates(
            &AppState::default().submit("nope"),
            &[0],
            &GrabberConfig::default(),
            &JpegFetcher,
            &RecordingOpener::default(),
            |_| {},
        );
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_download_without_title_skips_lookup() {
        let dir = create_temp_dir("lib_test").unwrap();
        let config = GrabberConfig {
            output_dir: dir.to_path_buf(),
            ..GrabberConfig::default()
        };
        let provider = FailingProvider::default();
        let mut events = Vec::new();

        let (state, outcomes) = download_thumbnails(
            WATCH_URL,
            &config,
            Some(&provider),
            &[0],
            &JpegFetcher,
            &RecordingOpener::default(),
            |e| events.push(e),
        );

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(state.metadata().is_none());
        assert_eq!(outcomes.len(), 1);
        assert!(dir.join("maxresdefault.jpg").exists());
        assert_eq!(event_names(&events), vec!["candidates", "downloading", "downloaded"]);
    }

    #[test]
    fn test_download_with_title_waits_for_lookup() {
        let dir = create_temp_dir("lib_test").unwrap();
        let config = GrabberConfig {
            output_dir: dir.to_path_buf(),
            name_format: "{title} - {quality}.{ext}".to_string(),
            ..GrabberConfig::default()
        };
        let mut events = Vec::new();

        download_thumbnails(
            WATCH_URL,
            &config,
            Some(&StaticProvider::default()),
            &[2],
            &JpegFetcher,
            &RecordingOpener::default(),
            |e| events.push(e),
        );

        assert!(dir.join("Title of dQw4w9WgXcQ - hqdefault.jpg").exists());
        assert_eq!(
            event_names(&events),
            vec!["candidates", "metadata", "downloading", "downloaded"]
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(GrabberConfig::default().validate().is_ok());

        let config = GrabberConfig {
            name_format: "{show}.{ext}".to_string(),
            ..GrabberConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ThumbGrabberError::Naming(_))
        ));
    }

    #[test]
    fn test_needs_title() {
        assert!(!GrabberConfig::default().needs_title());

        let config = GrabberConfig {
            name_format: "{id} {title}.{ext}".to_string(),
            ..GrabberConfig::default()
        };
        assert!(config.needs_title());
    }
}
