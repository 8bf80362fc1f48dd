//! Interactive session
//!
//! Drives [`AppState`] for a sequence of user submissions. Every successful
//! submission starts an independent background metadata lookup whose result
//! comes back over a channel; results are applied in the order they arrive,
//! so a slow lookup for an older video may overwrite a newer one. A
//! [`MetadataListener`] hears about each result the moment it is ready,
//! before the session applies it.

use crate::catalog::ThumbnailCandidate;
use crate::extractor::VideoId;
use crate::metadata_retrieval::{MetadataProvider, VideoMetadata, fetch_or_fallback};
use crate::state::AppState;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Callback run on the lookup thread when a result is ready
pub type MetadataListener = Arc<dyn Fn(&VideoId, &VideoMetadata) + Send + Sync>;

/// State of one interactive run
pub struct Session {
    state: AppState,
    provider: Option<Arc<dyn MetadataProvider>>,
    listener: Option<MetadataListener>,
    sender: Sender<VideoMetadata>,
    receiver: Receiver<VideoMetadata>,
    /// Lookups started but not yet received
    pending: usize,
}

impl Session {
    /// Creates a session; without a provider no metadata is ever looked up
    pub fn new(provider: Option<Arc<dyn MetadataProvider>>, cdn_base: &str) -> Self {
        let (sender, receiver) = mpsc::channel();

        Self {
            state: AppState::with_cdn_base(cdn_base),
            provider,
            listener: None,
            sender,
            receiver,
            pending: 0,
        }
    }

    /// Registers a listener for finished lookups, replacing any earlier one
    pub fn on_metadata<L>(mut self, listener: L) -> Self
    where
        L: Fn(&VideoId, &VideoMetadata) + Send + Sync + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of metadata lookups still in flight
    pub fn pending_lookups(&self) -> usize {
        self.pending
    }

    /// The candidate at a 0-based index of the current display
    pub fn candidate(&self, index: usize) -> Option<&ThumbnailCandidate> {
        self.state.candidates().get(index)
    }

    /// Submits user input and returns the new state without waiting for metadata
    pub fn submit(&mut self, input: &str) -> &AppState {
        self.state = std::mem::take(&mut self.state).submit(input);

        if let (Some(id), Some(provider)) = (self.state.current(), &self.provider) {
            let id = id.clone();
            let provider = Arc::clone(provider);
            let sender = self.sender.clone();
            let listener = self.listener.clone();

            self.pending += 1;
            thread::spawn(move || {
                let metadata =
                    panic::catch_unwind(AssertUnwindSafe(|| fetch_or_fallback(&*provider, &id)))
                        .unwrap_or_else(|_| {
                            log::warn!("Metadata lookup for {} panicked, using fallback", id);
                            VideoMetadata::fallback(&id)
                        });

                if let Some(listener) = listener {
                    listener(&id, &metadata);
                }

                // The session may already be gone
                let _ = sender.send(metadata);
            });
        }

        &self.state
    }

    /// Applies every metadata result that has already arrived
    ///
    /// Returns `true` when at least one result was applied.
    pub fn poll_metadata(&mut self) -> bool {
        let mut applied = false;

        while let Ok(metadata) = self.receiver.try_recv() {
            self.apply(metadata);
            applied = true;
        }

        applied
    }

    /// Blocks until the next metadata result arrives and applies it
    ///
    /// Returns `false` immediately when no lookup is in flight.
    pub fn wait_for_metadata(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }

        match self.receiver.recv() {
            Ok(metadata) => {
                self.apply(metadata);
                true
            }
            Err(_) => false,
        }
    }

    fn apply(&mut self, metadata: VideoMetadata) {
        self.pending = self.pending.saturating_sub(1);
        self.state = std::mem::take(&mut self.state).apply_metadata(metadata);
    }
}
