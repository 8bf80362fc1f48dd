//! Text rendering of the application state
//!
//! Rendering never mutates anything: it is a projection of [`AppState`]
//! into the text shown in the terminal (or JSON for scripting).

use crate::ProgressEvent;
use crate::catalog::ThumbnailCandidate;
use crate::metadata_retrieval::VideoMetadata;
use crate::state::{AppState, DisplayState};
use std::fmt::Write;

/// Message shown while nothing has been submitted
pub const IDLE_MESSAGE: &str = "Paste a video URL to grab its thumbnails.";

/// Message shown for input that is not a recognizable video URL
pub const ERROR_MESSAGE: &str = "Invalid URL. Please enter a valid video link.";

/// Renders the state as human-readable text
///
/// The metadata panel is drawn above the cards when present; its absence
/// never hides the cards.
pub fn render(state: &AppState) -> String {
    match state.display() {
        DisplayState::Idle => format!("{}\n", IDLE_MESSAGE),
        DisplayState::Error => format!("Error: {}\n", ERROR_MESSAGE),
        DisplayState::Displaying => render_results(state),
    }
}

fn render_results(state: &AppState) -> String {
    let mut out = String::new();

    if let Some(metadata) = state.metadata() {
        out.push_str(&render_metadata_panel(metadata, state.candidates().first()));
        out.push('\n');
    }

    out.push_str(&render_cards(state.candidates()));
    out
}

/// Renders one card per candidate, numbered from 1
pub fn render_cards(candidates: &[ThumbnailCandidate]) -> String {
    let mut out = String::new();

    for (index, candidate) in candidates.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = writeln!(out, "[{}] {}", index + 1, candidate.variant.label);
        let _ = writeln!(out, "    Resolution: {}", candidate.variant.resolution);
        let _ = writeln!(out, "    Image:      {}", candidate.image_url);
        let _ = writeln!(out, "    Save as:    {}", candidate.suggested_filename());
    }

    out
}

/// Renders the metadata panel
///
/// The highest quality candidate, when given, doubles as the panel's backdrop.
pub fn render_metadata_panel(
    metadata: &VideoMetadata,
    backdrop: Option<&ThumbnailCandidate>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== {} ===", metadata.title);
    let _ = writeln!(out, "{}", metadata.description);
    if let Some(backdrop) = backdrop {
        let _ = writeln!(out, "Backdrop: {}", backdrop.image_url);
    }

    out
}

/// Renders the state as pretty-printed JSON
pub fn render_json(state: &AppState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(state)
}

/// Renders one progress event as a single line of JSON
///
/// Printing these as they happen gives a JSON Lines stream in which the
/// candidates come first and the metadata follows once it arrived.
pub fn render_event_json(event: &ProgressEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
