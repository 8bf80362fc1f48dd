//! Application state
//!
//! The whole display is described by [`AppState`]. Every user interaction is
//! a pure transition from one state to the next, and rendering is a
//! projection of the current state. User input is mapped to actions through
//! the [`BINDINGS`] table rather than through ad-hoc wiring.

use crate::catalog::{DEFAULT_CDN_BASE, ThumbnailCandidate, candidates_with_base};
use crate::extractor::{VideoId, extract_video_id};
use crate::metadata_retrieval::VideoMetadata;
use serde::Serialize;

/// What the display currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// The last submission was not a recognizable video URL
    Error,
    /// Candidates (and possibly metadata) for a video are shown
    Displaying,
}

/// The complete state of the user-facing display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppState {
    #[serde(rename = "state")]
    display: DisplayState,
    #[serde(rename = "identifier")]
    current: Option<VideoId>,
    candidates: Vec<ThumbnailCandidate>,
    metadata: Option<VideoMetadata>,
    #[serde(skip)]
    cdn_base: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_cdn_base(DEFAULT_CDN_BASE)
    }
}

impl AppState {
    /// Creates an idle state whose candidates point at `cdn_base`
    pub fn with_cdn_base(cdn_base: &str) -> Self {
        Self {
            display: DisplayState::Idle,
            current: None,
            candidates: Vec::new(),
            metadata: None,
            cdn_base: cdn_base.to_string(),
        }
    }

    pub fn display(&self) -> DisplayState {
        self.display
    }

    /// The identifier currently displayed, if any
    pub fn current(&self) -> Option<&VideoId> {
        self.current.as_ref()
    }

    pub fn candidates(&self) -> &[ThumbnailCandidate] {
        &self.candidates
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    /// Processes a submitted URL
    ///
    /// The input is trimmed before extraction. A failed extraction moves to
    /// [`DisplayState::Error`] and hides all results. A successful one replaces
    /// the candidate list wholesale and clears metadata until it arrives.
    pub fn submit(self, input: &str) -> Self {
        match extract_video_id(input.trim()) {
            Some(id) => Self {
                display: DisplayState::Displaying,
                candidates: candidates_with_base(&id, &self.cdn_base),
                current: Some(id),
                metadata: None,
                cdn_base: self.cdn_base,
            },
            None => Self {
                display: DisplayState::Error,
                current: None,
                candidates: Vec::new(),
                metadata: None,
                cdn_base: self.cdn_base,
            },
        }
    }

    /// Overlays metadata on the displayed candidates
    ///
    /// Metadata is applied in arrival order, whichever video it was fetched
    /// for. Outside of [`DisplayState::Displaying`] it is dropped because
    /// there is no panel to show it in.
    pub fn apply_metadata(self, metadata: VideoMetadata) -> Self {
        if self.display != DisplayState::Displaying {
            return self;
        }

        Self {
            metadata: Some(metadata),
            ..self
        }
    }
}

/// Something the user did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Enter pressed in the URL input
    EnterKey,
    /// The "get thumbnails" button
    SubmitButton,
    /// A candidate's download button
    DownloadButton,
    HelpKey,
    QuitKey,
}

/// The kind of action a trigger leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ProcessUrl,
    Download,
    ShowHelp,
    Quit,
}

/// Event-to-action mapping
pub const BINDINGS: [(Trigger, ActionKind); 5] = [
    (Trigger::EnterKey, ActionKind::ProcessUrl),
    (Trigger::SubmitButton, ActionKind::ProcessUrl),
    (Trigger::DownloadButton, ActionKind::Download),
    (Trigger::HelpKey, ActionKind::ShowHelp),
    (Trigger::QuitKey, ActionKind::Quit),
];

/// A trigger together with the text it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub trigger: Trigger,
    /// The URL for submissions, the 1-based card number for downloads
    pub payload: String,
}

/// A fully resolved action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Extract and display the given input
    ProcessUrl(String),
    /// Download the candidate at this 0-based index
    Download(usize),
    ShowHelp,
    Quit,
}

/// Turns a line of interactive input into an event
///
/// - `q`, `quit`, `exit` quit
/// - `?`, `h`, `help` show help
/// - `d <n>` or `download <n>` downloads card `n`
/// - anything else is a URL submitted with Enter
pub fn parse_event(line: &str) -> InputEvent {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("").to_lowercase();

    let (trigger, payload) = match command.as_str() {
        "q" | "quit" | "exit" => (Trigger::QuitKey, String::new()),
        "?" | "h" | "help" => (Trigger::HelpKey, String::new()),
        "d" | "download" => (
            Trigger::DownloadButton,
            words.next().unwrap_or("").to_string(),
        ),
        _ => (Trigger::EnterKey, line.to_string()),
    };

    InputEvent { trigger, payload }
}

/// Resolves an event through [`BINDINGS`]
///
/// Returns `None` for unbound triggers and for download events whose payload
/// is not a card number of at least 1.
pub fn action_for(event: &InputEvent) -> Option<Action> {
    let (_, kind) = BINDINGS.iter().find(|(t, _)| *t == event.trigger)?;

    match kind {
        ActionKind::ProcessUrl => Some(Action::ProcessUrl(event.payload.clone())),
        ActionKind::Download => event
            .payload
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map(Action::Download),
        ActionKind::ShowHelp => Some(Action::ShowHelp),
        ActionKind::Quit => Some(Action::Quit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn metadata(title: &str) -> VideoMetadata {
        VideoMetadata {
            title: title.to_string(),
            description: "desc".to_string(),
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = AppState::default();
        assert_eq!(state.display(), DisplayState::Idle);
        assert!(state.candidates().is_empty());
        assert!(state.current().is_none());
    }

    #[test]
    fn test_valid_submission_displays_candidates() {
        let state = AppState::default().submit(&format!("  {}  ", WATCH_URL));

        assert_eq!(state.display(), DisplayState::Displaying);
        assert_eq!(state.current().unwrap().as_str(), "dQw4w9WgXcQ");
        assert_eq!(state.candidates().len(), 4);
        assert!(state.metadata().is_none());
    }

    #[test]
    fn test_invalid_submission_hides_previous_results() {
        let state = AppState::default()
            .submit(WATCH_URL)
            .apply_metadata(metadata("Title"))
            .submit("not a url");

        assert_eq!(state.display(), DisplayState::Error);
        assert!(state.candidates().is_empty());
        assert!(state.metadata().is_none());
        assert!(state.current().is_none());
    }

    #[test]
    fn test_resubmission_replaces_candidates() {
        let state = AppState::default()
            .submit(WATCH_URL)
            .submit("https://youtu.be/aaaaaaaaaaa");

        assert_eq!(state.candidates().len(), 4);
        assert!(
            state
                .candidates()
                .iter()
                .all(|c| c.image_url.contains("aaaaaaaaaaa"))
        );
    }

    #[test]
    fn test_error_then_valid_submission_recovers() {
        let state = AppState::default().submit("nope").submit(WATCH_URL);
        assert_eq!(state.display(), DisplayState::Displaying);
    }

    #[test]
    fn test_metadata_only_applies_while_displaying() {
        let idle = AppState::default().apply_metadata(metadata("Title"));
        assert!(idle.metadata().is_none());

        let error = AppState::default().submit("nope").apply_metadata(metadata("Title"));
        assert!(error.metadata().is_none());

        let displaying = AppState::default()
            .submit(WATCH_URL)
            .apply_metadata(metadata("Title"));
        assert_eq!(displaying.metadata().unwrap().title, "Title");
    }

    #[test]
    fn test_last_arriving_metadata_wins() {
        let state = AppState::default()
            .submit(WATCH_URL)
            .apply_metadata(metadata("newer"))
            .apply_metadata(metadata("stale"));

        assert_eq!(state.metadata().unwrap().title, "stale");
    }

    #[test]
    fn test_custom_cdn_base_is_used() {
        let state = AppState::with_cdn_base("http://cdn.local/vi").submit(WATCH_URL);
        assert!(state.candidates()[0].image_url.starts_with("http://cdn.local/vi/"));
    }

    #[test]
    fn test_parse_event() {
        assert_eq!(parse_event("q").trigger, Trigger::QuitKey);
        assert_eq!(parse_event(" HELP ").trigger, Trigger::HelpKey);

        let download = parse_event("d 3");
        assert_eq!(download.trigger, Trigger::DownloadButton);
        assert_eq!(download.payload, "3");

        let submit = parse_event(&format!("{}\n", WATCH_URL));
        assert_eq!(submit.trigger, Trigger::EnterKey);
        assert_eq!(submit.payload, WATCH_URL);
    }

    #[test]
    fn test_action_for() {
        assert_eq!(
            action_for(&parse_event(WATCH_URL)),
            Some(Action::ProcessUrl(WATCH_URL.to_string()))
        );
        assert_eq!(action_for(&parse_event("download 1")), Some(Action::Download(0)));
        assert_eq!(action_for(&parse_event("d 0")), None);
        assert_eq!(action_for(&parse_event("d two")), None);
        assert_eq!(action_for(&parse_event("exit")), Some(Action::Quit));
        assert_eq!(
            action_for(&InputEvent {
                trigger: Trigger::SubmitButton,
                payload: "x".to_string(),
            }),
            Some(Action::ProcessUrl("x".to_string()))
        );
    }

    #[test]
    fn test_every_trigger_is_bound() {
        for trigger in [
            Trigger::EnterKey,
            Trigger::SubmitButton,
            Trigger::DownloadButton,
            Trigger::HelpKey,
            Trigger::QuitKey,
        ] {
            assert!(BINDINGS.iter().any(|(t, _)| *t == trigger), "{:?}", trigger);
        }
    }
}
