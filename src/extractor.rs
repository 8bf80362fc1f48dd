//! Video identifier extraction
//!
//! This module locates a video identifier inside a user-supplied URL. A single
//! pattern covers every supported URL shape; the identifier is accepted only
//! when it is exactly [`VIDEO_ID_LENGTH`] characters long.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Number of characters in a valid video identifier
pub const VIDEO_ID_LENGTH: usize = 11;

/// Matches short links, watch queries, embeds, legacy `v/` and numbered-user
/// paths, live streams and shorts. The greedy leading `.*` makes the last
/// recognized prefix in the input win.
static VIDEO_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^.*(?P<prefix>(youtu.be/)|(v/)|(/u/\w/)|(embed/)|(watch\?)|(live/)|(shorts/))\??v?=?(?P<id>[^#&?\s]*).*",
    )
    .expect("video URL pattern is a valid regex")
});

/// An 11-character video identifier
///
/// Values of this type are only ever produced by [`extract_video_id`], so
/// holding one means the length check already passed. The character set is
/// not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which part of a matched URL holds what
///
/// Capture groups are looked up by name so the pattern can change shape
/// without silently shifting indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UrlMatch<'a> {
    /// The recognized path or query prefix (e.g. `youtu.be/`, `watch?`)
    prefix: &'a str,
    /// The token following the prefix
    token: &'a str,
}

fn match_url(input: &str) -> Option<UrlMatch<'_>> {
    let captures = VIDEO_URL_PATTERN.captures(input)?;
    Some(UrlMatch {
        prefix: captures.name("prefix")?.as_str(),
        token: captures.name("id").map_or("", |m| m.as_str()),
    })
}

/// Extracts the video identifier from a URL
///
/// The input is used as given; callers are expected to trim it first.
/// Returns `None` when no supported URL shape is found, or when the token
/// following the recognized prefix is not exactly 11 characters long. There
/// is no partial success: a URL-like prefix with a short or long token is a
/// failure.
///
/// # Examples
///
/// ```
/// use thumb_grabber::extract_video_id;
///
/// let id = extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
/// assert_eq!(id.as_str(), "dQw4w9WgXcQ");
///
/// assert!(extract_video_id("not a url").is_none());
/// ```
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    let url_match = match_url(input)?;

    if url_match.token.chars().count() != VIDEO_ID_LENGTH {
        log::debug!(
            "Rejected token {:?} after prefix {:?}: not {} characters",
            url_match.token,
            url_match.prefix,
            VIDEO_ID_LENGTH
        );
        return None;
    }

    Some(VideoId(url_match.token.to_string()))
}
