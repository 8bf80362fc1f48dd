/// oEmbed API response types for deserialization.
///
/// These structures mirror the JSON returned by the noembed lookup endpoint.
use serde::Deserialize;

/// The response of the `/embed` endpoint.
///
/// Every field is optional: unknown videos are reported with HTTP 200 and
/// only an `error` field.
#[derive(Debug, Deserialize)]
pub(super) struct OEmbedResponse {
    /// The video title
    pub title: Option<String>,
    /// The name of the uploading channel
    pub author_name: Option<String>,
    /// Set by the service when the URL could not be resolved
    pub error: Option<String>,
}
