/// oEmbed metadata provider implementation.
use super::noembed_types::OEmbedResponse;
use super::{MetadataProvider, MetadataRetrievalError, VideoMetadata};
use crate::extractor::VideoId;

/// Default base URL of the oEmbed lookup service
pub const DEFAULT_METADATA_ENDPOINT: &str = "https://noembed.com";

/// Builds the canonical watch page URL for a video
pub fn watch_url(id: &VideoId) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

/// Metadata provider for oEmbed style lookup services.
///
/// This provider asks `<base_url>/embed?url=<watch url>` for the title and
/// author of a video.
pub struct NoEmbedProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NoEmbedProvider {
    /// Creates a provider talking to the default lookup service.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_METADATA_ENDPOINT)
    }

    /// Creates a provider talking to the lookup service at `base_url`.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the lookup URL for a video, with the watch URL percent-encoded.
    pub fn lookup_url(&self, id: &VideoId) -> String {
        format!(
            "{}/embed?url={}",
            self.base_url,
            urlencoding::encode(&watch_url(id))
        )
    }

    /// Converts an oEmbed payload to our internal VideoMetadata structure.
    fn convert_response(
        id: &VideoId,
        response: OEmbedResponse,
    ) -> Result<VideoMetadata, MetadataRetrievalError> {
        if let Some(error) = response.error {
            return Err(MetadataRetrievalError::VideoNotFound(format!(
                "{} ({})",
                id, error
            )));
        }

        let title = response
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                MetadataRetrievalError::InvalidData("No title in API response".to_string())
            })?;

        Ok(VideoMetadata::from_lookup(
            title,
            response.author_name.as_deref(),
        ))
    }
}

impl Default for NoEmbedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider for NoEmbedProvider {
    fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata, MetadataRetrievalError> {
        let url = self.lookup_url(id);
        log::debug!("Fetching metadata from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| MetadataRetrievalError::RequestError(e.to_string()))?;

        if response.status() == 404 {
            return Err(MetadataRetrievalError::VideoNotFound(id.to_string()));
        }

        // Ensure request was successful
        if !response.status().is_success() {
            return Err(MetadataRetrievalError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let payload: OEmbedResponse = response
            .json()
            .map_err(|e| MetadataRetrievalError::ParseError(e.to_string()))?;

        Self::convert_response(id, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata_retrieval::tests::video_id;

    fn parse(json: &str) -> OEmbedResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_lookup_url_encodes_watch_url() {
        let provider = NoEmbedProvider::with_base_url("https://noembed.com/");
        assert_eq!(
            provider.lookup_url(&video_id()),
            "https://noembed.com/embed?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_convert_full_payload() {
        let payload = parse(
            r#"{"title":"Never Gonna Give You Up","author_name":"Rick Astley","provider_name":"YouTube"}"#,
        );
        let metadata = NoEmbedProvider::convert_response(&video_id(), payload).unwrap();

        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert_eq!(metadata.description, "Uploaded by Rick Astley");
    }

    #[test]
    fn test_convert_payload_without_author() {
        let payload = parse(r#"{"title":"Untitled upload"}"#);
        let metadata = NoEmbedProvider::convert_response(&video_id(), payload).unwrap();

        assert_eq!(metadata.title, "Untitled upload");
        assert_eq!(metadata.description, "Uploaded by an unknown author");
    }

    #[test]
    fn test_convert_error_payload() {
        let payload =
            parse(r#"{"error":"404 Not Found","url":"https://www.youtube.com/watch?v=x"}"#);
        let result = NoEmbedProvider::convert_response(&video_id(), payload);

        assert!(matches!(result, Err(MetadataRetrievalError::VideoNotFound(_))));
    }

    #[test]
    fn test_convert_payload_without_title() {
        let payload = parse(r#"{"author_name":"Someone"}"#);
        let result = NoEmbedProvider::convert_response(&video_id(), payload);

        assert!(matches!(result, Err(MetadataRetrievalError::InvalidData(_))));
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url(&video_id()),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }
}
