//! Thumbnail catalog
//!
//! The fixed set of thumbnail variants served by the image CDN and the
//! builder that turns a [`VideoId`] into candidate image URLs. Nothing here
//! touches the network: URLs are built speculatively and a variant that does
//! not exist for a given video simply fails to load later.

use crate::extractor::VideoId;
use serde::Serialize;

/// Base path of the thumbnail CDN
pub const DEFAULT_CDN_BASE: &str = "https://img.youtube.com/vi";

/// File extension of every thumbnail variant
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// A single thumbnail quality option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityVariant {
    /// Human-readable name of the quality
    pub label: &'static str,
    /// Nominal resolution, e.g. `1920x1080`
    pub resolution: &'static str,
    /// Path suffix on the CDN, e.g. `maxresdefault`
    pub suffix: &'static str,
}

/// All known variants, from highest to lowest nominal resolution
pub const QUALITY_VARIANTS: [QualityVariant; 4] = [
    QualityVariant {
        label: "Max Resolution (HD)",
        resolution: "1920x1080",
        suffix: "maxresdefault",
    },
    QualityVariant {
        label: "Standard Definition",
        resolution: "640x480",
        suffix: "sddefault",
    },
    QualityVariant {
        label: "High Quality",
        resolution: "480x360",
        suffix: "hqdefault",
    },
    QualityVariant {
        label: "Medium Quality",
        resolution: "320x180",
        suffix: "mqdefault",
    },
];

/// A candidate thumbnail image for a specific video
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailCandidate {
    /// The quality this candidate represents
    pub variant: QualityVariant,
    /// Fully qualified image URL
    pub image_url: String,
}

impl ThumbnailCandidate {
    /// Filename suggested when saving this candidate, e.g. `hqdefault.jpg`
    pub fn suggested_filename(&self) -> String {
        format!("{}.{}", self.variant.suffix, THUMBNAIL_EXTENSION)
    }
}

/// Looks up a variant by its CDN suffix
pub fn variant_by_suffix(suffix: &str) -> Option<&'static QualityVariant> {
    QUALITY_VARIANTS.iter().find(|v| v.suffix == suffix)
}

/// Builds the four thumbnail candidates for a video on the default CDN
pub fn candidates(id: &VideoId) -> Vec<ThumbnailCandidate> {
    candidates_with_base(id, DEFAULT_CDN_BASE)
}

/// Builds the four thumbnail candidates for a video under the given CDN base
///
/// Candidates are returned in presentation order: max, standard, high,
/// medium. A trailing slash on `cdn_base` is ignored.
pub fn candidates_with_base(id: &VideoId, cdn_base: &str) -> Vec<ThumbnailCandidate> {
    let base = cdn_base.trim_end_matches('/');

    QUALITY_VARIANTS
        .iter()
        .map(|variant| ThumbnailCandidate {
            variant: *variant,
            image_url: format!(
                "{}/{}/{}.{}",
                base,
                id.as_str(),
                variant.suffix,
                THUMBNAIL_EXTENSION
            ),
        })
        .collect()
}
