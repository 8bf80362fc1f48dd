//! Thumbnail download helper
//!
//! This module saves a thumbnail image to disk under a suggested filename.
//! The bytes are staged in a temporary file that is released as soon as the
//! save finished or failed. When anything goes wrong the image is handed to
//! the system's default opener instead, which is the terminal fallback.

use crate::naming::{sanitize_filename, unique_destination};
use crate::temp::create_temp_file;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Errors that can occur while downloading a thumbnail
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request could not be sent or its body not be read
    #[error("Failed to download {url}: {reason}")]
    RequestFailed { url: String, reason: String },

    /// HTTP error during download
    #[error("HTTP {status} while downloading {url}")]
    HttpError { url: String, status: u16 },

    /// The response body is not an image
    #[error("Response from {url} is not an image (detected: {})", .detected.as_deref().unwrap_or("unknown"))]
    NotAnImage {
        url: String,
        detected: Option<String>,
    },

    /// Failed to stage or write the image file
    #[error("Failed to write image file {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// Retrieves image bytes
pub trait ImageFetcher {
    /// Downloads the resource at `url` and returns its body
    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Opens a URL outside of this program, typically in a web browser
pub trait FallbackOpener {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Fetches images with a blocking HTTP client
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch_image(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        log::debug!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| DownloadError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::HttpError {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| DownloadError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

/// Opens URLs with the platform's default handler
///
/// - Windows: `explorer`
/// - macOS: `open`
/// - Other Unix: `xdg-open`
pub struct SystemOpener;

impl FallbackOpener for SystemOpener {
    fn open(&self, url: &str) -> io::Result<()> {
        let program = if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };

        // The opener is detached; its own success is not awaited
        Command::new(program).arg(url).spawn().map(|_| ())
    }
}

/// Result of a download attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// The image was written to `path`
    Saved { path: PathBuf, bytes: u64 },
    /// Saving failed and the remote URL was handed to the fallback opener
    OpenedExternally { url: String },
}

/// Downloads an image into `dest_dir`, falling back to opening it externally
///
/// The file is saved as `filename` (sanitized), or as `filename (2)` and so
/// on when that name is taken. Any failure is logged and answered by
/// passing the original `url` to `opener`; there is no retry and no error is
/// returned to the caller.
pub fn download_image<F, O>(
    fetcher: &F,
    opener: &O,
    url: &str,
    filename: &str,
    dest_dir: &Path,
) -> DownloadOutcome
where
    F: ImageFetcher + ?Sized,
    O: FallbackOpener + ?Sized,
{
    match save_image(fetcher, url, filename, dest_dir) {
        Ok((path, bytes)) => DownloadOutcome::Saved { path, bytes },
        Err(e) => {
            log::error!("Download failed, opening {} externally: {}", url, e);

            if let Err(e) = opener.open(url) {
                log::error!("Failed to open {}: {}", url, e);
            }

            DownloadOutcome::OpenedExternally {
                url: url.to_string(),
            }
        }
    }
}

fn save_image<F>(
    fetcher: &F,
    url: &str,
    filename: &str,
    dest_dir: &Path,
) -> Result<(PathBuf, u64), DownloadError>
where
    F: ImageFetcher + ?Sized,
{
    let bytes = fetcher.fetch_image(url)?;

    if !infer::is_image(&bytes) {
        return Err(DownloadError::NotAnImage {
            url: url.to_string(),
            detected: infer::get(&bytes).map(|t| t.mime_type().to_string()),
        });
    }

    // Stage the bytes first; the guard removes the staged copy on every path out
    let staged = create_temp_file("thumbnail", "part").map_err(|e| DownloadError::WriteFailed {
        path: std::env::temp_dir(),
        source: e,
    })?;

    fs::write(staged.path(), &bytes).map_err(|e| DownloadError::WriteFailed {
        path: staged.path().to_path_buf(),
        source: e,
    })?;

    fs::create_dir_all(dest_dir).map_err(|e| DownloadError::WriteFailed {
        path: dest_dir.to_path_buf(),
        source: e,
    })?;

    let destination = unique_destination(dest_dir, &sanitize_filename(filename));

    let written = fs::copy(staged.path(), &destination).map_err(|e| DownloadError::WriteFailed {
        path: destination.clone(),
        source: e,
    })?;

    Ok((destination, written))
}
