//! Offline asset cache
//!
//! A named cache that is filled once with the application's core assets and
//! then answers asset requests cache-first, passing misses through to the
//! network. There is no invalidation or expiry: shipping a new cache name is
//! the only way to upgrade the stored assets.

use crate::cache::{CacheError, CacheStorage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the cache holding the current asset set
pub const DEFAULT_CACHE_NAME: &str = "thumb-grabber-v1";

/// Asset paths stored on install
pub const CORE_ASSETS: [&str; 4] = ["/", "/index.html", "/style.css", "/script.js"];

/// Errors that can occur while installing or serving cached assets
#[derive(Debug, Error)]
pub enum OfflineCacheError {
    /// The underlying cache storage failed
    #[error("Cache storage error: {0}")]
    Cache(#[from] CacheError),

    /// The asset could not be requested
    #[error("Request for {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The origin answered with a non-success status
    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },
}

/// A stored copy of an asset response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAsset {
    /// Request path, e.g. `/style.css`
    pub path: String,
    /// Content type reported by the origin
    pub content_type: Option<String>,
    /// Response body
    pub body: String,
}

/// Where an asset response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    /// Served from the offline cache
    Cache,
    /// Passed through to the network
    Network,
}

/// Network access used to fill the cache and to serve misses
pub trait AssetNetwork {
    /// Requests `path` from `origin`
    fn fetch_asset(&self, origin: &str, path: &str) -> Result<CachedAsset, OfflineCacheError>;
}

/// Joins an origin and an absolute asset path
fn asset_url(origin: &str, path: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), path)
}

/// Fetches assets over HTTP
pub struct HttpAssetNetwork {
    client: reqwest::blocking::Client,
}

impl HttpAssetNetwork {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpAssetNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetNetwork for HttpAssetNetwork {
    fn fetch_asset(&self, origin: &str, path: &str) -> Result<CachedAsset, OfflineCacheError> {
        let url = asset_url(origin, path);
        log::debug!("Fetching asset {}", url);

        let response =
            self.client
                .get(&url)
                .send()
                .map_err(|e| OfflineCacheError::RequestFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(OfflineCacheError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .map_err(|e| OfflineCacheError::RequestFailed {
                url,
                reason: e.to_string(),
            })?;

        Ok(CachedAsset {
            path: path.to_string(),
            content_type,
            body,
        })
    }
}

/// Cache-first asset store
pub struct OfflineCache {
    storage: CacheStorage<CachedAsset>,
}

impl OfflineCache {
    /// Opens the cache called `name` in the user's cache directory
    pub fn open(name: &str) -> Result<Self, OfflineCacheError> {
        Ok(Self {
            storage: CacheStorage::open(name)?,
        })
    }

    /// Opens the cache called `name` below `root`
    pub fn open_in(root: &Path, name: &str) -> Result<Self, OfflineCacheError> {
        Ok(Self {
            storage: CacheStorage::open_in(root, name)?,
        })
    }

    /// Directory holding the cached assets
    pub fn location(&self) -> &PathBuf {
        self.storage.cache_dir()
    }

    /// Pre-populates the cache with every entry of [`CORE_ASSETS`]
    ///
    /// All assets are fetched before anything is stored, so a failing asset
    /// leaves the cache untouched. Returns the number of stored assets.
    pub fn install<N>(&self, network: &N, origin: &str) -> Result<usize, OfflineCacheError>
    where
        N: AssetNetwork + ?Sized,
    {
        let assets = CORE_ASSETS
            .iter()
            .map(|path| network.fetch_asset(origin, path))
            .collect::<Result<Vec<_>, _>>()?;

        for asset in &assets {
            self.storage.store(&asset.path, asset)?;
        }

        log::debug!(
            "Installed {} assets into {}",
            assets.len(),
            self.location().display()
        );

        Ok(assets.len())
    }

    /// Answers an asset request, preferring the cached copy
    ///
    /// Cache read failures are treated as misses. Network responses for
    /// misses are returned as-is and not added to the cache.
    pub fn respond<N>(
        &self,
        network: &N,
        origin: &str,
        path: &str,
    ) -> Result<(CachedAsset, AssetSource), OfflineCacheError>
    where
        N: AssetNetwork + ?Sized,
    {
        match self.storage.load(path) {
            Ok(Some(asset)) => return Ok((asset, AssetSource::Cache)),
            Ok(None) => {}
            Err(e) => log::warn!("Ignoring unreadable cache entry for {}: {}", path, e),
        }

        let asset = network.fetch_asset(origin, path)?;
        Ok((asset, AssetSource::Network))
    }
}
