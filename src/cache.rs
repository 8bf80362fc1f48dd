//! Persistent JSON storage
//!
//! A named directory below the platform cache directory holding one JSON
//! file per key. Used by the offline asset cache.

use serde::{Deserialize, Serialize};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read cache entry {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write cache entry {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The entry exists but is not valid JSON for the stored type
    #[error("Cache entry {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize cache entry: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Root of everything this application caches
///
/// - Linux: ~/.cache/thumb-grabber/
/// - macOS: ~/Library/Caches/thumb-grabber/
/// - Windows: %LOCALAPPDATA%\thumb-grabber\cache\
pub(crate) fn cache_root() -> Result<PathBuf, CacheError> {
    directories::ProjectDirs::from("", "", "thumb-grabber")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .ok_or(CacheError::CacheDirectoryNotFound)
}

/// Typed key/value storage backed by JSON files
pub(crate) struct CacheStorage<T> {
    dir: PathBuf,
    _entry: PhantomData<T>,
}

impl<T> CacheStorage<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    /// Opens (creating if needed) the storage called `name` in the cache root
    pub fn open(name: &str) -> Result<Self, CacheError> {
        Self::open_in(&cache_root()?, name)
    }

    /// Opens (creating if needed) the storage called `name` below `root`
    ///
    /// The directory name is `name` lowercased with everything except
    /// a-z, 0-9 and `-` replaced by `_`.
    pub fn open_in(root: &Path, name: &str) -> Result<Self, CacheError> {
        let dir = root.join(directory_name(name));

        fs::create_dir_all(&dir).map_err(|source| CacheError::DirectoryCreationFailed {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            _entry: PhantomData,
        })
    }

    /// Percent-encoded so distinct keys never share a file
    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }

    /// Reads the entry for `key`, `Ok(None)` when there is none
    pub fn load(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| CacheError::ReadFailed {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| CacheError::Corrupt { path, source })
    }

    /// Writes the entry for `key`, replacing any previous one
    ///
    /// The content is written next to the entry and renamed over it, so
    /// readers see either the old or the new entry.
    pub fn store(&self, key: &str, data: &T) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        let staged = path.with_extension("json.part");
        let content = serde_json::to_string_pretty(data)?;

        fs::write(&staged, content)
            .and_then(|_| fs::rename(&staged, &path))
            .map_err(|source| {
                let _ = fs::remove_file(&staged);
                CacheError::WriteFailed { path, source }
            })
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.dir
    }
}

fn directory_name(name: &str) -> String {
    name.chars()
        .map(|c| match c.to_ascii_lowercase() {
            c @ ('a'..='z' | '0'..='9' | '-') => c,
            _ => '_',
        })
        .collect()
}
