//! Scratch files that clean up after themselves
//!
//! Downloads are staged in the system temp directory before being copied
//! to their destination; the staging file is removed when its guard drops,
//! whether the copy happened or not.

use std::fs::{self, File};
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Owns a path in the temp directory and removes it on drop
#[derive(Debug)]
pub(crate) struct TempGuard {
    path: PathBuf,
    #[cfg(test)]
    is_dir: bool,
}

impl TempGuard {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        // Nothing useful to do if removal fails
        #[cfg(test)]
        if self.is_dir {
            let _ = fs::remove_dir_all(&self.path);
            return;
        }

        let _ = fs::remove_file(&self.path);
    }
}

impl Deref for TempGuard {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

/// `<temp>/<prefix>_<ulid>[.<extension>]`
fn scratch_path(prefix: &str, extension: Option<&str>) -> PathBuf {
    let mut name = format!("{}_{}", prefix, ulid::Ulid::new());
    if let Some(extension) = extension {
        name.push('.');
        name.push_str(extension);
    }

    std::env::temp_dir().join(name)
}

/// Creates an empty scratch file
pub(crate) fn create_temp_file(prefix: &str, extension: &str) -> io::Result<TempGuard> {
    let path = scratch_path(prefix, Some(extension));
    File::create(&path)?;

    Ok(TempGuard {
        path,
        #[cfg(test)]
        is_dir: false,
    })
}

/// Creates a scratch directory, removed with everything in it
#[cfg(test)]
pub(crate) fn create_temp_dir(prefix: &str) -> io::Result<TempGuard> {
    let path = scratch_path(prefix, None);
    fs::create_dir_all(&path)?;

    Ok(TempGuard { path, is_dir: true })
}
