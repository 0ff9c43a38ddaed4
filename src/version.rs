// ABOUTME: Version directory allocation for bananadeck projects
// ABOUTME: Finds or creates the lowest unused v<n> directory under a project

use crate::errors::{DeckError, Result};
use crate::layout::VersionDir;
use crate::store::ArtifactStore;
use log::{debug, info};
use std::path::Path;

/// Allocates `v0`, `v1`, ... directories.
///
/// The scan-then-create sequence is not atomic. Callers must not allocate
/// against the same base directory from more than one process at a time.
pub struct VersionAllocator<'a> {
    store: &'a dyn ArtifactStore,
}

impl<'a> VersionAllocator<'a> {
    pub fn new(store: &'a dyn ArtifactStore) -> Self {
        Self { store }
    }

    /// Lowest `n` such that `base_dir/v{n}` does not exist. Nothing is created.
    pub fn next_unused(&self, base_dir: &Path) -> VersionDir {
        let mut index = 0;
        loop {
            let candidate = VersionDir::new(base_dir, index);
            if !self.store.exists(candidate.path()) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Find the next unused version directory and create it.
    pub fn allocate_next(&self, base_dir: &Path) -> Result<VersionDir> {
        self.store.create_dir_all(base_dir)?;

        let version = self.next_unused(base_dir);
        self.store.create_dir_all(version.path())?;
        info!("Allocated version directory: {:?}", version.path());
        Ok(version)
    }

    /// Highest-numbered existing version directory.
    pub fn latest(&self, base_dir: &Path) -> Result<VersionDir> {
        if !self.store.exists(base_dir) {
            return Err(DeckError::PathNotFoundError(base_dir.to_path_buf()));
        }

        let latest = self
            .store
            .list_dir(base_dir)?
            .iter()
            .filter_map(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .and_then(parse_version_name)
            })
            .max();

        debug!("Latest version under {:?}: {:?}", base_dir, latest);
        latest
            .map(|index| VersionDir::new(base_dir, index))
            .ok_or_else(|| DeckError::PathNotFoundError(base_dir.join("v0")))
    }
}

/// `"v12"` -> `Some(12)`.
pub fn parse_version_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix('v')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
