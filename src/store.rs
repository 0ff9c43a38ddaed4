// ABOUTME: Artifact store for the bananadeck application
// ABOUTME: Path-addressed persistence with exists-means-done caching of expensive stages

use crate::errors::{DeckError, Result};
use crate::utils;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent storage addressed by output path.
///
/// The path is the cache key: anything already present at a path is
/// trusted as that stage's final output.
pub trait ArtifactStore {
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            DeckError::FormatMismatch(format!("{:?} is not valid UTF-8: {}", path, e))
        })
    }

    /// Write `content`, creating parent directories as needed.
    fn write(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Copy an artifact verbatim to a new path.
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Entries directly inside `dir`, sorted by path.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Artifact store backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsArtifactStore;

impl FsArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for FsArtifactStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.exists() {
            return Err(DeckError::PathNotFoundError(path.to_path_buf()));
        }
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        utils::ensure_parent_directory_exists(path)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        if !from.exists() {
            return Err(DeckError::PathNotFoundError(from.to_path_buf()));
        }
        utils::ensure_parent_directory_exists(to)?;
        fs::copy(from, to)?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        utils::ensure_directory_exists(path)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        utils::validate_directory_exists(dir)?;
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}

/// Return the text stored at `path`, or produce it with `generate` and
/// store it there first.
pub fn cached_text<F>(
    store: &dyn ArtifactStore,
    path: &Path,
    label: &str,
    generate: F,
) -> Result<String>
where
    F: FnOnce() -> Result<String>,
{
    if store.exists(path) {
        info!("{} already exists: {:?}", label, path);
        info!("Skipping {} generation - done", label);
        return store.read_to_string(path);
    }

    let content = generate()?;
    store.write(path, content.as_bytes())?;
    info!("{} saved to: {:?}", label, path);
    Ok(content)
}
