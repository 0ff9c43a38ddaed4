// ABOUTME: On-disk layout for bananadeck projects
// ABOUTME: Maps projects, version directories and slide numbers to artifact paths

use crate::errors::{DeckError, Result};
use crate::store::ArtifactStore;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SLIDES_DIR: &str = "slides";
const OUTLINE_SUFFIX: &str = "_presentation";
const EXPANDED_SUFFIX: &str = "_expanded";

/// File name of the rendered image for a slide number (`slide_07.png`).
pub fn image_file_name(number: u32) -> String {
    format!("slide_{:02}.png", number)
}

/// Inverse of [`image_file_name`].
pub fn parse_image_file_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("slide_")?.strip_suffix(".png")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// One project folder under the outputs directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    name: String,
}

impl ProjectLayout {
    /// Project rooted at an existing folder; the folder name is the project name.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        Self { root, name }
    }

    pub fn in_outputs(outputs_dir: &Path, name: &str) -> Self {
        Self {
            root: outputs_dir.join(name),
            name: name.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default location of the extracted source text.
    pub fn transcript_path(&self) -> PathBuf {
        self.root.join(format!("{}.md", self.name))
    }

    /// Locate the extracted source text, which may carry a different stem
    /// than the project (video projects name it after the video title).
    pub fn find_transcript(&self, store: &dyn ArtifactStore) -> Result<PathBuf> {
        let default = self.transcript_path();
        if store.exists(&default) {
            return Ok(default);
        }

        if store.exists(&self.root) {
            let found = store.list_dir(&self.root)?.into_iter().find(|path| {
                path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("md"))
            });
            if let Some(path) = found {
                return Ok(path);
            }
        }

        Err(DeckError::PathNotFoundError(default))
    }

    pub fn version(&self, index: u32) -> VersionDir {
        VersionDir::new(&self.root, index)
    }
}

/// One generation of pipeline output (`v0`, `v1`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDir {
    index: u32,
    path: PathBuf,
}

impl VersionDir {
    pub fn new(base_dir: &Path, index: u32) -> Self {
        Self {
            index,
            path: base_dir.join(format!("v{}", index)),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slides_dir(&self) -> PathBuf {
        self.path.join(SLIDES_DIR)
    }

    pub fn image_path(&self, number: u32) -> PathBuf {
        self.slides_dir().join(image_file_name(number))
    }

    /// Where this generation's outline is written. Generations after the
    /// first carry the `_expanded` suffix.
    pub fn outline_path(&self, project_name: &str) -> PathBuf {
        let suffix = if self.index == 0 { "" } else { EXPANDED_SUFFIX };
        self.path
            .join(format!("{}{}{}.md", project_name, OUTLINE_SUFFIX, suffix))
    }

    /// Find whichever outline this generation holds, preferring the
    /// canonical name for `project_name`.
    pub fn find_outline(
        &self,
        store: &dyn ArtifactStore,
        project_name: &str,
    ) -> Option<PathBuf> {
        let canonical = self.outline_path(project_name);
        if store.exists(&canonical) {
            return Some(canonical);
        }

        let pattern = glob::Pattern::new(&format!("*{}*.md", OUTLINE_SUFFIX)).ok()?;
        let matches: Vec<PathBuf> = store
            .list_dir(&self.path)
            .ok()?
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map_or(false, |name| pattern.matches(name))
            })
            .collect();
        debug!("Outline candidates in {:?}: {:?}", self.path, matches);
        matches.into_iter().next()
    }

    /// Scan this generation's rendered images.
    pub fn slide_images(&self, store: &dyn ArtifactStore) -> Result<SlideImages> {
        SlideImages::scan(store, &self.slides_dir())
    }
}

/// Explicit slide number to image path mapping for one version directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideImages {
    images: BTreeMap<u32, PathBuf>,
}

impl SlideImages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the mapping from the files present in `slides_dir`. A missing
    /// directory yields an empty mapping.
    pub fn scan(store: &dyn ArtifactStore, slides_dir: &Path) -> Result<Self> {
        let mut images = Self::new();
        if !store.exists(slides_dir) {
            return Ok(images);
        }

        for path in store.list_dir(slides_dir)? {
            let number = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_image_file_name);
            if let Some(number) = number {
                images.insert(number, path);
            }
        }

        Ok(images)
    }

    pub fn insert(&mut self, number: u32, path: PathBuf) {
        self.images.insert(number, path);
    }

    pub fn get(&self, number: u32) -> Option<&Path> {
        self.images.get(&number).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
