// ABOUTME: Pipeline orchestration for the bananadeck application
// ABOUTME: Sequences conversion, outline synthesis, rendering and slide expansion

use crate::config::Config;
use crate::convert::{SourceConverter, SourceInput};
use crate::errors::{DeckError, Result};
use crate::expand::{reconcile, ExpansionEngine};
use crate::generation::ContentService;
use crate::layout::{ProjectLayout, VersionDir};
use crate::outline::{parse_outline, Outline};
use crate::render::{RenderSummary, SlideRenderer};
use crate::skeleton::OutlineSynthesizer;
use crate::store::ArtifactStore;
use crate::version::VersionAllocator;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Outcome of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub project: ProjectLayout,
    pub transcript_path: PathBuf,
    pub outline_path: PathBuf,
    pub outline: Outline,
    pub render: RenderSummary,
}

/// Outcome of expanding one slide.
#[derive(Debug, Clone)]
pub struct ExpansionReport {
    pub project: ProjectLayout,
    /// Generation the expansion started from
    pub source_version: VersionDir,
    pub version: VersionDir,
    pub outline_path: PathBuf,
    pub outline: Outline,
    /// False when the fallback batch replaced the generated one
    pub generated: bool,
    pub rendered: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    pub missing: Vec<u32>,
    pub failed: Vec<u32>,
}

/// Runs the stages against one generation service and artifact store.
///
/// Runs are sequential; two pipelines must not work on the same project
/// at the same time.
pub struct Pipeline<'a> {
    config: &'a Config,
    service: &'a dyn ContentService,
    store: &'a dyn ArtifactStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        service: &'a dyn ContentService,
        store: &'a dyn ArtifactStore,
    ) -> Self {
        Self {
            config,
            service,
            store,
        }
    }

    /// Convert `input`, synthesize its outline and render every slide into `v0`.
    pub fn process_input(&self, input: &str) -> Result<PipelineReport> {
        let source = SourceInput::detect(input)?;

        info!("Step 1: Converting input to markdown: {}", input);
        let converter = SourceConverter::new(self.service, self.store);
        let transcript = converter.convert(&source, &self.config.outputs_dir)?;
        info!("Markdown conversion completed successfully");

        info!("Step 2: Generating presentation skeleton from markdown");
        let project = transcript.project;
        let version = project.version(0);
        let outline_path = version.outline_path(project.name());
        let synthesizer = OutlineSynthesizer::new(self.service);
        let outline_text =
            synthesizer.synthesize_cached(self.store, &transcript.text, &outline_path)?;

        let outline = parse_outline(&outline_text);
        if outline.is_empty() {
            warn!("Outline {:?} contains no slides", outline_path);
        }

        info!("Step 3: Rendering {} slides", outline.len());
        let renderer = SlideRenderer::new(self.service);
        let render = renderer.render_outline(self.store, &outline, &version)?;

        Ok(PipelineReport {
            project,
            transcript_path: transcript.path,
            outline_path,
            outline,
            render,
        })
    }

    /// Most recently modified project folder in the outputs directory.
    pub fn latest_project(&self) -> Result<ProjectLayout> {
        let outputs_dir = &self.config.outputs_dir;
        if !self.store.exists(outputs_dir) {
            return Err(DeckError::PathNotFoundError(outputs_dir.clone()));
        }

        let latest = self
            .store
            .list_dir(outputs_dir)?
            .into_iter()
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let modified = path.metadata().and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(_, path)| path);

        match latest {
            Some(path) => Ok(ProjectLayout::new(path)),
            None => Err(DeckError::PathNotFoundError(outputs_dir.clone())),
        }
    }

    /// Newest generation of `project` that holds an outline.
    fn latest_outline(&self, project: &ProjectLayout) -> Result<(VersionDir, PathBuf)> {
        let allocator = VersionAllocator::new(self.store);
        let newest = allocator.latest(project.root())?;

        for index in (0..=newest.index()).rev() {
            let version = project.version(index);
            if let Some(path) = version.find_outline(self.store, project.name()) {
                return Ok((version, path));
            }
        }

        Err(DeckError::PathNotFoundError(
            project.version(0).outline_path(project.name()),
        ))
    }

    /// Expand slide `slide_number` of `project` (or of the most recent project)
    /// into a new version directory.
    pub fn expand_slide(
        &self,
        project: Option<&Path>,
        slide_number: u32,
    ) -> Result<ExpansionReport> {
        let project = match project {
            Some(root) => {
                if !self.store.exists(root) {
                    return Err(DeckError::PathNotFoundError(root.to_path_buf()));
                }
                ProjectLayout::new(root)
            }
            None => self.latest_project()?,
        };
        info!(
            "Starting slide expansion for slide {} in {:?}",
            slide_number,
            project.root()
        );

        let (source_version, source_outline_path) = self.latest_outline(&project)?;
        let outline = parse_outline(&self.store.read_to_string(&source_outline_path)?);
        let transcript_path = project.find_transcript(self.store)?;
        let transcript = self.store.read_to_string(&transcript_path)?;
        let prior_images = source_version.slide_images(self.store)?;
        info!(
            "Found {} slide images in {:?}",
            prior_images.len(),
            source_version.path()
        );

        let engine = ExpansionEngine::new(self.service, self.config.expansion_batch_size);
        let expansion = engine.expand(
            &outline,
            slide_number,
            &transcript,
            prior_images.get(slide_number),
        )?;

        let allocator = VersionAllocator::new(self.store);
        let version = allocator.allocate_next(project.root())?;
        let outline_path = version.outline_path(project.name());
        self.store
            .write(&outline_path, expansion.outline.to_markdown().as_bytes())?;
        info!("Expanded presentation saved to: {:?}", outline_path);

        let renderer = SlideRenderer::new(self.service);
        let summary = reconcile(
            &expansion.plan,
            self.store,
            &renderer,
            &prior_images,
            &version,
        )?;

        info!(
            "Slide expansion completed. Generated {} new images",
            summary.rendered.len()
        );

        Ok(ExpansionReport {
            project,
            source_version,
            version,
            outline_path,
            outline: expansion.outline,
            generated: expansion.generated,
            rendered: summary.rendered,
            copied: summary.copied,
            missing: summary.missing,
            failed: summary.failed,
        })
    }
}
