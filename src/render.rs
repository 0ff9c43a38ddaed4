// ABOUTME: Slide rendering module for the bananadeck application
// ABOUTME: Turns outline slides into PNG images through the generation service

use crate::errors::{DeckError, Result};
use crate::generation::ContentService;
use crate::layout::VersionDir;
use crate::outline::{Outline, Slide};
use crate::store::ArtifactStore;
use image::{ImageFormat, ImageOutputFormat};
use log::{error, info, warn};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;

const DESIGN_DIRECTIVES: &[&str] = &[
    "Design specifications:",
    "- Use a professional color scheme with high contrast for readability",
    "- Ensure all text is clearly legible and properly positioned",
    "- Include appropriate visual elements that support the content",
    "- Use clean typography with good spacing between elements",
    "- Maintain a professional, corporate presentation aesthetic",
    "- Avoid cluttered layouts - keep it clean and focused",
    "- Ensure the slide title is prominently displayed at the top",
    "- Position bullet points clearly and logically",
    "- Use appropriate visual hierarchy with different text sizes",
    "- Include subtle background elements or graphics that enhance the message",
    "",
    "Text rendering requirements:",
    "- All text must be perfectly legible and accurately rendered",
    "- Use professional fonts suitable for presentations",
    "- Ensure proper contrast between text and background",
    "- Maintain consistent text alignment and spacing",
    "- Make sure the slide title stands out from the bullet points",
];

const THEME_DIRECTIVES: &[&str] = &[
    "Theme continuity:",
    "- The attached image is an existing slide from the same presentation",
    "- Match its color palette, background treatment, typography and overall visual style exactly",
    "- Do not copy its text; only its look",
];

/// Build the image prompt for one slide.
pub fn build_image_prompt(slide: &Slide, with_reference: bool) -> String {
    let mut lines = vec![
        "Create a professional presentation slide with high-fidelity text rendering. The slide should be a clean, modern corporate presentation slide with a 16:9 aspect ratio.".to_string(),
        String::new(),
        format!("The slide title is: '{}'", slide.title),
        String::new(),
        "The slide contains the following bullet points:".to_string(),
    ];

    for (i, bullet) in slide.bullets.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, bullet));
    }

    if let Some(hint) = &slide.visual_hint {
        lines.push(String::new());
        lines.push(format!("Visual elements to include: {}", hint));
    }

    lines.push(String::new());
    lines.extend(DESIGN_DIRECTIVES.iter().map(|s| s.to_string()));

    if with_reference {
        lines.push(String::new());
        lines.extend(THEME_DIRECTIVES.iter().map(|s| s.to_string()));
    }

    lines.join("\n")
}

/// Make sure generated bytes are a decodable image and return them as PNG.
pub fn normalize_to_png(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.is_empty() {
        return Err(DeckError::GenerationError(
            "Generation service returned an empty image".to_string(),
        ));
    }

    let image = image::load_from_memory(bytes)?;
    if image::guess_format(bytes)? == ImageFormat::Png {
        return Ok(bytes.to_vec());
    }

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageOutputFormat::Png)?;
    Ok(png.into_inner())
}

/// What happened while rendering an outline.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    pub rendered: Vec<PathBuf>,
    /// Slides whose image already existed
    pub skipped: Vec<u32>,
    pub failed: Vec<u32>,
}

/// Renders slides through a generation service.
pub struct SlideRenderer<'a> {
    service: &'a dyn ContentService,
}

impl<'a> SlideRenderer<'a> {
    pub fn new(service: &'a dyn ContentService) -> Self {
        Self { service }
    }

    /// Render one slide. Failures are logged and come back as `None`.
    pub fn render(&self, slide: &Slide, reference_image: Option<&[u8]>) -> Option<Vec<u8>> {
        info!(
            "Starting image generation for slide {}: {}",
            slide.number, slide.title
        );
        let prompt = build_image_prompt(slide, reference_image.is_some());

        let result = self
            .service
            .generate_image(&prompt, reference_image)
            .and_then(|bytes| normalize_to_png(&bytes));

        match result {
            Ok(png) => Some(png),
            Err(e) => {
                error!("Failed slide {}: {}", slide.number, e);
                None
            }
        }
    }

    /// Render one slide and write it to `path`.
    pub fn render_to(
        &self,
        store: &dyn ArtifactStore,
        slide: &Slide,
        path: &Path,
        reference_image: Option<&[u8]>,
    ) -> Result<Option<PathBuf>> {
        let Some(png) = self.render(slide, reference_image) else {
            return Ok(None);
        };
        store.write(path, &png)?;
        info!("Completed slide {}: {:?}", slide.number, path);
        Ok(Some(path.to_path_buf()))
    }

    /// Render every slide of `outline` into `version`'s slides directory.
    ///
    /// Slides whose image already exists are left alone, so an interrupted
    /// run resumes where it stopped.
    pub fn render_outline(
        &self,
        store: &dyn ArtifactStore,
        outline: &Outline,
        version: &VersionDir,
    ) -> Result<RenderSummary> {
        let slides_dir = version.slides_dir();
        store.create_dir_all(&slides_dir)?;
        info!("Found {} slides to process", outline.len());
        info!("Output directory: {:?}", slides_dir);

        let start_time = Instant::now();
        let mut summary = RenderSummary::default();
        let total = outline.len();

        for (i, slide) in outline.slides.iter().enumerate() {
            let path = version.image_path(slide.number);
            if store.exists(&path) {
                info!("Slide {} already rendered: {:?}", slide.number, path);
                summary.skipped.push(slide.number);
                continue;
            }

            info!("Processing slide {}/{}", i + 1, total);
            match self.render_to(store, slide, &path, None)? {
                Some(path) => {
                    summary.rendered.push(path);
                    info!("Progress: {}/{} slides completed", i + 1, total);
                }
                None => {
                    warn!("Slide {} failed to generate", slide.number);
                    summary.failed.push(slide.number);
                }
            }
        }

        info!(
            "Slide generation complete: {} rendered, {} reused, {} failed in {:.2} seconds",
            summary.rendered.len(),
            summary.skipped.len(),
            summary.failed.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(summary)
    }
}
