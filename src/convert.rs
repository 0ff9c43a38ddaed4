// ABOUTME: Source conversion module for the bananadeck application
// ABOUTME: Turns a PDF or a YouTube video into a cached markdown transcript

use crate::errors::{DeckError, Result};
use crate::generation::{Attachment, ContentService};
use crate::layout::ProjectLayout;
use crate::store::{cached_text, ArtifactStore};
use crate::utils;
use log::{info, warn};
use std::path::{Path, PathBuf};
use url::Url;

const PDF_PROMPT: &str = "Convert this PDF document into well-formatted markdown.
Preserve the structure, headings, lists, and formatting as much as possible.
Add appropriate markdown headers, bullet points, and formatting.
Maintain the original document structure and hierarchy.

Ignore page footers, page numbers, and repetitive header/footer content that appears on multiple pages.
Focus on the main content and body text.

For any images found in the document, describe them in this exact format: {image: describe image here}
Include the image descriptions at the appropriate locations in the markdown where the images appear.";

const VIDEO_PROMPT: &str = "You are a professional content creator. Please analyze this YouTube video and create a comprehensive, well-structured markdown document that includes:

1. **Video Title and Overview**: Extract the video title and provide a brief overview
2. **Enhanced Transcript**: Create a clean, well-formatted transcript with proper headings and organization
3. **Visual Descriptions**: Describe what viewers are seeing on screen throughout the video, including:
   - Visual elements, graphics, and text overlays
   - Speaker appearances and expressions
   - Screen recordings, demonstrations, or presentations
   - Any charts, diagrams, or visual aids shown
4. **Key Points and Takeaways**: Extract and highlight the main points, insights, and actionable items
5. **Timestamps**: Include relevant timestamps for major sections
6. **Structure**: Organize everything into a clear, readable format with appropriate markdown formatting

IMPORTANT: At the very beginning of your response, include the video title in this exact format:
VIDEO_TITLE: [exact video title here]

Then continue with the rest of the markdown document that someone could read and get the full value of the video even without watching it.";

const VIDEO_TITLE_MARKER: &str = "VIDEO_TITLE:";
const DEFAULT_VIDEO_ID: &str = "youtube_video";

/// A source document the pipeline can start from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Pdf(PathBuf),
    Video { url: String, video_id: String },
}

impl SourceInput {
    /// Work out what kind of source `input` names.
    pub fn detect(input: &str) -> Result<Self> {
        let input = input.trim();
        if is_youtube_url(input) {
            return Ok(SourceInput::Video {
                url: input.to_string(),
                video_id: extract_video_id(input),
            });
        }

        let path = Path::new(input);
        let is_pdf = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            return Ok(SourceInput::Pdf(path.to_path_buf()));
        }

        Err(DeckError::ValidationError(format!(
            "Unsupported input type: {}. Supported types: PDF files and YouTube URLs",
            input
        )))
    }
}

pub fn is_youtube_url(input: &str) -> bool {
    input.contains("youtube.com") || input.contains("youtu.be")
}

/// Video id from a `watch?v=` or `youtu.be/<id>` URL.
pub fn extract_video_id(input: &str) -> String {
    let Ok(url) = Url::parse(input) else {
        return DEFAULT_VIDEO_ID.to_string();
    };

    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
        if !id.is_empty() {
            return id.into_owned();
        }
    }

    if url.host_str().map_or(false, |host| host.ends_with("youtu.be")) {
        if let Some(id) = url.path_segments().and_then(|mut s| s.next()) {
            if !id.is_empty() {
                return id.to_string();
            }
        }
    }

    DEFAULT_VIDEO_ID.to_string()
}

/// Title from the leading `VIDEO_TITLE:` line, if the model supplied one.
pub fn extract_video_title(response: &str) -> Option<String> {
    let (_, rest) = response.split_once(VIDEO_TITLE_MARKER)?;
    let title = rest.lines().next()?.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Project name for a PDF: its file stem with spaces replaced.
pub fn pdf_project_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = stem.replace(' ', "_");
    if name.is_empty() {
        "document".to_string()
    } else {
        name
    }
}

/// Extracted source text together with the project it belongs to.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub project: ProjectLayout,
    pub path: PathBuf,
    pub text: String,
}

/// Converts sources to markdown transcripts, reusing earlier output.
pub struct SourceConverter<'a> {
    service: &'a dyn ContentService,
    store: &'a dyn ArtifactStore,
}

impl<'a> SourceConverter<'a> {
    pub fn new(service: &'a dyn ContentService, store: &'a dyn ArtifactStore) -> Self {
        Self { service, store }
    }

    pub fn convert(&self, source: &SourceInput, outputs_dir: &Path) -> Result<Transcript> {
        match source {
            SourceInput::Pdf(path) => {
                info!("Detected PDF file, using PDF converter");
                self.convert_pdf(path, outputs_dir)
            }
            SourceInput::Video { url, video_id } => {
                info!("Detected YouTube URL, using YouTube converter");
                self.convert_video(url, video_id, outputs_dir)
            }
        }
    }

    fn convert_pdf(&self, pdf_path: &Path, outputs_dir: &Path) -> Result<Transcript> {
        utils::validate_file_exists(pdf_path)?;
        let project = ProjectLayout::in_outputs(outputs_dir, &pdf_project_name(pdf_path));
        let path = project.transcript_path();

        let text = cached_text(self.store, &path, "Markdown transcript", || {
            info!("Starting PDF conversion for: {:?}", pdf_path);
            let pdf_data = self.store.read(pdf_path)?;
            let markdown = self
                .service
                .generate_text(PDF_PROMPT, &[Attachment::Pdf(pdf_data)])?;
            info!("PDF conversion completed successfully");
            Ok(markdown)
        })?;

        Ok(Transcript {
            project,
            path,
            text,
        })
    }

    fn convert_video(&self, url: &str, video_id: &str, outputs_dir: &Path) -> Result<Transcript> {
        if let Some(project) = self.find_existing_video_project(video_id, outputs_dir)? {
            if let Ok(path) = project.find_transcript(self.store) {
                info!("Found existing markdown file: {:?}", path);
                info!("Skipping transcription process - done");
                let text = self.store.read_to_string(&path)?;
                return Ok(Transcript {
                    project,
                    path,
                    text,
                });
            }
        }

        info!("Starting YouTube video processing for: {}", url);
        let markdown = self
            .service
            .generate_text(VIDEO_PROMPT, &[Attachment::VideoUri(url.to_string())])?;
        info!("YouTube video processing completed successfully");

        let title = extract_video_title(&markdown).unwrap_or_else(|| {
            warn!("Could not extract video title, using default");
            DEFAULT_VIDEO_ID.to_string()
        });
        let safe_title = utils::safe_file_name(&title);

        let folder = format!(
            "{}_{}",
            video_id,
            if safe_title.is_empty() { "video" } else { safe_title.as_str() }
        );
        let file_stem = if safe_title.is_empty() {
            format!("youtube_{}", video_id)
        } else {
            safe_title
        };

        let project = ProjectLayout::in_outputs(outputs_dir, &folder);
        let path = project.root().join(format!("{}.md", file_stem));
        self.store.write(&path, markdown.as_bytes())?;
        info!("Markdown saved to: {:?}", path);

        Ok(Transcript {
            project,
            path,
            text: markdown,
        })
    }

    fn find_existing_video_project(
        &self,
        video_id: &str,
        outputs_dir: &Path,
    ) -> Result<Option<ProjectLayout>> {
        if !self.store.exists(outputs_dir) {
            return Ok(None);
        }

        let found = self.store.list_dir(outputs_dir)?.into_iter().find(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .map_or(false, |name| name.to_string_lossy().contains(video_id))
        });
        Ok(found.map(ProjectLayout::new))
    }
}
