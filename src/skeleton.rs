// ABOUTME: Outline synthesis module for the bananadeck application
// ABOUTME: Asks the generation service for a slide outline of a markdown transcript

use crate::errors::Result;
use crate::generation::{Attachment, ContentService};
use crate::outline::VISUAL_HINT_MARKER;
use crate::store::{cached_text, ArtifactStore};
use log::info;
use std::path::Path;

/// Prompt asking for an outline in the format `parse_outline` reads.
pub fn build_outline_prompt() -> String {
    format!(
        "You are a professional presentation designer. Please analyze the provided markdown content and create a comprehensive presentation skeleton that effectively communicates the key information.

Create a presentation structure with the following format:

# [Presentation Title]

## Slide 1: [Title/Introduction]
- [Key point 1]
- [Key point 2]
- [Key point 3]

## Slide 2: [Section Title]
- [Main point with brief explanation]
- [Supporting detail]
{hint} [describe what visual would help - be specific about charts, images, diagrams, etc.]

## Slide 3: [Next Section]
- [Content point]
- [Another point]
- [Call to action or summary]

[Continue with additional slides as needed...]

## Slide N: [Conclusion/Summary]
- [Key takeaway 1]
- [Key takeaway 2]
- [Next steps or call to action]

IMPORTANT FORMATTING RULES:
- Every slide, including the conclusion, MUST start with a \"## Slide <number>: <title>\" header
- For visual suggestions, ALWAYS use the exact format: \"{hint} [description]\"
- Do NOT use formats like \"- Visual:\" or \"- Visual suggestion:\"
- The visual suggestion should describe specific visual elements like charts, graphs, images, diagrams, or infographics
- Be descriptive about what type of visual would best support the content

Guidelines:
1. Create 8-15 slides maximum for optimal presentation length
2. Each slide should have a clear, descriptive title
3. Use bullet points for easy reading
4. Include visual suggestions where appropriate using the exact format specified above
5. Maintain logical flow and narrative structure
6. Focus on the most important and actionable information
7. Make it engaging and audience-appropriate
8. Include a strong opening and memorable conclusion

Transform the markdown content into a compelling presentation that someone could use to present the material effectively.",
        hint = VISUAL_HINT_MARKER
    )
}

/// Produces outline markdown from a transcript.
pub struct OutlineSynthesizer<'a> {
    service: &'a dyn ContentService,
}

impl<'a> OutlineSynthesizer<'a> {
    pub fn new(service: &'a dyn ContentService) -> Self {
        Self { service }
    }

    pub fn synthesize(&self, markdown: &str) -> Result<String> {
        info!("Generating presentation skeleton from markdown content...");
        let outline = self.service.generate_text(
            &build_outline_prompt(),
            &[Attachment::Text(markdown.to_string())],
        )?;
        info!("Presentation skeleton generation completed successfully");
        Ok(outline)
    }

    /// Reuse the outline at `path` if present, otherwise synthesize and save it.
    pub fn synthesize_cached(
        &self,
        store: &dyn ArtifactStore,
        markdown: &str,
        path: &Path,
    ) -> Result<String> {
        cached_text(store, path, "Presentation skeleton", || {
            self.synthesize(markdown)
        })
    }
}
