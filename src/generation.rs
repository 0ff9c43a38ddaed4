// ABOUTME: Generation service interface for the bananadeck application
// ABOUTME: The remote text and image generation capability every stage delegates to

use crate::errors::Result;

/// Extra content sent alongside a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Raw PDF bytes
    Pdf(Vec<u8>),
    /// A video the service fetches itself (e.g. a YouTube URL)
    VideoUri(String),
    /// Additional plain text, sent as its own part after the prompt
    Text(String),
}

/// A remote content-generation service.
///
/// Both calls are blocking, possibly slow and possibly failing. No retry
/// or timeout policy is applied at this layer.
pub trait ContentService {
    /// Generate text from a prompt plus optional attachments.
    fn generate_text(&self, prompt: &str, attachments: &[Attachment]) -> Result<String>;

    /// Generate an image, optionally conditioned on a reference image.
    fn generate_image(&self, prompt: &str, reference_image: Option<&[u8]>) -> Result<Vec<u8>>;
}
