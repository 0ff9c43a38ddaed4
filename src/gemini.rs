// ABOUTME: Gemini client for the bananadeck application
// ABOUTME: Implements the generation service over the generateContent REST API

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::generation::{Attachment, ContentService};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Client for the Gemini `generateContent` endpoint.
///
/// Calls carrying a PDF or video go to the extraction model; other text
/// calls go to the outline model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    text_model: String,
    outline_model: String,
    image_model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a client from the application configuration
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: config.text_model.clone(),
            outline_model: config.outline_model.clone(),
            image_model: config.image_model.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn send(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DeckError::GenerationError(format!(
                "{} returned HTTP {}: {}",
                model,
                status.as_u16(),
                message
            )));
        }

        Ok(response.json::<GenerateContentResponse>()?)
    }
}

impl ContentService for GeminiClient {
    fn generate_text(&self, prompt: &str, attachments: &[Attachment]) -> Result<String> {
        let extracting = attachments
            .iter()
            .any(|a| matches!(a, Attachment::Pdf(_) | Attachment::VideoUri(_)));
        let model = if extracting {
            &self.text_model
        } else {
            &self.outline_model
        };

        info!("Sending text request to {}", model);
        let request = GenerateContentRequest::text(prompt, attachments);
        let response = self.send(model, &request)?;
        response.text()
    }

    fn generate_image(&self, prompt: &str, reference_image: Option<&[u8]>) -> Result<Vec<u8>> {
        info!("Sending image request to {}", self.image_model);
        let request = GenerateContentRequest::image(prompt, reference_image);
        let response = self.send(&self.image_model, &request)?;

        if let Some(text) = response.text().ok().filter(|t| !t.trim().is_empty()) {
            info!("Text response: {}", text.trim());
        }
        response.first_image()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Attachments first, then the prompt, then any extra text parts.
    pub fn text(prompt: &str, attachments: &[Attachment]) -> Self {
        let mut parts = Vec::with_capacity(attachments.len() + 1);
        for attachment in attachments {
            match attachment {
                Attachment::Pdf(bytes) => parts.push(Part::inline("application/pdf", bytes)),
                Attachment::VideoUri(uri) => parts.push(Part::file(uri)),
                Attachment::Text(_) => {}
            }
        }
        parts.push(Part::text(prompt));
        for attachment in attachments {
            if let Attachment::Text(text) = attachment {
                parts.push(Part::text(text));
            }
        }

        Self {
            contents: vec![Content { role: Some("user".to_string()), parts }],
            generation_config: None,
        }
    }

    pub fn image(prompt: &str, reference_image: Option<&[u8]>) -> Self {
        let mut parts = Vec::with_capacity(2);
        if let Some(bytes) = reference_image {
            parts.push(Part::inline(image_mime_type(bytes), bytes));
        }
        parts.push(Part::text(prompt));

        Self {
            contents: vec![Content { role: Some("user".to_string()), parts }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn inline(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            inline_data: Some(Blob {
                mime_type: mime_type.to_string(),
                data: STANDARD.encode(bytes),
            }),
            ..Self::default()
        }
    }

    fn file(uri: &str) -> Self {
        Self {
            file_data: Some(FileData {
                file_uri: uri.to_string(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub file_uri: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> Result<&[Part]> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(DeckError::GenerationError(format!(
                "Prompt was blocked: {}",
                reason
            )));
        }

        let candidate = self.candidates.first().ok_or_else(|| {
            DeckError::GenerationError("Response contained no candidates".to_string())
        })?;
        match &candidate.content {
            Some(content) => Ok(&content.parts),
            None => Err(DeckError::GenerationError(format!(
                "Candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }

    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Result<String> {
        let text: String = self
            .parts()?
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(DeckError::GenerationError(
                "Response contained no text".to_string(),
            ));
        }
        Ok(text)
    }

    /// Decoded bytes of the first inline image in the first candidate.
    pub fn first_image(&self) -> Result<Vec<u8>> {
        let blob = self
            .parts()?
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|blob| blob.mime_type.starts_with("image/"));

        match blob {
            Some(blob) => STANDARD.decode(blob.data.as_bytes()).map_err(|e| {
                DeckError::FormatMismatch(format!("Image data is not valid base64: {}", e))
            }),
            None => {
                warn!("No image data found in response");
                Err(DeckError::GenerationError(
                    "Response contained no image data".to_string(),
                ))
            }
        }
    }
}

fn image_mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        _ => "image/png",
    }
}
