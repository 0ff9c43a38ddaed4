// ABOUTME: Configuration module for the bananadeck application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::errors::{DeckError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_OUTLINE_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Application configuration, built once and handed to each component.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// Model used for transcript extraction (PDF and video).
    pub text_model: String,
    /// Model used for outline synthesis and slide expansion.
    pub outline_model: String,
    pub image_model: String,
    pub outputs_dir: PathBuf,
    /// Number of slides one expanded slide is replaced by.
    pub expansion_batch_size: usize,
    /// `None` leaves remote calls unbounded.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            outline_model: DEFAULT_OUTLINE_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            outputs_dir: PathBuf::from("outputs"),
            expansion_batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var("GEMINI_KEY").ok().filter(|key| !key.is_empty());
        let api_base_url = env::var("GEMINI_BASE_URL").unwrap_or(defaults.api_base_url);
        let text_model = env::var("BANANADECK_TEXT_MODEL").unwrap_or(defaults.text_model);
        let outline_model =
            env::var("BANANADECK_OUTLINE_MODEL").unwrap_or(defaults.outline_model);
        let image_model = env::var("BANANADECK_IMAGE_MODEL").unwrap_or(defaults.image_model);
        let outputs_dir = env::var("BANANADECK_OUTPUTS")
            .ok()
            .map(PathBuf::from)
            .unwrap_or(defaults.outputs_dir);
        let request_timeout_secs = env::var("BANANADECK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        Self {
            api_key,
            api_base_url,
            text_model,
            outline_model,
            image_model,
            outputs_dir,
            expansion_batch_size: defaults.expansion_batch_size,
            request_timeout_secs,
        }
    }

    /// Override the outputs directory
    pub fn with_outputs_dir(mut self, outputs_dir: impl Into<PathBuf>) -> Self {
        self.outputs_dir = outputs_dir.into();
        self
    }

    /// Override the expansion batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.expansion_batch_size = batch_size;
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Return the API key or a configuration error naming the variable to set
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            DeckError::ConfigError(
                "API key is required. Set the GEMINI_KEY environment variable.".to_string(),
            )
        })
    }

    /// Check settings that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        if self.expansion_batch_size == 0 {
            return Err(DeckError::ConfigError(
                "Expansion batch size must be at least 1".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(DeckError::ConfigError(
                "Generation service base URL is empty".to_string(),
            ));
        }
        Ok(())
    }
}
