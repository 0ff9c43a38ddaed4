// ABOUTME: Error types for the bananadeck application
// ABOUTME: Provides structured error handling for each stage of the pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Slide {0} not found in outline")]
    SlideNotFound(u32),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Generation service error: {0}")]
    GenerationError(String),

    #[error("Failed to reach generation service: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Unexpected generation output: {0}")]
    FormatMismatch(String),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl DeckError {
    /// True for errors that mean "the thing you asked for is not there".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DeckError::SlideNotFound(_) | DeckError::PathNotFoundError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
