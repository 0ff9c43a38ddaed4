// ABOUTME: Library module for the bananadeck program.
// ABOUTME: Contains outline parsing, versioned storage, rendering and slide expansion.

// Reexport modules
pub mod config;
pub mod convert;
pub mod errors;
pub mod expand;
pub mod gemini;
pub mod generation;
pub mod layout;
pub mod outline;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod skeleton;
pub mod store;
pub mod utils;
pub mod version;

// Reexport common types and functions
pub use config::Config;
pub use convert::{SourceConverter, SourceInput};
pub use errors::{DeckError, Result};
pub use expand::{reconcile, ArtifactAction, ArtifactPlan, Expansion, ExpansionEngine};
pub use gemini::GeminiClient;
pub use generation::{Attachment, ContentService};
pub use layout::{image_file_name, ProjectLayout, SlideImages, VersionDir};
pub use outline::{parse_outline, Outline, Slide};
pub use pipeline::{ExpansionReport, Pipeline, PipelineReport};
pub use render::{RenderSummary, SlideRenderer};
pub use server::serve;
pub use skeleton::OutlineSynthesizer;
pub use store::{cached_text, ArtifactStore, FsArtifactStore};
pub use version::VersionAllocator;

#[cfg(test)]
mod tests;
