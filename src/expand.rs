// ABOUTME: Slide expansion module for the bananadeck application
// ABOUTME: Replaces one slide with a batch of new slides, renumbers, and reconciles images

use crate::errors::{DeckError, Result};
use crate::generation::ContentService;
use crate::layout::{SlideImages, VersionDir};
use crate::outline::{parse_outline, Outline, Slide, VISUAL_HINT_MARKER};
use crate::render::SlideRenderer;
use crate::store::ArtifactStore;
use crate::utils;
use log::{error, info, warn};
use regex::Regex;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Blocks shorter than this never count as relevant context.
pub const MIN_CONTEXT_BLOCK_CHARS: usize = 50;
/// Size of the leading excerpt used when no block matches.
pub const FALLBACK_CONTEXT_CHARS: usize = 1000;
const MIN_TERM_CHARS: usize = 4;

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "both", "could", "does", "each",
    "from", "have", "here", "into", "just", "like", "made", "make", "many", "more", "most",
    "much", "must", "only", "other", "over", "should", "some", "such", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "those", "very", "were", "what", "when",
    "where", "which", "while", "will", "with", "would", "your",
];

/// Lowercased terms from a slide's title and bullets worth searching for.
pub fn significant_terms(slide: &Slide) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(slide.title.as_str())
        .chain(slide.bullets.iter().map(String::as_str))
        .flat_map(str::split_whitespace)
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
        .filter(|term| !STOPWORDS.contains(&term.as_str()))
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

fn block_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Regex::new(r"\n[ \t\r]*\n").expect("block separator pattern is valid")
    })
}

/// Pick the passage of `source` most relevant to `slide`.
///
/// Blocks are separated by blank or whitespace-only lines and scored by how many significant
/// terms they contain; the first best block wins. Without any match the
/// leading excerpt of `source` is returned.
pub fn select_context<'s>(slide: &Slide, source: &'s str) -> &'s str {
    let terms = significant_terms(slide);
    let mut best: Option<(&str, usize)> = None;

    for block in block_separator().split(source) {
        if block.trim().chars().count() < MIN_CONTEXT_BLOCK_CHARS {
            continue;
        }

        let lower = block.to_lowercase();
        let score = terms.iter().filter(|term| lower.contains(term.as_str())).count();
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((block, score));
        }
    }

    match best {
        Some((block, _)) => block,
        None => utils::leading_excerpt(source, FALLBACK_CONTEXT_CHARS),
    }
}

/// Prompt asking for `batch_size` slides that replace `slide`.
pub fn build_expansion_prompt(slide: &Slide, context: &str, batch_size: usize) -> String {
    let mut prompt = format!(
        "You are a professional presentation designer. I need you to expand a single slide into {} separate slides that provide more detailed coverage of the content.\n\n",
        batch_size
    );

    prompt.push_str("ORIGINAL SLIDE:\n");
    prompt.push_str(&format!("Title: {}\n", slide.title));
    prompt.push_str("Content:\n");
    for bullet in &slide.bullets {
        prompt.push_str(&format!("- {}\n", bullet));
    }
    if let Some(hint) = &slide.visual_hint {
        prompt.push_str(&format!("Visual theme: {}\n", hint));
    }

    prompt.push_str("\nRELEVANT SOURCE CONTENT:\n");
    prompt.push_str(context);
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "TASK: Create {} new slides that expand on this content. The slides should:\n\
         1. Provide more detailed coverage of the topic\n\
         2. Include additional context from the source content\n\
         3. Maintain logical flow and progression\n\
         4. Each slide should be substantial and meaningful\n\n",
        batch_size
    ));

    prompt.push_str("OUTPUT FORMAT:\n");
    for i in 1..=batch_size {
        prompt.push_str(&format!("## Slide {}: [New Title]\n", i));
        prompt.push_str("- [Detailed point 1]\n- [Detailed point 2]\n- [Detailed point 3]\n");
        prompt.push_str(&format!("{} [specific visual description]\n\n", VISUAL_HINT_MARKER));
    }

    prompt.push_str(&format!(
        "IMPORTANT:\n\
         - Produce exactly {} slides using the exact \"## Slide N:\" headers shown above\n\
         - Include visual suggestions using the exact format \"{}\"\n\
         - Every visual suggestion must keep the theme and imagery of the ORIGINAL slide so the new slides look like part of the same deck\n\
         - Make each slide substantial and informative\n\
         - Draw additional details from the source content\n\
         - Maintain professional presentation standards",
        batch_size, VISUAL_HINT_MARKER
    ));

    prompt
}

fn part_of(target: &Slide, part: usize) -> Slide {
    let mut copy = target.clone();
    copy.title = format!("{} (Part {})", target.title, part);
    copy
}

/// Batch used when the generation service cannot produce one.
pub fn fallback_batch(target: &Slide, batch_size: usize) -> Vec<Slide> {
    (1..=batch_size).map(|part| part_of(target, part)).collect()
}

/// Force a parsed batch to exactly `batch_size` entries: extra entries are
/// dropped, missing ones are filled with "(Part k)" copies of the target.
pub fn normalize_batch(mut batch: Vec<Slide>, target: &Slide, batch_size: usize) -> Vec<Slide> {
    if batch.len() != batch_size {
        warn!(
            "Expected {} slides, got {}. Adjusting...",
            batch_size,
            batch.len()
        );
    }

    batch.truncate(batch_size);
    while batch.len() < batch_size {
        let part = batch.len() + 1;
        batch.push(part_of(target, part));
    }
    batch
}

/// Replace slide `target_number` with `batch`.
///
/// Slides before the target keep their numbers, the batch takes
/// `target_number..target_number + B - 1`, and later slides move up by
/// `B - 1`. The input outline is left untouched.
pub fn splice(outline: &Outline, target_number: u32, batch: Vec<Slide>) -> Result<Outline> {
    let index = outline
        .position(target_number)
        .ok_or(DeckError::SlideNotFound(target_number))?;
    if batch.is_empty() {
        return Err(DeckError::FormatMismatch(
            "Replacement batch is empty".to_string(),
        ));
    }

    let shift = batch.len() as u32 - 1;
    let mut slides = Vec::with_capacity(outline.len() + batch.len() - 1);

    slides.extend(outline.slides[..index].iter().cloned());
    slides.extend(batch.into_iter().enumerate().map(|(i, mut slide)| {
        slide.number = target_number + i as u32;
        slide
    }));
    slides.extend(outline.slides[index + 1..].iter().map(|slide| {
        let mut moved = slide.clone();
        moved.number += shift;
        moved
    }));

    let spliced = Outline::new(outline.title.clone(), slides);
    debug_assert!(!outline.is_contiguous() || spliced.is_contiguous());
    Ok(spliced)
}

/// Where the image for one slide of the expanded outline comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactAction {
    /// New slide: generate a fresh image.
    Render(Slide),
    /// Untouched slide before the expansion: same number, same image.
    Reuse { previous: u32 },
    /// Slide after the expansion: image of `previous` under the new number.
    Shift { previous: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedArtifact {
    pub number: u32,
    pub action: ArtifactAction,
}

/// Image work needed to bring a version directory in line with an
/// expanded outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPlan {
    pub entries: Vec<PlannedArtifact>,
    /// Numbers taken by the replacement batch
    pub replaced: RangeInclusive<u32>,
    /// Prior image of the expanded slide, used as a theme reference
    pub reference_image: Option<PathBuf>,
}

impl ArtifactPlan {
    pub fn build(
        outline: &Outline,
        target_number: u32,
        batch_size: usize,
        reference_image: Option<PathBuf>,
    ) -> Self {
        let shift = batch_size.saturating_sub(1) as u32;
        let replaced = target_number..=target_number + shift;

        let entries = outline
            .slides
            .iter()
            .map(|slide| {
                let action = if replaced.contains(&slide.number) {
                    ArtifactAction::Render(slide.clone())
                } else if slide.number < target_number {
                    ArtifactAction::Reuse {
                        previous: slide.number,
                    }
                } else {
                    ArtifactAction::Shift {
                        previous: slide.number - shift,
                    }
                };
                PlannedArtifact {
                    number: slide.number,
                    action,
                }
            })
            .collect();

        Self {
            entries,
            replaced,
            reference_image,
        }
    }

    pub fn renders(&self) -> impl Iterator<Item = &Slide> {
        self.entries.iter().filter_map(|entry| match &entry.action {
            ArtifactAction::Render(slide) => Some(slide),
            _ => None,
        })
    }
}

/// Result of expanding one slide in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub target: Slide,
    pub outline: Outline,
    pub plan: ArtifactPlan,
    /// False when the generation service failed and the fallback batch was used
    pub generated: bool,
}

/// Expands slides using a generation service.
pub struct ExpansionEngine<'a> {
    service: &'a dyn ContentService,
    batch_size: usize,
}

impl<'a> ExpansionEngine<'a> {
    pub fn new(service: &'a dyn ContentService, batch_size: usize) -> Self {
        Self {
            service,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Replace slide `target_number` with a freshly generated batch.
    ///
    /// Only a missing target slide is an error; generation problems fall
    /// back to "(Part k)" copies of the target.
    pub fn expand(
        &self,
        outline: &Outline,
        target_number: u32,
        source_material: &str,
        reference_image: Option<&Path>,
    ) -> Result<Expansion> {
        let target = outline
            .find(target_number)
            .cloned()
            .ok_or(DeckError::SlideNotFound(target_number))?;
        info!("Expanding slide {}: {}", target.number, target.title);

        let context = select_context(&target, source_material);
        let (batch, generated) = match self.synthesize_batch(&target, context) {
            Ok(batch) => (normalize_batch(batch, &target, self.batch_size), true),
            Err(e) => {
                error!("Error expanding slide: {}", e);
                (fallback_batch(&target, self.batch_size), false)
            }
        };
        info!("Expanded slide into {} slides", batch.len());

        let new_outline = splice(outline, target_number, batch)?;
        let plan = ArtifactPlan::build(
            &new_outline,
            target_number,
            self.batch_size,
            reference_image.map(Path::to_path_buf),
        );

        Ok(Expansion {
            target,
            outline: new_outline,
            plan,
            generated,
        })
    }

    fn synthesize_batch(&self, target: &Slide, context: &str) -> Result<Vec<Slide>> {
        let prompt = build_expansion_prompt(target, context, self.batch_size);
        let response = self.service.generate_text(&prompt, &[])?;
        let batch = parse_outline(&response).slides;
        if batch.is_empty() {
            return Err(DeckError::FormatMismatch(
                "Expansion response contained no slides".to_string(),
            ));
        }
        Ok(batch)
    }
}

/// What reconciling a plan produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub rendered: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
    /// Slides whose prior image was expected but absent
    pub missing: Vec<u32>,
    /// New slides whose image could not be generated
    pub failed: Vec<u32>,
}

/// Carry out `plan` into `target`, pulling prior images from `prior`.
///
/// Per-slide problems are logged and recorded; only storage failures abort.
pub fn reconcile(
    plan: &ArtifactPlan,
    store: &dyn ArtifactStore,
    renderer: &SlideRenderer<'_>,
    prior: &SlideImages,
    target: &VersionDir,
) -> Result<ReconcileSummary> {
    store.create_dir_all(&target.slides_dir())?;
    let mut summary = ReconcileSummary::default();
    if prior.is_empty() {
        warn!("Previous version has no slide images to carry over");
    }

    let reference = plan.reference_image.as_deref().and_then(|path| {
        match store.read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Reference image {:?} unavailable: {}", path, e);
                None
            }
        }
    });

    for entry in &plan.entries {
        let destination = target.image_path(entry.number);
        match &entry.action {
            ArtifactAction::Render(slide) => {
                match renderer.render_to(store, slide, &destination, reference.as_deref())? {
                    Some(path) => {
                        info!(
                            "Generated image for expanded slide {}: {:?}",
                            entry.number, path
                        );
                        summary.rendered.push(path);
                    }
                    None => summary.failed.push(entry.number),
                }
            }
            ArtifactAction::Reuse { previous } | ArtifactAction::Shift { previous } => {
                match prior.get(*previous) {
                    Some(source) => {
                        store.copy(source, &destination)?;
                        summary.copied.push(destination);
                    }
                    None => {
                        warn!(
                            "Image for slide {} missing from previous version, skipping",
                            previous
                        );
                        summary.missing.push(entry.number);
                    }
                }
            }
        }
    }

    info!(
        "Reconciled images: {} generated, {} copied, {} missing, {} failed",
        summary.rendered.len(),
        summary.copied.len(),
        summary.missing.len(),
        summary.failed.len()
    );
    Ok(summary)
}
