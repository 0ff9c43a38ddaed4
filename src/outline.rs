// ABOUTME: Outline module for the bananadeck application
// ABOUTME: Parses slide outline markdown into typed records and writes it back out

use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

/// The one recognised spelling of a visual hint line.
pub const VISUAL_HINT_MARKER: &str = "- **Visual suggestion:**";

const DEFAULT_PRESENTATION_TITLE: &str = "Presentation";

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// 1-based position in the outline
    pub number: u32,
    pub title: String,
    pub bullets: Vec<String>,
    pub visual_hint: Option<String>,
}

impl Slide {
    pub fn new(number: u32, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            bullets: Vec::new(),
            visual_hint: None,
        }
    }

    pub fn with_bullets<I, S>(mut self, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bullets = bullets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_visual_hint(mut self, hint: impl Into<String>) -> Self {
        self.visual_hint = Some(hint.into());
        self
    }
}

/// An ordered list of slides plus the presentation heading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outline {
    pub title: Option<String>,
    pub slides: Vec<Slide>,
}

impl Outline {
    pub fn new(title: Option<String>, slides: Vec<Slide>) -> Self {
        Self { title, slides }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn find(&self, number: u32) -> Option<&Slide> {
        self.slides.iter().find(|slide| slide.number == number)
    }

    /// Position of the slide carrying `number`, if any.
    pub fn position(&self, number: u32) -> Option<usize> {
        self.slides.iter().position(|slide| slide.number == number)
    }

    /// True when slide numbers are exactly 1..=N in order.
    pub fn is_contiguous(&self) -> bool {
        self.slides
            .iter()
            .enumerate()
            .all(|(idx, slide)| slide.number as usize == idx + 1)
    }

    /// Serialize to the outline markdown format that `parse_outline` reads.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let title = self
            .title
            .as_deref()
            .unwrap_or(DEFAULT_PRESENTATION_TITLE);
        let _ = writeln!(out, "# {}", title);
        out.push('\n');

        for slide in &self.slides {
            let _ = writeln!(out, "## Slide {}: {}", slide.number, slide.title);
            for bullet in &slide.bullets {
                // A bullet that reads like a hint keeps the near-miss spelling.
                if format!("- {}", bullet).starts_with(VISUAL_HINT_MARKER) {
                    let _ = writeln!(out, "-{}", bullet);
                } else {
                    let _ = writeln!(out, "- {}", bullet);
                }
            }
            if let Some(hint) = &slide.visual_hint {
                let _ = writeln!(out, "{} {}", VISUAL_HINT_MARKER, hint);
            }
            out.push('\n');
        }

        out
    }
}

fn slide_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^##\s+Slide\s+([^:]*):(.*)$").expect("slide marker pattern is valid")
    })
}

/// How a single line of outline text is read.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Marker { label: &'a str, title: &'a str },
    Heading(&'a str),
    Hint(&'a str),
    Bullet(&'a str),
    Blank,
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if let Some(caps) = slide_marker().captures(line) {
        let label = caps.get(1).map_or("", |m| m.as_str().trim());
        let title = caps.get(2).map_or("", |m| m.as_str().trim());
        return Line::Marker { label, title };
    }
    if line.starts_with('#') {
        return Line::Heading(line.trim_start_matches('#').trim());
    }
    if let Some(hint) = line.strip_prefix(VISUAL_HINT_MARKER) {
        return Line::Hint(hint.trim());
    }
    if let Some(bullet) = line.strip_prefix('-') {
        return Line::Bullet(bullet.trim());
    }
    Line::Other
}

/// Parse outline markdown into slides numbered 1..=N in document order.
///
/// Every `## Slide <label>: <title>` line opens a slide. Its body runs until
/// the next marker or any other heading. Labels are ignored. Input without
/// markers gives an empty outline.
pub fn parse_outline(text: &str) -> Outline {
    let mut title = None;
    let mut slides: Vec<Slide> = Vec::new();
    // Whether lines are currently being collected into the last slide.
    let mut in_slide = false;

    for raw in text.lines() {
        match classify(raw) {
            Line::Marker { label, title: slide_title } => {
                let number = slides.len() as u32 + 1;
                let slide_title = match (slide_title.is_empty(), label.is_empty()) {
                    (false, _) => slide_title.to_string(),
                    (true, false) => format!("Slide {}", label),
                    (true, true) => format!("Slide {}", number),
                };
                slides.push(Slide::new(number, slide_title));
                in_slide = true;
            }
            Line::Heading(text) => {
                if title.is_none() && slides.is_empty() && raw.trim_start().starts_with("# ") {
                    title = Some(text.to_string());
                }
                in_slide = false;
            }
            Line::Hint(hint) if in_slide => {
                if let Some(slide) = slides.last_mut() {
                    slide.visual_hint = (!hint.is_empty()).then(|| hint.to_string());
                }
            }
            Line::Bullet(bullet) if in_slide => {
                if let Some(slide) = slides.last_mut() {
                    slide.bullets.push(bullet.to_string());
                }
            }
            _ => {}
        }
    }

    Outline { title, slides }
}
