#![allow(dead_code)]

use bananadeck::{Attachment, ContentService, DeckError, Outline, Result, Slide};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::cell::{Cell, RefCell};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn png_bytes() -> Vec<u8> {
    let image = RgbImage::from_pixel(8, 6, Rgb([250, 210, 40]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    cursor.into_inner()
}

/// Generation service answering from fixed scripts and counting calls.
pub struct ScriptedService {
    pub transcript: String,
    pub outline: String,
    /// `None` makes expansion requests fail
    pub expansion: Option<String>,
    pub fail_images: Cell<bool>,
    pub text_calls: Cell<usize>,
    pub image_calls: Cell<usize>,
    pub references: RefCell<Vec<Option<Vec<u8>>>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            transcript: String::new(),
            outline: String::new(),
            expansion: None,
            fail_images: Cell::new(false),
            text_calls: Cell::new(0),
            image_calls: Cell::new(0),
            references: RefCell::new(Vec::new()),
        }
    }

    pub fn with_transcript(mut self, transcript: &str) -> Self {
        self.transcript = transcript.to_string();
        self
    }

    pub fn with_outline(mut self, outline: &str) -> Self {
        self.outline = outline.to_string();
        self
    }

    pub fn with_expansion(mut self, expansion: &str) -> Self {
        self.expansion = Some(expansion.to_string());
        self
    }
}

impl ContentService for ScriptedService {
    fn generate_text(&self, _prompt: &str, attachments: &[Attachment]) -> Result<String> {
        self.text_calls.set(self.text_calls.get() + 1);

        let extracting = attachments
            .iter()
            .any(|a| matches!(a, Attachment::Pdf(_) | Attachment::VideoUri(_)));
        if extracting {
            return Ok(self.transcript.clone());
        }
        if attachments.iter().any(|a| matches!(a, Attachment::Text(_))) {
            return Ok(self.outline.clone());
        }

        self.expansion
            .clone()
            .ok_or_else(|| DeckError::GenerationError("expansion unavailable".to_string()))
    }

    fn generate_image(&self, _prompt: &str, reference_image: Option<&[u8]>) -> Result<Vec<u8>> {
        self.image_calls.set(self.image_calls.get() + 1);
        self.references
            .borrow_mut()
            .push(reference_image.map(<[u8]>::to_vec));

        if self.fail_images.get() {
            return Err(DeckError::GenerationError("image quota exhausted".to_string()));
        }
        Ok(png_bytes())
    }
}

pub fn five_slide_outline() -> Outline {
    let slides = (1..=5)
        .map(|n| {
            Slide::new(n, format!("Topic {}", n))
                .with_bullets([format!("Detail {} one", n), format!("Detail {} two", n)])
                .with_visual_hint(format!("Illustration {}", n))
        })
        .collect();
    Outline::new(Some("Field Guide".to_string()), slides)
}

/// Create `outputs/<name>` with a transcript, a `v0` outline and one
/// placeholder image per slide whose bytes name the slide.
pub fn seed_project(outputs: &Path, name: &str, outline: &Outline) -> PathBuf {
    let root = outputs.join(name);
    let v0 = root.join("v0");
    let slides = v0.join("slides");
    fs::create_dir_all(&slides).expect("Failed to create project dirs");

    fs::write(
        root.join(format!("{}.md", name)),
        "Intro paragraph about the guide and its purpose for new readers.\n\n\
         Topic 3 covers detail 3 one and detail 3 two in considerable depth here.",
    )
    .expect("Failed to write transcript");
    fs::write(
        v0.join(format!("{}_presentation.md", name)),
        outline.to_markdown(),
    )
    .expect("Failed to write outline");

    for slide in &outline.slides {
        fs::write(
            slides.join(format!("slide_{:02}.png", slide.number)),
            format!("image-{}", slide.number),
        )
        .expect("Failed to write image");
    }

    root
}
