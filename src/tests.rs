use super::*;
use crate::expand::{normalize_batch, select_context, significant_terms, splice, PlannedArtifact};
use crate::gemini::{GenerateContentRequest, GenerateContentResponse};
use crate::layout::parse_image_file_name;
use crate::server::route;
use crate::utils::{leading_excerpt, safe_file_name};
use crate::version::parse_version_name;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::cell::Cell;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use tiny_http::Method;

fn encode_image(format: ImageOutputFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(4, 3, Rgb([30, 120, 200]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut cursor, format)
        .expect("Failed to encode test image");
    cursor.into_inner()
}

fn sample_outline(count: u32) -> Outline {
    let slides = (1..=count)
        .map(|n| {
            Slide::new(n, format!("Slide {} title", n))
                .with_bullets([format!("Point {}a", n), format!("Point {}b", n)])
                .with_visual_hint(format!("Picture {}", n))
        })
        .collect();
    Outline::new(Some("Sample Deck".to_string()), slides)
}

fn titles(outline: &Outline) -> Vec<&str> {
    outline.slides.iter().map(|s| s.title.as_str()).collect()
}

/// Service that never gets as far as a network call.
struct OfflineService {
    calls: Cell<usize>,
}

impl OfflineService {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
        }
    }
}

impl ContentService for OfflineService {
    fn generate_text(&self, _prompt: &str, _attachments: &[Attachment]) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        Err(DeckError::GenerationError("offline".to_string()))
    }

    fn generate_image(&self, _prompt: &str, _reference: Option<&[u8]>) -> Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        Err(DeckError::GenerationError("offline".to_string()))
    }
}

#[test]
fn test_parse_outline_basic() {
    let text = "# Quarterly Review\n\n\
                ## Slide 1: Introduction\n\
                - Welcome\n\
                - Agenda\n\
                - **Visual suggestion:** A bar chart of revenue\n\n\
                ## Slide 2: Results\n\
                - Revenue up\n";

    let outline = parse_outline(text);

    assert_eq!(outline.title.as_deref(), Some("Quarterly Review"));
    assert_eq!(outline.len(), 2);
    assert_eq!(outline.slides[0].number, 1);
    assert_eq!(outline.slides[0].title, "Introduction");
    assert_eq!(outline.slides[0].bullets, vec!["Welcome", "Agenda"]);
    assert_eq!(
        outline.slides[0].visual_hint.as_deref(),
        Some("A bar chart of revenue")
    );
    assert_eq!(outline.slides[1].bullets, vec!["Revenue up"]);
    assert_eq!(outline.slides[1].visual_hint, None);
}

#[test]
fn test_parse_outline_ignores_marker_labels() {
    let text = "## Slide 7: First\n## Slide X: Second\n## Slide : Third\n";

    let outline = parse_outline(text);

    let numbers: Vec<u32> = outline.slides.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(titles(&outline), vec!["First", "Second", "Third"]);
    assert!(outline.is_contiguous());
}

#[test]
fn test_parse_outline_empty_title_uses_label() {
    let outline = parse_outline("## Slide 4:\n- something\n");

    assert_eq!(outline.len(), 1);
    assert_eq!(outline.slides[0].title, "Slide 4");
    assert_eq!(outline.slides[0].number, 1);
}

#[test]
fn test_parse_outline_without_markers_is_empty() {
    let outline = parse_outline("# Notes\n\nSome prose.\n- a stray bullet\n");

    assert!(outline.is_empty());
    assert_eq!(outline.title.as_deref(), Some("Notes"));
    assert!(parse_outline("").is_empty());
}

#[test]
fn test_parse_outline_only_exact_hint_spelling() {
    let text = "## Slide 1: Hints\n\
                - Visual suggestion: plain variant\n\
                - **Visual:** short variant\n";

    let slide = &parse_outline(text).slides[0];

    assert_eq!(slide.visual_hint, None);
    assert_eq!(
        slide.bullets,
        vec!["Visual suggestion: plain variant", "**Visual:** short variant"]
    );
}

#[test]
fn test_parse_outline_blank_lines_and_other_headings() {
    let text = "## Slide 1: Body\n\n- first\n\n\n- second\n### Speaker notes\n- not a bullet\n\n## Slide 2: Next\n- third\n";

    let outline = parse_outline(text);

    assert_eq!(outline.slides[0].bullets, vec!["first", "second"]);
    assert_eq!(outline.slides[1].bullets, vec!["third"]);
}

#[test]
fn test_parse_outline_last_hint_wins() {
    let text = "## Slide 1: Twice\n- **Visual suggestion:** one\n- **Visual suggestion:** two\n";

    let outline = parse_outline(text);

    assert_eq!(outline.slides[0].visual_hint.as_deref(), Some("two"));
}

#[test]
fn test_outline_markdown_round_trip() {
    let mut outline = sample_outline(3);
    outline.slides[1].visual_hint = None;
    outline.slides[2].bullets.clear();

    let reparsed = parse_outline(&outline.to_markdown());

    assert_eq!(reparsed, outline);
}

#[test]
fn test_outline_round_trip_keeps_near_miss_hint_bullet() {
    let parsed = parse_outline("## Slide 1: Data\n- Real point\n-**Visual suggestion:** near miss\n");
    assert_eq!(
        parsed.slides[0].bullets,
        vec!["Real point", "**Visual suggestion:** near miss"]
    );
    assert_eq!(parsed.slides[0].visual_hint, None);

    let reparsed = parse_outline(&parsed.to_markdown());

    assert_eq!(reparsed.slides, parsed.slides);
}

#[test]
fn test_outline_round_trip_with_empty_marker_title() {
    let parsed = parse_outline("## Slide : \n- a\n## Slide 2:\n- b\n");
    assert_eq!(titles(&parsed), vec!["Slide 1", "Slide 2"]);

    let reparsed = parse_outline(&parsed.to_markdown());

    assert_eq!(reparsed.slides, parsed.slides);
}

#[test]
fn test_outline_markdown_default_title() {
    let outline = Outline::new(None, vec![Slide::new(1, "Only")]);
    let markdown = outline.to_markdown();

    assert!(markdown.starts_with("# Presentation\n"));
    assert!(markdown.contains("## Slide 1: Only\n"));
}

#[test]
fn test_outline_contiguity() {
    assert!(sample_outline(4).is_contiguous());
    assert!(Outline::default().is_contiguous());

    let gapped = Outline::new(None, vec![Slide::new(1, "a"), Slide::new(3, "b")]);
    assert!(!gapped.is_contiguous());
}

#[test]
fn test_splice_replaces_and_shifts() {
    let outline = sample_outline(5);
    let batch = vec![
        Slide::new(1, "New A"),
        Slide::new(2, "New B"),
        Slide::new(3, "New C"),
    ];

    let spliced = splice(&outline, 3, batch).expect("Splice failed");

    assert_eq!(spliced.len(), 7);
    assert!(spliced.is_contiguous());
    assert_eq!(
        titles(&spliced),
        vec![
            "Slide 1 title",
            "Slide 2 title",
            "New A",
            "New B",
            "New C",
            "Slide 4 title",
            "Slide 5 title",
        ]
    );
    // Shifted slides keep their content.
    assert_eq!(spliced.slides[5].bullets, outline.slides[3].bullets);
    // Input outline is untouched.
    assert_eq!(outline, sample_outline(5));
}

#[test]
fn test_splice_last_and_single_slide() {
    let outline = sample_outline(2);
    let spliced = splice(&outline, 2, vec![Slide::new(0, "x"), Slide::new(0, "y")])
        .expect("Splice failed");
    assert_eq!(titles(&spliced), vec!["Slide 1 title", "x", "y"]);

    let single = sample_outline(1);
    let spliced = splice(&single, 1, vec![Slide::new(0, "only")]).expect("Splice failed");
    assert_eq!(titles(&spliced), vec!["only"]);
}

#[test]
fn test_splice_missing_slide() {
    let outline = sample_outline(3);

    let result = splice(&outline, 9, vec![Slide::new(1, "x")]);

    assert!(matches!(result, Err(DeckError::SlideNotFound(9))));
}

#[test]
fn test_normalize_batch_pads_and_truncates() {
    let target = Slide::new(3, "Target").with_bullets(["keep"]);

    let padded = normalize_batch(vec![Slide::new(1, "Generated")], &target, 3);
    assert_eq!(
        padded.iter().map(|s| s.title.as_str()).collect::<Vec<_>>(),
        vec!["Generated", "Target (Part 2)", "Target (Part 3)"]
    );
    assert_eq!(padded[2].bullets, vec!["keep"]);

    let many = (1..=5).map(|n| Slide::new(n, format!("g{}", n))).collect();
    let truncated = normalize_batch(many, &target, 3);
    assert_eq!(
        truncated.iter().map(|s| s.title.as_str()).collect::<Vec<_>>(),
        vec!["g1", "g2", "g3"]
    );
}

#[test]
fn test_artifact_plan_actions() {
    let outline = sample_outline(5);
    let batch = (1..=3).map(|n| Slide::new(n, format!("n{}", n))).collect();
    let expanded = splice(&outline, 3, batch).expect("Splice failed");

    let plan = ArtifactPlan::build(&expanded, 3, 3, None);

    assert_eq!(plan.replaced, 3..=5);
    assert_eq!(
        plan.entries[0],
        PlannedArtifact {
            number: 1,
            action: ArtifactAction::Reuse { previous: 1 }
        }
    );
    assert_eq!(plan.entries[1].action, ArtifactAction::Reuse { previous: 2 });
    assert_eq!(plan.entries[5].action, ArtifactAction::Shift { previous: 4 });
    assert_eq!(plan.entries[6].action, ArtifactAction::Shift { previous: 5 });
    let rendered: Vec<&str> = plan.renders().map(|s| s.title.as_str()).collect();
    assert_eq!(rendered, vec!["n1", "n2", "n3"]);
}

#[test]
fn test_significant_terms() {
    let slide = Slide::new(1, "The Role of Data, in 2024!").with_bullets(["More data about roles"]);

    let terms = significant_terms(&slide);

    assert_eq!(terms, vec!["role", "data", "2024", "roles"]);
}

#[test]
fn test_select_context_picks_best_block() {
    let slide = Slide::new(1, "Photosynthesis basics").with_bullets(["Chlorophyll absorbs light"]);
    let source = "The history of the region goes back many centuries of trade.\n\n\
                  chlorophyll light\n\n\
                  Photosynthesis happens in leaves where chlorophyll absorbs light energy.\n\n\
                  Light is also discussed in this later paragraph about optics and lenses.";

    let context = select_context(&slide, source);

    assert_eq!(
        context,
        "Photosynthesis happens in leaves where chlorophyll absorbs light energy."
    );
}

#[test]
fn test_select_context_splits_on_whitespace_only_lines() {
    let slide = Slide::new(1, "Volcanic eruptions").with_bullets(["Magma chambers"]);
    let source = "Volcanic eruptions begin when magma chambers under the crust fill up.\n   \n\
                  Glaciers carve valleys slowly over thousands of years of steady movement.";

    let context = select_context(&slide, source);

    assert_eq!(
        context,
        "Volcanic eruptions begin when magma chambers under the crust fill up."
    );
}

#[test]
fn test_select_context_falls_back_to_excerpt() {
    let slide = Slide::new(1, "Quantum entanglement");
    let long_source = "x".repeat(1500);

    assert_eq!(select_context(&slide, &long_source).len(), 1000);
    assert_eq!(select_context(&slide, "short"), "short");
}

#[test]
fn test_expansion_engine_falls_back_when_generation_fails() {
    let service = OfflineService::new();
    let engine = ExpansionEngine::new(&service, 3);
    let outline = sample_outline(4);

    let expansion = engine
        .expand(&outline, 2, "source text", None)
        .expect("Expansion failed");

    assert!(!expansion.generated);
    assert_eq!(expansion.outline.len(), 6);
    assert_eq!(
        titles(&expansion.outline)[1..4],
        [
            "Slide 2 title (Part 1)",
            "Slide 2 title (Part 2)",
            "Slide 2 title (Part 3)"
        ]
    );
}

#[test]
fn test_expansion_engine_missing_slide_makes_no_calls() {
    let service = OfflineService::new();
    let engine = ExpansionEngine::new(&service, 3);

    let result = engine.expand(&sample_outline(2), 5, "", None);

    assert!(matches!(result, Err(DeckError::SlideNotFound(5))));
    assert_eq!(service.calls.get(), 0);
}

#[test]
fn test_expansion_engine_clamps_batch_size() {
    let service = OfflineService::new();
    assert_eq!(ExpansionEngine::new(&service, 0).batch_size(), 1);
}

#[test]
fn test_expansion_prompt_mentions_theme() {
    let slide = Slide::new(2, "Market").with_visual_hint("Blue world map");

    let prompt = expand::build_expansion_prompt(&slide, "context here", 3);

    assert!(prompt.contains("Visual theme: Blue world map"));
    assert!(prompt.contains("## Slide 3: [New Title]"));
    assert!(prompt.contains("context here"));
}

#[test]
fn test_version_allocator_sequence() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let base = temp_dir.path().join("project");
    let store = FsArtifactStore::new();
    let allocator = VersionAllocator::new(&store);

    assert_eq!(allocator.next_unused(&base).index(), 0);

    let first = allocator.allocate_next(&base).expect("Failed to allocate");
    let second = allocator.allocate_next(&base).expect("Failed to allocate");
    assert_eq!(first.index(), 0);
    assert_eq!(second.index(), 1);
    assert!(second.path().is_dir());

    fs::create_dir_all(base.join("v3")).expect("Failed to create dir");
    let third = allocator.allocate_next(&base).expect("Failed to allocate");
    assert_eq!(third.index(), 2);
    assert_eq!(allocator.latest(&base).expect("No latest").index(), 3);
}

#[test]
fn test_version_allocator_latest_without_versions() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = FsArtifactStore::new();
    let allocator = VersionAllocator::new(&store);

    let missing = allocator.latest(&temp_dir.path().join("nope"));
    assert!(matches!(missing, Err(DeckError::PathNotFoundError(_))));

    fs::create_dir_all(temp_dir.path().join("vx")).expect("Failed to create dir");
    assert!(allocator.latest(temp_dir.path()).is_err());
}

#[test]
fn test_parse_version_name() {
    assert_eq!(parse_version_name("v0"), Some(0));
    assert_eq!(parse_version_name("v12"), Some(12));
    assert_eq!(parse_version_name("v"), None);
    assert_eq!(parse_version_name("version1"), None);
}

#[test]
fn test_cached_text_skips_generation() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("cached.md");
    fs::write(&path, "already here").expect("Failed to write file");
    let store = FsArtifactStore::new();
    let called = Cell::new(false);

    let text = cached_text(&store, &path, "Test text", || {
        called.set(true);
        Ok("fresh".to_string())
    })
    .expect("Cached read failed");

    assert_eq!(text, "already here");
    assert!(!called.get());
}

#[test]
fn test_cached_text_writes_on_miss() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("nested").join("fresh.md");
    let store = FsArtifactStore::new();

    let text = cached_text(&store, &path, "Test text", || Ok("fresh".to_string()))
        .expect("Cached write failed");

    assert_eq!(text, "fresh");
    assert_eq!(fs::read_to_string(&path).expect("Missing file"), "fresh");
}

#[test]
fn test_cached_text_failure_leaves_no_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("never.md");
    let store = FsArtifactStore::new();

    let result = cached_text(&store, &path, "Test text", || {
        Err(DeckError::GenerationError("boom".to_string()))
    });

    assert!(result.is_err());
    assert!(!path.exists());
}

#[test]
fn test_image_file_names() {
    assert_eq!(image_file_name(7), "slide_07.png");
    assert_eq!(image_file_name(12), "slide_12.png");
    assert_eq!(parse_image_file_name("slide_07.png"), Some(7));
    assert_eq!(parse_image_file_name("slide_x.png"), None);
    assert_eq!(parse_image_file_name("slide_07.jpg"), None);
}

#[test]
fn test_outline_paths_per_version() {
    let project = ProjectLayout::in_outputs(Path::new("outputs"), "deck");

    assert_eq!(
        project.version(0).outline_path(project.name()),
        Path::new("outputs/deck/v0/deck_presentation.md")
    );
    assert_eq!(
        project.version(2).outline_path(project.name()),
        Path::new("outputs/deck/v2/deck_presentation_expanded.md")
    );
    assert_eq!(
        project.version(1).image_path(3),
        Path::new("outputs/deck/v1/slides/slide_03.png")
    );
}

#[test]
fn test_find_outline_falls_back_to_pattern() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let version = VersionDir::new(temp_dir.path(), 1);
    fs::create_dir_all(version.path()).expect("Failed to create dir");
    fs::write(version.path().join("notes.md"), "x").expect("Failed to write file");
    fs::write(
        version.path().join("old_name_presentation_expanded.md"),
        "## Slide 1: x",
    )
    .expect("Failed to write file");
    let store = FsArtifactStore::new();

    let found = version.find_outline(&store, "deck");

    assert_eq!(
        found,
        Some(version.path().join("old_name_presentation_expanded.md"))
    );
    assert_eq!(VersionDir::new(temp_dir.path(), 5).find_outline(&store, "deck"), None);
}

#[test]
fn test_slide_images_scan() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let slides_dir = temp_dir.path().join("slides");
    fs::create_dir_all(&slides_dir).expect("Failed to create dir");
    for name in ["slide_01.png", "slide_03.png", "notes.txt"] {
        fs::write(slides_dir.join(name), "x").expect("Failed to write file");
    }
    let store = FsArtifactStore::new();

    let images = SlideImages::scan(&store, &slides_dir).expect("Scan failed");

    assert_eq!(images.len(), 2);
    assert_eq!(images.get(1), Some(slides_dir.join("slide_01.png").as_path()));
    assert_eq!(images.get(2), None);
    assert_eq!(images.get(3), Some(slides_dir.join("slide_03.png").as_path()));

    let empty = SlideImages::scan(&store, &temp_dir.path().join("missing"))
        .expect("Scan failed");
    assert!(empty.is_empty());
}

#[test]
fn test_find_transcript_with_other_stem() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let project = ProjectLayout::in_outputs(temp_dir.path(), "abc_My_Talk");
    fs::create_dir_all(project.version(0).path()).expect("Failed to create dir");
    fs::write(project.root().join("My_Talk.md"), "text").expect("Failed to write file");
    let store = FsArtifactStore::new();

    let found = project.find_transcript(&store).expect("Transcript not found");

    assert_eq!(found, project.root().join("My_Talk.md"));
}

#[test]
fn test_extract_video_id() {
    assert_eq!(
        convert::extract_video_id("https://www.youtube.com/watch?v=abc123&t=10"),
        "abc123"
    );
    assert_eq!(convert::extract_video_id("https://youtu.be/xyz789"), "xyz789");
    assert_eq!(
        convert::extract_video_id("youtube.com without scheme"),
        "youtube_video"
    );
}

#[test]
fn test_extract_video_title() {
    assert_eq!(
        convert::extract_video_title("VIDEO_TITLE: My Talk\n\n# Overview"),
        Some("My Talk".to_string())
    );
    assert_eq!(convert::extract_video_title("# No title here"), None);
}

#[test]
fn test_detect_source_input() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pdf = temp_dir.path().join("report.pdf");
    fs::write(&pdf, b"%PDF-1.4").expect("Failed to write file");

    assert_eq!(
        SourceInput::detect(pdf.to_str().unwrap()).expect("Detect failed"),
        SourceInput::Pdf(pdf.clone())
    );
    assert!(matches!(
        SourceInput::detect("https://youtu.be/xyz789"),
        Ok(SourceInput::Video { ref video_id, .. }) if video_id == "xyz789"
    ));
    assert!(matches!(
        SourceInput::detect("notes.txt"),
        Err(DeckError::ValidationError(_))
    ));
    assert!(matches!(
        SourceInput::detect(temp_dir.path().join("absent.pdf").to_str().unwrap()),
        Err(DeckError::ValidationError(_))
    ));
}

#[test]
fn test_pdf_project_name() {
    assert_eq!(
        convert::pdf_project_name(Path::new("/tmp/My Report.pdf")),
        "My_Report"
    );
}

#[test]
fn test_safe_file_name_and_excerpt() {
    assert_eq!(safe_file_name("My Talk: Part 1/2"), "My_Talk_Part_1_2");
    assert_eq!(safe_file_name("  ?? "), "");
    assert_eq!(leading_excerpt("héllo", 2), "hé");
    assert_eq!(leading_excerpt("hi", 10), "hi");
}

#[test]
fn test_config_validation() {
    let config = Config::new();
    assert!(config.validate().is_ok());
    assert!(matches!(
        config.require_api_key(),
        Err(DeckError::ConfigError(_))
    ));
    assert!(config.request_timeout().is_none());

    let zero = Config::new().with_batch_size(0);
    assert!(matches!(zero.validate(), Err(DeckError::ConfigError(_))));
}

#[test]
fn test_gemini_client_requires_key() {
    assert!(GeminiClient::new(&Config::new()).is_err());

    let mut config = Config::new();
    config.api_key = Some("test-key".to_string());
    config.api_base_url = "http://localhost:9999/".to_string();
    let client = GeminiClient::new(&config).expect("Client setup failed");
    assert_eq!(client.base_url(), "http://localhost:9999");
}

#[test]
fn test_text_request_layout() {
    let request = GenerateContentRequest::text(
        "Summarise",
        &[
            Attachment::Text("transcript body".to_string()),
            Attachment::Pdf(vec![1, 2, 3]),
        ],
    );

    let value = serde_json::to_value(&request).expect("Failed to serialise");
    let parts = &value["contents"][0]["parts"];

    assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
    assert_eq!(parts[0]["inlineData"]["data"], STANDARD.encode([1u8, 2, 3]));
    assert_eq!(parts[1]["text"], "Summarise");
    assert_eq!(parts[2]["text"], "transcript body");
    assert!(value.get("generationConfig").is_none());
}

#[test]
fn test_image_request_layout() {
    let reference = encode_image(ImageOutputFormat::Png);

    let request = GenerateContentRequest::image("Draw it", Some(&reference));

    let value = serde_json::to_value(&request).expect("Failed to serialise");
    assert_eq!(
        value["generationConfig"]["responseModalities"],
        serde_json::json!(["TEXT", "IMAGE"])
    );
    assert_eq!(
        value["contents"][0]["parts"][0]["inlineData"]["mimeType"],
        "image/png"
    );
    assert_eq!(value["contents"][0]["parts"][1]["text"], "Draw it");
}

#[test]
fn test_response_text_and_image() {
    let text: GenerateContentResponse = serde_json::from_str(
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
    )
    .expect("Failed to parse");
    assert_eq!(text.text().expect("No text"), "Hello world");

    let png = encode_image(ImageOutputFormat::Png);
    let body = format!(
        r#"{{"candidates":[{{"content":{{"parts":[{{"text":"Here you go"}},{{"inlineData":{{"mimeType":"image/png","data":"{}"}}}}]}}}}]}}"#,
        STANDARD.encode(&png)
    );
    let image: GenerateContentResponse = serde_json::from_str(&body).expect("Failed to parse");
    assert_eq!(image.first_image().expect("No image"), png);
}

#[test]
fn test_response_errors() {
    let blocked: GenerateContentResponse =
        serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .expect("Failed to parse");
    assert!(matches!(blocked.text(), Err(DeckError::GenerationError(_))));

    let text_only: GenerateContentResponse =
        serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#)
            .expect("Failed to parse");
    assert!(matches!(
        text_only.first_image(),
        Err(DeckError::GenerationError(_))
    ));

    let empty: GenerateContentResponse = serde_json::from_str("{}").expect("Failed to parse");
    assert!(empty.text().is_err());
}

#[test]
fn test_normalize_to_png() {
    let png = encode_image(ImageOutputFormat::Png);
    assert_eq!(render::normalize_to_png(&png).expect("Normalize failed"), png);

    let jpeg = encode_image(ImageOutputFormat::Jpeg(90));
    let converted = render::normalize_to_png(&jpeg).expect("Normalize failed");
    assert_eq!(
        image::guess_format(&converted).expect("Unknown format"),
        image::ImageFormat::Png
    );

    assert!(render::normalize_to_png(b"not an image").is_err());
    assert!(render::normalize_to_png(&[]).is_err());
}

#[test]
fn test_image_prompt_contents() {
    let slide = Slide::new(1, "Growth")
        .with_bullets(["Revenue up", "Costs down"])
        .with_visual_hint("Line chart");

    let plain = render::build_image_prompt(&slide, false);
    assert!(plain.contains("The slide title is: 'Growth'"));
    assert!(plain.contains("1. Revenue up"));
    assert!(plain.contains("2. Costs down"));
    assert!(plain.contains("Visual elements to include: Line chart"));
    assert!(!plain.contains("Theme continuity"));

    assert!(render::build_image_prompt(&slide, true).contains("Theme continuity"));
}

#[test]
fn test_render_failure_leaves_no_artifact() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let service = OfflineService::new();
    let store = FsArtifactStore::new();
    let renderer = SlideRenderer::new(&service);
    let version = VersionDir::new(temp_dir.path(), 0);

    let summary = renderer
        .render_outline(&store, &sample_outline(2), &version)
        .expect("Render failed");

    assert_eq!(summary.failed, vec![1, 2]);
    assert!(summary.rendered.is_empty());
    assert!(!version.image_path(1).exists());
}

#[test]
fn test_error_not_found_classification() {
    assert!(DeckError::SlideNotFound(1).is_not_found());
    assert!(DeckError::PathNotFoundError("x".into()).is_not_found());
    assert!(!DeckError::GenerationError("x".to_string()).is_not_found());
}

#[test]
fn test_router_endpoints() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::new().with_outputs_dir(temp_dir.path());
    let service = OfflineService::new();
    let store = FsArtifactStore::new();
    let pipeline = Pipeline::new(&config, &service, &store);

    let health = route(&pipeline, &Method::Get, "/health", "");
    assert_eq!(health.status, 200);
    assert_eq!(health.body["status"], "healthy");
    assert_eq!(health.body["service"], "bananadeck-api");

    let root = route(&pipeline, &Method::Get, "/", "");
    assert_eq!(root.body["message"], "BananaDeck API");

    let missing = route(&pipeline, &Method::Get, "/nowhere", "");
    assert_eq!(missing.status, 404);

    let bad_body = route(&pipeline, &Method::Post, "/expand", "{\"slide\": 1}");
    assert_eq!(bad_body.status, 422);

    let unsupported = route(
        &pipeline,
        &Method::Post,
        "/process",
        "{\"input_path\": \"notes.txt\"}",
    );
    assert_eq!(unsupported.status, 400);

    let no_project = route(
        &pipeline,
        &Method::Post,
        "/expand",
        "{\"slide_number\": 1}",
    );
    assert_eq!(no_project.status, 404);
    assert!(no_project.body["detail"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Error expanding slide"));
    assert_eq!(service.calls.get(), 0);
}
