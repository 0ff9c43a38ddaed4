// ABOUTME: Main entry point for the bananadeck program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::Context;
use bananadeck::{Config, FsArtifactStore, GeminiClient, Pipeline};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding one folder per project
    #[arg(long, global = true)]
    outputs: Option<PathBuf>,

    /// Number of slides an expanded slide is replaced by
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF or YouTube video into an outline and slide images
    Run(RunArgs),

    /// Expand one slide of a project into several new slides
    Expand(ExpandArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Path to a PDF file or a YouTube URL
    #[arg(short, long)]
    input: String,
}

#[derive(Args)]
struct ExpandArgs {
    /// Number of the slide to expand
    #[arg(short, long)]
    slide: u32,

    /// Project folder (defaults to the most recent project)
    #[arg(short, long)]
    project: Option<PathBuf>,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, default_value_t = 8000)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(outputs) = cli.outputs {
        config = config.with_outputs_dir(outputs);
    }
    if let Some(batch_size) = cli.batch_size {
        config = config.with_batch_size(batch_size);
    }
    config.validate()?;

    let client = GeminiClient::new(&config).context("Failed to set up generation client")?;
    let store = FsArtifactStore::new();
    let pipeline = Pipeline::new(&config, &client, &store);

    match cli.command {
        Commands::Run(args) => {
            println!("Processing {}...", args.input);
            let report = pipeline
                .process_input(&args.input)
                .with_context(|| format!("Error processing input {}", args.input))?;

            println!("Outline: {:?}", report.outline_path);
            println!(
                "Slides: {} rendered, {} reused, {} failed",
                report.render.rendered.len(),
                report.render.skipped.len(),
                report.render.failed.len()
            );
        }
        Commands::Expand(args) => {
            println!("Expanding slide {}...", args.slide);
            let report = pipeline
                .expand_slide(args.project.as_deref(), args.slide)
                .with_context(|| format!("Error expanding slide {}", args.slide))?;

            println!("Slide expansion completed successfully!");
            println!("New presentation: {:?}", report.outline_path);
            println!(
                "Generated {} new slide images, carried over {}",
                report.rendered.len(),
                report.copied.len()
            );
            if !report.failed.is_empty() || !report.missing.is_empty() {
                println!(
                    "Slides without images: failed {:?}, missing {:?}",
                    report.failed, report.missing
                );
            }
        }
        Commands::Serve(args) => {
            bananadeck::serve(&pipeline, &args.host, args.port)?;
        }
    }

    Ok(())
}
