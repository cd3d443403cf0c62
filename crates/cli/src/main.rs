//! CLI tool for generating course decks, quizzes and exams from an outline.

mod external;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use course_core::{
    authoring, parse_with, CourseOutline, ImageGenerator, NarrationComposer, ParseOptions, PipelineConfig,
    Renderers, SnapshotComposer, TextGenerator,
};
use course_pptx::{PptxDeckWriter, PptxReader};
use external::{CommandImages, CommandNarration, CommandSnapshots, CommandText, Unavailable};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Generate course material from a numbered outline.
#[derive(Parser, Debug)]
#[command(name = "course-gen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, global = true, default_value = "output")]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Draft an outline from a course description
    Outline {
        /// File holding the course description
        description: PathBuf,
    },

    /// Build the deck, markdown, handbook and video timeline
    Slides {
        /// Outline file (default: the outline in the output directory)
        #[arg(long)]
        outline: Option<PathBuf>,
    },

    /// Write one quiz per module
    Quizzes {
        /// Outline file (default: the outline in the output directory)
        #[arg(long)]
        outline: Option<PathBuf>,
    },

    /// Write the final exam
    Exam {
        /// Outline file (default: the outline in the output directory)
        #[arg(long)]
        outline: Option<PathBuf>,
    },

    /// Run slides, quizzes and exam in sequence
    All {
        /// Outline file (default: the outline in the output directory)
        #[arg(long)]
        outline: Option<PathBuf>,
    },

    /// Print the text of a PPTX deck as JSON
    Inspect {
        /// Deck to read
        deck: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = PipelineConfig::load(args.config.as_deref())
        .with_context(|| "Failed to load configuration")?;
    let output_dir = args.output_dir.as_path();

    let result = match &args.command {
        Commands::Outline { description } => draft(&config, output_dir, description)?,
        Commands::Slides { outline } => {
            let outline = load_outline(&config, output_dir, outline.as_deref())?;
            build_slides(&config, output_dir, &outline)?
        }
        Commands::Quizzes { outline } => {
            let outline = load_outline(&config, output_dir, outline.as_deref())?;
            write_quizzes(&config, output_dir, &outline)
        }
        Commands::Exam { outline } => {
            let outline = load_outline(&config, output_dir, outline.as_deref())?;
            write_exam(&config, output_dir, &outline)?
        }
        Commands::All { outline } => {
            let outline = load_outline(&config, output_dir, outline.as_deref())?;
            json!({
                "slides": build_slides(&config, output_dir, &outline)?,
                "quizzes": write_quizzes(&config, output_dir, &outline),
                "exam": write_exam(&config, output_dir, &outline).unwrap_or_else(|e| {
                    eprintln!("Exam failed: {:#}", e);
                    serde_json::Value::Null
                }),
            })
        }
        Commands::Inspect { deck } => {
            let slides = PptxReader::new()
                .read_file(deck)
                .with_context(|| format!("Failed to read {}", deck.display()))?;
            serde_json::to_value(slides)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Text generator from the configuration, or a stand-in that always fails.
fn text_generator(config: &PipelineConfig) -> Box<dyn TextGenerator> {
    match &config.commands.text {
        Some(command) => Box::new(CommandText::new(command)),
        None => {
            log::warn!("No text command configured, generated text will use fallbacks");
            Box::new(Unavailable)
        }
    }
}

fn image_generator(config: &PipelineConfig) -> Box<dyn ImageGenerator> {
    match &config.commands.image {
        Some(command) => Box::new(CommandImages::new(command)),
        None => {
            log::warn!("No image command configured, slides will have no images");
            Box::new(Unavailable)
        }
    }
}

fn draft(config: &PipelineConfig, output_dir: &Path, description: &Path) -> Result<serde_json::Value> {
    let description = fs::read_to_string(description)
        .with_context(|| format!("Failed to read {}", description.display()))?;

    let mut text = text_generator(config);
    let outline = authoring::draft_outline(&description, text.as_mut()).with_context(|| "Failed to draft outline")?;

    fs::create_dir_all(output_dir).with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(&config.files.outline);
    fs::write(&path, format!("{}\n", outline)).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(json!({ "outline": path }))
}

fn load_outline(config: &PipelineConfig, output_dir: &Path, path: Option<&Path>) -> Result<CourseOutline> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| output_dir.join(&config.files.outline));
    let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let outline = parse_with(&text, ParseOptions::with_raw_capture())
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    log::info!(
        "Loaded '{}' with {} modules from {}",
        outline.course_title,
        outline.modules.len(),
        path.display()
    );
    Ok(outline)
}

fn build_slides(config: &PipelineConfig, output_dir: &Path, outline: &CourseOutline) -> Result<serde_json::Value> {
    let slides = config.projector().project(outline);
    let title = outline.course_title.as_str();

    let mut text = text_generator(config);
    let mut images = image_generator(config);
    let artifacts = config
        .coordinator(title, output_dir)
        .run(&slides, text.as_mut(), images.as_mut());

    let assembler = config.assembler(output_dir);
    let plan = assembler.plan(title, &slides, &artifacts);

    let mut deck = PptxDeckWriter::new();
    let mut snapshots = config.commands.snapshot.as_ref().map(CommandSnapshots::new);
    let mut narration = config.commands.speech.as_ref().map(|speech| {
        let composer = CommandNarration::new(speech);
        match &config.commands.video {
            Some(video) => composer.with_video(video),
            None => composer,
        }
    });

    let report = assembler.assemble(
        &plan,
        Renderers {
            deck: Some(&mut deck),
            snapshots: snapshots.as_mut().map(|s| s as &mut dyn SnapshotComposer),
            narration: narration.as_mut().map(|n| n as &mut dyn NarrationComposer),
        },
    );

    Ok(serde_json::to_value(report)?)
}

fn write_quizzes(config: &PipelineConfig, output_dir: &Path, outline: &CourseOutline) -> serde_json::Value {
    let mut text = text_generator(config);
    let files = config.quiz_generator(output_dir).write_all(outline, text.as_mut());
    if files.len() < outline.modules.len() {
        log::warn!("Wrote {} of {} quizzes", files.len(), outline.modules.len());
    }
    json!(files)
}

fn write_exam(config: &PipelineConfig, output_dir: &Path, outline: &CourseOutline) -> Result<serde_json::Value> {
    let mut text = text_generator(config);
    let files = config
        .exam_generator(output_dir)
        .write(outline, text.as_mut())
        .with_context(|| "Failed to write final exam")?;
    Ok(json!(files))
}
