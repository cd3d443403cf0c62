//! Pipeline configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is valid.

use crate::assemble::{RenderAssembler, DEFAULT_SLIDE_DURATION_SECS};
use crate::assessment::{ExamGenerator, QuizGenerator, DEFAULT_EXAM_QUESTION_COUNT, DEFAULT_QUIZ_QUESTION_COUNT};
use crate::coordinator::{
    BatchArtifactCoordinator, SideFilePolicy, DEFAULT_IMAGE_BATCH_SIZE, DEFAULT_NOTES_FILE,
    DEFAULT_PROMPTS_FILE,
};
use crate::error::{Error, Result};
use crate::projector::{SlideProjector, DEFAULT_MAX_SLIDES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deck size including the title slide.
    pub max_slides: usize,

    /// Images requested per image-generation call.
    pub image_batch_size: usize,

    /// Questions per module quiz.
    pub quiz_question_count: usize,

    /// Questions in the final exam.
    pub exam_question_count: usize,

    /// Seconds a slide is shown when its narration length is unknown.
    pub slide_duration_secs: f64,

    /// Replay saved raw responses instead of calling the text generator.
    pub reuse_side_files: bool,

    pub files: FileNames,
    pub directories: Directories,
    pub commands: Commands,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_slides: DEFAULT_MAX_SLIDES,
            image_batch_size: DEFAULT_IMAGE_BATCH_SIZE,
            quiz_question_count: DEFAULT_QUIZ_QUESTION_COUNT,
            exam_question_count: DEFAULT_EXAM_QUESTION_COUNT,
            slide_duration_secs: DEFAULT_SLIDE_DURATION_SECS,
            reuse_side_files: false,
            files: FileNames::default(),
            directories: Directories::default(),
            commands: Commands::default(),
        }
    }
}

/// Output file names, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNames {
    pub outline: String,
    pub deck: String,
    pub markdown: String,
    pub handbook: String,
    pub prompts: String,
    pub notes: String,
    pub timeline: String,
    pub video: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            outline: "course_outline.txt".to_string(),
            deck: "course_presentation.pptx".to_string(),
            markdown: "course_presentation.md".to_string(),
            handbook: "course_handbook.md".to_string(),
            prompts: DEFAULT_PROMPTS_FILE.to_string(),
            notes: DEFAULT_NOTES_FILE.to_string(),
            timeline: "timeline.json".to_string(),
            video: "course_video.mp4".to_string(),
        }
    }
}

/// Artifact directories, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directories {
    pub images: String,
    pub snapshots: String,
    pub audio: String,
    pub quizzes: String,
    pub exams: String,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            images: "slide_images".to_string(),
            snapshots: "slide_snapshots".to_string(),
            audio: "audio".to_string(),
            quizzes: "quizzes".to_string(),
            exams: "exams".to_string(),
        }
    }
}

/// External command templates. A missing command disables that collaborator.
///
/// Placeholders: `{prompt}` and `{system}` for text, `{prompt}` and
/// `{output}` for images, `{input}` (slide image), `{title}` and `{output}`
/// for snapshots, `{text}` and `{output}` for speech, `{input}` (timeline
/// JSON) and `{output}` for video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commands {
    pub text: Option<String>,
    pub image: Option<String>,
    pub snapshot: Option<String>,
    pub speech: Option<String>,
    pub video: Option<String>,
}

impl PipelineConfig {
    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Load `path` when given, otherwise use the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Projector honouring `max_slides`; one slot goes to the title slide.
    pub fn projector(&self) -> SlideProjector {
        SlideProjector::for_deck_size(self.max_slides)
    }

    /// Side-file policy from `reuse_side_files`.
    pub fn side_file_policy(&self) -> SideFilePolicy {
        if self.reuse_side_files {
            SideFilePolicy::Reuse
        } else {
            SideFilePolicy::Overwrite
        }
    }

    /// Coordinator for one course writing under `output_dir`.
    pub fn coordinator(&self, course_title: &str, output_dir: &Path) -> BatchArtifactCoordinator {
        BatchArtifactCoordinator::new(course_title, output_dir)
            .with_image_dir(output_dir.join(&self.directories.images))
            .with_image_batch_size(self.image_batch_size)
            .with_side_files(
                output_dir.join(&self.files.prompts),
                output_dir.join(&self.files.notes),
            )
            .with_side_file_policy(self.side_file_policy())
    }

    /// Assembler writing under `output_dir`.
    pub fn assembler(&self, output_dir: &Path) -> RenderAssembler {
        RenderAssembler::new(output_dir)
            .with_document_files(&self.files.deck, &self.files.markdown, &self.files.handbook)
            .with_video_files(&self.files.timeline, &self.files.video)
            .with_media_dirs(&self.directories.snapshots, &self.directories.audio)
            .with_slide_duration(self.slide_duration_secs)
    }

    /// Quiz generator writing under `output_dir`.
    pub fn quiz_generator(&self, output_dir: &Path) -> QuizGenerator {
        QuizGenerator::new(output_dir.join(&self.directories.quizzes))
            .with_question_count(self.quiz_question_count)
    }

    /// Exam generator writing under `output_dir`.
    pub fn exam_generator(&self, output_dir: &Path) -> ExamGenerator {
        ExamGenerator::new(output_dir.join(&self.directories.exams))
            .with_question_count(self.exam_question_count)
    }
}
