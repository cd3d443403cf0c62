//! Final assembly of slides and their artifacts into deliverables.
//!
//! The title slide always comes first with index 0, followed by content
//! slides in projection order. Every per-slide file name starts with the
//! same zero-padded prefix so a plain lexicographic sort restores the
//! presentation order.

use crate::coordinator::SlideArtifacts;
use crate::correlate::{ArtifactKind, KeyCorrelator};
use crate::error::Result;
use crate::sanitize::safe_file_stem;
use crate::types::{SlideId, SlideLevel, SlideSpec, StyleTag};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default seconds a slide stays on screen when its narration length is unknown.
pub const DEFAULT_SLIDE_DURATION_SECS: f64 = 1.0;

/// Zero-padded position of a slide in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ArtifactPrefix {
    index: usize,
    width: usize,
}

impl ArtifactPrefix {
    /// Create the prefix of slide `index`, padded to `width` digits.
    pub fn new(index: usize, width: usize) -> Self {
        Self { index, width }
    }

    /// Padding width for a deck of `content_slides` slides plus the title
    /// slide: at least two digits, enough for the largest index.
    pub fn width_for(content_slides: usize) -> usize {
        content_slides.to_string().len().max(2)
    }

    /// Position in the deck; 0 is the title slide.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this is the title slide.
    pub fn is_title(&self) -> bool {
        self.index == 0
    }

    /// Image file name of a content slide.
    pub fn image_name(&self) -> String {
        format!("{}_slide.png", self)
    }

    /// Image file name of the title slide.
    pub fn title_image_name(&self) -> String {
        format!("{}_title_slide.png", self)
    }

    /// Snapshot file name; the title slide has a fixed suffix.
    pub fn snapshot_name(&self, title: &str) -> String {
        if self.is_title() {
            format!("{}_snapshot_title_slide.png", self)
        } else {
            format!("{}_snapshot_{}.png", self, safe_file_stem(title))
        }
    }

    /// Narration audio file name.
    pub fn narration_name(&self) -> String {
        format!("{}_narration.mp3", self)
    }
}

impl fmt::Display for ArtifactPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.index, width = self.width)
    }
}

/// A slide with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSlide {
    pub prefix: ArtifactPrefix,
    pub id: SlideId,
    pub title: String,
    pub bullets: Vec<String>,
    pub level: SlideLevel,
    pub style: StyleTag,

    /// Image on disk, if one was generated.
    pub image: Option<PathBuf>,

    /// Resolved speaker notes.
    pub notes: String,

    /// Whether the notes were synthesized rather than generated.
    pub notes_fallback: bool,
}

/// Ordered slides of one deck, title slide first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckPlan {
    pub course_title: String,
    pub slides: Vec<RenderedSlide>,
}

impl DeckPlan {
    /// Number of slides including the title slide.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the plan has no slides at all.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// The title slide.
    pub fn title_slide(&self) -> Option<&RenderedSlide> {
        self.slides.first().filter(|s| s.level == SlideLevel::Title)
    }

    /// Slides after the title slide.
    pub fn content_slides(&self) -> &[RenderedSlide] {
        match self.title_slide() {
            Some(_) => &self.slides[1..],
            None => &self.slides,
        }
    }
}

/// Writes a presentation file.
pub trait DeckWriter {
    /// Write the whole deck to `path`.
    fn write_deck(&mut self, plan: &DeckPlan, path: &Path) -> Result<()>;
}

/// Renders a still image of one slide.
pub trait SnapshotComposer {
    /// Render `slide` to `target` and return the written path.
    fn compose(&mut self, slide: &RenderedSlide, target: &Path) -> Result<PathBuf>;
}

/// Turns notes into audio and the slide sequence into a video.
pub trait NarrationComposer {
    /// Speak `text` into `target`. Returns the audio length in seconds when known.
    fn synthesize(&mut self, text: &str, target: &Path) -> Result<Option<f64>>;

    /// Mux the timeline into a single video at `target`.
    fn compose_video(&mut self, timeline: &NarrationTimeline, target: &Path) -> Result<()>;
}

/// One slide's slot in the narrated video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSegment {
    pub index: usize,
    pub prefix: String,
    pub title: String,
    pub image: Option<PathBuf>,
    pub audio: Option<PathBuf>,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// Video segments in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NarrationTimeline {
    pub segments: Vec<TimelineSegment>,
    pub total_secs: f64,
}

impl NarrationTimeline {
    /// Append a segment starting where the previous one ended.
    pub fn push(
        &mut self,
        slide: &RenderedSlide,
        image: Option<PathBuf>,
        audio: Option<PathBuf>,
        duration_secs: f64,
    ) {
        self.segments.push(TimelineSegment {
            index: slide.prefix.index(),
            prefix: slide.prefix.to_string(),
            title: slide.title.clone(),
            image,
            audio,
            start_secs: self.total_secs,
            duration_secs,
        });
        self.total_secs += duration_secs;
    }
}

/// Optional renderers used by [`RenderAssembler::assemble`].
#[derive(Default)]
pub struct Renderers<'a> {
    pub deck: Option<&'a mut dyn DeckWriter>,
    pub snapshots: Option<&'a mut dyn SnapshotComposer>,
    pub narration: Option<&'a mut dyn NarrationComposer>,
}

/// What an assembly run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblyReport {
    pub slides: usize,
    pub images_attached: usize,
    pub notes_fallbacks: usize,
    pub deck: Option<PathBuf>,
    pub markdown: Option<PathBuf>,
    pub handbook: Option<PathBuf>,
    pub snapshots_written: usize,
    pub snapshot_failures: usize,
    pub narration_failures: usize,
    pub timeline: Option<PathBuf>,
    pub video: Option<PathBuf>,
}

/// Builds deck plans and drives the renderers.
#[derive(Debug, Clone)]
pub struct RenderAssembler {
    output_dir: PathBuf,
    deck_file: String,
    markdown_file: String,
    handbook_file: String,
    timeline_file: String,
    video_file: String,
    snapshot_dir: String,
    audio_dir: String,
    slide_duration_secs: f64,
}

impl RenderAssembler {
    /// Create an assembler writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            deck_file: "course_presentation.pptx".to_string(),
            markdown_file: "course_presentation.md".to_string(),
            handbook_file: "course_handbook.md".to_string(),
            timeline_file: "timeline.json".to_string(),
            video_file: "course_video.mp4".to_string(),
            snapshot_dir: "slide_snapshots".to_string(),
            audio_dir: "audio".to_string(),
            slide_duration_secs: DEFAULT_SLIDE_DURATION_SECS,
        }
    }

    /// Set the deck, markdown and handbook file names.
    pub fn with_document_files(
        mut self,
        deck: impl Into<String>,
        markdown: impl Into<String>,
        handbook: impl Into<String>,
    ) -> Self {
        self.deck_file = deck.into();
        self.markdown_file = markdown.into();
        self.handbook_file = handbook.into();
        self
    }

    /// Set the timeline and video file names.
    pub fn with_video_files(mut self, timeline: impl Into<String>, video: impl Into<String>) -> Self {
        self.timeline_file = timeline.into();
        self.video_file = video.into();
        self
    }

    /// Set the snapshot and audio directory names.
    pub fn with_media_dirs(mut self, snapshots: impl Into<String>, audio: impl Into<String>) -> Self {
        self.snapshot_dir = snapshots.into();
        self.audio_dir = audio.into();
        self
    }

    /// Set the fallback duration of a slide without known audio length.
    pub fn with_slide_duration(mut self, secs: f64) -> Self {
        self.slide_duration_secs = secs;
        self
    }

    /// Path of the deck file.
    pub fn deck_path(&self) -> PathBuf {
        self.output_dir.join(&self.deck_file)
    }

    /// Resolve every slide's notes and image into a plan.
    ///
    /// Images that are missing on disk are dropped; the slide is rendered
    /// without one.
    pub fn plan(&self, course_title: &str, slides: &[SlideSpec], artifacts: &SlideArtifacts) -> DeckPlan {
        let notes = KeyCorrelator::new(course_title, ArtifactKind::SpeakerNotes);
        let width = ArtifactPrefix::width_for(slides.len());

        let title_notes = notes.resolve_title_slide(&artifacts.notes);
        let title_id = SlideId::title();
        let mut rendered = vec![RenderedSlide {
            prefix: ArtifactPrefix::new(0, width),
            image: existing_image(artifacts.images.get(&title_id), course_title),
            id: title_id,
            title: course_title.to_string(),
            bullets: Vec::new(),
            level: SlideLevel::Title,
            style: StyleTag::CourseTitle,
            notes_fallback: title_notes.is_fallback(),
            notes: title_notes.into_text(),
        }];

        for (i, slide) in slides.iter().enumerate() {
            let resolution = notes.resolve(slide, &artifacts.notes);
            let image = artifacts
                .images
                .get(&slide.id)
                .or_else(|| artifacts.images.get_by_title(&slide.title));

            rendered.push(RenderedSlide {
                prefix: ArtifactPrefix::new(i + 1, width),
                id: slide.id.clone(),
                title: slide.title.clone(),
                bullets: slide.content.clone(),
                level: slide.level,
                style: slide.style,
                image: existing_image(image, &slide.title),
                notes_fallback: resolution.is_fallback(),
                notes: resolution.into_text(),
            });
        }

        DeckPlan {
            course_title: course_title.to_string(),
            slides: rendered,
        }
    }

    /// Produce every deliverable. A failing deliverable is logged and
    /// skipped; the others are still produced.
    pub fn assemble(&self, plan: &DeckPlan, renderers: Renderers<'_>) -> AssemblyReport {
        let mut report = AssemblyReport {
            slides: plan.len(),
            images_attached: plan.slides.iter().filter(|s| s.image.is_some()).count(),
            notes_fallbacks: plan.slides.iter().filter(|s| s.notes_fallback).count(),
            ..Default::default()
        };

        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            log::error!("Could not create {}: {}", self.output_dir.display(), e);
        }

        if let Some(writer) = renderers.deck {
            let path = self.deck_path();
            match writer.write_deck(plan, &path) {
                Ok(()) => {
                    log::info!("Wrote deck to {}", path.display());
                    report.deck = Some(path);
                }
                Err(e) => log::error!("Could not write deck: {}", e),
            }
        }

        let markdown_path = self.output_dir.join(&self.markdown_file);
        report.markdown = self.write_text(&markdown_path, &render_markdown(plan, &self.output_dir));

        let handbook_path = self.output_dir.join(&self.handbook_file);
        report.handbook = self.write_text(&handbook_path, &render_handbook(plan));

        let snapshots = match renderers.snapshots {
            Some(composer) => self.compose_snapshots(plan, composer, &mut report),
            None => vec![None; plan.len()],
        };

        let timeline = match renderers.narration {
            Some(composer) => {
                let timeline = self.narrate(plan, &snapshots, composer, &mut report);
                let video = self.output_dir.join(&self.video_file);
                match composer.compose_video(&timeline, &video) {
                    Ok(()) => {
                        log::info!("Wrote video to {}", video.display());
                        report.video = Some(video);
                    }
                    Err(e) => log::error!("Could not compose video: {}", e),
                }
                timeline
            }
            None => self.silent_timeline(plan, &snapshots),
        };

        let timeline_path = self.output_dir.join(&self.timeline_file);
        report.timeline = match serde_json::to_string_pretty(&timeline) {
            Ok(json) => self.write_text(&timeline_path, &json),
            Err(e) => {
                log::error!("Could not serialize timeline: {}", e);
                None
            }
        };

        log::info!(
            "Assembled {} slides ({} with images, {} with fallback notes)",
            report.slides,
            report.images_attached,
            report.notes_fallbacks
        );

        report
    }

    fn compose_snapshots(
        &self,
        plan: &DeckPlan,
        composer: &mut dyn SnapshotComposer,
        report: &mut AssemblyReport,
    ) -> Vec<Option<PathBuf>> {
        let dir = self.output_dir.join(&self.snapshot_dir);
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("Could not create {}: {}", dir.display(), e);
        }

        plan.slides
            .iter()
            .map(|slide| {
                let target = dir.join(slide.prefix.snapshot_name(&slide.title));
                match composer.compose(slide, &target) {
                    Ok(path) => {
                        report.snapshots_written += 1;
                        Some(path)
                    }
                    Err(e) => {
                        log::warn!("Snapshot of '{}' failed: {}", slide.title, e);
                        report.snapshot_failures += 1;
                        None
                    }
                }
            })
            .collect()
    }

    fn narrate(
        &self,
        plan: &DeckPlan,
        snapshots: &[Option<PathBuf>],
        composer: &mut dyn NarrationComposer,
        report: &mut AssemblyReport,
    ) -> NarrationTimeline {
        let dir = self.output_dir.join(&self.audio_dir);
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("Could not create {}: {}", dir.display(), e);
        }

        let mut timeline = NarrationTimeline::default();
        for (slide, snapshot) in plan.slides.iter().zip(snapshots) {
            let target = dir.join(slide.prefix.narration_name());
            let (audio, duration) = match composer.synthesize(&slide.notes, &target) {
                Ok(duration) => (Some(target), duration.unwrap_or(self.slide_duration_secs)),
                Err(e) => {
                    log::warn!("Narration of '{}' failed: {}", slide.title, e);
                    report.narration_failures += 1;
                    (None, self.slide_duration_secs)
                }
            };
            let image = snapshot.clone().or_else(|| slide.image.clone());
            timeline.push(slide, image, audio, duration);
        }
        timeline
    }

    fn silent_timeline(&self, plan: &DeckPlan, snapshots: &[Option<PathBuf>]) -> NarrationTimeline {
        let mut timeline = NarrationTimeline::default();
        for (slide, snapshot) in plan.slides.iter().zip(snapshots) {
            let image = snapshot.clone().or_else(|| slide.image.clone());
            timeline.push(slide, image, None, self.slide_duration_secs);
        }
        timeline
    }

    fn write_text(&self, path: &Path, content: &str) -> Option<PathBuf> {
        match fs::write(path, content) {
            Ok(()) => {
                log::info!("Wrote {}", path.display());
                Some(path.to_path_buf())
            }
            Err(e) => {
                log::error!("Could not write {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn existing_image(path: Option<&Path>, title: &str) -> Option<PathBuf> {
    let path = path?;
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        log::warn!(
            "Image {} for '{}' is missing, rendering without it",
            path.display(),
            title
        );
        None
    }
}

/// Path of `path` relative to `base`, with forward slashes.
fn relative_link(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Markdown version of the deck. Image links are relative to `base_dir`.
pub fn render_markdown(plan: &DeckPlan, base_dir: &Path) -> String {
    let mut md = format!("# Title: {}\n\n", plan.course_title);

    for slide in &plan.slides {
        let heading = match slide.level {
            SlideLevel::Title => None,
            SlideLevel::Module => Some("##"),
            SlideLevel::Topic => Some("###"),
            SlideLevel::Subtopic => Some("####"),
        };
        if let Some(hashes) = heading {
            md.push_str(&format!("{} {}\n\n", hashes, slide.title));
        }

        if let Some(image) = &slide.image {
            md.push_str(&format!("![{}]({})\n\n", slide.title, relative_link(image, base_dir)));
        }

        // Module and topic bullets repeat the headings that follow them.
        if slide.level == SlideLevel::Subtopic && !slide.bullets.is_empty() {
            for point in &slide.bullets {
                md.push_str(&format!("- {}\n", point));
            }
            md.push('\n');
        }
    }

    md
}

/// Student handbook: every slide's title followed by its notes.
pub fn render_handbook(plan: &DeckPlan) -> String {
    let mut md = format!("# {}: Student Handbook\n\n", plan.course_title);

    for slide in &plan.slides {
        let hashes = match slide.level {
            SlideLevel::Title | SlideLevel::Module => "##",
            SlideLevel::Topic => "###",
            SlideLevel::Subtopic => "####",
        };
        md.push_str(&format!("{} {}\n\n{}\n\n", hashes, slide.title, slide.notes.trim()));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::ArtifactMap;
    use crate::error::Error;
    use crate::outline::parse;
    use crate::projector::SlideProjector;
    use tempfile::TempDir;

    const OUTLINE: &str = "AI 101\n1. Security\n1.1 Basics\n1.1.1 Intro\n1.1.1.1 Point A\n1.1.1.2 Point B";

    fn slides() -> Vec<SlideSpec> {
        SlideProjector::new(10).project(&parse(OUTLINE).unwrap())
    }

    struct RecordingDeck {
        slides: usize,
    }

    impl DeckWriter for RecordingDeck {
        fn write_deck(&mut self, plan: &DeckPlan, path: &Path) -> Result<()> {
            self.slides = plan.len();
            fs::write(path, b"deck")?;
            Ok(())
        }
    }

    struct FailingSnapshots;

    impl SnapshotComposer for FailingSnapshots {
        fn compose(&mut self, _slide: &RenderedSlide, _target: &Path) -> Result<PathBuf> {
            Err(Error::collaborator("no renderer"))
        }
    }

    struct FixedNarration {
        videos: usize,
    }

    impl NarrationComposer for FixedNarration {
        fn synthesize(&mut self, text: &str, target: &Path) -> Result<Option<f64>> {
            if text.contains("Intro") {
                return Err(Error::collaborator("tts down"));
            }
            fs::write(target, b"mp3")?;
            Ok(Some(2.5))
        }

        fn compose_video(&mut self, _timeline: &NarrationTimeline, target: &Path) -> Result<()> {
            self.videos += 1;
            fs::write(target, b"mp4")?;
            Ok(())
        }
    }

    #[test]
    fn test_prefix_width() {
        assert_eq!(ArtifactPrefix::width_for(0), 2);
        assert_eq!(ArtifactPrefix::width_for(49), 2);
        assert_eq!(ArtifactPrefix::width_for(99), 2);
        assert_eq!(ArtifactPrefix::width_for(100), 3);
    }

    #[test]
    fn test_prefix_names() {
        let title = ArtifactPrefix::new(0, 2);
        assert_eq!(title.to_string(), "00");
        assert_eq!(title.title_image_name(), "00_title_slide.png");
        assert_eq!(title.snapshot_name("AI 101"), "00_snapshot_title_slide.png");

        let slide = ArtifactPrefix::new(7, 2);
        assert_eq!(slide.image_name(), "07_slide.png");
        assert_eq!(slide.snapshot_name("1.2: Basics"), "07_snapshot_1_2__Basics.png");
        assert_eq!(slide.narration_name(), "07_narration.mp3");
    }

    #[test]
    fn test_prefixes_sort_in_presentation_order() {
        let width = ArtifactPrefix::width_for(120);
        let mut names: Vec<String> = (0..=120)
            .map(|i| ArtifactPrefix::new(i, width).narration_name())
            .collect();
        let expected = names.clone();
        names.sort();

        assert_eq!(names, expected);
        assert_eq!(names[0], "000_narration.mp3");
    }

    #[test]
    fn test_plan_puts_title_first() {
        let assembler = RenderAssembler::new("out");
        let plan = assembler.plan("AI 101", &slides(), &SlideArtifacts::default());

        assert_eq!(plan.len(), 4);
        let title = plan.title_slide().unwrap();
        assert_eq!(title.title, "AI 101");
        assert_eq!(title.prefix.to_string(), "00");
        assert_eq!(title.style, StyleTag::CourseTitle);
        assert_eq!(plan.content_slides().len(), 3);
        assert_eq!(plan.slides[3].title, "Intro");
        assert_eq!(plan.slides[3].prefix.to_string(), "03");
        assert_eq!(plan.slides[3].bullets, vec!["Point A", "Point B"]);
    }

    #[test]
    fn test_plan_resolves_notes_with_fallbacks() {
        let mut artifacts = SlideArtifacts::default();
        artifacts.notes = [("Course: AI 101", "Welcome"), ("Intro", "Intro notes")]
            .into_iter()
            .collect::<ArtifactMap>();

        let plan = RenderAssembler::new("out").plan("AI 101", &slides(), &artifacts);

        assert_eq!(plan.slides[0].notes, "Welcome");
        assert!(!plan.slides[0].notes_fallback);
        assert_eq!(plan.slides[3].notes, "Intro notes");
        assert!(plan.slides[1].notes_fallback);
        assert!(plan.slides[1].notes.starts_with("Module: Security."));
    }

    #[test]
    fn test_plan_drops_missing_images() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("01_slide.png");
        fs::write(&present, b"png").unwrap();

        let slides = slides();
        let mut artifacts = SlideArtifacts::default();
        artifacts
            .images
            .insert(slides[0].id.clone(), slides[0].title.clone(), present.clone());
        artifacts.images.insert(
            slides[1].id.clone(),
            slides[1].title.clone(),
            dir.path().join("02_slide.png"),
        );

        let plan = RenderAssembler::new(dir.path()).plan("AI 101", &slides, &artifacts);

        assert_eq!(plan.slides[1].image.as_deref(), Some(present.as_path()));
        assert_eq!(plan.slides[2].image, None);
    }

    #[test]
    fn test_render_markdown() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("slide_images").join("03_slide.png");
        fs::create_dir_all(image.parent().unwrap()).unwrap();
        fs::write(&image, b"png").unwrap();

        let slides = slides();
        let mut artifacts = SlideArtifacts::default();
        artifacts
            .images
            .insert(slides[2].id.clone(), slides[2].title.clone(), image);

        let plan = RenderAssembler::new(dir.path()).plan("AI 101", &slides, &artifacts);
        let md = render_markdown(&plan, dir.path());

        assert!(md.starts_with("# Title: AI 101\n\n## Module 1: Security\n\n### 1.1: Basics\n\n"));
        assert!(md.contains("#### Intro\n\n![Intro](slide_images/03_slide.png)\n\n- Point A\n- Point B\n"));
        assert!(!md.contains("- Basics"));
    }

    #[test]
    fn test_render_handbook() {
        let plan = RenderAssembler::new("out").plan("AI 101", &slides(), &SlideArtifacts::default());
        let md = render_handbook(&plan);

        assert!(md.starts_with("# AI 101: Student Handbook\n\n## AI 101\n\nWelcome to the course: AI 101."));
        assert!(md.contains("#### Intro\n\nDiscuss the key points on this slide about Intro.\n\n"));
    }

    #[test]
    fn test_assemble_isolates_failures() {
        let dir = TempDir::new().unwrap();
        let assembler = RenderAssembler::new(dir.path()).with_slide_duration(1.5);
        let plan = assembler.plan("AI 101", &slides(), &SlideArtifacts::default());

        let mut deck = RecordingDeck { slides: 0 };
        let mut snapshots = FailingSnapshots;
        let mut narration = FixedNarration { videos: 0 };
        let report = assembler.assemble(
            &plan,
            Renderers {
                deck: Some(&mut deck),
                snapshots: Some(&mut snapshots),
                narration: Some(&mut narration),
            },
        );

        assert_eq!(deck.slides, 4);
        assert_eq!(narration.videos, 1);
        assert_eq!(report.slides, 4);
        assert_eq!(report.snapshot_failures, 4);
        assert_eq!(report.narration_failures, 1);
        assert!(report.deck.is_some());
        assert!(report.markdown.is_some());
        assert!(report.handbook.is_some());
        assert!(report.video.is_some());
        assert!(dir.path().join("audio").join("00_narration.mp3").exists());

        let timeline: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("timeline.json")).unwrap())
                .unwrap();
        let segments = timeline["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0]["prefix"], "00");
        assert_eq!(segments[3]["duration_secs"], 1.5);
        assert!(segments[3]["audio"].is_null());
        assert_eq!(timeline["total_secs"], 9.0);
    }

    #[test]
    fn test_assemble_without_renderers_writes_documents() {
        let dir = TempDir::new().unwrap();
        let assembler = RenderAssembler::new(dir.path());
        let plan = assembler.plan("AI 101", &slides(), &SlideArtifacts::default());

        let report = assembler.assemble(&plan, Renderers::default());

        assert!(report.deck.is_none());
        assert!(report.video.is_none());
        assert!(dir.path().join("course_presentation.md").exists());
        assert!(dir.path().join("course_handbook.md").exists());
        assert!(dir.path().join("timeline.json").exists());
    }
}
