//! Batched generation of per-slide artifacts.
//!
//! One text call produces every image prompt and one produces every set of
//! speaker notes; images are then requested in fixed-size chunks. Nothing in
//! here fails a run: unusable responses degrade to templated fallbacks and
//! failed image chunks leave their slides without a picture.

use crate::assemble::ArtifactPrefix;
use crate::correlate::{ArtifactKind, ArtifactMap, KeyCorrelator};
use crate::error::Result;
use crate::extract::parse_artifact_map;
use crate::types::{SlideId, SlideLevel, SlideSpec};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of images requested per call.
pub const DEFAULT_IMAGE_BATCH_SIZE: usize = 25;

/// Default side file for the raw image-prompt response.
pub const DEFAULT_PROMPTS_FILE: &str = "06_Enhanced_Prompts.txt";

/// Default side file for the raw speaker-notes response.
pub const DEFAULT_NOTES_FILE: &str = "06_Enhanced_Notes.txt";

/// System prompt for the image-prompt batch.
pub const PROMPTS_SYSTEM_PROMPT: &str = r#"You write prompts for an AI image generator used to illustrate presentation slides.

You will receive a JSON list of slides, each with an id, a title, its bullet content and its type.
Write one short prompt per slide that would produce an image capturing the slide's idea.

Each prompt must:
- suit a professional business presentation
- ask for no text in the image
- lean towards technology and education imagery
- favour a clean, modern look

Answer with a single JSON object mapping each slide title, exactly as given, to its prompt:
{"slide title": "prompt"}

Return only the JSON object."#;

/// System prompt for the speaker-notes batch.
pub const NOTES_SYSTEM_PROMPT: &str = r#"You write speaker notes for technical training courses.

You will receive a JSON list of slides, each with an id, a title, its bullet content and its type.
Write notes for every slide so an instructor can present it and a student can study from it.

- For the slide of type "title", write a warm welcome and a short overview of the whole course.
- For slides of type "module", introduce the module, why it matters and what will be learned.
- For every other slide, explain the content in a couple of paragraphs.

Every slide needs notes, including the title slide and module slides.

Answer with a single JSON object mapping each slide title, exactly as given, to its notes:
{"slide title": "notes"}

Return only the JSON object."#;

/// Produces text from a user prompt and a system prompt.
pub trait TextGenerator {
    /// Run one generation call.
    fn generate(&mut self, user_prompt: &str, system_prompt: &str) -> Result<String>;
}

/// One image to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Deck position; 0 is the title slide.
    pub index: usize,

    /// Slide the image belongs to.
    pub id: SlideId,

    /// Display title of that slide.
    pub title: String,

    /// Image prompt.
    pub prompt: String,

    /// Where the image should be written.
    pub target: PathBuf,
}

/// Produces image files for a batch of prompts.
///
/// Results are expected in request order and may be shorter than the
/// request list when some images fail.
pub trait ImageGenerator {
    /// Generate one chunk of images.
    fn generate_batch(&mut self, requests: &[ImageRequest]) -> Result<Vec<PathBuf>>;
}

/// What to do with an existing raw-response side file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SideFilePolicy {
    /// Always call the generator and overwrite the file.
    #[default]
    Overwrite,
    /// Replay an existing file instead of calling the generator.
    Reuse,
}

/// One slide as sent in a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl BatchEntry {
    /// Batch entry for a projected slide.
    pub fn from_slide(slide: &SlideSpec) -> Self {
        Self {
            id: slide.id.to_string(),
            title: slide.title.clone(),
            content: slide.content_text(),
            kind: slide.level.as_str().to_string(),
        }
    }
}

/// Image paths keyed by slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMap {
    by_id: HashMap<SlideId, PathBuf>,
    by_title: HashMap<String, PathBuf>,
}

impl ImageMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the image of a slide.
    pub fn insert(&mut self, id: SlideId, title: impl Into<String>, path: PathBuf) {
        self.by_title.insert(title.into(), path.clone());
        self.by_id.insert(id, path);
    }

    /// Image of a slide by identifier.
    pub fn get(&self, id: &SlideId) -> Option<&Path> {
        self.by_id.get(id).map(PathBuf::as_path)
    }

    /// Image of a slide by display title. With duplicate titles the last
    /// bound slide wins.
    pub fn get_by_title(&self, title: &str) -> Option<&Path> {
        self.by_title.get(title).map(PathBuf::as_path)
    }

    /// Number of slides with an image.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no slide has an image.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Everything generated for a slide sequence.
#[derive(Debug, Clone, Default)]
pub struct SlideArtifacts {
    pub prompts: ArtifactMap,
    pub notes: ArtifactMap,
    pub images: ImageMap,
}

/// Drives the batched text and image calls for one course.
#[derive(Debug, Clone)]
pub struct BatchArtifactCoordinator {
    course_title: String,
    image_dir: PathBuf,
    image_batch_size: usize,
    prompts_file: PathBuf,
    notes_file: PathBuf,
    side_file_policy: SideFilePolicy,
}

impl BatchArtifactCoordinator {
    /// Create a coordinator writing side files and images under `output_dir`.
    pub fn new(course_title: impl Into<String>, output_dir: &Path) -> Self {
        Self {
            course_title: course_title.into(),
            image_dir: output_dir.join("slide_images"),
            image_batch_size: DEFAULT_IMAGE_BATCH_SIZE,
            prompts_file: output_dir.join(DEFAULT_PROMPTS_FILE),
            notes_file: output_dir.join(DEFAULT_NOTES_FILE),
            side_file_policy: SideFilePolicy::default(),
        }
    }

    /// Set the image directory.
    pub fn with_image_dir(mut self, dir: PathBuf) -> Self {
        self.image_dir = dir;
        self
    }

    /// Set the number of images per call. Zero is treated as one.
    pub fn with_image_batch_size(mut self, size: usize) -> Self {
        self.image_batch_size = size.max(1);
        self
    }

    /// Set the raw-response side files.
    pub fn with_side_files(mut self, prompts: PathBuf, notes: PathBuf) -> Self {
        self.prompts_file = prompts;
        self.notes_file = notes;
        self
    }

    /// Set the side-file policy.
    pub fn with_side_file_policy(mut self, policy: SideFilePolicy) -> Self {
        self.side_file_policy = policy;
        self
    }

    /// The course title.
    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    /// Key of the title-slide entry in the notes batch.
    pub fn title_slide_key(&self) -> String {
        format!("Course: {}", self.course_title)
    }

    /// Run the prompt, notes and image stages.
    pub fn run(
        &self,
        slides: &[SlideSpec],
        text: &mut dyn TextGenerator,
        images: &mut dyn ImageGenerator,
    ) -> SlideArtifacts {
        let prompts = self.generate_prompts(slides, text);
        let notes = self.generate_notes(slides, text);
        let images = self.generate_images(slides, &prompts, images);

        log::info!(
            "Generated {} prompts, {} notes and {} images for {} slides",
            prompts.len(),
            notes.len(),
            images.len(),
            slides.len()
        );

        SlideArtifacts {
            prompts,
            notes,
            images,
        }
    }

    /// Batch payload for the image-prompt call.
    pub fn prompt_payload(&self, slides: &[SlideSpec]) -> Vec<BatchEntry> {
        slides.iter().map(BatchEntry::from_slide).collect()
    }

    /// Batch payload for the notes call: a title-slide entry, then every slide.
    pub fn notes_payload(&self, slides: &[SlideSpec]) -> Vec<BatchEntry> {
        let overview = slides
            .iter()
            .filter(|s| s.level == SlideLevel::Module)
            .map(|s| s.title.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut payload = vec![BatchEntry {
            id: SlideId::title().to_string(),
            title: self.title_slide_key(),
            content: overview,
            kind: SlideLevel::Title.as_str().to_string(),
        }];
        payload.extend(slides.iter().map(BatchEntry::from_slide));
        payload
    }

    /// Generate image prompts with a single text call.
    pub fn generate_prompts(&self, slides: &[SlideSpec], text: &mut dyn TextGenerator) -> ArtifactMap {
        let payload = self.prompt_payload(slides);
        let user_prompt = format!(
            "Write one image prompt for each of these presentation slides:\n{}",
            to_pretty_json(&payload)
        );

        let correlator = KeyCorrelator::new(&self.course_title, ArtifactKind::ImagePrompt);
        self.batch_call(
            "image prompts",
            &user_prompt,
            PROMPTS_SYSTEM_PROMPT,
            &self.prompts_file,
            text,
        )
        .unwrap_or_else(|| {
            slides
                .iter()
                .map(|s| (s.title.clone(), correlator.fallback(s.level, &s.title)))
                .collect()
        })
    }

    /// Generate speaker notes with a single text call.
    pub fn generate_notes(&self, slides: &[SlideSpec], text: &mut dyn TextGenerator) -> ArtifactMap {
        let payload = self.notes_payload(slides);
        let user_prompt = format!(
            "Write speaker notes for each slide of the course \"{}\":\n{}",
            self.course_title,
            to_pretty_json(&payload)
        );

        let correlator = KeyCorrelator::new(&self.course_title, ArtifactKind::SpeakerNotes);
        self.batch_call(
            "speaker notes",
            &user_prompt,
            NOTES_SYSTEM_PROMPT,
            &self.notes_file,
            text,
        )
        .unwrap_or_else(|| {
            let mut map = ArtifactMap::new();
            map.insert(
                self.title_slide_key(),
                correlator.fallback(SlideLevel::Title, &self.course_title),
            );
            for slide in slides {
                map.insert(slide.title.clone(), correlator.fallback(slide.level, &slide.title));
            }
            map
        })
    }

    /// One batched text call: obtain the response, persist it, then parse it.
    /// `None` means the caller should fall back.
    fn batch_call(
        &self,
        label: &str,
        user_prompt: &str,
        system_prompt: &str,
        side_file: &Path,
        text: &mut dyn TextGenerator,
    ) -> Option<ArtifactMap> {
        let response = match self.replay(side_file) {
            Some(saved) => saved,
            None => {
                log::info!("Requesting {} in one batch", label);
                match text.generate(user_prompt, system_prompt) {
                    Ok(response) => {
                        persist_side_file(side_file, &response);
                        response
                    }
                    Err(e) => {
                        log::error!("Text generation for {} failed: {}", label, e);
                        return None;
                    }
                }
            }
        };

        match parse_artifact_map(&response) {
            Some(map) => {
                log::info!("Parsed {} {} entries", map.len(), label);
                Some(map)
            }
            None => {
                log::warn!(
                    "Could not parse {} response (raw text kept in {}), using fallbacks",
                    label,
                    side_file.display()
                );
                None
            }
        }
    }

    fn replay(&self, side_file: &Path) -> Option<String> {
        if self.side_file_policy != SideFilePolicy::Reuse {
            return None;
        }
        match fs::read_to_string(side_file) {
            Ok(saved) => {
                log::info!("Reusing saved response from {}", side_file.display());
                Some(saved)
            }
            Err(e) => {
                log::debug!("No reusable response at {}: {}", side_file.display(), e);
                None
            }
        }
    }

    /// Image requests for the title slide and every content slide, in deck order.
    pub fn image_requests(&self, slides: &[SlideSpec], prompts: &ArtifactMap) -> Vec<ImageRequest> {
        let correlator = KeyCorrelator::new(&self.course_title, ArtifactKind::ImagePrompt);
        let width = ArtifactPrefix::width_for(slides.len());

        let title_prefix = ArtifactPrefix::new(0, width);
        let mut requests = vec![ImageRequest {
            index: 0,
            id: SlideId::title(),
            title: self.course_title.clone(),
            prompt: correlator.resolve_title_slide(prompts).into_text(),
            target: self.image_dir.join(title_prefix.title_image_name()),
        }];

        for (i, slide) in slides.iter().enumerate() {
            let prefix = ArtifactPrefix::new(i + 1, width);
            requests.push(ImageRequest {
                index: i + 1,
                id: slide.id.clone(),
                title: slide.title.clone(),
                prompt: correlator.resolve(slide, prompts).into_text(),
                target: self.image_dir.join(prefix.image_name()),
            });
        }

        requests
    }

    /// Generate images chunk by chunk and bind the results to slides.
    pub fn generate_images(
        &self,
        slides: &[SlideSpec],
        prompts: &ArtifactMap,
        generator: &mut dyn ImageGenerator,
    ) -> ImageMap {
        let mut images = ImageMap::new();

        if let Err(e) = fs::create_dir_all(&self.image_dir) {
            log::warn!("Could not create image directory {}: {}", self.image_dir.display(), e);
        }

        let requests = self.image_requests(slides, prompts);
        let chunks = requests.chunks(self.image_batch_size);
        let chunk_count = chunks.len();

        for (n, chunk) in chunks.enumerate() {
            log::info!(
                "Requesting image batch {}/{} ({} images)",
                n + 1,
                chunk_count,
                chunk.len()
            );
            match generator.generate_batch(chunk) {
                Ok(results) => {
                    for (request, path) in bind_results(chunk, results) {
                        images.insert(request.id.clone(), request.title.clone(), path);
                    }
                }
                Err(e) => log::error!("Image batch {}/{} failed: {}", n + 1, chunk_count, e),
            }
        }

        images
    }
}

/// Pair returned paths with the requests that produced them.
///
/// A result equal to a requested target binds to that request. Remaining
/// results bind by position to the request at the same index, unless that
/// request is already bound.
pub fn bind_results(requests: &[ImageRequest], results: Vec<PathBuf>) -> Vec<(&ImageRequest, PathBuf)> {
    if results.len() < requests.len() {
        log::warn!(
            "Image batch returned {} of {} images",
            results.len(),
            requests.len()
        );
    }

    let mut bound: Vec<Option<PathBuf>> = vec![None; requests.len()];
    let mut leftovers = Vec::new();

    for (position, path) in results.into_iter().enumerate() {
        match requests.iter().position(|r| r.target == path) {
            Some(i) if bound[i].is_none() => bound[i] = Some(path),
            _ => leftovers.push((position, path)),
        }
    }

    for (position, path) in leftovers {
        match bound.get_mut(position) {
            Some(slot) if slot.is_none() => *slot = Some(path),
            _ => log::warn!("Dropping unmatched image result {}", path.display()),
        }
    }

    requests
        .iter()
        .zip(bound)
        .filter_map(|(request, path)| match path {
            Some(path) => Some((request, path)),
            None => {
                log::debug!("No image for slide '{}'", request.title);
                None
            }
        })
        .collect()
}

fn to_pretty_json(payload: &[BatchEntry]) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        log::warn!("Could not serialize batch payload: {}", e);
        String::from("[]")
    })
}

fn persist_side_file(path: &Path, response: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("Could not create {}: {}", parent.display(), e);
        }
    }
    match fs::write(path, response) {
        Ok(()) => log::debug!("Saved raw response to {}", path.display()),
        Err(e) => log::warn!("Could not save raw response to {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::outline::parse;
    use crate::projector::SlideProjector;
    use tempfile::TempDir;

    const OUTLINE: &str = "AI 101\n1. Security\n1.1 Basics\n1.1.1 Intro\n1.1.1.1 Point A\n1.1.1.2 Point B";

    fn slides() -> Vec<SlideSpec> {
        SlideProjector::new(10).project(&parse(OUTLINE).unwrap())
    }

    /// Replays canned responses and records every call.
    struct ScriptedText {
        responses: Vec<Result<String>>,
        calls: Vec<(String, String)>,
    }

    impl ScriptedText {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses,
                calls: Vec::new(),
            }
        }
    }

    impl TextGenerator for ScriptedText {
        fn generate(&mut self, user_prompt: &str, system_prompt: &str) -> Result<String> {
            self.calls.push((user_prompt.to_string(), system_prompt.to_string()));
            if self.responses.is_empty() {
                return Err(Error::collaborator("no more responses"));
            }
            self.responses.remove(0)
        }
    }

    /// Returns each chunk's targets transformed by `shape`.
    struct FakeImages<F: FnMut(&[ImageRequest]) -> Result<Vec<PathBuf>>> {
        shape: F,
        batches: Vec<usize>,
    }

    impl<F: FnMut(&[ImageRequest]) -> Result<Vec<PathBuf>>> ImageGenerator for FakeImages<F> {
        fn generate_batch(&mut self, requests: &[ImageRequest]) -> Result<Vec<PathBuf>> {
            self.batches.push(requests.len());
            (self.shape)(requests)
        }
    }

    fn fake_images<F: FnMut(&[ImageRequest]) -> Result<Vec<PathBuf>>>(shape: F) -> FakeImages<F> {
        FakeImages {
            shape,
            batches: Vec::new(),
        }
    }

    fn request(index: usize, target: &str) -> ImageRequest {
        ImageRequest {
            index,
            id: SlideId::title(),
            title: format!("slide {}", index),
            prompt: String::new(),
            target: PathBuf::from(target),
        }
    }

    #[test]
    fn test_prompt_payload_shape() {
        let dir = TempDir::new().unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path());
        let payload = serde_json::to_value(coordinator.prompt_payload(&slides())).unwrap();

        assert_eq!(payload.as_array().unwrap().len(), 3);
        assert_eq!(payload[0]["id"], "module:1");
        assert_eq!(payload[0]["title"], "Module 1: Security");
        assert_eq!(payload[0]["type"], "module");
        assert_eq!(payload[2]["content"], "Point A\nPoint B");
    }

    #[test]
    fn test_notes_payload_starts_with_course_entry() {
        let dir = TempDir::new().unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path());
        let payload = coordinator.notes_payload(&slides());

        assert_eq!(payload.len(), 4);
        assert_eq!(payload[0].title, "Course: AI 101");
        assert_eq!(payload[0].kind, "title");
        assert_eq!(payload[0].content, "Module 1: Security");
    }

    #[test]
    fn test_single_call_per_channel_and_side_files() {
        let dir = TempDir::new().unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path());
        let prompts = "```json\n{\"Intro\": \"A door opening\"}\n```";
        let mut text = ScriptedText::new(vec![
            Ok(prompts.to_string()),
            Ok("{\"Course: AI 101\": \"Welcome!\"}".to_string()),
        ]);

        let slides = slides();
        let prompt_map = coordinator.generate_prompts(&slides, &mut text);
        let notes_map = coordinator.generate_notes(&slides, &mut text);

        assert_eq!(text.calls.len(), 2);
        assert_eq!(text.calls[0].1, PROMPTS_SYSTEM_PROMPT);
        assert_eq!(text.calls[1].1, NOTES_SYSTEM_PROMPT);
        assert_eq!(prompt_map.get("Intro"), Some("A door opening"));
        assert_eq!(notes_map.get("Course: AI 101"), Some("Welcome!"));

        let saved = fs::read_to_string(dir.path().join(DEFAULT_PROMPTS_FILE)).unwrap();
        assert_eq!(saved, prompts);
    }

    #[test]
    fn test_unparseable_response_is_saved_and_falls_back() {
        let dir = TempDir::new().unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path());
        let mut text = ScriptedText::new(vec![Ok("Sorry, I can't help with that.".to_string())]);

        let map = coordinator.generate_notes(&slides(), &mut text);

        let saved = fs::read_to_string(dir.path().join(DEFAULT_NOTES_FILE)).unwrap();
        assert_eq!(saved, "Sorry, I can't help with that.");
        assert_eq!(map.len(), 4);
        assert!(map
            .get("Course: AI 101")
            .unwrap()
            .starts_with("Welcome to the course: AI 101."));
        assert_eq!(
            map.get("Intro"),
            Some("Discuss the key points on this slide about Intro.")
        );
    }

    #[test]
    fn test_failed_call_falls_back_per_slide() {
        let dir = TempDir::new().unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path());
        let mut text = ScriptedText::new(vec![Err(Error::collaborator("offline"))]);

        let map = coordinator.generate_prompts(&slides(), &mut text);

        assert_eq!(map.len(), 3);
        assert!(map
            .get("1.1: Basics")
            .unwrap()
            .starts_with("Create a professional image representing 1.1: Basics."));
        assert!(!dir.path().join(DEFAULT_PROMPTS_FILE).exists());
    }

    #[test]
    fn test_reuse_policy_replays_side_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_PROMPTS_FILE), "{\"Intro\": \"saved\"}").unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path())
            .with_side_file_policy(SideFilePolicy::Reuse);
        let mut text = ScriptedText::new(Vec::new());

        let map = coordinator.generate_prompts(&slides(), &mut text);

        assert!(text.calls.is_empty());
        assert_eq!(map.get("Intro"), Some("saved"));
    }

    #[test]
    fn test_image_requests_use_shared_prefixes() {
        let dir = TempDir::new().unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path());
        let prompts: ArtifactMap = [("Intro", "A door")].into_iter().collect();
        let requests = coordinator.image_requests(&slides(), &prompts);

        let names: Vec<_> = requests
            .iter()
            .map(|r| r.target.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["00_title_slide.png", "01_slide.png", "02_slide.png", "03_slide.png"]
        );
        assert_eq!(requests[3].prompt, "A door");
        assert!(requests[1].prompt.starts_with("Create a professional image representing"));
        assert!(requests[2].prompt.starts_with("Create a professional image representing"));
        assert_eq!(requests[0].id, SlideId::title());
    }

    #[test]
    fn test_images_are_chunked() {
        let dir = TempDir::new().unwrap();
        let coordinator =
            BatchArtifactCoordinator::new("AI 101", dir.path()).with_image_batch_size(3);
        let mut generator = fake_images(|requests| Ok(requests.iter().map(|r| r.target.clone()).collect()));

        let images = coordinator.generate_images(&slides(), &ArtifactMap::new(), &mut generator);

        assert_eq!(generator.batches, vec![3, 1]);
        assert_eq!(images.len(), 4);
        assert!(images
            .get(&SlideId::title())
            .unwrap()
            .ends_with("00_title_slide.png"));
        assert!(images.get_by_title("Intro").unwrap().ends_with("03_slide.png"));
    }

    #[test]
    fn test_failed_chunk_leaves_only_its_slides_unmapped() {
        let dir = TempDir::new().unwrap();
        let coordinator =
            BatchArtifactCoordinator::new("AI 101", dir.path()).with_image_batch_size(2);
        let mut calls = 0;
        let mut generator = fake_images(move |requests: &[ImageRequest]| {
            calls += 1;
            if calls == 1 {
                Err(Error::collaborator("quota"))
            } else {
                Ok(requests.iter().map(|r| r.target.clone()).collect())
            }
        });

        let images = coordinator.generate_images(&slides(), &ArtifactMap::new(), &mut generator);

        assert_eq!(images.len(), 2);
        assert!(images.get(&SlideId::title()).is_none());
        assert!(images.get_by_title("Intro").is_some());
    }

    #[test]
    fn test_bind_results_matches_targets_before_position() {
        let requests = vec![request(1, "a.png"), request(2, "b.png"), request(3, "c.png")];
        let results = vec![PathBuf::from("c.png"), PathBuf::from("a.png")];

        let bound = bind_results(&requests, results);

        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].0.index, 1);
        assert_eq!(bound[0].1, PathBuf::from("a.png"));
        assert_eq!(bound[1].0.index, 3);
        assert_eq!(bound[1].1, PathBuf::from("c.png"));
    }

    #[test]
    fn test_bind_results_falls_back_to_position() {
        let requests = vec![request(1, "a.png"), request(2, "b.png"), request(3, "c.png")];
        let results = vec![PathBuf::from("out/x.png"), PathBuf::from("out/y.png")];

        let bound = bind_results(&requests, results);

        assert_eq!(bound.len(), 2);
        assert_eq!(bound[0].0.index, 1);
        assert_eq!(bound[0].1, PathBuf::from("out/x.png"));
        assert_eq!(bound[1].0.index, 2);
    }

    #[test]
    fn test_bind_results_positional_slot_taken() {
        let requests = vec![request(1, "a.png"), request(2, "b.png")];
        // "a.png" claims slot 0 by target, so "z.png" has no free slot.
        let results = vec![PathBuf::from("z.png"), PathBuf::from("a.png")];
        let bound = bind_results(&requests, results);

        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].1, PathBuf::from("a.png"));
    }

    #[test]
    fn test_run_with_everything_unavailable_still_completes() {
        let dir = TempDir::new().unwrap();
        let coordinator = BatchArtifactCoordinator::new("AI 101", dir.path());
        let mut text = ScriptedText::new(Vec::new());
        let mut generator = fake_images(|_: &[ImageRequest]| Err(Error::collaborator("offline")));

        let artifacts = coordinator.run(&slides(), &mut text, &mut generator);

        assert_eq!(artifacts.prompts.len(), 3);
        assert_eq!(artifacts.notes.len(), 4);
        assert!(artifacts.images.is_empty());
    }
}
