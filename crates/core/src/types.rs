//! Domain types for course outlines and projected slides.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four fixed hierarchy levels of the outline grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineLevel {
    Module,
    Topic,
    Subtopic,
    Point,
}

impl OutlineLevel {
    /// Level for a numeric path with the given number of dots.
    pub fn from_dots(dots: usize) -> Option<Self> {
        match dots {
            0 => Some(Self::Module),
            1 => Some(Self::Topic),
            2 => Some(Self::Subtopic),
            3 => Some(Self::Point),
            _ => None,
        }
    }
}

/// A dotted sequence of integers such as `1.2.3`.
///
/// The number of segments fixes the node kind: one segment is a module,
/// four segments are a point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NumericPath(Vec<u32>);

impl NumericPath {
    /// Create a path from its segments.
    pub fn new(segments: Vec<u32>) -> Self {
        Self(segments)
    }

    /// A single-segment (module) path.
    pub fn module(number: u32) -> Self {
        Self(vec![number])
    }

    /// Parse a leading outline token like `1.2.` (one trailing dot allowed).
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.strip_suffix('.').unwrap_or(token);
        if token.is_empty() {
            return None;
        }

        token
            .split('.')
            .map(|segment| {
                if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                    segment.parse::<u32>().ok()
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Number of dots in the display form.
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// The level this path denotes, if any.
    pub fn level(&self) -> Option<OutlineLevel> {
        OutlineLevel::from_dots(self.depth())
    }

    /// Path segments.
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// The first segment (the module number).
    pub fn first(&self) -> u32 {
        self.0.first().copied().unwrap_or(1)
    }

    /// This path extended by one more segment.
    pub fn child(&self, number: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(number);
        Self(segments)
    }
}

impl fmt::Display for NumericPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// A top-level outline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Single-segment path; its value is the module number.
    pub path: NumericPath,

    /// Module title as written in the outline.
    pub title: String,

    /// Topics in outline order.
    pub topics: Vec<Topic>,

    /// Every line seen while this module was the active cursor.
    /// Only filled when parsing with raw capture enabled.
    pub raw_content: Vec<String>,
}

impl Module {
    /// Create an empty module.
    pub fn new(path: NumericPath, title: impl Into<String>) -> Self {
        Self {
            path,
            title: title.into(),
            topics: Vec::new(),
            raw_content: Vec::new(),
        }
    }

    /// The module number.
    pub fn number(&self) -> u32 {
        self.path.first()
    }
}

/// Second-level outline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub path: NumericPath,
    pub title: String,
    pub subtopics: Vec<Subtopic>,
}

impl Topic {
    /// Create an empty topic.
    pub fn new(path: NumericPath, title: impl Into<String>) -> Self {
        Self {
            path,
            title: title.into(),
            subtopics: Vec::new(),
        }
    }
}

/// Third-level outline entry; its points become slide bullets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    pub path: NumericPath,
    pub title: String,
    pub points: Vec<String>,
}

impl Subtopic {
    /// Create a subtopic without points.
    pub fn new(path: NumericPath, title: impl Into<String>) -> Self {
        Self {
            path,
            title: title.into(),
            points: Vec::new(),
        }
    }
}

/// Counters for lines the parser could not place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Point lines seen with no active subtopic.
    pub skipped_points: usize,

    /// Lines that matched no level pattern.
    pub unmatched_lines: usize,
}

/// Root of a parsed outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    /// Course title from the first line, or the default placeholder.
    pub course_title: String,

    /// Modules in insertion order; module numbers are unique.
    pub modules: Vec<Module>,

    /// Title plus every non-blank line. Only filled with raw capture.
    pub all_content: Vec<String>,

    /// Lines dropped during parsing.
    pub stats: ParseStats,
}

impl CourseOutline {
    /// Create an outline with no modules.
    pub fn new(course_title: impl Into<String>) -> Self {
        Self {
            course_title: course_title.into(),
            modules: Vec::new(),
            all_content: Vec::new(),
            stats: ParseStats::default(),
        }
    }

    /// The course title.
    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    /// Look up a module by number.
    pub fn module(&self, number: u32) -> Option<&Module> {
        self.modules.iter().find(|m| m.number() == number)
    }

    /// Total topics across all modules.
    pub fn topic_count(&self) -> usize {
        self.modules.iter().map(|m| m.topics.len()).sum()
    }

    /// Total subtopics across all modules.
    pub fn subtopic_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| m.topics.iter())
            .map(|t| t.subtopics.len())
            .sum()
    }
}

/// Hierarchy level of a rendered slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideLevel {
    Title,
    Module,
    Topic,
    Subtopic,
}

impl SlideLevel {
    /// Lowercase name used in batch payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideLevel::Title => "title",
            SlideLevel::Module => "module",
            SlideLevel::Topic => "topic",
            SlideLevel::Subtopic => "subtopic",
        }
    }
}

/// Stable identifier of a slide, assigned at projection time.
///
/// Unlike the display title this never collides: two subtopics named
/// "Overview" in different topics still have distinct paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlideId {
    pub level: SlideLevel,
    pub path: Option<NumericPath>,
}

impl SlideId {
    /// Identifier of the course title slide.
    pub fn title() -> Self {
        Self {
            level: SlideLevel::Title,
            path: None,
        }
    }

    /// Identifier of a content slide.
    pub fn new(level: SlideLevel, path: NumericPath) -> Self {
        Self {
            level,
            path: Some(path),
        }
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}", self.level.as_str(), path),
            None => f.write_str(self.level.as_str()),
        }
    }
}

/// Visual style of a slide title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleTag {
    CourseTitle,
    ModuleTitle,
    TopicTitle,
    SubtopicTitle,
}

impl StyleTag {
    /// Style used for slides of the given level.
    pub fn for_level(level: SlideLevel) -> Self {
        match level {
            SlideLevel::Title => Self::CourseTitle,
            SlideLevel::Module => Self::ModuleTitle,
            SlideLevel::Topic => Self::TopicTitle,
            SlideLevel::Subtopic => Self::SubtopicTitle,
        }
    }

    /// Title colour as an RGB hex string (no leading `#`).
    pub fn title_color(&self) -> &'static str {
        match self {
            StyleTag::CourseTitle => "004481",
            StyleTag::ModuleTitle => "002060",
            StyleTag::TopicTitle => "0070C0",
            StyleTag::SubtopicTitle => "00B0F0",
        }
    }
}

/// One projected slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// Stable identifier.
    pub id: SlideId,

    /// Display title; also the correlation key shared with the LLM.
    pub title: String,

    /// Bullet lines in outline order.
    pub content: Vec<String>,

    /// Hierarchy level.
    pub level: SlideLevel,

    /// Title style.
    pub style: StyleTag,
}

impl SlideSpec {
    /// Create a slide; the style follows the level.
    pub fn new(id: SlideId, title: impl Into<String>, content: Vec<String>) -> Self {
        let level = id.level;
        Self {
            id,
            title: title.into(),
            content,
            level,
            style: StyleTag::for_level(level),
        }
    }

    /// Bullets joined into one block of text.
    pub fn content_text(&self) -> String {
        self.content.join("\n")
    }
}
