//! Correlation of slides with artifacts produced out of process.
//!
//! Image prompts and speaker notes come back from the text generator as flat
//! JSON objects keyed by slide title. Producers do not agree on key formats,
//! so lookups go through two paths:
//!
//! * the primary path: exact title, then the slide's stable [`SlideId`];
//! * the [`legacy`] ladder: historical key variants, then for the title
//!   slide only the single-entry rule and a title-marker scan.
//!
//! A lookup that misses both synthesizes a templated fallback. Fallbacks are
//! never written back into the map.

use crate::sanitize::{module_name_from_title, strip_fundamentals};
use crate::types::{SlideId, SlideLevel, SlideSpec};
use serde_json::{Map, Value};

/// Insertion-ordered map from correlation key to artifact text.
///
/// Backed by a JSON object, so keys keep the order the producer wrote them
/// in. Every stored value is a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactMap {
    entries: Map<String, Value>,
}

impl ArtifactMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a JSON object, keeping the object's key order.
    ///
    /// Strings are kept verbatim and other scalars are stringified; nested
    /// values and nulls are skipped.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        let mut map = Self::new();
        for (key, value) in object {
            match value {
                Value::String(text) => map.insert(key, text),
                Value::Number(n) => map.insert(key, n.to_string()),
                Value::Bool(b) => map.insert(key, b.to_string()),
                Value::Null => log::debug!("Skipping null artifact for '{}'", key),
                Value::Array(_) | Value::Object(_) => {
                    log::warn!("Skipping non-text artifact for '{}'", key)
                }
            }
        }
        map
    }

    /// Insert or overwrite an entry. Overwrites keep the key's position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::String(value.into()));
    }

    /// Merge a later batch into this map; its entries win.
    pub fn merge(&mut self, other: ArtifactMap) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }

    /// Look up an exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Look up an exact key, returning the stored key as well.
    pub fn get_entry(&self, key: &str) -> Option<(&str, &str)> {
        self.entries
            .get_key_value(key)
            .and_then(|(k, v)| Some((k.as_str(), v.as_str()?)))
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| Some((k.as_str(), v.as_str()?)))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArtifactMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Which side channel a map belongs to; selects the fallback templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ImagePrompt,
    SpeakerNotes,
}

impl ArtifactKind {
    fn label(&self) -> &'static str {
        match self {
            ArtifactKind::ImagePrompt => "image prompt",
            ArtifactKind::SpeakerNotes => "speaker notes",
        }
    }
}

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    ExactTitle,
    SlideId,
    KnownVariant,
    SingleEntry,
    TitleMarker,
}

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// An entry of the map was used.
    Matched {
        key: &'a str,
        value: &'a str,
        rule: MatchRule,
    },
    /// Nothing matched; the text was synthesized.
    Fallback(String),
}

impl Resolution<'_> {
    /// The resolved text.
    pub fn text(&self) -> &str {
        match self {
            Resolution::Matched { value, .. } => value,
            Resolution::Fallback(text) => text,
        }
    }

    /// The resolved text, owned.
    pub fn into_text(self) -> String {
        match self {
            Resolution::Matched { value, .. } => value.to_string(),
            Resolution::Fallback(text) => text,
        }
    }

    /// Whether the text was synthesized.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback(_))
    }
}

/// Resolves slides against one artifact map. Never fails.
#[derive(Debug, Clone)]
pub struct KeyCorrelator {
    course_title: String,
    kind: ArtifactKind,
}

impl KeyCorrelator {
    /// Create a correlator for one side channel of one course.
    pub fn new(course_title: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            course_title: course_title.into(),
            kind,
        }
    }

    /// The side channel this correlator serves.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Resolve a content slide.
    pub fn resolve<'m>(&self, slide: &SlideSpec, map: &'m ArtifactMap) -> Resolution<'m> {
        self.resolve_parts(&slide.id, &slide.title, map)
    }

    /// Resolve the course title slide.
    pub fn resolve_title_slide<'m>(&self, map: &'m ArtifactMap) -> Resolution<'m> {
        self.resolve_parts(&SlideId::title(), &self.course_title, map)
    }

    /// Resolve by title alone, for callers that only kept the title.
    pub fn resolve_title<'m>(
        &self,
        title: &str,
        level: SlideLevel,
        map: &'m ArtifactMap,
    ) -> Resolution<'m> {
        let id = SlideId {
            level,
            path: None,
        };
        self.resolve_parts(&id, title, map)
    }

    fn resolve_parts<'m>(&self, id: &SlideId, title: &str, map: &'m ArtifactMap) -> Resolution<'m> {
        let found = primary_lookup(id, title, map)
            .or_else(|| legacy::lookup(&self.course_title, id, title, map));

        match found {
            Some(resolution) => {
                if let Resolution::Matched { key, rule, .. } = &resolution {
                    log::debug!(
                        "Resolved {} for '{}' via {:?} (key '{}')",
                        self.kind.label(),
                        title,
                        rule,
                        key
                    );
                }
                resolution
            }
            None => {
                log::info!("Using fallback {} for slide '{}'", self.kind.label(), title);
                Resolution::Fallback(self.fallback(id.level, title))
            }
        }
    }

    /// Synthesize the templated text for a slide with no artifact.
    pub fn fallback(&self, level: SlideLevel, title: &str) -> String {
        match (self.kind, level) {
            (ArtifactKind::ImagePrompt, _) => format!(
                "Create a professional image representing {}. Style: modern business presentation. \
                 Focus on technology and education concepts with clean, modern design.",
                title
            ),
            (ArtifactKind::SpeakerNotes, SlideLevel::Title) => format!(
                "Welcome to the course: {name}. This comprehensive course will provide you with \
                 in-depth knowledge and practical skills about {name}. Throughout this course, you \
                 will learn key concepts, best practices, and hands-on techniques that you can apply \
                 in real-world scenarios. Let's begin our journey into {name}.",
                name = title
            ),
            (ArtifactKind::SpeakerNotes, SlideLevel::Module) => format!(
                "Module: {name}. This module will introduce you to the key concepts and principles \
                 of {name}. We will explore the fundamental aspects, practical applications, and \
                 best practices related to this module topic. By the end of this module, you will \
                 have a solid understanding of {name} and be able to apply these concepts in \
                 various scenarios.",
                name = module_name_from_title(title)
            ),
            (ArtifactKind::SpeakerNotes, _) => {
                format!("Discuss the key points on this slide about {}.", title)
            }
        }
    }
}

/// Exact title, then the stable slide identifier.
fn primary_lookup<'m>(id: &SlideId, title: &str, map: &'m ArtifactMap) -> Option<Resolution<'m>> {
    if let Some((key, value)) = map.get_entry(title) {
        return Some(Resolution::Matched {
            key,
            value,
            rule: MatchRule::ExactTitle,
        });
    }

    if id.path.is_some() || id.level == SlideLevel::Title {
        if let Some((key, value)) = map.get_entry(&id.to_string()) {
            return Some(Resolution::Matched {
                key,
                value,
                rule: MatchRule::SlideId,
            });
        }
    }

    None
}

/// Compatibility rules for maps keyed by older producers.
pub mod legacy {
    use super::*;

    /// Historical keys under which the title slide's artifact was stored.
    pub fn title_slide_variants(course_title: &str) -> Vec<String> {
        let mut variants = vec![
            course_title.to_string(),
            format!("Course: {}", course_title),
            format!("Title: {}", course_title),
            "Title Slide".to_string(),
        ];
        if let Some(base) = strip_fundamentals(course_title) {
            variants.push(base.to_string());
            variants.push(format!("Course: {}", base));
        }
        variants
    }

    /// Historical keys for a content slide.
    ///
    /// The notes producer keyed module slides `"{n}: {title}"` instead of
    /// `"Module {n}: {title}"`.
    pub fn content_slide_variants(id: &SlideId, title: &str) -> Vec<String> {
        match (&id.level, &id.path) {
            (SlideLevel::Module, Some(path)) => {
                vec![format!("{}: {}", path.first(), module_name_from_title(title))]
            }
            _ => Vec::new(),
        }
    }

    /// Whether a key looks like it belongs to the course title slide.
    pub fn is_title_marker(key: &str) -> bool {
        let lower = key.to_lowercase();
        lower.starts_with("course:") || lower.contains("title")
    }

    /// Run the compatibility ladder; first hit wins.
    pub fn lookup<'m>(
        course_title: &str,
        id: &SlideId,
        title: &str,
        map: &'m ArtifactMap,
    ) -> Option<Resolution<'m>> {
        let is_title_slide = id.level == SlideLevel::Title;
        let variants = if is_title_slide {
            title_slide_variants(course_title)
        } else {
            content_slide_variants(id, title)
        };

        if let Some((key, value)) = variants.iter().find_map(|v| map.get_entry(v)) {
            return Some(Resolution::Matched {
                key,
                value,
                rule: MatchRule::KnownVariant,
            });
        }

        if is_title_slide && map.len() == 1 {
            let (key, value) = map.iter().next()?;
            return Some(Resolution::Matched {
                key,
                value,
                rule: MatchRule::SingleEntry,
            });
        }

        if is_title_slide {
            if let Some((key, value)) = map.iter().find(|(key, _)| is_title_marker(key)) {
                return Some(Resolution::Matched {
                    key,
                    value,
                    rule: MatchRule::TitleMarker,
                });
            }
        }

        None
    }
}
