//! Course outline parsing.
//!
//! The outline is line-oriented. Every structural line starts with a dotted
//! numeric prefix whose dot count gives its level:
//!
//! ```text
//! AI 101
//! 1. Security
//! 1.1 Basics
//! 1.1.1 Intro
//! 1.1.1.1 Point A
//! ```
//!
//! Lines attach to whichever module/topic/subtopic was seen last, not to the
//! parent their number names. Missing parents are synthesized, orphan points
//! are dropped, and unrecognized lines never fail the parse.

use crate::error::{Error, Result};
use crate::types::{CourseOutline, Module, NumericPath, OutlineLevel, Subtopic, Topic};

/// Title used when the outline has no title line.
pub const DEFAULT_COURSE_TITLE: &str = "Course Presentation";

/// Title of the module synthesized for a topic with no module.
pub const PLACEHOLDER_MODULE_TITLE: &str = "Main Module";

/// Title of the topic synthesized for a subtopic with no topic.
pub const PLACEHOLDER_TOPIC_TITLE: &str = "Main Topic";

/// Options selecting what the parser keeps besides the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep the raw text of each module (and of the whole course) for
    /// assessment prompts.
    pub capture_raw: bool,
}

impl ParseOptions {
    /// Options for the quiz and exam generators.
    pub fn with_raw_capture() -> Self {
        Self { capture_raw: true }
    }
}

/// Parse an outline, keeping only the structured tree.
pub fn parse(text: &str) -> Result<CourseOutline> {
    parse_with(text, ParseOptions::default())
}

/// Parse an outline with explicit options.
///
/// Fails only when nothing but (at most) a title line is present.
pub fn parse_with(text: &str, options: ParseOptions) -> Result<CourseOutline> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let first = lines.next().ok_or(Error::EmptyOutline)?;
    let (course_title, leading) = if is_level_one_line(first) {
        (DEFAULT_COURSE_TITLE.to_string(), Some(first))
    } else {
        (first.to_string(), None)
    };

    let body: Vec<&str> = leading.into_iter().chain(lines).collect();
    if body.is_empty() {
        return Err(Error::EmptyOutline);
    }

    let mut initial = ParseState::new(CourseOutline::new(course_title), options);
    if options.capture_raw {
        let title = initial.outline.course_title.clone();
        initial.outline.all_content.push(title);
    }

    let outline = body
        .into_iter()
        .fold(initial, |state, line| state.apply(line))
        .finish();

    log::info!(
        "Found {} modules, {} topics, and {} subtopics in outline ({} points skipped, {} lines unmatched)",
        outline.modules.len(),
        outline.topic_count(),
        outline.subtopic_count(),
        outline.stats.skipped_points,
        outline.stats.unmatched_lines
    );

    Ok(outline)
}

/// Whether a line already looks like the first module rather than a title.
fn is_level_one_line(line: &str) -> bool {
    line.starts_with("1.") || line.starts_with("1 ")
}

/// A line recognized by the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutlineLine<'a> {
    path: NumericPath,
    level: OutlineLevel,
    title: &'a str,
}

/// Classify a trimmed line, or `None` when it matches no level.
fn classify(line: &str) -> Option<OutlineLine<'_>> {
    let (token, rest) = line.split_once(char::is_whitespace)?;
    let title = rest.trim();
    if title.is_empty() {
        return None;
    }

    let path = NumericPath::parse(token)?;
    let level = path.level()?;

    Some(OutlineLine { path, level, title })
}

/// Active insertion points, as indices into the tree.
#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    module: Option<usize>,
    topic: Option<usize>,
    subtopic: Option<usize>,
}

/// Accumulator threaded through the fold over outline lines.
#[derive(Debug)]
struct ParseState {
    outline: CourseOutline,
    cursor: Cursor,
    options: ParseOptions,
}

impl ParseState {
    fn new(outline: CourseOutline, options: ParseOptions) -> Self {
        Self {
            outline,
            cursor: Cursor::default(),
            options,
        }
    }

    fn apply(mut self, line: &str) -> Self {
        if self.options.capture_raw {
            self.outline.all_content.push(line.to_string());
        }

        match classify(line) {
            Some(OutlineLine {
                path,
                level: OutlineLevel::Module,
                title,
            }) => {
                log::debug!("Found module: {} - {}", path, title);
                self.enter_module(path, title);
            }
            Some(OutlineLine {
                path,
                level: OutlineLevel::Topic,
                title,
            }) => {
                self.ensure_module();
                log::debug!("Found topic: {} - {}", path, title);
                self.enter_topic(path, title);
            }
            Some(OutlineLine {
                path,
                level: OutlineLevel::Subtopic,
                title,
            }) => {
                self.ensure_module();
                self.ensure_topic(&path);
                log::debug!("Found subtopic: {} - {}", path, title);
                self.enter_subtopic(path, title);
            }
            Some(OutlineLine {
                path,
                level: OutlineLevel::Point,
                title,
            }) => {
                if !self.push_point(title) {
                    log::debug!("Skipping point {} with no active subtopic", path);
                    self.outline.stats.skipped_points += 1;
                }
            }
            None => {
                self.outline.stats.unmatched_lines += 1;
            }
        }

        if self.options.capture_raw {
            if let Some(m) = self.cursor.module {
                self.outline.modules[m].raw_content.push(line.to_string());
            }
        }

        self
    }

    fn finish(self) -> CourseOutline {
        self.outline
    }

    fn enter_module(&mut self, path: NumericPath, title: &str) {
        let module = Module::new(path, title);
        let modules = &mut self.outline.modules;

        let index = match modules.iter().position(|m| m.number() == module.number()) {
            Some(index) => {
                modules[index] = module;
                index
            }
            None => {
                modules.push(module);
                modules.len() - 1
            }
        };

        self.cursor = Cursor {
            module: Some(index),
            topic: None,
            subtopic: None,
        };
    }

    fn ensure_module(&mut self) {
        if self.cursor.module.is_none() {
            log::debug!("Created default module: Module 1");
            self.enter_module(NumericPath::module(1), PLACEHOLDER_MODULE_TITLE);
        }
    }

    fn enter_topic(&mut self, path: NumericPath, title: &str) {
        let Some(m) = self.cursor.module else {
            return;
        };
        let topic = Topic::new(path, title);
        let topics = &mut self.outline.modules[m].topics;

        let index = match topics.iter().position(|t| t.path == topic.path) {
            Some(index) => {
                topics[index] = topic;
                index
            }
            None => {
                topics.push(topic);
                topics.len() - 1
            }
        };

        self.cursor.topic = Some(index);
        self.cursor.subtopic = None;
    }

    fn ensure_topic(&mut self, subtopic_path: &NumericPath) {
        if self.cursor.topic.is_none() {
            let path = NumericPath::module(subtopic_path.first()).child(1);
            log::debug!("Created default topic: {}", path);
            self.enter_topic(path, PLACEHOLDER_TOPIC_TITLE);
        }
    }

    fn enter_subtopic(&mut self, path: NumericPath, title: &str) {
        let (Some(m), Some(t)) = (self.cursor.module, self.cursor.topic) else {
            return;
        };
        let subtopic = Subtopic::new(path, title);
        let subtopics = &mut self.outline.modules[m].topics[t].subtopics;

        let index = match subtopics.iter().position(|s| s.path == subtopic.path) {
            Some(index) => {
                subtopics[index] = subtopic;
                index
            }
            None => {
                subtopics.push(subtopic);
                subtopics.len() - 1
            }
        };

        self.cursor.subtopic = Some(index);
    }

    fn push_point(&mut self, point: &str) -> bool {
        match (self.cursor.module, self.cursor.topic, self.cursor.subtopic) {
            (Some(m), Some(t), Some(s)) => {
                self.outline.modules[m].topics[t].subtopics[s]
                    .points
                    .push(point.to_string());
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "AI 101\n1. Security\n1.1 Basics\n1.1.1 Intro\n1.1.1.1 Point A\n1.1.1.2 Point B";

    #[test]
    fn test_parse_sample_outline() {
        let outline = parse(SAMPLE).unwrap();

        assert_eq!(outline.course_title(), "AI 101");
        assert_eq!(outline.modules.len(), 1);

        let module = &outline.modules[0];
        assert_eq!(module.number(), 1);
        assert_eq!(module.title, "Security");
        assert_eq!(module.topics.len(), 1);
        assert_eq!(module.topics[0].title, "Basics");
        assert_eq!(module.topics[0].subtopics.len(), 1);

        let subtopic = &module.topics[0].subtopics[0];
        assert_eq!(subtopic.title, "Intro");
        assert_eq!(subtopic.path.to_string(), "1.1.1");
        assert_eq!(subtopic.points, vec!["Point A", "Point B"]);
    }

    #[test]
    fn test_first_line_module_uses_default_title() {
        let outline = parse("1. Security\n1.1 Basics").unwrap();
        assert_eq!(outline.course_title(), DEFAULT_COURSE_TITLE);
        assert_eq!(outline.modules[0].title, "Security");
        assert_eq!(outline.modules[0].topics[0].title, "Basics");
    }

    #[test]
    fn test_blank_lines_and_whitespace_ignored() {
        let outline = parse("\n\n  AI 101  \n\n   1 Security  \n\n 1.1   Basics\n").unwrap();
        assert_eq!(outline.course_title(), "AI 101");
        assert_eq!(outline.modules[0].title, "Security");
        assert_eq!(outline.modules[0].topics[0].title, "Basics");
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(parse(""), Err(Error::EmptyOutline)));
        assert!(matches!(parse("   \n\n  "), Err(Error::EmptyOutline)));
    }

    #[test]
    fn test_title_only_fails() {
        assert!(matches!(parse("AI 101\n\n"), Err(Error::EmptyOutline)));
    }

    #[test]
    fn test_unstructured_body_gives_empty_tree() {
        let outline = parse("AI 101\nSome prose\nMore prose").unwrap();
        assert!(outline.modules.is_empty());
        assert_eq!(outline.stats.unmatched_lines, 2);
    }

    #[test]
    fn test_topic_without_module_creates_placeholder() {
        let outline = parse("Course\n2.1 Foo").unwrap();

        assert_eq!(outline.modules.len(), 1);
        let module = &outline.modules[0];
        assert_eq!(module.number(), 1);
        assert_eq!(module.title, PLACEHOLDER_MODULE_TITLE);
        assert_eq!(module.topics[0].title, "Foo");
        assert_eq!(module.topics[0].path.to_string(), "2.1");
    }

    #[test]
    fn test_subtopic_without_topic_creates_placeholder() {
        let outline = parse("Course\n3 Networking\n3.2.1 Routing").unwrap();

        let module = &outline.modules[0];
        assert_eq!(module.topics.len(), 1);
        assert_eq!(module.topics[0].path.to_string(), "3.1");
        assert_eq!(module.topics[0].title, PLACEHOLDER_TOPIC_TITLE);
        assert_eq!(module.topics[0].subtopics[0].title, "Routing");
    }

    #[test]
    fn test_subtopic_without_module_creates_both_placeholders() {
        let outline = parse("Course\n4.1.1 Lonely").unwrap();

        let module = &outline.modules[0];
        assert_eq!(module.title, PLACEHOLDER_MODULE_TITLE);
        assert_eq!(module.topics[0].path.to_string(), "4.1");
        assert_eq!(module.topics[0].subtopics[0].title, "Lonely");
    }

    #[test]
    fn test_point_without_subtopic_is_skipped() {
        let outline = parse("Course\n1 Security\n1.1 Basics\n1.1.1.1 Orphan").unwrap();

        assert_eq!(outline.stats.skipped_points, 1);
        assert!(outline.modules[0].topics[0].subtopics.is_empty());
    }

    #[test]
    fn test_topic_line_resets_subtopic_cursor() {
        let text = "Course\n1 M\n1.1 T1\n1.1.1 S1\n1.2 T2\n1.2.1.1 Orphan";
        let outline = parse(text).unwrap();

        assert_eq!(outline.stats.skipped_points, 1);
        assert!(outline.modules[0].topics[0].subtopics[0].points.is_empty());
    }

    #[test]
    fn test_lines_attach_to_cursor_not_numeric_parent() {
        let text = "Course\n1 First\n1.1 Topic\n2 Second\n1.2 Misplaced";
        let outline = parse(text).unwrap();

        assert_eq!(outline.modules[0].topics.len(), 1);
        assert_eq!(outline.modules[1].topics[0].title, "Misplaced");
    }

    #[test]
    fn test_redeclared_module_replaces_in_place() {
        let text = "Course\n1 First\n1.1 Old\n2 Second\n1 Again\n1.1 New";
        let outline = parse(text).unwrap();

        assert_eq!(outline.modules.len(), 2);
        assert_eq!(outline.modules[0].title, "Again");
        assert_eq!(outline.modules[0].topics.len(), 1);
        assert_eq!(outline.modules[0].topics[0].title, "New");
        assert_eq!(outline.modules[1].title, "Second");
    }

    #[test]
    fn test_malformed_prefixes_do_not_match() {
        let text = "Course\n1.Module Intro\n1.1.1.1.1 Too deep\n1.1\nabc def";
        let outline = parse(text).unwrap();

        assert!(outline.modules.is_empty());
        assert_eq!(outline.stats.unmatched_lines, 4);
    }

    #[test]
    fn test_trailing_dot_is_stripped_before_counting() {
        let outline = parse("Course\n1. Module\n1.1. Topic").unwrap();
        assert_eq!(outline.modules[0].title, "Module");
        assert_eq!(outline.modules[0].topics[0].title, "Topic");
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "Course\n2.1 Foo\n1 Bar\n1.1 Baz\n1.1.1 Qux\n1.1.1.1 P\nnoise";
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }

    #[test]
    fn test_structured_parse_keeps_no_raw_text() {
        let outline = parse(SAMPLE).unwrap();
        assert!(outline.all_content.is_empty());
        assert!(outline.modules[0].raw_content.is_empty());
    }

    #[test]
    fn test_raw_capture_keeps_module_text() {
        let text = "AI 101\nPreamble\n1 Security\n1.1 Basics\nA loose note\n1.1.1 Intro\n2 Next";
        let outline = parse_with(text, ParseOptions::with_raw_capture()).unwrap();

        assert_eq!(
            outline.modules[0].raw_content,
            vec!["1 Security", "1.1 Basics", "A loose note", "1.1.1 Intro"]
        );
        assert_eq!(outline.modules[1].raw_content, vec!["2 Next"]);
        assert_eq!(outline.all_content.first().map(String::as_str), Some("AI 101"));
        assert_eq!(outline.all_content.len(), 7);
        // Structured tree is the same either way.
        assert_eq!(outline.modules[0].topics, parse(text).unwrap().modules[0].topics);
    }
}
