//! Projection of an outline tree onto a flat slide sequence.

use crate::types::{CourseOutline, NumericPath, SlideId, SlideLevel, SlideSpec};

/// Default deck size, title slide included.
pub const DEFAULT_MAX_SLIDES: usize = 50;

/// Build the display title of a slide.
///
/// These strings are the correlation key shared with every side channel,
/// so the formats must not change.
pub fn format_slide_title(level: SlideLevel, path: &NumericPath, title: &str) -> String {
    match level {
        SlideLevel::Module => format!("Module {}: {}", path.first(), title),
        SlideLevel::Topic => format!("{}: {}", path, title),
        SlideLevel::Subtopic | SlideLevel::Title => title.to_string(),
    }
}

/// Number of slides a full deck for this outline would have, title included.
pub fn slide_count_estimate(outline: &CourseOutline) -> usize {
    1 + outline.modules.len() + outline.topic_count() + outline.subtopic_count()
}

/// Walks an outline depth-first and emits one slide per module, topic and
/// subtopic, stopping as soon as the cap is reached.
#[derive(Debug, Clone)]
pub struct SlideProjector {
    /// Maximum number of content slides to emit.
    max_slides: usize,
}

impl Default for SlideProjector {
    fn default() -> Self {
        // One slot is reserved for the title slide.
        Self {
            max_slides: DEFAULT_MAX_SLIDES - 1,
        }
    }
}

impl SlideProjector {
    /// Create a projector emitting at most `max_slides` content slides.
    pub fn new(max_slides: usize) -> Self {
        Self { max_slides }
    }

    /// Projector for a deck of `deck_size` slides including the title slide.
    pub fn for_deck_size(deck_size: usize) -> Self {
        Self::new(deck_size.saturating_sub(1))
    }

    /// The content slide cap.
    pub fn max_slides(&self) -> usize {
        self.max_slides
    }

    /// Project the outline into slides, in outline order.
    ///
    /// Modules without topics produce no slide. A deck cut off mid-module
    /// is a valid result.
    pub fn project(&self, outline: &CourseOutline) -> Vec<SlideSpec> {
        let mut slides = Vec::new();
        let full = |slides: &Vec<SlideSpec>| slides.len() >= self.max_slides;

        'modules: for module in &outline.modules {
            if module.topics.is_empty() {
                log::debug!("Skipping module {} with no topics", module.path);
                continue;
            }
            if full(&slides) {
                break;
            }

            slides.push(SlideSpec::new(
                SlideId::new(SlideLevel::Module, module.path.clone()),
                format_slide_title(SlideLevel::Module, &module.path, &module.title),
                module.topics.iter().map(|t| t.title.clone()).collect(),
            ));

            for topic in &module.topics {
                if full(&slides) {
                    break 'modules;
                }
                slides.push(SlideSpec::new(
                    SlideId::new(SlideLevel::Topic, topic.path.clone()),
                    format_slide_title(SlideLevel::Topic, &topic.path, &topic.title),
                    topic.subtopics.iter().map(|s| s.title.clone()).collect(),
                ));

                for subtopic in &topic.subtopics {
                    if full(&slides) {
                        break 'modules;
                    }
                    slides.push(SlideSpec::new(
                        SlideId::new(SlideLevel::Subtopic, subtopic.path.clone()),
                        format_slide_title(SlideLevel::Subtopic, &subtopic.path, &subtopic.title),
                        subtopic.points.clone(),
                    ));
                }
            }
        }

        log::info!(
            "Projected {} slides (cap {}, full deck would be {})",
            slides.len(),
            self.max_slides,
            slide_count_estimate(outline).saturating_sub(1)
        );

        slides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::parse;
    use crate::types::StyleTag;

    const SAMPLE: &str =
        "AI 101\n1. Security\n1.1 Basics\n1.1.1 Intro\n1.1.1.1 Point A\n1.1.1.2 Point B";

    const MULTI: &str = "Course
1 Security
1.1 Basics
1.1.1 Intro
1.1.1.1 A
1.1.2 Threats
1.2 Advanced
1.2.1 Models
2 Operations
2.1 Monitoring
2.1.1 Dashboards
2.1.1.1 B";

    #[test]
    fn test_project_sample() {
        let outline = parse(SAMPLE).unwrap();
        let slides = SlideProjector::new(10).project(&outline);

        assert_eq!(slides.len(), 3);
        assert_eq!(slides[0].title, "Module 1: Security");
        assert_eq!(slides[0].content, vec!["Basics"]);
        assert_eq!(slides[0].style, StyleTag::ModuleTitle);
        assert_eq!(slides[1].title, "1.1: Basics");
        assert_eq!(slides[1].content, vec!["Intro"]);
        assert_eq!(slides[2].title, "Intro");
        assert_eq!(slides[2].level, SlideLevel::Subtopic);
        assert_eq!(slides[2].content, vec!["Point A", "Point B"]);
    }

    #[test]
    fn test_project_preserves_outline_order() {
        let outline = parse(MULTI).unwrap();
        let titles: Vec<_> = SlideProjector::new(100)
            .project(&outline)
            .into_iter()
            .map(|s| s.title)
            .collect();

        assert_eq!(
            titles,
            vec![
                "Module 1: Security",
                "1.1: Basics",
                "Intro",
                "Threats",
                "1.2: Advanced",
                "Models",
                "Module 2: Operations",
                "2.1: Monitoring",
                "Dashboards",
            ]
        );
    }

    #[test]
    fn test_children_appear_once_in_parent_bullets() {
        let outline = parse(MULTI).unwrap();
        let slides = SlideProjector::new(100).project(&outline);

        for module in &outline.modules {
            let slide = slides.iter().find(|s| s.id.path.as_ref() == Some(&module.path)).unwrap();
            for topic in &module.topics {
                assert_eq!(slide.content.iter().filter(|b| **b == topic.title).count(), 1);
            }
        }
        let topic_slide = slides.iter().find(|s| s.title == "1.1: Basics").unwrap();
        assert_eq!(topic_slide.content, vec!["Intro", "Threats"]);
    }

    #[test]
    fn test_cap_of_one_stops_after_first_module() {
        let outline = parse(MULTI).unwrap();
        let slides = SlideProjector::new(1).project(&outline);

        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "Module 1: Security");
    }

    #[test]
    fn test_cap_stops_mid_module() {
        let outline = parse(MULTI).unwrap();
        let slides = SlideProjector::new(4).project(&outline);

        assert_eq!(slides.len(), 4);
        assert_eq!(slides[3].title, "Threats");
    }

    #[test]
    fn test_cap_of_zero_emits_nothing() {
        let outline = parse(MULTI).unwrap();
        assert!(SlideProjector::new(0).project(&outline).is_empty());
    }

    #[test]
    fn test_module_without_topics_is_skipped() {
        let outline = parse("Course\n1 Empty\n2 Full\n2.1 Topic").unwrap();
        let slides = SlideProjector::new(10).project(&outline);

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].title, "Module 2: Full");
    }

    #[test]
    fn test_module_title_round_trip() {
        let outline = parse("Course\n3 Foo\n3.1 Bar").unwrap();
        let slides = SlideProjector::new(10).project(&outline);

        assert_eq!(
            format_slide_title(SlideLevel::Module, &NumericPath::module(3), "Foo"),
            "Module 3: Foo"
        );
        assert_eq!(slides[0].title, "Module 3: Foo");
    }

    #[test]
    fn test_duplicate_titles_keep_distinct_ids() {
        let outline = parse("Course\n1 M\n1.1 A\n1.1.1 Overview\n1.2 B\n1.2.1 Overview").unwrap();
        let slides = SlideProjector::new(10).project(&outline);
        let overviews: Vec<_> = slides.iter().filter(|s| s.title == "Overview").collect();

        assert_eq!(overviews.len(), 2);
        assert_ne!(overviews[0].id, overviews[1].id);
    }

    #[test]
    fn test_deck_size_reserves_title_slot() {
        assert_eq!(SlideProjector::for_deck_size(50).max_slides(), 49);
        assert_eq!(SlideProjector::default().max_slides(), 49);
        assert_eq!(SlideProjector::for_deck_size(0).max_slides(), 0);
    }

    #[test]
    fn test_slide_count_estimate() {
        let outline = parse(MULTI).unwrap();
        assert_eq!(slide_count_estimate(&outline), 10);
    }
}
