//! Drafting a course outline from a free-form course description.

use crate::coordinator::TextGenerator;
use crate::error::{Error, Result};

/// System prompt for outline drafting. The requested format is the grammar
/// accepted by [`crate::outline::parse`].
pub const OUTLINE_SYSTEM_PROMPT: &str = r#"You are a curriculum designer who turns course descriptions into detailed course outlines.

The description may include a title, an overview, learning objectives, the audience,
prerequisites, a suggested duration, a module breakdown, assessments and resources.
Keep every module and topic the description names.

For every topic write 3 to 6 subtopics.
For every subtopic write 3 to 6 points. Points go on slides, so keep them to short sentences.
Never use the words "module", "topic", "subtopic" or "point" in the outline itself.

Write plain text with no markdown, one entry per line, numbered like this:
Course Title
1 First module title
1.1 First topic title
1.1.1 First subtopic title
1.1.1.1 First point
1.1.1.2 Second point
1.1.2 Second subtopic title
1.1.2.1 First point
2 Second module title
2.1 First topic title

The first line is the course title. Put a space between the number and the title."#;

/// Ask the text generator for an outline of the described course.
///
/// Fails when the generator fails or returns nothing, since every later
/// stage needs the outline.
pub fn draft_outline(description: &str, text: &mut dyn TextGenerator) -> Result<String> {
    let user_prompt = format!(
        "Create a complete course outline for this course description:\n\n{}\n\n\
         Follow the format from the instructions exactly.",
        description.trim()
    );

    log::info!("Drafting course outline");
    let outline = text.generate(&user_prompt, OUTLINE_SYSTEM_PROMPT)?;
    let outline = outline.trim();
    if outline.is_empty() {
        return Err(Error::collaborator("outline draft is empty"));
    }

    log::info!("Drafted outline with {} lines", outline.lines().count());
    Ok(outline.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::parse;

    struct Fixed(&'static str, Vec<String>);

    impl TextGenerator for Fixed {
        fn generate(&mut self, user_prompt: &str, system_prompt: &str) -> Result<String> {
            assert_eq!(system_prompt, OUTLINE_SYSTEM_PROMPT);
            self.1.push(user_prompt.to_string());
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_draft_outline_parses() {
        let mut text = Fixed("\nAI 101\n1 Security\n1.1 Basics\n1.1.1 Intro\n1.1.1.1 A\n\n", Vec::new());

        let draft = draft_outline("  A course about AI security.  ", &mut text).unwrap();

        assert!(text.1[0].contains("\n\nA course about AI security.\n\n"));
        assert!(draft.starts_with("AI 101\n"));
        let outline = parse(&draft).unwrap();
        assert_eq!(outline.course_title, "AI 101");
        assert_eq!(outline.modules.len(), 1);
    }

    #[test]
    fn test_empty_draft_is_an_error() {
        let mut text = Fixed("   \n", Vec::new());
        assert!(matches!(
            draft_outline("anything", &mut text),
            Err(Error::Collaborator(_))
        ));
    }

    #[test]
    fn test_system_prompt_example_is_valid_outline() {
        let example: String = OUTLINE_SYSTEM_PROMPT
            .lines()
            .skip_while(|l| *l != "Course Title")
            .take_while(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let outline = parse(&example).unwrap();
        assert_eq!(outline.modules.len(), 2);
        assert_eq!(outline.subtopic_count(), 2);
        assert_eq!(outline.stats.unmatched_lines, 0);
    }
}
