//! Module quizzes and the final exam.
//!
//! Both are generated from the raw outline text captured while parsing, so
//! outlines meant for assessments should be parsed with
//! [`ParseOptions::with_raw_capture`](crate::outline::ParseOptions::with_raw_capture).

use crate::coordinator::TextGenerator;
use crate::error::{Error, Result};
use crate::extract::parse_lenient_as;
use crate::sanitize::clean_title;
use crate::types::{CourseOutline, Module};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of questions per module quiz.
pub const DEFAULT_QUIZ_QUESTION_COUNT: usize = 10;

/// Default number of questions in the final exam.
pub const DEFAULT_EXAM_QUESTION_COUNT: usize = 50;

/// Longest course text sent for the exam; longer courses send a summary.
pub const EXAM_CONTENT_LIMIT: usize = 25_000;

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
}

#[derive(Debug, Deserialize)]
struct QuizResponse {
    quiz: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct ExamResponse {
    exam: Vec<Question>,
}

/// A titled list of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub title: String,
    pub questions: Vec<Question>,
}

impl Assessment {
    /// Question sheet under the given heading.
    pub fn render_questions(&self, heading: &str) -> String {
        let mut text = format!("# {}\n\n", heading);
        for (i, q) in self.questions.iter().enumerate() {
            text.push_str(&format!("Question {}: {}\n", i + 1, q.question));
            for option in &q.options {
                text.push_str(&format!("  {}\n", option));
            }
            text.push('\n');
        }
        text
    }

    /// Answer key under the given heading.
    pub fn render_answer_key(&self, heading: &str) -> String {
        let mut text = format!("# {}\n\n", heading);
        for (i, q) in self.questions.iter().enumerate() {
            text.push_str(&format!("Question {}: {}\n", i + 1, q.correct_answer));
        }
        text
    }
}

/// Files written for one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentFiles {
    pub questions: PathBuf,
    pub answer_key: PathBuf,
}

fn quiz_system_prompt(count: usize) -> String {
    format!(
        r#"You write quizzes for technical courses.

You will receive the content of one course module.
Write a {count}-question multiple-choice quiz about it.

Every question must:
1. relate directly to the module content
2. offer exactly four options labelled A, B, C and D
3. have exactly one correct option
4. test understanding rather than recall

Answer in JSON with this shape:
{{
  "quiz": [
    {{
      "question": "What is the main purpose of X?",
      "options": ["A. ...", "B. ...", "C. ...", "D. ..."],
      "correct_answer": "B"
    }}
  ]
}}

Return only the JSON."#,
        count = count
    )
}

fn exam_system_prompt(course_title: &str, count: usize, modules: usize) -> String {
    format!(
        r#"You write final exams for technical courses.

You will receive the content of the course '{title}'.
Write a final exam of exactly {count} multiple-choice questions about it.

The exam must:
1. cover all {modules} modules in proportion to their content
2. mix easy, medium and hard questions
3. test both foundations and deeper understanding
4. offer exactly four options labelled A, B, C and D per question
5. have exactly one correct option per question

Answer in JSON with this shape:
{{
  "exam": [
    {{
      "question": "What is the main purpose of X?",
      "options": ["A. ...", "B. ...", "C. ...", "D. ..."],
      "correct_answer": "B"
    }}
  ]
}}

Return only the JSON."#,
        title = course_title,
        count = count,
        modules = modules
    )
}

/// Outline lines of one module: its title, topics and subtopics.
fn module_summary(module: &Module) -> Vec<String> {
    let mut lines = vec![format!("{}.Module {}", module.number(), module.title)];
    for topic in &module.topics {
        lines.push(format!("{} {}", topic.path, topic.title));
        for subtopic in &topic.subtopics {
            lines.push(format!("{} {}", subtopic.path, subtopic.title));
        }
    }
    lines
}

/// Condensed course text: the title, then every module's summary.
pub fn course_summary(outline: &CourseOutline) -> String {
    let mut lines = vec![outline.course_title.clone()];
    lines.extend(outline.modules.iter().flat_map(module_summary));
    lines.join("\n")
}

/// Write `{stem}{suffix}.txt` and `{stem}_AnswerKey.txt`.
fn write_pair(
    dir: &Path,
    stem: &str,
    suffix: &str,
    questions: &str,
    answer_key: &str,
) -> Result<AssessmentFiles> {
    fs::create_dir_all(dir)?;
    let files = AssessmentFiles {
        questions: dir.join(format!("{}{}.txt", stem, suffix)),
        answer_key: dir.join(format!("{}_AnswerKey.txt", stem)),
    };
    fs::write(&files.questions, questions)?;
    fs::write(&files.answer_key, answer_key)?;
    Ok(files)
}

/// One quiz per module.
#[derive(Debug, Clone)]
pub struct QuizGenerator {
    output_dir: PathBuf,
    question_count: usize,
}

impl QuizGenerator {
    /// Create a generator writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            question_count: DEFAULT_QUIZ_QUESTION_COUNT,
        }
    }

    /// Set the number of questions per quiz.
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count;
        self
    }

    /// Generate the quiz of one module.
    pub fn generate(&self, module: &Module, text: &mut dyn TextGenerator) -> Result<Assessment> {
        let content = if module.raw_content.is_empty() {
            module_summary(module).join("\n")
        } else {
            module.raw_content.join("\n")
        };
        let user_prompt = format!(
            "Write a {}-question quiz for this module content:\n\n{}",
            self.question_count, content
        );

        log::info!("Generating quiz for module {}", module.number());
        let response = text.generate(&user_prompt, &quiz_system_prompt(self.question_count))?;
        let parsed: QuizResponse = parse_lenient_as(&response).ok_or_else(|| {
            Error::collaborator(format!(
                "quiz response for module {} has no usable JSON",
                module.number()
            ))
        })?;

        Ok(Assessment {
            title: module.title.clone(),
            questions: parsed.quiz,
        })
    }

    /// Generate and write every module's quiz. A failing module is logged
    /// and skipped.
    pub fn write_all(&self, outline: &CourseOutline, text: &mut dyn TextGenerator) -> Vec<AssessmentFiles> {
        let mut written = Vec::new();

        for module in &outline.modules {
            let result = self.generate(module, text).and_then(|quiz| {
                let stem = format!("{}_{}", module.number(), clean_title(&module.title));
                write_pair(
                    &self.output_dir,
                    &stem,
                    "_Quiz",
                    &quiz.render_questions(&format!("Quiz for {}", quiz.title)),
                    &quiz.render_answer_key(&format!("Answer Key for {}", quiz.title)),
                )
            });

            match result {
                Ok(files) => {
                    log::info!("Wrote quiz {}", files.questions.display());
                    written.push(files);
                }
                Err(e) => log::error!("Skipping quiz for module {}: {}", module.number(), e),
            }
        }

        written
    }
}

/// The final exam over the whole course.
#[derive(Debug, Clone)]
pub struct ExamGenerator {
    output_dir: PathBuf,
    question_count: usize,
}

impl ExamGenerator {
    /// Create a generator writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            question_count: DEFAULT_EXAM_QUESTION_COUNT,
        }
    }

    /// Set the number of exam questions.
    pub fn with_question_count(mut self, count: usize) -> Self {
        self.question_count = count;
        self
    }

    /// Course text sent with the exam request.
    pub fn exam_content(&self, outline: &CourseOutline) -> String {
        let full = outline.all_content.join("\n");
        if full.is_empty() {
            return course_summary(outline);
        }
        if full.chars().count() > EXAM_CONTENT_LIMIT {
            log::info!("Course text exceeds {} characters, sending a summary", EXAM_CONTENT_LIMIT);
            return course_summary(outline);
        }
        full
    }

    /// Generate the exam.
    pub fn generate(&self, outline: &CourseOutline, text: &mut dyn TextGenerator) -> Result<Assessment> {
        let user_prompt = format!(
            "Write a {}-question final exam for this course content:\n\n{}",
            self.question_count,
            self.exam_content(outline)
        );
        let system_prompt =
            exam_system_prompt(&outline.course_title, self.question_count, outline.modules.len());

        log::info!("Generating final exam with {} questions", self.question_count);
        let response = text.generate(&user_prompt, &system_prompt)?;
        let parsed: ExamResponse = parse_lenient_as(&response)
            .ok_or_else(|| Error::collaborator("exam response has no usable JSON"))?;

        if parsed.exam.len() != self.question_count {
            log::warn!(
                "Exam has {} questions, {} were requested",
                parsed.exam.len(),
                self.question_count
            );
        }

        Ok(Assessment {
            title: outline.course_title.clone(),
            questions: parsed.exam,
        })
    }

    /// Generate and write the exam and its answer key.
    pub fn write(&self, outline: &CourseOutline, text: &mut dyn TextGenerator) -> Result<AssessmentFiles> {
        let exam = self.generate(outline, text)?;
        let stem = format!("Final_Exam_{}", clean_title(&exam.title));
        let files = write_pair(
            &self.output_dir,
            &stem,
            "",
            &exam.render_questions(&format!("Final Exam: {}", exam.title)),
            &exam.render_answer_key(&format!("Final Exam Answer Key: {}", exam.title)),
        )?;
        log::info!("Wrote final exam {}", files.questions.display());
        Ok(files)
    }
}
