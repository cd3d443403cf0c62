//! Collaborators backed by external shell commands.
//!
//! Each command is a template run through `sh -c`. Placeholders such as
//! `{prompt}` or `{output}` are replaced by single-quoted values before the
//! command runs.

use course_core::{
    Error, ImageGenerator, ImageRequest, NarrationComposer, NarrationTimeline, RenderedSlide, Result,
    SnapshotComposer, TextGenerator,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// A shell command with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    template: String,
}

impl CommandTemplate {
    /// Create a template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitute every placeholder with its quoted value.
    ///
    /// Placeholders without a value are left untouched.
    /// Substituted values are never scanned again.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut command = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            command.push_str(&rest[..start]);
            let tail = &rest[start + 1..];
            let var = vars
                .iter()
                .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
            match var {
                Some((name, value)) => {
                    command.push_str(&shell_quote(value));
                    rest = &tail[name.len() + 1..];
                }
                None => {
                    command.push('{');
                    rest = tail;
                }
            }
        }

        command.push_str(rest);
        command
    }

    /// Run the rendered command, feeding `stdin` if given, and return its stdout.
    pub fn run(&self, vars: &[(&str, &str)], stdin: Option<&str>) -> Result<String> {
        let command = self.render(vars);
        log::debug!("Running: {}", command);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::collaborator(format!("Failed to spawn '{}': {}", command, e)))?;

        // The child may block on a full stdout pipe until we read it.
        let feeder = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => {
                let input = input.to_owned();
                Some(thread::spawn(move || pipe.write_all(input.as_bytes())))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| Error::collaborator(format!("Failed to wait for '{}': {}", command, e)))?;

        if let Some(Ok(Err(e))) = feeder.map(|handle| handle.join()) {
            // A command that ignores stdin may close it early.
            log::debug!("Could not write stdin: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::collaborator(format!(
                "Command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Quote a value for POSIX `sh`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Text generation through `{prompt}` and `{system}`; the prompt is also
/// written to stdin.
#[derive(Debug, Clone)]
pub struct CommandText {
    command: CommandTemplate,
}

impl CommandText {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            command: CommandTemplate::new(template),
        }
    }
}

impl TextGenerator for CommandText {
    fn generate(&mut self, user_prompt: &str, system_prompt: &str) -> Result<String> {
        let response = self
            .command
            .run(&[("prompt", user_prompt), ("system", system_prompt)], Some(user_prompt))?;
        if response.trim().is_empty() {
            return Err(Error::collaborator("Text command returned nothing"));
        }
        Ok(response)
    }
}

/// Image generation, one command run per request with `{prompt}` and `{output}`.
#[derive(Debug, Clone)]
pub struct CommandImages {
    command: CommandTemplate,
}

impl CommandImages {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            command: CommandTemplate::new(template),
        }
    }
}

impl ImageGenerator for CommandImages {
    fn generate_batch(&mut self, requests: &[ImageRequest]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(requests.len());
        let mut last_error = None;

        for request in requests {
            ensure_parent(&request.target)?;
            let output = path_str(&request.target);
            let result = self
                .command
                .run(&[("prompt", request.prompt.as_str()), ("output", output.as_str())], None);

            match result {
                Ok(_) if request.target.is_file() => written.push(request.target.clone()),
                Ok(_) => {
                    log::warn!("Image command wrote nothing for '{}'", request.title);
                }
                Err(e) => {
                    log::warn!("Image for '{}' failed: {}", request.title, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if written.is_empty() => Err(e),
            _ => Ok(written),
        }
    }
}

/// Slide snapshots with `{input}` (the slide image, empty when the slide
/// has none), `{title}` and `{output}`.
#[derive(Debug, Clone)]
pub struct CommandSnapshots {
    command: CommandTemplate,
}

impl CommandSnapshots {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            command: CommandTemplate::new(template),
        }
    }
}

impl SnapshotComposer for CommandSnapshots {
    fn compose(&mut self, slide: &RenderedSlide, target: &Path) -> Result<PathBuf> {
        ensure_parent(target)?;
        let input = slide.image.as_deref().map(path_str).unwrap_or_default();
        let output = path_str(target);
        self.command.run(
            &[
                ("input", input.as_str()),
                ("title", slide.title.as_str()),
                ("output", output.as_str()),
            ],
            None,
        )?;

        if target.is_file() {
            Ok(target.to_path_buf())
        } else {
            Err(Error::collaborator(format!("Snapshot command did not write {}", output)))
        }
    }
}

/// Narration through a speech command (`{text}`, `{output}`) and an
/// optional video command (`{input}`, `{output}`).
///
/// The speech command may print the audio length in seconds. The video
/// command receives the timeline as a JSON file.
#[derive(Debug, Clone)]
pub struct CommandNarration {
    speech: CommandTemplate,
    video: Option<CommandTemplate>,
}

impl CommandNarration {
    pub fn new(speech: impl Into<String>) -> Self {
        Self {
            speech: CommandTemplate::new(speech),
            video: None,
        }
    }

    pub fn with_video(mut self, template: impl Into<String>) -> Self {
        self.video = Some(CommandTemplate::new(template));
        self
    }
}

impl NarrationComposer for CommandNarration {
    fn synthesize(&mut self, text: &str, target: &Path) -> Result<Option<f64>> {
        ensure_parent(target)?;
        let output = path_str(target);
        let stdout = self
            .speech
            .run(&[("text", text), ("output", output.as_str())], Some(text))?;

        if !target.is_file() {
            return Err(Error::collaborator(format!("Speech command did not write {}", output)));
        }
        Ok(stdout.trim().parse::<f64>().ok().filter(|d| *d > 0.0))
    }

    fn compose_video(&mut self, timeline: &NarrationTimeline, target: &Path) -> Result<()> {
        let Some(video) = &self.video else {
            return Err(Error::collaborator("No video command configured"));
        };

        let mut segments = tempfile::Builder::new().suffix(".json").tempfile()?;
        serde_json::to_writer_pretty(segments.as_file_mut(), timeline)?;
        segments.as_file_mut().flush()?;

        ensure_parent(target)?;
        let input = path_str(segments.path());
        let output = path_str(target);
        video.run(&[("input", input.as_str()), ("output", output.as_str())], None)?;
        Ok(())
    }
}

/// Stand-in for a collaborator with no command configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl TextGenerator for Unavailable {
    fn generate(&mut self, _user_prompt: &str, _system_prompt: &str) -> Result<String> {
        Err(Error::collaborator("No text command configured"))
    }
}

impl ImageGenerator for Unavailable {
    fn generate_batch(&mut self, _requests: &[ImageRequest]) -> Result<Vec<PathBuf>> {
        Err(Error::collaborator("No image command configured"))
    }
}
