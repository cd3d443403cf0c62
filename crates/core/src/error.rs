//! Error types for course generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating a course.
///
/// Only [`Error::EmptyOutline`] is meant to stop a run; everything else is
/// caught at the stage that produced it and degraded to fallback output.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The outline contains nothing besides (at most) its title line.
    #[error("Course outline is empty")]
    EmptyOutline,

    /// An external collaborator (text, image, narration...) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The deck writer failed.
    #[error("Deck error: {0}")]
    DeckError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML writing or parsing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}

impl Error {
    /// Shorthand for a collaborator failure.
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator(message.into())
    }
}
