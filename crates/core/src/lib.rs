//! Core of the course generator: outline parsing, slide projection,
//! artifact correlation, batch coordination and render assembly.

pub mod assemble;
pub mod assessment;
pub mod authoring;
pub mod config;
pub mod coordinator;
pub mod correlate;
pub mod error;
pub mod extract;
pub mod outline;
pub mod projector;
pub mod sanitize;
pub mod types;

pub use assemble::{
    ArtifactPrefix, AssemblyReport, DeckPlan, DeckWriter, NarrationComposer, NarrationTimeline,
    RenderAssembler, RenderedSlide, Renderers, SnapshotComposer,
};
pub use assessment::{Assessment, AssessmentFiles, ExamGenerator, QuizGenerator};
pub use config::PipelineConfig;
pub use coordinator::{
    BatchArtifactCoordinator, ImageGenerator, ImageMap, ImageRequest, SideFilePolicy,
    SlideArtifacts, TextGenerator,
};
pub use correlate::{ArtifactKind, ArtifactMap, KeyCorrelator, Resolution};
pub use error::{Error, Result};
pub use outline::{parse, parse_with, ParseOptions};
pub use projector::SlideProjector;
pub use types::{
    CourseOutline, Module, NumericPath, SlideId, SlideLevel, SlideSpec, StyleTag, Subtopic, Topic,
};
