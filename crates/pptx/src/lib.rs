//! PPTX (Office Open XML) backend for generated course decks.
//!
//! Writes decks as ZIP archives of PresentationML parts and reads them back
//! for inspection.

pub mod parts;
pub mod reader;
pub mod writer;

pub use reader::{DeckSlide, PptxReader};
pub use writer::PptxDeckWriter;
