//! PPTX (Office Open XML) backend for content extraction.
//!
//! Parses .pptx files which are ZIP archives containing XML documents,
//! reading slide text (with first-run font sizes for title detection) and
//! the embedded image parts referenced by picture shapes.

pub mod deck;
pub mod parser;
pub mod rels;
pub mod shapes;

pub use deck::{Deck, ParsedSlide, Picture};
pub use parser::PptxParser;
