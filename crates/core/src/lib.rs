//! Core domain types, title classification, and output sinks for
//! PowerPoint and PDF content extraction.

pub mod classify;
pub mod error;
pub mod html;
pub mod locate;
pub mod sink;
pub mod types;

pub use classify::{
    Classification, Classifier, FirstRun, FontSize, TextShape, UnknownReason,
    DEFAULT_TITLE_THRESHOLD_PT,
};
pub use error::{Error, Result};
pub use html::{HtmlRenderer, HtmlStyle};
pub use locate::{locate_source, SourceFile};
pub use sink::{Overview, TreeWriter};
pub use types::{
    DocumentFormat, ExtractedImage, ExtractedPage, RenderedPage, RunSummary, SlideContent,
};
