//! PDF backends for content extraction.
//!
//! Text and embedded images are read with `lopdf` when the document loads;
//! otherwise poppler's `pdftoppm` and `pdftotext` are used if installed.
//! The [`convert`] module turns a presentation into per-slide PNGs by way of
//! an office suite and the rasterizer.

pub mod backend;
pub mod convert;
pub mod layout;
pub mod raster;
pub mod structured;
pub mod tools;

pub use backend::{Backend, BackendChoice, BackendSet, PdfExtractor, PdfOutcome};
pub use convert::{Converter, SlideImages, SlideRenderer};
pub use layout::LayoutText;
pub use raster::{dpi_for_scale, Rasterizer, DEFAULT_PAGE_DPI};
pub use structured::StructuredPdf;
pub use tools::{Tool, ToolRunner, DEFAULT_TIMEOUT};
