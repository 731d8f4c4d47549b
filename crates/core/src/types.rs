//! Domain types for representing extracted document content.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The format of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// PowerPoint presentation (Office Open XML).
    Pptx,
    /// Portable Document Format.
    Pdf,
}

impl DocumentFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        None
    }

    /// Human-readable name used in console output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pptx => "PowerPoint",
            Self::Pdf => "PDF",
        }
    }
}

/// An image copied out of a slide or page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// 1-based page or slide number.
    pub page: usize,

    /// 1-based index of the owning shape (PPTX) or of the image on the page (PDF).
    pub shape: usize,

    /// Raw image bytes as they will be written to disk.
    #[serde(skip)]
    pub bytes: Vec<u8>,

    /// File extension without the dot (`png`, `jpg`, ...).
    pub extension: String,

    /// Deterministic output filename.
    pub filename: String,
}

impl ExtractedImage {
    /// Create an image record with an explicit filename.
    pub fn new(
        page: usize,
        shape: usize,
        bytes: Vec<u8>,
        extension: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            page,
            shape,
            bytes,
            extension: extension.into(),
            filename: filename.into(),
        }
    }

    /// A picture placed directly on a slide: `slide_{n}_img_{shape}.{ext}`.
    pub fn slide_picture(slide: usize, shape: usize, bytes: Vec<u8>, ext: &str) -> Self {
        let filename = format!("slide_{}_img_{}.{}", slide, shape, ext);
        Self::new(slide, shape, bytes, ext, filename)
    }

    /// A picture nested in a group shape: `slide_{n}_group_{shape}_img_{ordinal}.{ext}`,
    /// where `ordinal` is the 1-based count of images in the deck so far.
    pub fn group_picture(
        slide: usize,
        shape: usize,
        ordinal: usize,
        bytes: Vec<u8>,
        ext: &str,
    ) -> Self {
        let filename = format!("slide_{}_group_{}_img_{}.{}", slide, shape, ordinal, ext);
        Self::new(slide, shape, bytes, ext, filename)
    }

    /// An image referenced by a PDF page: `page_{n}_img_{index}.{ext}`.
    pub fn page_image(page: usize, index: usize, bytes: Vec<u8>, ext: &str) -> Self {
        let filename = format!("page_{}_img_{}.{}", page, index, ext);
        Self::new(page, index, bytes, ext, filename)
    }
}

/// A single extracted page or slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// 1-based page number.
    pub number: usize,

    /// Text content in reading order.
    pub text: String,

    /// Images found on this page.
    pub images: Vec<ExtractedImage>,
}

impl ExtractedPage {
    /// Create a page with text and no images.
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            images: Vec::new(),
        }
    }

    /// Attach images to this page.
    pub fn with_images(mut self, images: Vec<ExtractedImage>) -> Self {
        self.images = images;
        self
    }
}

/// A page or slide rasterized to an image file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPage {
    /// 1-based page number.
    pub number: usize,

    /// Location of the written image.
    pub path: PathBuf,

    /// File name component of `path`.
    pub filename: String,
}

/// Slide text split into title and body sections for HTML output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlideContent {
    /// 1-based slide number.
    pub number: usize,

    /// Text runs classified as titles, in shape order.
    pub titles: Vec<String>,

    /// Body texts, in shape order.
    pub texts: Vec<String>,

    /// Number of entries in `texts` whose classification was unknown.
    pub unclassified: usize,

    /// Every text in shape order, regardless of classification.
    pub all_texts: Vec<String>,

    /// Pictures on this slide.
    #[serde(skip)]
    pub images: Vec<ExtractedImage>,
}

impl SlideContent {
    /// Create an empty slide.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Whether the slide has neither text nor images.
    pub fn is_empty(&self) -> bool {
        self.all_texts.is_empty() && self.images.is_empty()
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Source document.
    pub source: PathBuf,

    /// Number of pages or slides, when known.
    pub pages: Option<usize>,

    /// Number of images written.
    pub images: usize,

    /// Files written during the run.
    pub outputs: Vec<PathBuf>,
}
