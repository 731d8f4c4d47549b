//! Backend discovery and the PDF extraction policy.
//!
//! Backends, best first:
//!
//! 1. [`Backend::Structured`]: text and embedded images via `lopdf`.
//! 2. [`Backend::Raster`]: whole pages rendered to PNG by `pdftoppm`.
//! 3. [`Backend::Layout`]: layout-preserving text via `pdftotext`.
//!
//! Availability is decided once, before extraction starts.

use crate::layout::LayoutText;
use crate::raster::{Rasterizer, DEFAULT_PAGE_DPI};
use crate::structured::StructuredPdf;
use crate::tools::ToolRunner;
use deck_core::sink::{IMAGES_DIR, PAGE_IMAGES_DIR};
use deck_core::{ExtractedPage, RenderedPage, Result, TreeWriter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// An extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    Structured,
    Raster,
    Layout,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Structured => "structured (lopdf)",
            Backend::Raster => "raster (pdftoppm)",
            Backend::Layout => "layout text (pdftotext)",
        };
        f.write_str(name)
    }
}

/// Which backends may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendChoice {
    /// Use the best available backend.
    #[default]
    Auto,
    /// Use only this backend.
    Only(Backend),
}

impl BackendChoice {
    fn allows(&self, backend: Backend) -> bool {
        match self {
            BackendChoice::Auto => true,
            BackendChoice::Only(only) => *only == backend,
        }
    }
}

/// The backends that are usable for one document.
#[derive(Default)]
pub struct BackendSet {
    pub structured: Option<StructuredPdf>,
    pub raster: Option<Rasterizer>,
    pub layout: Option<LayoutText>,
}

impl BackendSet {
    /// Probe every permitted backend against `pdf`.
    ///
    /// The structured backend counts as available when `lopdf` can load the
    /// document; the others when their executable is on `PATH`.
    pub fn probe(pdf: &Path, choice: BackendChoice) -> Self {
        let structured = if choice.allows(Backend::Structured) {
            match StructuredPdf::load(pdf) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    log::warn!("Structured backend unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let raster = choice
            .allows(Backend::Raster)
            .then(Rasterizer::probe)
            .flatten();
        let layout = choice
            .allows(Backend::Layout)
            .then(LayoutText::probe)
            .flatten();

        let backends = Self {
            structured,
            raster,
            layout,
        };
        log::debug!("Available backends: {:?}", backends.available());
        backends
    }

    /// Available backends, best first.
    pub fn available(&self) -> Vec<Backend> {
        let mut backends = Vec::new();
        if self.structured.is_some() {
            backends.push(Backend::Structured);
        }
        if self.raster.is_some() {
            backends.push(Backend::Raster);
        }
        if self.layout.is_some() {
            backends.push(Backend::Layout);
        }
        backends
    }
}

/// What a PDF extraction produced.
#[derive(Debug, Default)]
pub struct PdfOutcome {
    /// Page records with text and embedded images.
    pub pages: Vec<ExtractedPage>,
    /// Embedded images written under `images/`.
    pub image_paths: Vec<PathBuf>,
    /// Pages rendered under `page_images/`.
    pub rendered: Vec<RenderedPage>,
    /// Backend that produced the images, if any.
    pub image_backend: Option<Backend>,
    /// Backend that produced the page texts, if any.
    pub text_backend: Option<Backend>,
}

/// Extracts text and images from a PDF using the best available backends.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    runner: ToolRunner,
    choice: BackendChoice,
    dpi: u32,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self {
            runner: ToolRunner::default(),
            choice: BackendChoice::Auto,
            dpi: DEFAULT_PAGE_DPI,
        }
    }
}

impl PdfExtractor {
    /// Create an extractor that picks backends automatically.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific tool runner.
    pub fn with_runner(mut self, runner: ToolRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Restrict backend selection.
    pub fn with_backend(mut self, choice: BackendChoice) -> Self {
        self.choice = choice;
        self
    }

    /// Resolution for rendered pages.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    /// Extract `pdf`, writing images below `writer`'s root.
    ///
    /// When no backend is usable the outcome is empty; that is not an error.
    pub fn extract(&self, pdf: &Path, writer: &TreeWriter) -> Result<PdfOutcome> {
        let backends = BackendSet::probe(pdf, self.choice);
        self.extract_with(&backends, pdf, writer)
    }

    /// Extract `pdf` with an already probed backend set.
    pub fn extract_with(
        &self,
        backends: &BackendSet,
        pdf: &Path,
        writer: &TreeWriter,
    ) -> Result<PdfOutcome> {
        let mut outcome = PdfOutcome::default();

        if let Some(doc) = &backends.structured {
            log::info!("Using {}", Backend::Structured);
            outcome.pages = doc.pages();
            let images: Vec<_> = outcome
                .pages
                .iter()
                .flat_map(|p| p.images.iter().cloned())
                .collect();
            outcome.image_paths = writer.write_images(IMAGES_DIR, &images)?;
            outcome.image_backend = Some(Backend::Structured);
            outcome.text_backend = Some(Backend::Structured);
        } else if let Some(raster) = &backends.raster {
            log::info!("Using {}", Backend::Raster);
            let dir = writer.subdir(PAGE_IMAGES_DIR)?;
            outcome.rendered = raster.render(&self.runner, pdf, &dir, "page", self.dpi)?;
            outcome.image_backend = Some(Backend::Raster);
        }

        if outcome.pages.is_empty() {
            if let Some(layout) = &backends.layout {
                log::info!("Using {}", Backend::Layout);
                outcome.pages = layout.extract(&self.runner, pdf)?;
                outcome.text_backend = Some(Backend::Layout);
            }
        }

        Ok(outcome)
    }
}
