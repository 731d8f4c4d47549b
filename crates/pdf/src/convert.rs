//! Presentation to slide images: convert to PDF with an office suite, then
//! rasterize the PDF.

use crate::raster::Rasterizer;
use crate::tools::{Tool, ToolRunner};
use deck_core::sink::SLIDES_DIR;
use deck_core::{Error, RenderedPage, Result, SourceFile, TreeWriter};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Executable names for LibreOffice, in lookup order.
const LIBREOFFICE: &[&str] = &["libreoffice", "soffice"];
const UNOCONV: &str = "unoconv";

/// An installed document converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converter {
    LibreOffice(Tool),
    Unoconv(Tool),
}

impl Converter {
    /// Installed converters, LibreOffice first.
    pub fn probe_all() -> Vec<Self> {
        let mut converters = Vec::new();
        if let Some(tool) = Tool::find_first(LIBREOFFICE) {
            converters.push(Converter::LibreOffice(tool));
        }
        if let Some(tool) = Tool::find(UNOCONV) {
            converters.push(Converter::Unoconv(tool));
        }
        converters
    }

    /// The underlying executable.
    pub fn tool(&self) -> &Tool {
        match self {
            Converter::LibreOffice(tool) | Converter::Unoconv(tool) => tool,
        }
    }

    /// Arguments converting `source` to PDF inside `out_dir`.
    pub fn args<'a>(&self, source: &'a Path, out_dir: &'a Path) -> Vec<&'a OsStr> {
        match self {
            Converter::LibreOffice(_) => vec![
                OsStr::new("--headless"),
                OsStr::new("--convert-to"),
                OsStr::new("pdf"),
                OsStr::new("--outdir"),
                out_dir.as_os_str(),
                source.as_os_str(),
            ],
            Converter::Unoconv(_) => vec![
                OsStr::new("-f"),
                OsStr::new("pdf"),
                OsStr::new("-o"),
                out_dir.as_os_str(),
                source.as_os_str(),
            ],
        }
    }

    /// Convert `source` to `<out_dir>/<stem>.pdf`.
    ///
    /// Returns `None` if the converter ran but the PDF did not appear.
    pub fn convert(
        &self,
        runner: &ToolRunner,
        source: &SourceFile,
        out_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        runner.run(self.tool(), self.args(&source.path, out_dir))?;

        let pdf = out_dir.join(format!("{}.pdf", source.stem));
        if pdf.is_file() {
            Ok(Some(pdf))
        } else {
            log::warn!(
                "{} finished but {} was not created",
                self.tool().name,
                pdf.display()
            );
            Ok(None)
        }
    }
}

/// Result of rendering a presentation's slides.
#[derive(Debug, Default)]
pub struct SlideImages {
    /// Intermediate PDF, when the conversion succeeded.
    pub pdf: Option<PathBuf>,
    /// Rendered slides, in order.
    pub slides: Vec<RenderedPage>,
}

/// Renders every slide of a presentation to `slides/slide_N.png`.
#[derive(Debug, Clone)]
pub struct SlideRenderer {
    runner: ToolRunner,
    dpi: u32,
}

impl SlideRenderer {
    /// Create a renderer.
    pub fn new(runner: ToolRunner, dpi: u32) -> Self {
        Self {
            runner,
            dpi: dpi.max(1),
        }
    }

    /// Convert and rasterize `source` below `writer`'s root.
    ///
    /// Without a converter the result is empty. A missing rasterizer is
    /// reported before any conversion runs.
    pub fn render(&self, source: &SourceFile, writer: &TreeWriter) -> Result<SlideImages> {
        let converters = Converter::probe_all();
        if converters.is_empty() {
            log::warn!("Neither LibreOffice nor unoconv is installed");
            return Ok(SlideImages::default());
        }
        let rasterizer = Rasterizer::require()?;
        self.render_with(&converters, &rasterizer, source, writer)
    }

    /// Try each converter in order until one produces a PDF, then rasterize it.
    ///
    /// A converter that fails or writes no PDF hands over to the next one; a
    /// timeout ends the run. When every converter fails the result is empty.
    pub fn render_with(
        &self,
        converters: &[Converter],
        rasterizer: &Rasterizer,
        source: &SourceFile,
        writer: &TreeWriter,
    ) -> Result<SlideImages> {
        for converter in converters {
            log::info!("Converting with {}", converter.tool().name);
            let pdf = match converter.convert(&self.runner, source, writer.root()) {
                Ok(Some(pdf)) => pdf,
                Ok(None) => continue,
                Err(e @ Error::ToolFailed { .. }) => {
                    log::warn!("{}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let dir = writer.subdir(SLIDES_DIR)?;
            let slides = rasterizer.render(&self.runner, &pdf, &dir, "slide", self.dpi)?;
            return Ok(SlideImages {
                pdf: Some(pdf),
                slides,
            });
        }

        log::warn!("No converter produced a PDF from {}", source.filename());
        Ok(SlideImages::default())
    }
}
