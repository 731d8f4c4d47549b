//! CLI tool for extracting text and images from PowerPoint and PDF files.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deck_core::sink::{write_images_to, IMAGES_DIR, SLIDES_DIR};
use deck_core::{
    locate_source, Classifier, DocumentFormat, ExtractedPage, FontSize, HtmlRenderer, HtmlStyle,
    Overview, RunSummary, SourceFile, TreeWriter, DEFAULT_TITLE_THRESHOLD_PT,
};
use deck_pdf::{
    dpi_for_scale, Backend, BackendChoice, PdfExtractor, Rasterizer, SlideRenderer, ToolRunner,
    DEFAULT_PAGE_DPI,
};
use deck_pptx::PptxParser;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extract text and images from PowerPoint and PDF files.
#[derive(Parser, Debug)]
#[command(name = "deck-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Time limit in seconds for each external tool
    #[arg(long, global = true, default_value = "120")]
    timeout: u64,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract page text and embedded images from a PDF
    Pdf {
        /// Input PDF file
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Backend to use
        #[arg(long, value_enum, default_value = "auto")]
        backend: BackendArg,

        /// Resolution for rendered pages
        #[arg(long, default_value_t = DEFAULT_PAGE_DPI)]
        dpi: u32,
    },

    /// Copy the pictures embedded in a presentation
    Images {
        /// Input .pptx file
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render every slide to a PNG (needs LibreOffice or unoconv, and poppler)
    Slides {
        /// Input .pptx or .pdf file
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Zoom factor relative to 72 dpi
        #[arg(long, default_value = "2")]
        scale: f32,
    },

    /// Write slide text as HTML fragments
    Html {
        /// Input .pptx file
        input: PathBuf,

        /// Output HTML file
        #[arg(short, long)]
        output: PathBuf,

        /// Fragment structure
        #[arg(long, value_enum, default_value = "integrated")]
        style: StyleArg,

        /// Label placed before each slide number
        #[arg(long, default_value = "Slide")]
        heading: String,

        /// Font size in points above which a text counts as a title
        #[arg(long, default_value_t = DEFAULT_TITLE_THRESHOLD_PT)]
        title_threshold: f64,

        /// Also copy slide pictures here and reference them from the HTML
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Auto,
    Structured,
    Raster,
    Layout,
}

impl From<BackendArg> for BackendChoice {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendChoice::Auto,
            BackendArg::Structured => BackendChoice::Only(Backend::Structured),
            BackendArg::Raster => BackendChoice::Only(Backend::Raster),
            BackendArg::Layout => BackendChoice::Only(Backend::Layout),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    Integrated,
    Simple,
}

impl From<StyleArg> for HtmlStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Integrated => HtmlStyle::Integrated,
            StyleArg::Simple => HtmlStyle::Simple,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let runner = ToolRunner::new().with_timeout(Duration::from_secs(args.timeout.max(1)));
    log::debug!("External tool timeout: {:?}", runner.timeout());

    let summary = match &args.command {
        Command::Pdf {
            input,
            output,
            backend,
            dpi,
        } => {
            let source = locate(input)?;
            let extractor = PdfExtractor::new()
                .with_runner(runner)
                .with_backend((*backend).into())
                .with_dpi(*dpi);
            run_pdf(&source, output, &extractor, args.json)?
        }
        Command::Images { input, output } => {
            let source = locate(input)?;
            match source.format {
                DocumentFormat::Pptx => run_images(&source, output, args.json)?,
                DocumentFormat::Pdf => {
                    let extractor = PdfExtractor::new().with_runner(runner);
                    run_pdf(&source, output, &extractor, args.json)?
                }
            }
        }
        Command::Slides {
            input,
            output,
            scale,
        } => {
            let source = locate(input)?;
            run_slides(&source, output, runner, *scale, args.json)?
        }
        Command::Html {
            input,
            output,
            style,
            heading,
            title_threshold,
            images_dir,
        } => {
            let source = locate(input)?;
            let threshold = FontSize::from_points(*title_threshold)
                .with_context(|| format!("Invalid title threshold: {}", title_threshold))?;
            let classifier = Classifier::new().with_threshold(threshold);
            log::debug!("Title threshold: {}", classifier.threshold());
            let renderer = HtmlRenderer::new()
                .with_style((*style).into())
                .with_heading(heading.as_str());
            run_html(
                &source,
                output,
                &classifier,
                renderer,
                images_dir.as_deref(),
                args.json,
            )?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Check the input before anything is written.
fn locate(input: &Path) -> Result<SourceFile> {
    let source = locate_source(input)
        .with_context(|| format!("Cannot use input {}", input.display()))?;
    log::info!(
        "Processing: {} ({})",
        source.path.display(),
        source.format.label()
    );
    Ok(source)
}

/// Write page texts and the overview, returning the files written.
fn write_text_outputs(writer: &TreeWriter, pages: &[ExtractedPage]) -> Result<Vec<PathBuf>> {
    let mut outputs = Vec::new();
    if let Some(path) = writer.write_text(pages)? {
        outputs.push(path);
    }
    outputs.push(writer.write_overview(&Overview::from_pages(pages))?);
    Ok(outputs)
}

fn run_pdf(
    source: &SourceFile,
    output: &Path,
    extractor: &PdfExtractor,
    quiet: bool,
) -> Result<RunSummary> {
    if source.format != DocumentFormat::Pdf {
        bail!("{} is not a PDF", source.path.display());
    }

    let writer = TreeWriter::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let outcome = extractor
        .extract(&source.path, &writer)
        .with_context(|| format!("Failed to extract {}", source.filename()))?;

    let mut outputs = outcome.image_paths.clone();
    outputs.extend(outcome.rendered.iter().map(|p| p.path.clone()));
    outputs.extend(write_text_outputs(&writer, &outcome.pages)?);

    let pages = if outcome.pages.is_empty() && outcome.rendered.is_empty() {
        None
    } else {
        Some(outcome.pages.len().max(outcome.rendered.len()))
    };
    let images = outcome.image_paths.len() + outcome.rendered.len();

    if !quiet {
        match (outcome.image_backend, outcome.text_backend) {
            (None, None) => println!("No PDF backend available; nothing extracted."),
            (image_backend, text_backend) => {
                if let Some(backend) = image_backend {
                    println!("Images: {}", backend);
                }
                if let Some(backend) = text_backend {
                    println!("Text:   {}", backend);
                }
            }
        }
        match pages {
            Some(n) => println!("Pages: {}", n),
            None => println!("Pages: unknown"),
        }
        println!("Extracted {} images to {}", images, output.display());
    }

    Ok(RunSummary {
        source: source.path.clone(),
        pages,
        images,
        outputs,
    })
}

fn run_images(source: &SourceFile, output: &Path, quiet: bool) -> Result<RunSummary> {
    let deck = PptxParser::new()
        .open(&source.path)
        .with_context(|| format!("Failed to parse {}", source.filename()))?;
    let pages = deck.pages();

    let writer = TreeWriter::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let images: Vec<_> = pages.iter().flat_map(|p| p.images.iter().cloned()).collect();
    let mut outputs = writer.write_images(IMAGES_DIR, &images)?;
    let image_count = outputs.len();
    outputs.extend(write_text_outputs(&writer, &pages)?);

    if !quiet {
        println!("Slides: {}", deck.slide_count());
        println!(
            "Extracted {} images to {}",
            image_count,
            output.join(IMAGES_DIR).display()
        );
    }

    Ok(RunSummary {
        source: source.path.clone(),
        pages: Some(deck.slide_count()),
        images: image_count,
        outputs,
    })
}

fn run_slides(
    source: &SourceFile,
    output: &Path,
    runner: ToolRunner,
    scale: f32,
    quiet: bool,
) -> Result<RunSummary> {
    let writer = TreeWriter::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let dpi = dpi_for_scale(scale);

    let slides = match source.format {
        DocumentFormat::Pptx => {
            let rendered = SlideRenderer::new(runner, dpi)
                .render(source, &writer)
                .with_context(|| format!("Failed to render {}", source.filename()))?;
            if rendered.pdf.is_none() && !quiet {
                println!("No converter produced a PDF; install LibreOffice or unoconv.");
            }
            rendered.slides
        }
        DocumentFormat::Pdf => {
            let rasterizer = Rasterizer::require()?;
            let dir = writer.subdir(SLIDES_DIR)?;
            rasterizer
                .render(&runner, &source.path, &dir, "slide", dpi)
                .with_context(|| format!("Failed to render {}", source.filename()))?
        }
    };

    if !quiet {
        for slide in &slides {
            println!("  {}", slide.path.display());
        }
        println!("Rendered {} slides", slides.len());
    }

    Ok(RunSummary {
        source: source.path.clone(),
        pages: (!slides.is_empty()).then_some(slides.len()),
        images: slides.len(),
        outputs: slides.into_iter().map(|s| s.path).collect(),
    })
}

fn run_html(
    source: &SourceFile,
    output: &Path,
    classifier: &Classifier,
    renderer: HtmlRenderer,
    images_dir: Option<&Path>,
    quiet: bool,
) -> Result<RunSummary> {
    if source.format != DocumentFormat::Pptx {
        bail!("HTML output needs a .pptx input, got {}", source.filename());
    }

    let deck = PptxParser::new()
        .open(&source.path)
        .with_context(|| format!("Failed to parse {}", source.filename()))?;
    let slides = deck.slide_contents(classifier);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut outputs = Vec::new();
    let renderer = match images_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let images: Vec<_> = slides.iter().flat_map(|s| s.images.iter().cloned()).collect();
            outputs.extend(write_images_to(dir, &images)?);
            renderer.with_images_href(images_href(output, dir)?)
        }
        None => renderer,
    };

    let html = renderer.render(&slides);
    fs::write(output, &html).with_context(|| format!("Failed to write {}", output.display()))?;
    let image_count = outputs.len();
    outputs.push(output.to_path_buf());

    if !quiet {
        let unclassified: usize = slides.iter().map(|s| s.unclassified).sum();
        println!("Slides: {}", slides.len());
        if unclassified > 0 {
            println!("Texts without a declared font size: {}", unclassified);
        }
        println!("Wrote {}", output.display());
    }

    Ok(RunSummary {
        source: source.path.clone(),
        pages: Some(slides.len()),
        images: image_count,
        outputs,
    })
}

/// Image directory as referenced from the HTML file.
///
/// Both directories must exist. The link is relative to the HTML file's
/// directory, climbing with `..` where needed; a `file://` URL is used when no
/// relative path exists.
fn images_href(html: &Path, images_dir: &Path) -> Result<String> {
    let base = html
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let base = base
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", base.display()))?;
    let images = images_dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", images_dir.display()))?;

    let href = match pathdiff::diff_paths(&images, &base) {
        Some(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Some(relative) => relative.to_string_lossy().replace('\\', "/"),
        None => format!("file://{}", images.to_string_lossy().replace('\\', "/")),
    };
    Ok(href)
}
