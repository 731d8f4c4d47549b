//! File-tree output: images, concatenated text, and an overview summary.
//!
//! Layout under the output root:
//!
//! ```text
//! <root>/images/page_1_img_1.jpg
//! <root>/slides/slide_1.png
//! <root>/page_images/page_1.png
//! <root>/extracted_text.txt
//! <root>/overview.txt
//! ```

use crate::error::Result;
use crate::types::{ExtractedImage, ExtractedPage};
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory for embedded images.
pub const IMAGES_DIR: &str = "images";
/// Subdirectory for rasterized slides.
pub const SLIDES_DIR: &str = "slides";
/// Subdirectory for rasterized PDF pages.
pub const PAGE_IMAGES_DIR: &str = "page_images";
/// Name of the concatenated text file.
pub const TEXT_FILE: &str = "extracted_text.txt";
/// Name of the overview file.
pub const OVERVIEW_FILE: &str = "overview.txt";

/// Number of pages previewed in the overview.
const PREVIEW_PAGES: usize = 3;
/// Characters kept per previewed page.
const PREVIEW_CHARS: usize = 200;
/// Width of banner rules.
const RULE_WIDTH: usize = 60;

/// Writes extraction results below an output root directory.
#[derive(Debug, Clone)]
pub struct TreeWriter {
    root: PathBuf,
}

impl TreeWriter {
    /// Create the output root (and parents) if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a subdirectory of the root if needed and return its path.
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write each image into `subdir` under its own filename.
    ///
    /// The subdirectory is only created when there is something to write.
    pub fn write_images(&self, subdir: &str, images: &[ExtractedImage]) -> Result<Vec<PathBuf>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }
        let dir = self.subdir(subdir)?;
        write_images_to(&dir, images)
    }

    /// Write all page texts to `extracted_text.txt`, each preceded by a banner.
    ///
    /// Returns `None` when there are no pages.
    pub fn write_text(&self, pages: &[ExtractedPage]) -> Result<Option<PathBuf>> {
        if pages.is_empty() {
            return Ok(None);
        }
        let path = self.root.join(TEXT_FILE);
        fs::write(&path, render_text(pages))?;
        Ok(Some(path))
    }

    /// Write `overview.txt`. Always written, even for an empty document.
    pub fn write_overview(&self, overview: &Overview) -> Result<PathBuf> {
        let path = self.root.join(OVERVIEW_FILE);
        fs::write(&path, overview.render())?;
        Ok(path)
    }
}

/// Write images into an existing directory, returning the written paths.
pub fn write_images_to(dir: &Path, images: &[ExtractedImage]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(images.len());
    for image in images {
        let path = dir.join(&image.filename);
        fs::write(&path, &image.bytes)?;
        log::debug!("Wrote {} ({} bytes)", path.display(), image.bytes.len());
        written.push(path);
    }
    Ok(written)
}

/// Concatenate page texts with page banners.
pub fn render_text(pages: &[ExtractedPage]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    for page in pages {
        out.push_str(&format!("\n{}\nPAGE {}\n{}\n\n", rule, page.number, rule));
        out.push_str(&page.text);
        out.push_str("\n\n");
    }
    out
}

/// Summary of a run written to `overview.txt`.
#[derive(Debug, Clone, Default)]
pub struct Overview {
    /// Page count, `None` when no page records were produced.
    pub page_count: Option<usize>,

    /// `(page, filename)` for every written image.
    pub images: Vec<(usize, String)>,

    /// `(page, text)` for the first pages.
    pub previews: Vec<(usize, String)>,
}

impl Overview {
    /// Build an overview from extracted pages and the images written for them.
    pub fn from_pages(pages: &[ExtractedPage]) -> Self {
        let page_count = if pages.is_empty() {
            None
        } else {
            Some(pages.len())
        };

        let images = pages
            .iter()
            .flat_map(|p| p.images.iter().map(|i| (i.page, i.filename.clone())))
            .collect();

        let previews = pages
            .iter()
            .take(PREVIEW_PAGES)
            .map(|p| (p.number, preview(&p.text)))
            .collect();

        Self {
            page_count,
            images,
            previews,
        }
    }

    /// Render the overview text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("CONTENT OVERVIEW\n");
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push_str("\n\n");

        match self.page_count {
            Some(n) => out.push_str(&format!("Pages: {}\n", n)),
            None => out.push_str("Pages: unknown\n"),
        }
        out.push_str(&format!("Images: {}\n\n", self.images.len()));

        if !self.images.is_empty() {
            out.push_str("EXTRACTED IMAGES:\n");
            out.push_str(&"-".repeat(RULE_WIDTH));
            out.push('\n');
            for (page, filename) in &self.images {
                out.push_str(&format!("Page {}: {}\n", page, filename));
            }
            out.push('\n');
        }

        if !self.previews.is_empty() {
            out.push_str("\nTEXT PREVIEW:\n");
            out.push_str(&"-".repeat(RULE_WIDTH));
            out.push('\n');
            for (page, text) in &self.previews {
                out.push_str(&format!("\nPage {}:\n{}...\n", page, text));
            }
        }

        out
    }
}

/// First characters of a page's text on a single line.
fn preview(text: &str) -> String {
    text.chars()
        .take(PREVIEW_CHARS)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
