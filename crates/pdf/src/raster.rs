//! Raster backend: whole pages to PNG through poppler's `pdftoppm`.

use crate::tools::{Tool, ToolRunner};
use deck_core::{Error, RenderedPage, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

const PDFTOPPM: &str = "pdftoppm";
const INSTALL_HINT: &str =
    "Install poppler (Debian/Ubuntu: `apt install poppler-utils`, macOS: `brew install poppler`).";

/// Resolution used by PDF page rendering.
pub const DEFAULT_PAGE_DPI: u32 = 200;
/// Resolution at which PDF rendering is 1:1.
pub const BASE_DPI: u32 = 72;

/// Renders PDF pages to PNG files.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    tool: Tool,
}

impl Rasterizer {
    /// Use a specific `pdftoppm`-compatible executable.
    pub fn new(tool: Tool) -> Self {
        Self { tool }
    }

    /// Find `pdftoppm`, if installed.
    pub fn probe() -> Option<Self> {
        Tool::find(PDFTOPPM).map(|tool| Self { tool })
    }

    /// Find `pdftoppm`, failing with an install hint when it is missing.
    pub fn require() -> Result<Self> {
        Self::probe().ok_or_else(|| Error::missing_tool(PDFTOPPM, INSTALL_HINT))
    }

    /// Render every page of `pdf` into `out_dir` as `{prefix}_{n}.png`.
    pub fn render(
        &self,
        runner: &ToolRunner,
        pdf: &Path,
        out_dir: &Path,
        prefix: &str,
        dpi: u32,
    ) -> Result<Vec<RenderedPage>> {
        fs::create_dir_all(out_dir)?;

        // pdftoppm names its files `<root>-<n>.png`, zero-padding n to the page
        // count's width; render under a scratch root and rename afterwards.
        let scratch = format!(".{}-render", prefix);
        let root = out_dir.join(&scratch);
        let dpi = dpi.to_string();
        let args: [&OsStr; 5] = [
            OsStr::new("-png"),
            OsStr::new("-r"),
            OsStr::new(&dpi),
            pdf.as_os_str(),
            root.as_os_str(),
        ];
        runner.run(&self.tool, args)?;

        collect_rendered(out_dir, &scratch, prefix)
    }
}

/// Rename `<scratch>-<n>.png` files in `dir` to `{prefix}_{n}.png`, ordered by page.
fn collect_rendered(dir: &Path, scratch: &str, prefix: &str) -> Result<Vec<RenderedPage>> {
    let marker = format!("{}-", scratch);
    let mut found = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let number = name
            .strip_prefix(&marker)
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(number) = number {
            found.push((number, entry.path()));
        }
    }

    found.sort_by_key(|(number, _)| *number);

    let mut pages = Vec::with_capacity(found.len());
    for (number, from) in found {
        let filename = format!("{}_{}.png", prefix, number);
        let path = dir.join(&filename);
        fs::rename(&from, &path)?;
        pages.push(RenderedPage {
            number,
            path,
            filename,
        });
    }

    Ok(pages)
}

/// Resolution for a zoom factor relative to 72 dpi.
pub fn dpi_for_scale(scale: f32) -> u32 {
    (BASE_DPI as f32 * scale.max(0.1)).round() as u32
}
