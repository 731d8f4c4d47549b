//! Layout text backend: `pdftotext -layout`, split per page.

use crate::tools::{Tool, ToolRunner};
use deck_core::{ExtractedPage, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

const PDFTOTEXT: &str = "pdftotext";

/// Page separator written by `pdftotext`.
const FORM_FEED: char = '\u{0C}';

/// Layout-preserving text extraction.
#[derive(Debug, Clone)]
pub struct LayoutText {
    tool: Tool,
}

impl LayoutText {
    /// Use a specific `pdftotext`-compatible executable.
    pub fn new(tool: Tool) -> Self {
        Self { tool }
    }

    /// Find `pdftotext`, if installed.
    pub fn probe() -> Option<Self> {
        Tool::find(PDFTOTEXT).map(|tool| Self { tool })
    }

    /// Extract the text of every page.
    pub fn extract(&self, runner: &ToolRunner, pdf: &Path) -> Result<Vec<ExtractedPage>> {
        let scratch = tempfile::tempdir()?;
        let out = scratch.path().join("layout.txt");
        let args: [&OsStr; 5] = [
            OsStr::new("-layout"),
            OsStr::new("-enc"),
            OsStr::new("UTF-8"),
            pdf.as_os_str(),
            out.as_os_str(),
        ];
        runner.run(&self.tool, args)?;

        let raw = fs::read(&out)?;
        Ok(split_pages(&String::from_utf8_lossy(&raw)))
    }
}

/// Split `pdftotext` output into pages at form feeds.
pub fn split_pages(text: &str) -> Vec<ExtractedPage> {
    let body = text.strip_suffix(FORM_FEED).unwrap_or(text);
    if body.is_empty() {
        return Vec::new();
    }
    body.split(FORM_FEED)
        .enumerate()
        .map(|(idx, page)| ExtractedPage::new(idx + 1, page.trim_end()))
        .collect()
}
