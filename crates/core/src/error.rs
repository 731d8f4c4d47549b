//! Error types for document content extraction.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during content extraction.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The configured source file does not exist or is not a regular file.
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// Failed to load or walk a PDF document.
    #[error("PDF parsing error: {0}")]
    PdfParseError(String),

    /// Failed to decode or re-encode an embedded image.
    #[error("Image error: {0}")]
    ImageError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A required external tool is not installed.
    #[error("Required tool '{tool}' was not found on PATH. {hint}")]
    MissingTool { tool: String, hint: String },

    /// An external tool ran but reported failure.
    #[error("'{tool}' failed: {detail}")]
    ToolFailed { tool: String, detail: String },

    /// An external tool exceeded its time budget and was killed.
    #[error("'{tool}' did not finish within {}s and was killed", .timeout.as_secs())]
    ToolTimedOut { tool: String, timeout: Duration },
}

impl Error {
    /// Build a [`Error::MissingTool`] with an install hint.
    pub fn missing_tool(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            hint: hint.into(),
        }
    }
}
