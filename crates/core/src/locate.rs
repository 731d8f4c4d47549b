//! Locating and identifying the source document.

use crate::error::{Error, Result};
use crate::types::DocumentFormat;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// A source document that exists on disk and has a known format.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as given by the caller.
    pub path: PathBuf,

    /// Detected document format.
    pub format: DocumentFormat,

    /// File name without extension, used to name derived files.
    pub stem: String,
}

impl SourceFile {
    /// File name (without directories) for display.
    pub fn filename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }
}

/// Verify that `path` is an existing regular file and detect its format.
///
/// Magic bytes take precedence over the extension.
pub fn locate_source(path: &Path) -> Result<SourceFile> {
    if !path.is_file() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let mut magic = [0u8; 8];
    let mut file = File::open(path)?;
    let read = read_prefix(&mut file, &mut magic)?;

    let format = DocumentFormat::from_magic(&magic[..read])
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(DocumentFormat::from_extension)
        })
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();

    log::debug!("Located {} as {:?}", path.display(), format);

    Ok(SourceFile {
        path: path.to_path_buf(),
        format,
        stem,
    })
}

/// Read as many bytes as are available up to `buf.len()`.
fn read_prefix(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
