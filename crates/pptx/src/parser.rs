//! PPTX file parser implementation.

use crate::deck::{Deck, ParsedSlide, Picture};
use crate::rels::{local_name, parse_relationships, rels_path_for, resolve_target, Relationship};
use crate::shapes::scan_slide;
use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open and parse a PPTX file from disk.
    pub fn open(&self, path: &Path) -> Result<Deck> {
        let file = File::open(path)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        self.parse(BufReader::new(file), filename)
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("{}: {} slides", filename, slide_order.len());

        let mut deck = Deck {
            filename: filename.to_string(),
            slides: Vec::with_capacity(slide_order.len()),
        };

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            deck.slides.push(slide);
        }

        Ok(deck)
    }

    /// Get the ordered list of slide part names.
    ///
    /// The order comes from `p:sldIdLst` in `presentation.xml`. When that list
    /// is unavailable, slide relationships are sorted by the number in their
    /// id or target.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = rels_path_for(PRESENTATION_PART);
        let rels_content = self
            .read_file_from_archive(archive, &rels_path)
            .map_err(|_| {
                Error::PptxParseError(format!("Not a presentation: {} is missing", rels_path))
            })?;
        let rels = parse_relationships(&rels_content)?;

        let listed = match self.read_file_from_archive(archive, PRESENTATION_PART) {
            Ok(xml) => slide_id_list(&xml)?,
            Err(e) => {
                log::warn!("{} unreadable, ordering slides by name: {}", PRESENTATION_PART, e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let mut slides = Vec::with_capacity(listed.len());
            for rid in &listed {
                match rels.iter().find(|r| &r.id == rid && r.is_slide()) {
                    Some(rel) => slides.push(resolve_target(PRESENTATION_PART, &rel.target)),
                    None => log::warn!("Slide relationship '{}' not found, skipping", rid),
                }
            }
            return Ok(slides);
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|r| r.is_slide())
            .map(|r| {
                let order_num = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
                (resolve_target(PRESENTATION_PART, &r.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide from the archive.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<ParsedSlide> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let shapes = scan_slide(&content)?;

        let rels = if shapes.pictures.is_empty() {
            Vec::new()
        } else {
            self.slide_relationships(archive, slide_path)?
        };

        let mut pictures = Vec::with_capacity(shapes.pictures.len());
        for pic in shapes.pictures {
            let Some(rel) = rels.iter().find(|r| r.id == pic.embed) else {
                log::warn!(
                    "Slide {}: image relationship '{}' missing, skipping",
                    slide_number,
                    pic.embed
                );
                continue;
            };
            if rel.external {
                log::debug!("Slide {}: linked image {} skipped", slide_number, rel.target);
                continue;
            }

            let part = resolve_target(slide_path, &rel.target);
            match self.read_bytes_from_archive(archive, &part) {
                Ok(bytes) => pictures.push(Picture {
                    shape: pic.shape,
                    grouped: pic.grouped,
                    bytes,
                    extension: image_extension(&part),
                }),
                Err(e) => log::warn!("Slide {}: {}", slide_number, e),
            }
        }

        Ok(ParsedSlide {
            number: slide_number,
            texts: shapes.texts,
            pictures,
        })
    }

    /// Relationships of a slide; a slide without a `.rels` part has none.
    fn slide_relationships<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Vec<Relationship>> {
        match self.read_file_from_archive(archive, &rels_path_for(slide_path)) {
            Ok(xml) => parse_relationships(&xml),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Read a text part from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a binary part from the ZIP archive.
    fn read_bytes_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<Vec<u8>> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(bytes)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The relationship id is the namespaced `r:id`; the bare `id` is numeric.
                let rid = e.attributes().flatten().find(|a| {
                    a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id"
                });
                if let Some(attr) = rid {
                    ids.push(String::from_utf8_lossy(&attr.value).to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing {}: {}",
                    PRESENTATION_PART, e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extension of an image part, lowercased, with `jpeg` shortened to `jpg`.
fn image_extension(part: &str) -> String {
    let name = part.rsplit('/').next().unwrap_or(part);
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "bin".to_string(),
    };
    match ext.as_str() {
        "jpeg" | "jpe" => "jpg".to_string(),
        "tif" => "tiff".to_string(),
        _ => ext,
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("ppt/media/image1.PNG"), "png");
        assert_eq!(image_extension("ppt/media/image2.jpeg"), "jpg");
        assert_eq!(image_extension("ppt/media/image3.emf"), "emf");
        assert_eq!(image_extension("ppt/media/noext"), "bin");
    }

    #[test]
    fn test_slide_id_list_uses_relationship_ids() {
        let xml = r#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="257" r:id="rId7"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        assert_eq!(slide_id_list(xml).unwrap(), vec!["rId7", "rId2"]);
    }
}
