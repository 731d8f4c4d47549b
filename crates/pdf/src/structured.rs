//! Structured PDF backend: per-page text and embedded image XObjects via `lopdf`.

use deck_core::{Error, ExtractedImage, ExtractedPage, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// Guards against cyclic `/Parent` links in malformed page trees.
const MAX_TREE_DEPTH: usize = 64;

/// A PDF loaded for structured access.
pub struct StructuredPdf {
    doc: Document,
}

impl StructuredPdf {
    /// Load a PDF from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let doc = Document::load(path)
            .map_err(|e| Error::PdfParseError(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(Self { doc })
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Extract text and images of every page, in page order.
    ///
    /// A page whose text cannot be decoded gets empty text; images that cannot
    /// be exported are skipped. Both are logged.
    pub fn pages(&self) -> Vec<ExtractedPage> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| {
                let number = number as usize;
                let text = match self.doc.extract_text(&[number as u32]) {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("Page {}: text extraction failed: {}", number, e);
                        String::new()
                    }
                };
                ExtractedPage::new(number, text).with_images(self.page_images(number, page_id))
            })
            .collect()
    }

    /// Images referenced by a page's resources, numbered from 1.
    fn page_images(&self, number: usize, page_id: ObjectId) -> Vec<ExtractedImage> {
        let mut images = Vec::new();
        for (idx, image_id) in self.image_ids(page_id).into_iter().enumerate() {
            let stream = match self.doc.get_object(image_id).and_then(Object::as_stream) {
                Ok(stream) => stream,
                Err(e) => {
                    log::warn!("Page {}: image {:?} unreadable: {}", number, image_id, e);
                    continue;
                }
            };
            match export_image(&self.doc, stream) {
                Ok(Some((bytes, ext))) => {
                    images.push(ExtractedImage::page_image(number, idx + 1, bytes, ext))
                }
                Ok(None) => log::warn!(
                    "Page {}: image {:?} uses an unsupported encoding, skipped",
                    number,
                    image_id
                ),
                Err(e) => log::warn!("Page {}: image {:?} skipped: {}", number, image_id, e),
            }
        }
        images
    }

    /// Object ids of the image XObjects in a page's (possibly inherited) resources.
    fn image_ids(&self, page_id: ObjectId) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        for resource in self.resource_dicts(page_id) {
            let xobjects = resource
                .get(b"XObject")
                .and_then(|o| self.doc.dereference(o))
                .and_then(|(_, o)| o.as_dict());
            let Ok(xobjects) = xobjects else {
                continue;
            };

            for (_, object) in xobjects.iter() {
                let Ok(id) = object.as_reference() else {
                    continue;
                };
                if !ids.contains(&id) && self.is_image(id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// `/Resources` of the page and of every ancestor in the page tree.
    fn resource_dicts(&self, page_id: ObjectId) -> Vec<&Dictionary> {
        let mut resources = Vec::new();
        let mut node = self.doc.get_dictionary(page_id).ok();
        let mut depth = 0;

        while let Some(dict) = node {
            let own = dict
                .get(b"Resources")
                .and_then(|o| self.doc.dereference(o))
                .and_then(|(_, o)| o.as_dict());
            if let Ok(own) = own {
                resources.push(own);
            }

            depth += 1;
            if depth > MAX_TREE_DEPTH {
                log::warn!("Page tree deeper than {} levels, stopping", MAX_TREE_DEPTH);
                break;
            }
            node = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|id| self.doc.get_dictionary(id))
                .ok();
        }

        resources
    }

    fn is_image(&self, id: ObjectId) -> bool {
        self.doc
            .get_object(id)
            .and_then(Object::as_stream)
            .and_then(|s| s.dict.get(b"Subtype"))
            .and_then(Object::as_name)
            .map(|name| name == b"Image")
            .unwrap_or(false)
    }
}

/// Export an image stream as a standalone file.
///
/// JPEG and JPEG 2000 data is copied unchanged; 8-bit gray or RGB samples are
/// re-encoded as PNG. Returns `None` for any other encoding.
fn export_image(doc: &Document, stream: &Stream) -> Result<Option<(Vec<u8>, &'static str)>> {
    let filters = filter_names(doc, &stream.dict);

    match filters.as_slice() {
        [f] if f == "DCTDecode" => return Ok(Some((stream.content.clone(), "jpg"))),
        [f] if f == "JPXDecode" => return Ok(Some((stream.content.clone(), "jp2"))),
        _ => {}
    }

    if !filters
        .iter()
        .all(|f| f == "FlateDecode" || f == "LZWDecode")
    {
        return Ok(None);
    }

    let width = dict_u32(doc, &stream.dict, b"Width");
    let height = dict_u32(doc, &stream.dict, b"Height");
    let bits = dict_u32(doc, &stream.dict, b"BitsPerComponent");
    let (Some(width), Some(height), Some(8)) = (width, height, bits) else {
        return Ok(None);
    };
    let color = match color_components(doc, &stream.dict) {
        Some(1) => ColorType::L8,
        Some(3) => ColorType::Rgb8,
        _ => return Ok(None),
    };

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|e| Error::PdfParseError(format!("Failed to decompress image: {}", e)))?
    };

    let expected = sample_len(width, height, color.bytes_per_pixel())
        .ok_or_else(|| Error::ImageError(format!("{}x{} image is too large", width, height)))?;
    if samples.len() < expected {
        return Err(Error::ImageError(format!(
            "{}x{} image has {} bytes of samples, expected {}",
            width,
            height,
            samples.len(),
            expected
        )));
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&samples[..expected], width, height, color)
        .map_err(|e| Error::ImageError(e.to_string()))?;
    Ok(Some((png, "png")))
}

/// Bytes of sample data in a `width` x `height` image, `None` on overflow.
fn sample_len(width: u32, height: u32, bytes_per_pixel: u8) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(usize::from(bytes_per_pixel))
}

/// Names listed in a stream's `/Filter` entry.
fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<String> {
    let Ok((_, filter)) = dict.get(b"Filter").and_then(|o| doc.dereference(o)) else {
        return Vec::new();
    };
    match filter {
        Object::Name(name) => vec![String::from_utf8_lossy(name).to_string()],
        Object::Array(items) => items
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Number of colour components of an image's `/ColorSpace`.
fn color_components(doc: &Document, dict: &Dictionary) -> Option<u32> {
    let (_, space) = dict.get(b"ColorSpace").and_then(|o| doc.dereference(o)).ok()?;
    match space {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" => Some(1),
            b"DeviceRGB" | b"CalRGB" => Some(3),
            _ => None,
        },
        // [/ICCBased <stream>] carries the component count in /N.
        Object::Array(items) => {
            let family = items.first()?.as_name().ok()?;
            if family != b"ICCBased" {
                return None;
            }
            let (_, profile) = doc.dereference(items.get(1)?).ok()?;
            let n = profile.as_stream().ok()?.dict.get(b"N").ok()?.as_i64().ok()?;
            u32::try_from(n).ok()
        }
        _ => None,
    }
}

fn dict_u32(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    let (_, value) = dict.get(key).and_then(|o| doc.dereference(o)).ok()?;
    u32::try_from(value.as_i64().ok()?).ok()
}
