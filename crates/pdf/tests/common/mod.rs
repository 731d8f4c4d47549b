//! PDF fixtures built with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// An image XObject placed on a page.
pub enum FixtureImage {
    /// JPEG bytes stored under `/DCTDecode`.
    Jpeg(Vec<u8>),
    /// Uncompressed 8-bit RGB samples.
    Rgb { width: u32, height: u32, samples: Vec<u8> },
}

#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<(String, Vec<FixtureImage>)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, text: &str, images: Vec<FixtureImage>) -> Self {
        self.pages.push((text.to_string(), images));
        self
    }

    pub fn save(&self, path: &Path) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids: Vec<Object> = Vec::new();
        for (text, images) in &self.pages {
            let page_id = add_page(&mut doc, pages_id, font_id, text, images);
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("fixture should save");
    }
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    text: &str,
    images: &[FixtureImage],
) -> ObjectId {
    let mut xobjects = Dictionary::new();
    for (idx, image) in images.iter().enumerate() {
        let stream = match image {
            FixtureImage::Jpeg(bytes) => Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2,
                    "Height" => 2,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                bytes.clone(),
            ),
            FixtureImage::Rgb {
                width,
                height,
                samples,
            } => Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => *width as i64,
                    "Height" => *height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                },
                samples.clone(),
            ),
        };
        let image_id = doc.add_object(stream);
        xobjects.set(format!("Im{}", idx + 1), image_id);
    }

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().expect("content should encode"),
    ));

    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => xobjects,
        },
    })
}
