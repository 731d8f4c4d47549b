mod common;

use common::{FixtureImage, PdfBuilder};
use deck_core::sink::{IMAGES_DIR, PAGE_IMAGES_DIR};
use deck_core::TreeWriter;
use deck_pdf::{Backend, BackendChoice, PdfExtractor, StructuredPdf};
use std::fs;

const JPG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn two_page_pdf(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("report.pdf");
    PdfBuilder::new()
        .page("Hello", vec![FixtureImage::Jpeg(JPG.to_vec())])
        .page(
            "Second",
            vec![FixtureImage::Rgb {
                width: 2,
                height: 1,
                samples: vec![255, 0, 0, 0, 0, 255],
            }],
        )
        .save(&path);
    path
}

#[test]
fn test_page_count_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = StructuredPdf::load(&two_page_pdf(dir.path())).unwrap();

    assert_eq!(pdf.page_count(), 2);
    let pages = pdf.pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert!(pages[0].text.contains("Hello"));
    assert!(pages[1].text.contains("Second"));
}

#[test]
fn test_jpeg_bytes_are_copied_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let pages = StructuredPdf::load(&two_page_pdf(dir.path())).unwrap().pages();

    let image = &pages[0].images[0];
    assert_eq!(image.filename, "page_1_img_1.jpg");
    assert_eq!(image.bytes, JPG);
}

#[test]
fn test_raw_samples_become_png() {
    let dir = tempfile::tempdir().unwrap();
    let pages = StructuredPdf::load(&two_page_pdf(dir.path())).unwrap().pages();

    let image = &pages[1].images[0];
    assert_eq!(image.filename, "page_2_img_1.png");
    assert!(image.bytes.starts_with(PNG_MAGIC));
}

#[test]
fn test_empty_pdf_has_no_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.pdf");
    PdfBuilder::new().save(&path);

    let pdf = StructuredPdf::load(&path).unwrap();
    assert_eq!(pdf.page_count(), 0);
    assert!(pdf.pages().is_empty());
}

#[test]
fn test_invalid_pdf_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    fs::write(&path, b"%PDF-1.4\nnot really a pdf").unwrap();

    assert!(StructuredPdf::load(&path).is_err());
}

#[test]
fn test_structured_extraction_writes_images() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = two_page_pdf(dir.path());
    let out = dir.path().join("out");
    let writer = TreeWriter::create(&out).unwrap();

    let outcome = PdfExtractor::new()
        .with_backend(BackendChoice::Only(Backend::Structured))
        .extract(&pdf, &writer)
        .unwrap();

    assert_eq!(outcome.image_backend, Some(Backend::Structured));
    assert_eq!(outcome.text_backend, Some(Backend::Structured));
    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.image_paths.len(), 2);
    assert!(outcome.rendered.is_empty());

    let jpg = fs::read(out.join(IMAGES_DIR).join("page_1_img_1.jpg")).unwrap();
    assert_eq!(jpg, JPG);
    assert!(out.join(IMAGES_DIR).join("page_2_img_1.png").exists());
    assert!(!out.join(PAGE_IMAGES_DIR).exists());
}

#[test]
fn test_unusable_backend_gives_empty_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    fs::write(&path, b"%PDF-1.4\nnot really a pdf").unwrap();
    let writer = TreeWriter::create(dir.path().join("out")).unwrap();

    let outcome = PdfExtractor::new()
        .with_backend(BackendChoice::Only(Backend::Structured))
        .extract(&path, &writer)
        .unwrap();

    assert!(outcome.pages.is_empty());
    assert!(outcome.image_paths.is_empty());
    assert_eq!(outcome.image_backend, None);
    assert_eq!(outcome.text_backend, None);
}
