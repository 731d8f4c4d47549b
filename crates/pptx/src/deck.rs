//! Parsed presentation model and conversions into output records.

use deck_core::{Classifier, ExtractedImage, ExtractedPage, SlideContent, TextShape};

/// An embedded picture with its image bytes.
#[derive(Debug, Clone)]
pub struct Picture {
    /// 1-based index of the top-level shape (the group, for grouped pictures).
    pub shape: usize,
    /// Whether the picture was found inside a group shape.
    pub grouped: bool,
    /// Image part contents, unchanged.
    pub bytes: Vec<u8>,
    /// Extension of the image part (`png`, `jpg`, `emf`, ...).
    pub extension: String,
}

/// One slide as read from the package.
#[derive(Debug, Clone)]
pub struct ParsedSlide {
    /// 1-based slide number in presentation order.
    pub number: usize,
    /// Non-empty text shapes in shape order.
    pub texts: Vec<TextShape>,
    /// Pictures in shape order.
    pub pictures: Vec<Picture>,
}

/// A parsed presentation.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    /// Original filename (without path).
    pub filename: String,
    pub slides: Vec<ParsedSlide>,
}

impl Deck {
    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Image records for every slide, named for output.
    ///
    /// Grouped pictures are numbered by their position among all pictures of
    /// the deck, so the result is returned per slide.
    pub fn images_by_slide(&self) -> Vec<Vec<ExtractedImage>> {
        let mut ordinal = 0;
        self.slides
            .iter()
            .map(|slide| {
                slide
                    .pictures
                    .iter()
                    .map(|pic| {
                        ordinal += 1;
                        if pic.grouped {
                            ExtractedImage::group_picture(
                                slide.number,
                                pic.shape,
                                ordinal,
                                pic.bytes.clone(),
                                &pic.extension,
                            )
                        } else {
                            ExtractedImage::slide_picture(
                                slide.number,
                                pic.shape,
                                pic.bytes.clone(),
                                &pic.extension,
                            )
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// All images in the deck, in slide and shape order.
    pub fn images(&self) -> Vec<ExtractedImage> {
        self.images_by_slide().into_iter().flatten().collect()
    }

    /// One page record per slide, texts joined by newlines.
    pub fn pages(&self) -> Vec<ExtractedPage> {
        self.slides
            .iter()
            .zip(self.images_by_slide())
            .map(|(slide, images)| {
                let text = slide
                    .texts
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                ExtractedPage::new(slide.number, text).with_images(images)
            })
            .collect()
    }

    /// Title/body split of every slide.
    pub fn slide_contents(&self, classifier: &Classifier) -> Vec<SlideContent> {
        self.slides
            .iter()
            .zip(self.images_by_slide())
            .map(|(slide, images)| classifier.slide_content(slide.number, &slide.texts, images))
            .collect()
    }
}
