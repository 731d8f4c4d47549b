//! Title/body classification of slide text.
//!
//! A shape's text counts as a title when the font size declared on the first
//! run of its first paragraph is strictly above a threshold. Sizes that are
//! inherited from a layout or master are not declared on the run, so such
//! shapes cannot be classified and fall back to body text.

use crate::types::{ExtractedImage, SlideContent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default title threshold in points.
pub const DEFAULT_TITLE_THRESHOLD_PT: f64 = 20.0;

/// A font size in centipoints (1/100 pt), the unit of the OOXML `sz` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FontSize(pub u32);

impl FontSize {
    /// Convert a size in points, rounding to the nearest centipoint.
    ///
    /// Returns `None` for negative or non-finite values.
    pub fn from_points(points: f64) -> Option<Self> {
        if !points.is_finite() || points < 0.0 {
            return None;
        }
        let centi = (points * 100.0).round();
        if centi > u32::MAX as f64 {
            return None;
        }
        Some(Self(centi as u32))
    }

    /// Parse the raw value of an `sz` attribute.
    pub fn parse_sz(raw: &str) -> Option<Self> {
        raw.trim().parse::<u32>().ok().map(Self)
    }

    /// Size in points.
    pub fn points(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", self.points())
    }
}

/// What the first run of a text body looked like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstRun {
    /// The text body has no paragraphs.
    NoParagraph,
    /// The first paragraph has no text runs.
    NoRun,
    /// The first run, with the raw `sz` attribute if one was declared.
    Sized(Option<String>),
}

/// Text of one top-level shape, with the font information needed to classify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextShape {
    /// 1-based position of the shape on its slide.
    pub index: usize,

    /// Trimmed text, paragraphs joined with `\n`.
    pub text: String,

    /// First run of the first paragraph.
    pub first_run: FirstRun,
}

impl TextShape {
    /// Create a text shape.
    pub fn new(index: usize, text: impl Into<String>, first_run: FirstRun) -> Self {
        Self {
            index,
            text: text.into(),
            first_run,
        }
    }
}

/// Why a shape could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownReason {
    /// No paragraph or no run to inspect.
    NoRuns,
    /// The first run inherits its size.
    NoDeclaredSize,
    /// The declared size is not a valid integer.
    MalformedSize(String),
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuns => write!(f, "no text runs"),
            Self::NoDeclaredSize => write!(f, "font size not declared on first run"),
            Self::MalformedSize(raw) => write!(f, "malformed font size '{}'", raw),
        }
    }
}

/// Outcome of classifying a text shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Title,
    Body,
    Unknown(UnknownReason),
}

/// Font-size based title classifier.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    threshold: FontSize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            threshold: FontSize(2000),
        }
    }
}

impl Classifier {
    /// Create a classifier with the default 20pt threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom threshold.
    pub fn with_threshold(mut self, threshold: FontSize) -> Self {
        self.threshold = threshold;
        self
    }

    /// The threshold in use.
    pub fn threshold(&self) -> FontSize {
        self.threshold
    }

    /// Classify a single shape.
    pub fn classify(&self, shape: &TextShape) -> Classification {
        match &shape.first_run {
            FirstRun::NoParagraph | FirstRun::NoRun => Classification::Unknown(UnknownReason::NoRuns),
            FirstRun::Sized(None) => Classification::Unknown(UnknownReason::NoDeclaredSize),
            FirstRun::Sized(Some(raw)) => match FontSize::parse_sz(raw) {
                Some(size) if size > self.threshold => Classification::Title,
                Some(_) => Classification::Body,
                None => Classification::Unknown(UnknownReason::MalformedSize(raw.clone())),
            },
        }
    }

    /// Split a slide's shapes into titles and body texts.
    ///
    /// Unclassifiable shapes are routed to the body and counted.
    pub fn slide_content(
        &self,
        number: usize,
        shapes: &[TextShape],
        images: Vec<ExtractedImage>,
    ) -> SlideContent {
        let mut content = SlideContent::new(number);
        content.images = images;

        for shape in shapes {
            if shape.text.is_empty() {
                continue;
            }
            content.all_texts.push(shape.text.clone());

            match self.classify(shape) {
                Classification::Title => content.titles.push(shape.text.clone()),
                Classification::Body => content.texts.push(shape.text.clone()),
                Classification::Unknown(reason) => {
                    log::debug!(
                        "slide {} shape {}: treating as body text ({})",
                        number,
                        shape.index,
                        reason
                    );
                    content.unclassified += 1;
                    content.texts.push(shape.text.clone());
                }
            }
        }

        content
    }
}
