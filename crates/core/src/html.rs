//! HTML fragment output.
//!
//! Each slide becomes one `<div>` fragment; fragments are joined by a newline
//! and carry no `<html>`/`<body>` wrapper so they can be included in a larger
//! page. All slide text is escaped.

use crate::types::SlideContent;
use serde::{Deserialize, Serialize};

/// Default label placed before the slide number in fragment headings.
pub const DEFAULT_HEADING: &str = "Slide";

/// Fragment structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HtmlStyle {
    /// Titles as `<h3>`, body text as a `<ul>` list.
    #[default]
    Integrated,
    /// Every text as a `<p>`, in shape order.
    Simple,
}

/// Renders slides into HTML fragments.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    style: HtmlStyle,
    heading: String,
    images_href: Option<String>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            style: HtmlStyle::default(),
            heading: DEFAULT_HEADING.to_string(),
            images_href: None,
        }
    }
}

impl HtmlRenderer {
    /// Create a renderer using the integrated style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the fragment structure.
    pub fn with_style(mut self, style: HtmlStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the heading label (`"{heading} {number}"`).
    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    /// Reference slide images from this directory (relative to the HTML file).
    pub fn with_images_href(mut self, href: impl Into<String>) -> Self {
        let href = href.into();
        self.images_href = Some(href.trim_end_matches('/').to_string());
        self
    }

    /// Render all slides, one fragment each, joined by `\n`.
    pub fn render(&self, slides: &[SlideContent]) -> String {
        self.render_fragments(slides).join("\n")
    }

    /// Render each slide into its own fragment.
    pub fn render_fragments(&self, slides: &[SlideContent]) -> Vec<String> {
        slides.iter().map(|s| self.render_slide(s)).collect()
    }

    /// Render a single slide.
    pub fn render_slide(&self, slide: &SlideContent) -> String {
        match self.style {
            HtmlStyle::Integrated => self.render_integrated(slide),
            HtmlStyle::Simple => self.render_simple(slide),
        }
    }

    fn render_integrated(&self, slide: &SlideContent) -> String {
        let mut html = String::from("<div class=\"slide pptx-integrated\">\n");
        html.push_str(&format!(
            "<h2>{} {}</h2>\n",
            escape(&self.heading),
            slide.number
        ));
        html.push_str("<div class=\"pptx-content\">\n");

        for title in &slide.titles {
            html.push_str(&format!("<h3>{}</h3>\n", escape(title)));
        }

        if !slide.texts.is_empty() {
            html.push_str("<ul class=\"pptx-text-list\">\n");
            for text in &slide.texts {
                html.push_str(&format!("<li>{}</li>\n", escape(text)));
            }
            html.push_str("</ul>\n");
        }

        if let Some(href) = &self.images_href {
            if !slide.images.is_empty() {
                html.push_str("<div class=\"pptx-images\">\n");
                for image in &slide.images {
                    let src = format!("{}/{}", href, image.filename);
                    html.push_str(&format!(
                        "<img src=\"{}\" alt=\"\">\n",
                        html_escape::encode_double_quoted_attribute(&src)
                    ));
                }
                html.push_str("</div>\n");
            }
        }

        html.push_str("</div>\n</div>\n");
        html
    }

    fn render_simple(&self, slide: &SlideContent) -> String {
        let mut html = String::from("<div class=\"pptx-slide\">\n");
        html.push_str(&format!(
            "<h3>{} {}</h3>\n",
            escape(&self.heading),
            slide.number
        ));
        html.push_str("<div class=\"slide-content\">\n");

        for text in &slide.all_texts {
            html.push_str(&format!("<p>{}</p>\n", escape(text)));
        }

        html.push_str("</div>\n</div>\n");
        html
    }
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}
