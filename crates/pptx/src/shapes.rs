//! Shape scanning for a single slide part.
//!
//! Only the direct children of `p:spTree` count as shapes. Text is taken from
//! top-level `p:sp` elements, pictures from top-level `p:pic` elements and
//! from `p:pic` elements directly inside a top-level `p:grpSp`. Anything
//! nested deeper is ignored.

use crate::rels::local_name;
use deck_core::{FirstRun, Result, TextShape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Element names that occupy a shape slot in the shape tree.
const SHAPE_ELEMENTS: &[&[u8]] = &[
    b"sp",
    b"pic",
    b"grpSp",
    b"graphicFrame",
    b"cxnSp",
    b"contentPart",
];

/// Elements marking a picture as an audio/video frame.
const MEDIA_ELEMENTS: &[&[u8]] = &[b"videoFile", b"audioFile", b"quickTimeFile", b"media"];

/// A picture whose image part still has to be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureRef {
    /// 1-based index of the top-level shape (the group, for grouped pictures).
    pub shape: usize,
    /// Whether the picture sits inside a group shape.
    pub grouped: bool,
    /// Relationship id of the embedded image.
    pub embed: String,
}

/// Text and picture shapes found on a slide, in document order.
#[derive(Debug, Clone, Default)]
pub struct SlideShapes {
    pub texts: Vec<TextShape>,
    pub pictures: Vec<PictureRef>,
}

/// Scan slide XML for text shapes and picture references.
///
/// Malformed XML stops the scan; whatever was collected before the error is
/// returned.
pub fn scan_slide(xml: &str) -> Result<SlideShapes> {
    let mut reader = Reader::from_str(xml);
    let mut scanner = Scanner::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => scanner.start(e, false),
            Ok(Event::Empty(ref e)) => scanner.start(e, true),
            Ok(Event::End(ref e)) => scanner.end(local_name(e.name().as_ref())),
            Ok(Event::Text(ref e)) => {
                if scanner.in_text_run() {
                    let text = e.unescape().unwrap_or_default();
                    scanner.push_text(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!(
                    "XML parsing error at position {} (keeping shapes read so far): {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
            _ => {}
        }
    }

    Ok(scanner.out)
}

#[derive(Debug)]
enum Kind {
    Text(TextState),
    Picture,
    Group,
    Other,
}

#[derive(Debug, Default)]
struct TextState {
    text: String,
    has_body: bool,
    paragraphs: usize,
    first_run: Option<FirstRun>,
    capturing_run: bool,
}

#[derive(Debug)]
struct TopShape {
    index: usize,
    depth: usize,
    kind: Kind,
}

#[derive(Debug)]
struct PicState {
    shape: usize,
    depth: usize,
    grouped: bool,
    embed: Option<String>,
    media: bool,
}

#[derive(Debug, Default)]
struct Scanner {
    stack: Vec<Vec<u8>>,
    shape_count: usize,
    top: Option<TopShape>,
    pic: Option<PicState>,
    out: SlideShapes,
}

impl Scanner {
    fn parent(&self) -> &[u8] {
        self.stack.last().map(|n| n.as_slice()).unwrap_or_default()
    }

    fn start(&mut self, e: &BytesStart, is_empty: bool) {
        let qname = e.name();
        let name = local_name(qname.as_ref()).to_vec();
        let depth = self.stack.len();

        if self.parent() == b"spTree" && SHAPE_ELEMENTS.contains(&name.as_slice()) {
            self.shape_count += 1;
            let kind = match name.as_slice() {
                b"sp" => Kind::Text(TextState::default()),
                b"pic" => Kind::Picture,
                b"grpSp" => Kind::Group,
                _ => Kind::Other,
            };
            if matches!(kind, Kind::Picture) {
                self.pic = Some(PicState::new(self.shape_count, depth, false));
            }
            self.top = Some(TopShape {
                index: self.shape_count,
                depth,
                kind,
            });
        } else if name == b"pic" && self.pic.is_none() {
            if let Some(TopShape {
                index,
                depth: group_depth,
                kind: Kind::Group,
            }) = self.top
            {
                if depth == group_depth + 1 {
                    self.pic = Some(PicState::new(index, depth, true));
                }
            }
        }

        if let Some(pic) = self.pic.as_mut() {
            if name == b"blip" {
                pic.embed = attribute(e, b"embed");
            } else if MEDIA_ELEMENTS.contains(&name.as_slice()) {
                pic.media = true;
            }
        }

        let parent = self.parent().to_vec();
        if let Some(TopShape {
            kind: Kind::Text(state),
            ..
        }) = self.top.as_mut()
        {
            match (name.as_slice(), parent.as_slice()) {
                (b"txBody", _) => state.has_body = true,
                (b"p", b"txBody") => {
                    state.paragraphs += 1;
                    if state.paragraphs > 1 {
                        state.text.push('\n');
                    }
                }
                (b"r", b"p") if state.paragraphs == 1 && state.first_run.is_none() => {
                    state.first_run = Some(FirstRun::Sized(None));
                    state.capturing_run = !is_empty;
                }
                (b"rPr", b"r") if state.capturing_run => {
                    if let Some(sz) = attribute(e, b"sz") {
                        state.first_run = Some(FirstRun::Sized(Some(sz)));
                    }
                }
                (b"br", b"p") => state.text.push('\n'),
                _ => {}
            }
        }

        if is_empty {
            self.close(&name, depth);
        } else {
            self.stack.push(name);
        }
    }

    fn end(&mut self, name: &[u8]) {
        self.stack.pop();
        let depth = self.stack.len();
        self.close(name, depth);
    }

    /// Finish whatever element at `depth` just closed.
    fn close(&mut self, name: &[u8], depth: usize) {
        if name == b"r" {
            if let Some(TopShape {
                kind: Kind::Text(state),
                ..
            }) = self.top.as_mut()
            {
                state.capturing_run = false;
            }
        }

        if name == b"pic" && self.pic.as_ref().is_some_and(|p| p.depth == depth) {
            if let Some(pic) = self.pic.take() {
                self.finish_picture(pic);
            }
        }

        if self.top.as_ref().is_some_and(|t| t.depth == depth) {
            if let Some(top) = self.top.take() {
                self.finish_shape(top);
            }
        }
    }

    fn finish_picture(&mut self, pic: PicState) {
        if pic.media {
            log::debug!("shape {}: skipping media frame", pic.shape);
            return;
        }
        match pic.embed {
            Some(embed) => self.out.pictures.push(PictureRef {
                shape: pic.shape,
                grouped: pic.grouped,
                embed,
            }),
            None => log::debug!("shape {}: picture has no embedded image", pic.shape),
        }
    }

    fn finish_shape(&mut self, top: TopShape) {
        if let Kind::Text(state) = top.kind {
            let text = state.text.trim();
            if !state.has_body || text.is_empty() {
                return;
            }
            let first_run = state.first_run.unwrap_or(if state.paragraphs == 0 {
                FirstRun::NoParagraph
            } else {
                FirstRun::NoRun
            });
            self.out
                .texts
                .push(TextShape::new(top.index, text, first_run));
        }
    }

    fn in_text_run(&self) -> bool {
        self.parent() == b"t"
            && matches!(
                self.top,
                Some(TopShape {
                    kind: Kind::Text(TextState { has_body: true, .. }),
                    ..
                })
            )
    }

    fn push_text(&mut self, text: &str) {
        if let Some(TopShape {
            kind: Kind::Text(state),
            ..
        }) = self.top.as_mut()
        {
            state.text.push_str(text);
        }
    }
}

impl PicState {
    fn new(shape: usize, depth: usize, grouped: bool) -> Self {
        Self {
            shape,
            depth,
            grouped,
            embed: None,
            media: false,
        }
    }
}

/// Value of the attribute with the given local name.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(tree: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            tree
        )
    }

    fn text_shape(body: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Text"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            body
        )
    }

    fn picture(embed: &str) -> String {
        format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill><p:spPr/></p:pic>"#,
            embed
        )
    }

    #[test]
    fn test_text_with_font_size() {
        let xml = slide(&text_shape(
            r#"<a:p><a:r><a:rPr lang="en-US" sz="4400"/><a:t>Big Title</a:t></a:r></a:p>"#,
        ));
        let shapes = scan_slide(&xml).unwrap();

        assert_eq!(shapes.texts.len(), 1);
        assert_eq!(shapes.texts[0].index, 1);
        assert_eq!(shapes.texts[0].text, "Big Title");
        assert_eq!(
            shapes.texts[0].first_run,
            FirstRun::Sized(Some("4400".to_string()))
        );
    }

    #[test]
    fn test_paragraphs_runs_and_breaks() {
        let xml = slide(&text_shape(
            r#"<a:p><a:r><a:t>Hello</a:t></a:r><a:r><a:rPr sz="900"/><a:t> world</a:t></a:r></a:p><a:p><a:r><a:t>Line</a:t></a:r><a:br/><a:r><a:t>Break &amp; more</a:t></a:r></a:p>"#,
        ));
        let shapes = scan_slide(&xml).unwrap();

        assert_eq!(shapes.texts[0].text, "Hello world\nLine\nBreak & more");
        // The size belongs to the second run, not the first.
        assert_eq!(shapes.texts[0].first_run, FirstRun::Sized(None));
    }

    #[test]
    fn test_empty_text_skipped_and_no_run() {
        let xml = slide(&format!(
            "{}{}",
            text_shape(r#"<a:p><a:r><a:t>   </a:t></a:r></a:p>"#),
            text_shape(r#"<a:p><a:fld id="x" type="slidenum"><a:t>7</a:t></a:fld></a:p>"#),
        ));
        let shapes = scan_slide(&xml).unwrap();

        assert_eq!(shapes.texts.len(), 1);
        assert_eq!(shapes.texts[0].index, 2);
        assert_eq!(shapes.texts[0].text, "7");
        assert_eq!(shapes.texts[0].first_run, FirstRun::NoRun);
    }

    #[test]
    fn test_pictures_and_one_group_level() {
        let nested_group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="9" name="Inner"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:grpSp>"#,
            picture("rId9")
        );
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}{}{}</p:grpSp>"#,
            picture("rId3"),
            nested_group,
            text_shape(r#"<a:p><a:r><a:t>Grouped text</a:t></a:r></a:p>"#)
        );
        let xml = slide(&format!("{}{}", picture("rId2"), group));
        let shapes = scan_slide(&xml).unwrap();

        assert_eq!(
            shapes.pictures,
            vec![
                PictureRef {
                    shape: 1,
                    grouped: false,
                    embed: "rId2".to_string()
                },
                PictureRef {
                    shape: 2,
                    grouped: true,
                    embed: "rId3".to_string()
                },
            ]
        );
        // Text inside groups is not a top-level text shape.
        assert!(shapes.texts.is_empty());
    }

    #[test]
    fn test_media_frames_are_not_pictures() {
        let video = r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="Video"/><p:cNvPicPr/><p:nvPr><a:videoFile r:link="rId5"/></p:nvPr></p:nvPicPr><p:blipFill><a:blip r:embed="rId6"/></p:blipFill><p:spPr/></p:pic>"#;
        let shapes = scan_slide(&slide(video)).unwrap();
        assert!(shapes.pictures.is_empty());
    }

    #[test]
    fn test_shape_indices_count_every_shape() {
        let connector = r#"<p:cxnSp><p:nvCxnSpPr><p:cNvPr id="7" name="Line"/><p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr><p:spPr/></p:cxnSp>"#;
        let xml = slide(&format!("{}{}", connector, picture("rId2")));
        let shapes = scan_slide(&xml).unwrap();

        assert_eq!(shapes.pictures[0].shape, 2);
    }

    #[test]
    fn test_malformed_xml_keeps_earlier_shapes() {
        let mut xml = slide(&text_shape(r#"<a:p><a:r><a:t>Kept</a:t></a:r></a:p>"#));
        xml = xml.replace("</p:spTree>", "<p:sp></p:wrong></p:spTree>");
        let shapes = scan_slide(&xml).unwrap();

        assert_eq!(shapes.texts.len(), 1);
        assert_eq!(shapes.texts[0].text, "Kept");
    }
}
