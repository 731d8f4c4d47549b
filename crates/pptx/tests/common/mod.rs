//! In-memory PPTX fixtures.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub enum Shape {
    /// Text box; `sz` is the first run's size in centipoints.
    Text { text: String, sz: Option<u32> },
    Picture { bytes: Vec<u8>, ext: String },
    Group(Vec<(Vec<u8>, String)>),
}

impl Shape {
    pub fn text(text: &str, sz: Option<u32>) -> Self {
        Shape::Text {
            text: text.to_string(),
            sz,
        }
    }

    pub fn picture(bytes: &[u8], ext: &str) -> Self {
        Shape::Picture {
            bytes: bytes.to_vec(),
            ext: ext.to_string(),
        }
    }
}

#[derive(Default)]
pub struct DeckBuilder {
    slides: Vec<Vec<Shape>>,
    reverse_rel_ids: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, shapes: Vec<Shape>) -> Self {
        self.slides.push(shapes);
        self
    }

    /// Number slide relationships in reverse, so only `sldIdLst` gives the right order.
    pub fn reverse_relationship_ids(mut self) -> Self {
        self.reverse_rel_ids = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        let count = self.slides.len();
        let rel_id = |i: usize| {
            if self.reverse_rel_ids {
                format!("rId{}", count - i + 1)
            } else {
                format!("rId{}", i + 1)
            }
        };

        let mut sld_ids = String::new();
        let mut pres_rels = String::new();
        for i in 1..=count {
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + i, rel_id(i)));
            pres_rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                rel_id(i),
                REL_SLIDE,
                i
            ));
        }

        put(
            &mut zip,
            options,
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.as_bytes(),
        );
        put(
            &mut zip,
            options,
            "ppt/presentation.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:presentation {}><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
                NS, sld_ids
            )
            .as_bytes(),
        );
        put(
            &mut zip,
            options,
            "ppt/_rels/presentation.xml.rels",
            rels(&pres_rels).as_bytes(),
        );

        let mut media_count = 0;
        for (i, shapes) in self.slides.iter().enumerate() {
            let number = i + 1;
            let mut tree = String::new();
            let mut slide_rels = String::new();
            let mut media = Vec::new();

            let mut add_image = |bytes: &Vec<u8>, ext: &String, slide_rels: &mut String| {
                media_count += 1;
                let rid = format!("rIdImg{}", media_count);
                let name = format!("image{}.{}", media_count, ext);
                slide_rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="../media/{}"/>"#,
                    rid, REL_IMAGE, name
                ));
                media.push((format!("ppt/media/{}", name), bytes.clone()));
                rid
            };

            for shape in shapes {
                match shape {
                    Shape::Text { text, sz } => {
                        let rpr = match sz {
                            Some(sz) => format!(r#"<a:rPr lang="de-DE" sz="{}"/>"#, sz),
                            None => r#"<a:rPr lang="de-DE"/>"#.to_string(),
                        };
                        tree.push_str(&format!(
                            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Text"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r>{}<a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                            rpr,
                            escape(text)
                        ));
                    }
                    Shape::Picture { bytes, ext } => {
                        let rid = add_image(bytes, ext, &mut slide_rels);
                        tree.push_str(&pic(&rid));
                    }
                    Shape::Group(pictures) => {
                        let mut inner = String::new();
                        for (bytes, ext) in pictures {
                            let rid = add_image(bytes, ext, &mut slide_rels);
                            inner.push_str(&pic(&rid));
                        }
                        tree.push_str(&format!(
                            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="4" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:grpSp>"#,
                            inner
                        ));
                    }
                }
            }

            put(
                &mut zip,
                options,
                &format!("ppt/slides/slide{}.xml", number),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
                    NS, tree
                )
                .as_bytes(),
            );
            put(
                &mut zip,
                options,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                rels(&slide_rels).as_bytes(),
            );
            for (path, bytes) in media {
                put(&mut zip, options, &path, &bytes);
            }
        }

        zip.finish().unwrap().into_inner()
    }
}

fn put(zip: &mut ZipWriter<Cursor<Vec<u8>>>, options: FileOptions, name: &str, bytes: &[u8]) {
    zip.start_file(name, options).unwrap();
    zip.write_all(bytes).unwrap();
}

fn rels(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

fn pic(rid: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill><p:spPr/></p:pic>"#,
        rid
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
