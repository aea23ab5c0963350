//! Slide text of a PowerPoint deck.
//!
//! Slides are visited in the order of `<p:sldIdLst>`. On each slide only the
//! top-level shapes of the shape tree carry text; grouped shapes, tables and
//! pictures do not.

use crate::common::error::Result;
use crate::common::xml::{attr_value_qualified, push_entity, push_text};
use crate::ooxml::office_document_member;
use crate::ooxml::opc::{PhysPkgReader, Relationships, resolve_target};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;
use tracing::debug;

/// Text of one slide: one entry per text-bearing shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideText {
    pub shapes: Vec<String>,
}

/// Read every slide of a `.pptx` file, in presentation order.
pub fn read_slides<P: AsRef<Path>>(path: P) -> Result<Vec<SlideText>> {
    let mut pkg = PhysPkgReader::open(path)?;
    let presentation = office_document_member(&mut pkg, "ppt/presentation.xml")?;
    let rels = match pkg.rels_xml_for(&presentation)? {
        Some(xml) => Relationships::from_xml(&xml)?,
        None => Relationships::new(),
    };

    let mut slides = Vec::new();
    for r_id in parse_slide_ids(&pkg.blob_for(&presentation)?)? {
        let Some(rel) = rels.get(&r_id) else {
            debug!(r_id = %r_id, "slide id without relationship");
            continue;
        };
        let member = resolve_target(&presentation, &rel.target);
        slides.push(parse_slide(&pkg.blob_for(&member)?)?);
    }
    Ok(slides)
}

/// `r:id` of each `<p:sldId>` in deck order.
pub(crate) fn parse_slide_ids(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut ids = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sldId" => {
                if let Some(r_id) = attr_value_qualified(&e, b"r:id")? {
                    ids.push(r_id);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
    Ok(ids)
}

/// Collect the text of each top-level `<p:sp>` in a slide.
///
/// A shape's text is its paragraphs joined by `\n`; line breaks inside a
/// paragraph also become `\n`.
pub(crate) fn parse_slide(xml: &[u8]) -> Result<SlideText> {
    let mut reader = Reader::from_reader(xml);

    let mut slide = SlideText::default();
    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut shape_depth: Option<usize> = None;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut in_body = false;
    let mut in_text = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"spTree" if tree_depth.is_none() => tree_depth = Some(depth),
                    b"sp" if shape_depth.is_none() && tree_depth.is_some_and(|t| depth == t + 1) => {
                        shape_depth = Some(depth);
                        paragraphs.clear();
                    },
                    b"txBody" if shape_depth.is_some() => in_body = true,
                    b"p" if in_body => paragraphs.push(String::new()),
                    b"t" if in_body => in_text = true,
                    _ => {},
                }
            },
            Ok(Event::Empty(e)) if in_body => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"br" => {
                    if let Some(last) = paragraphs.last_mut() {
                        last.push('\n');
                    }
                },
                _ => {},
            },
            Ok(Event::Text(e)) if in_text => {
                if let Some(last) = paragraphs.last_mut() {
                    push_text(last, &e)?;
                }
            },
            Ok(Event::GeneralRef(e)) if in_text => {
                if let Some(last) = paragraphs.last_mut() {
                    push_entity(last, &e)?;
                }
            },
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"txBody" => in_body = false,
                    b"sp" if shape_depth == Some(depth) => {
                        shape_depth = None;
                        slide.shapes.push(paragraphs.join("\n"));
                    },
                    b"spTree" if tree_depth == Some(depth) => tree_depth = None,
                    _ => {},
                }
                depth = depth.saturating_sub(1);
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
    Ok(slide)
}

/// Render slides as extraction text, or `None` when no slide has text.
///
/// Each slide with at least one non-blank shape contributes its
/// `--- Slide N ---` marker, the shape texts and a blank line.
pub fn render_slides(slides: &[SlideText]) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for (i, slide) in slides.iter().enumerate() {
        let body: Vec<&String> = slide.shapes.iter().filter(|t| !t.trim().is_empty()).collect();
        if body.is_empty() {
            continue;
        }
        parts.push(format!("--- Slide {} ---", i + 1));
        parts.extend(body.into_iter().cloned());
        parts.push(String::new());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree>
  <p:nvGrpSpPr/>
  <p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>Quarterly </a:t></a:r><a:r><a:t>Review</a:t></a:r></a:p></p:txBody></p:sp>
  <p:sp><p:txBody><a:p><a:r><a:t>First</a:t></a:r><a:br/><a:r><a:t>line</a:t></a:r></a:p><a:p/><a:p><a:r><a:t>R&amp;D</a:t></a:r></a:p></p:txBody></p:sp>
  <p:grpSp><p:sp><p:txBody><a:p><a:r><a:t>Grouped</a:t></a:r></a:p></p:txBody></p:sp></p:grpSp>
  <p:sp><p:spPr/></p:sp>
</p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_parse_slide() {
        let slide = parse_slide(SLIDE.as_bytes()).unwrap();
        assert_eq!(slide.shapes, ["Quarterly Review", "First\nline\n\nR&D", ""]);
    }

    #[test]
    fn test_render_drops_empty_slides() {
        let slides = vec![
            SlideText {
                shapes: vec!["Intro".into()],
            },
            SlideText {
                shapes: vec!["  ".into()],
            },
            SlideText {
                shapes: vec!["Title".into(), "Body".into()],
            },
        ];
        assert_eq!(
            render_slides(&slides).unwrap(),
            "--- Slide 1 ---\nIntro\n\n--- Slide 3 ---\nTitle\nBody\n"
        );
        assert_eq!(render_slides(&slides[1..2]), None);
    }

    #[test]
    fn test_parse_slide_ids() {
        let xml = br#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="257" r:id="rId3"/><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#;
        assert_eq!(parse_slide_ids(xml).unwrap(), ["rId3", "rId2"]);
    }
}
