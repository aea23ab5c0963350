//! Plain-text view of a Word document body.
//!
//! Only the direct children of `<w:body>` are considered: top-level
//! paragraphs in document order, then every top-level table row. Text inside
//! text boxes and nested tables is not part of either.

use crate::common::error::Result;
use crate::common::xml::{attr_value, push_entity, push_text};
use crate::ooxml::office_document_member;
use crate::ooxml::opc::PhysPkgReader;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Paragraph and table text of a document body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentText {
    /// Text of every top-level paragraph, blank ones included
    pub paragraphs: Vec<String>,
    /// Top-level tables as rows of cell texts
    pub tables: Vec<Vec<Vec<String>>>,
}

impl DocumentText {
    /// Read the main document part of a `.docx` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut pkg = PhysPkgReader::open(path)?;
        let member = office_document_member(&mut pkg, "word/document.xml")?;
        Self::parse(&pkg.blob_for(&member)?)
    }

    /// Parse `document.xml`.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);

        let mut doc = DocumentText::default();
        let mut depth = 0usize;
        let mut body_depth: Option<usize> = None;
        // Depth of the paragraph whose text is being collected
        let mut para_depth: Option<usize> = None;
        let mut para = String::new();
        // Depths of the open top-level table, row and cell
        let mut tbl_depth: Option<usize> = None;
        let mut tr_depth: Option<usize> = None;
        let mut tc_depth: Option<usize> = None;
        let mut row: Vec<String> = Vec::new();
        let mut cell_paras: Vec<String> = Vec::new();
        let mut in_text = false;
        // Text boxes nest whole paragraphs inside a run
        let mut txbx_depth: Option<usize> = None;

        let mut buf = Vec::with_capacity(1024);
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    let name = e.name();
                    match name.as_ref() {
                        b"w:body" if body_depth.is_none() => body_depth = Some(depth),
                        b"w:p" if txbx_depth.is_none() && para_depth.is_none() => {
                            let top_level = body_depth.is_some_and(|b| depth == b + 1);
                            let in_cell = tc_depth.is_some_and(|c| depth == c + 1);
                            if top_level || in_cell {
                                para_depth = Some(depth);
                                para.clear();
                            }
                        },
                        b"w:tbl" if tbl_depth.is_none() => {
                            if body_depth.is_some_and(|b| depth == b + 1) {
                                tbl_depth = Some(depth);
                                doc.tables.push(Vec::new());
                            }
                        },
                        b"w:tr" if tbl_depth.is_some_and(|t| depth == t + 1) => {
                            tr_depth = Some(depth);
                            row.clear();
                        },
                        b"w:tc" if tr_depth.is_some_and(|r| depth == r + 1) => {
                            tc_depth = Some(depth);
                            cell_paras.clear();
                        },
                        b"w:txbxContent" if txbx_depth.is_none() => txbx_depth = Some(depth),
                        b"w:t" if para_depth.is_some() && txbx_depth.is_none() => in_text = true,
                        _ => {},
                    }
                },
                Ok(Event::Empty(e)) => {
                    if para_depth.is_some() && txbx_depth.is_none() {
                        push_break(&mut para, &e)?;
                    }
                    if e.name().as_ref() == b"w:p" && txbx_depth.is_none() {
                        let top_level = body_depth.is_some_and(|b| depth + 1 == b + 1);
                        let in_cell = tc_depth.is_some_and(|c| depth == c);
                        if top_level {
                            doc.paragraphs.push(String::new());
                        } else if in_cell {
                            cell_paras.push(String::new());
                        }
                    }
                },
                Ok(Event::Text(e)) if in_text => push_text(&mut para, &e)?,
                Ok(Event::GeneralRef(e)) if in_text => push_entity(&mut para, &e)?,
                Ok(Event::End(e)) => {
                    match e.name().as_ref() {
                        b"w:t" => in_text = false,
                        b"w:p" if para_depth == Some(depth) => {
                            para_depth = None;
                            let text = std::mem::take(&mut para);
                            if tc_depth.is_some_and(|c| depth == c + 1) {
                                cell_paras.push(text);
                            } else {
                                doc.paragraphs.push(text);
                            }
                        },
                        b"w:tc" if tc_depth == Some(depth) => {
                            tc_depth = None;
                            row.push(cell_paras.join("\n"));
                        },
                        b"w:tr" if tr_depth == Some(depth) => {
                            tr_depth = None;
                            if let Some(table) = doc.tables.last_mut() {
                                table.push(std::mem::take(&mut row));
                            }
                        },
                        b"w:tbl" if tbl_depth == Some(depth) => tbl_depth = None,
                        b"w:txbxContent" if txbx_depth == Some(depth) => txbx_depth = None,
                        b"w:body" if body_depth == Some(depth) => body_depth = None,
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

        Ok(doc)
    }

    /// Render as extraction text, or `None` when nothing qualifies.
    ///
    /// Non-blank paragraphs come first, then one line per table row with the
    /// non-empty trimmed cell texts joined by `" | "`.
    pub fn render(&self) -> Option<String> {
        let mut parts: Vec<String> = self
            .paragraphs
            .iter()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect();

        for table in &self.tables {
            for row in table {
                let cells: Vec<&str> = row
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .collect();
                if !cells.is_empty() {
                    parts.push(cells.join(" | "));
                }
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}

/// Run-level breaks and tabs that contribute characters to paragraph text.
fn push_break(out: &mut String, e: &BytesStart<'_>) -> Result<()> {
    match e.name().as_ref() {
        b"w:tab" => out.push('\t'),
        b"w:cr" => out.push('\n'),
        b"w:br" => {
            let kind = attr_value(e, b"type")?;
            if matches!(kind.as_deref(), None | Some("textWrapping")) {
                out.push('\n');
            }
        },
        _ => {},
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:t>Hello</w:t></w:r></w:p>
<w:p/>
<w:tbl>
  <w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc><w:tc><w:p><w:r><w:t> Qty </w:t></w:r></w:p></w:tc></w:tr>
  <w:tr><w:tc><w:p/></w:tc></w:tr>
</w:tbl>
<w:p><w:r><w:t xml:space="preserve">Tom &amp; </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>Jerry</w:t><w:tab/><w:t>end</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">   </w:t></w:r></w:p>
<w:sectPr/>
</w:body>
</w:document>"#;

    #[test]
    fn test_parse_structure() {
        let doc = DocumentText::parse(BODY.as_bytes()).unwrap();
        assert_eq!(doc.paragraphs, ["Hello", "", "Tom & Jerry\tend", "   "]);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0][0], ["Name", "", " Qty "]);
    }

    #[test]
    fn test_render_orders_tables_last() {
        let doc = DocumentText::parse(BODY.as_bytes()).unwrap();
        assert_eq!(doc.render().unwrap(), "Hello\nTom & Jerry\tend\nName | Qty");
    }

    #[test]
    fn test_render_empty() {
        let xml = br#"<w:document xmlns:w="x"><w:body><w:p/><w:sectPr/></w:body></w:document>"#;
        assert_eq!(DocumentText::parse(xml).unwrap().render(), None);
    }

    #[test]
    fn test_text_box_is_skipped() {
        let xml = br#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Outer</w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>Inner</w:t></w:r></w:p></w:txbxContent></w:pict></w:r></w:p></w:body></w:document>"#;
        let doc = DocumentText::parse(xml).unwrap();
        assert_eq!(doc.paragraphs, ["Outer"]);
    }
}
