/// Style definitions for generated DOCX documents.
///
/// Every generated document carries the same small style sheet: the normal
/// paragraph style, three heading levels and the two list styles. List styles
/// link to the numbering definitions written by
/// [`generate_numbering_xml`].
use crate::common::error::Result;
use crate::common::xml::escape_xml;
use std::fmt::Write as FmtWrite;

/// Numbering instance used by the `ListBullet` style.
pub(crate) const BULLET_NUM_ID: u32 = 1;
/// Numbering instance used by the `ListNumber` style.
pub(crate) const DECIMAL_NUM_ID: u32 = 2;

pub(crate) const STYLE_HEADING_1: &str = "Heading1";
pub(crate) const STYLE_HEADING_2: &str = "Heading2";
pub(crate) const STYLE_HEADING_3: &str = "Heading3";
pub(crate) const STYLE_LIST_BULLET: &str = "ListBullet";
pub(crate) const STYLE_LIST_NUMBER: &str = "ListNumber";

/// Heading style ID for a level.
pub(crate) fn heading_style(level: u8) -> &'static str {
    match level {
        0 | 1 => STYLE_HEADING_1,
        2 => STYLE_HEADING_2,
        _ => STYLE_HEADING_3,
    }
}

struct HeadingDef {
    id: &'static str,
    name: &'static str,
    /// Half-points
    size: u32,
    space_before: u32,
    outline_level: u8,
}

const HEADINGS: [HeadingDef; 3] = [
    HeadingDef {
        id: STYLE_HEADING_1,
        name: "heading 1",
        size: 28,
        space_before: 480,
        outline_level: 0,
    },
    HeadingDef {
        id: STYLE_HEADING_2,
        name: "heading 2",
        size: 26,
        space_before: 200,
        outline_level: 1,
    },
    HeadingDef {
        id: STYLE_HEADING_3,
        name: "heading 3",
        size: 22,
        space_before: 200,
        outline_level: 2,
    },
];

/// Generate `word/styles.xml` with `font_name` as the document default font.
pub(crate) fn generate_styles_xml(font_name: &str) -> Result<String> {
    let mut xml = String::with_capacity(4096);
    let font = escape_xml(font_name);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    );
    xml.push_str(
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    xml.push_str("<w:docDefaults>");
    xml.push_str("<w:rPrDefault><w:rPr>");
    write!(
        xml,
        r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
    )?;
    xml.push_str(r#"<w:sz w:val="22"/>"#);
    xml.push_str(r#"<w:szCs w:val="22"/>"#);
    xml.push_str("</w:rPr></w:rPrDefault>");
    xml.push_str(r#"<w:pPrDefault><w:pPr><w:spacing w:after="200" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#);
    xml.push_str("</w:docDefaults>");

    xml.push_str(
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    );

    for heading in &HEADINGS {
        write!(
            xml,
            r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
            heading.id, heading.name
        )?;
        write!(
            xml,
            r#"<w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="{}" w:after="0"/><w:outlineLvl w:val="{}"/></w:pPr>"#,
            heading.space_before, heading.outline_level
        )?;
        write!(
            xml,
            r#"<w:rPr><w:b/><w:bCs/><w:color w:val="365F91"/><w:sz w:val="{0}"/><w:szCs w:val="{0}"/></w:rPr>"#,
            heading.size
        )?;
        xml.push_str("</w:style>");
    }

    for (id, name, num_id) in [
        (STYLE_LIST_BULLET, "List Bullet", BULLET_NUM_ID),
        (STYLE_LIST_NUMBER, "List Number", DECIMAL_NUM_ID),
    ] {
        write!(
            xml,
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/><w:basedOn w:val="Normal"/><w:pPr><w:numPr><w:numId w:val="{num_id}"/></w:numPr><w:contextualSpacing/></w:pPr></w:style>"#
        )?;
    }

    xml.push_str("</w:styles>");
    Ok(xml)
}

/// Generate `word/numbering.xml` with one bullet and one decimal list.
pub(crate) fn generate_numbering_xml() -> Result<String> {
    let mut xml = String::with_capacity(1024);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    );

    let definitions = [
        (0, "bullet", "\u{2022}", BULLET_NUM_ID),
        (1, "decimal", "%1.", DECIMAL_NUM_ID),
    ];

    for (abstract_id, num_fmt, text, _) in definitions {
        write!(
            xml,
            r#"<w:abstractNum w:abstractNumId="{abstract_id}"><w:multiLevelType w:val="singleLevel"/><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="{num_fmt}"/><w:lvlText w:val="{text}"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="360" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>"#
        )?;
    }

    for (abstract_id, _, _, num_id) in definitions {
        write!(
            xml,
            r#"<w:num w:numId="{num_id}"><w:abstractNumId w:val="{abstract_id}"/></w:num>"#
        )?;
    }

    xml.push_str("</w:numbering>");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_style_ids() {
        assert_eq!(heading_style(1), "Heading1");
        assert_eq!(heading_style(2), "Heading2");
        assert_eq!(heading_style(3), "Heading3");
        assert_eq!(heading_style(9), "Heading3");
    }

    #[test]
    fn test_styles_xml() {
        let xml = generate_styles_xml("Arial & Co").unwrap();
        assert!(xml.contains(r#"w:ascii="Arial &amp; Co""#));
        assert!(xml.contains(r#"w:styleId="Heading1""#));
        assert!(xml.contains(r#"w:styleId="ListBullet""#));
        assert!(xml.contains(r#"<w:numId w:val="2"/>"#));
        assert!(xml.ends_with("</w:styles>"));
    }

    #[test]
    fn test_numbering_xml() {
        let xml = generate_numbering_xml().unwrap();
        assert!(xml.contains(r#"<w:numFmt w:val="bullet"/>"#));
        assert!(xml.contains(r#"<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>"#));
    }
}
