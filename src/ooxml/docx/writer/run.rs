/// Run types for generated DOCX paragraphs.
use crate::common::error::Result;
use crate::common::xml::{escape_xml, sanitize_xml_text};
use std::fmt::Write as FmtWrite;

/// What a run carries.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RunContent {
    Text(String),
    /// Current page number field (`PAGE`)
    PageField,
}

/// Character formatting of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RunProperties {
    pub(crate) bold: bool,
    pub(crate) font_name: Option<String>,
    /// Font size in half-points
    pub(crate) font_size: Option<u32>,
}

impl RunProperties {
    fn has_properties(&self) -> bool {
        self.bold || self.font_name.is_some() || self.font_size.is_some()
    }
}

/// A run of uniformly formatted content.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Run {
    pub(crate) content: RunContent,
    pub(crate) properties: RunProperties,
}

impl Run {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            content: RunContent::Text(text.into()),
            properties: RunProperties::default(),
        }
    }

    pub(crate) fn page_field() -> Self {
        Self {
            content: RunContent::PageField,
            properties: RunProperties::default(),
        }
    }

    pub(crate) fn bold(mut self, bold: bool) -> Self {
        self.properties.bold = bold;
        self
    }

    pub(crate) fn font_name(mut self, name: &str) -> Self {
        self.properties.font_name = Some(name.to_string());
        self
    }

    /// Set the font size in points.
    pub(crate) fn font_size_pt(mut self, points: f64) -> Self {
        self.properties.font_size = Some(points_to_half_points(points));
        self
    }

    pub(crate) fn to_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<w:r>");

        if self.properties.has_properties() {
            xml.push_str("<w:rPr>");
            if let Some(ref font_name) = self.properties.font_name {
                let font_name = escape_xml(font_name);
                write!(
                    xml,
                    "<w:rFonts w:ascii=\"{font_name}\" w:hAnsi=\"{font_name}\" w:cs=\"{font_name}\"/>"
                )?;
            }
            if self.properties.bold {
                xml.push_str("<w:b/>");
            }
            if let Some(size) = self.properties.font_size {
                write!(xml, "<w:sz w:val=\"{size}\"/><w:szCs w:val=\"{size}\"/>")?;
            }
            xml.push_str("</w:rPr>");
        }

        match &self.content {
            RunContent::Text(text) => {
                write!(
                    xml,
                    "<w:t xml:space=\"preserve\">{}</w:t>",
                    escape_xml(&sanitize_xml_text(text))
                )?;
            },
            RunContent::PageField => {
                xml.push_str("<w:fldChar w:fldCharType=\"begin\"/>");
                xml.push_str("<w:instrText xml:space=\"preserve\">PAGE</w:instrText>");
                xml.push_str("<w:fldChar w:fldCharType=\"end\"/>");
            },
        }

        xml.push_str("</w:r>");
        Ok(())
    }
}

/// Convert points to the half-point unit of `w:sz`.
pub(crate) fn points_to_half_points(points: f64) -> u32 {
    (points * 2.0).round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_run() {
        let mut xml = String::new();
        Run::text("a < b").to_xml(&mut xml).unwrap();
        assert_eq!(xml, "<w:r><w:t xml:space=\"preserve\">a &lt; b</w:t></w:r>");
    }

    #[test]
    fn test_formatted_run() {
        let mut xml = String::new();
        Run::text("Bold")
            .bold(true)
            .font_name("Calibri")
            .font_size_pt(11.0)
            .to_xml(&mut xml)
            .unwrap();
        assert!(xml.contains("<w:rFonts w:ascii=\"Calibri\""));
        assert!(xml.contains("<w:b/>"));
        assert!(xml.contains("<w:sz w:val=\"22\"/>"));
    }

    #[test]
    fn test_control_characters_are_dropped() {
        let mut xml = String::new();
        Run::text("a\u{1}b").to_xml(&mut xml).unwrap();
        assert!(xml.contains(">ab<"));
    }

    #[test]
    fn test_page_field() {
        let mut xml = String::new();
        Run::page_field().to_xml(&mut xml).unwrap();
        assert!(xml.contains("w:fldCharType=\"begin\""));
        assert!(xml.contains(">PAGE<"));
        assert!(xml.contains("w:fldCharType=\"end\""));
    }
}
