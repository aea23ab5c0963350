/// Paragraph types for generated DOCX documents.
use crate::common::error::Result;
use crate::common::xml::escape_xml;
use std::fmt::Write as FmtWrite;

use super::run::Run;

/// Twips per point.
const TWIPS_PER_POINT: f64 = 20.0;

/// Paragraph-level formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ParagraphProperties {
    pub(crate) centered: bool,
    /// Space after in twips
    pub(crate) space_after: Option<u32>,
    /// Line spacing as a multiple of single spacing
    pub(crate) line_spacing: Option<f64>,
}

impl ParagraphProperties {
    fn has_properties(&self) -> bool {
        self.centered || self.space_after.is_some() || self.line_spacing.is_some()
    }
}

/// A paragraph under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Paragraph {
    /// Paragraph style ID (`Heading2`, `ListBullet`, ...)
    pub(crate) style: Option<&'static str>,
    pub(crate) properties: ParagraphProperties,
    pub(crate) runs: Vec<Run>,
}

impl Paragraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_style(style: &'static str) -> Self {
        Self {
            style: Some(style),
            ..Self::default()
        }
    }

    pub(crate) fn centered(mut self) -> Self {
        self.properties.centered = true;
        self
    }

    /// Set the space after the paragraph in points.
    pub(crate) fn space_after_pt(mut self, points: f64) -> Self {
        self.properties.space_after = Some((points * TWIPS_PER_POINT).round() as u32);
        self
    }

    pub(crate) fn line_spacing(mut self, factor: f64) -> Self {
        self.properties.line_spacing = Some(factor);
        self
    }

    pub(crate) fn push(&mut self, run: Run) {
        self.runs.push(run);
    }

    pub(crate) fn with_run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub(crate) fn to_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<w:p>");

        if self.style.is_some() || self.properties.has_properties() {
            xml.push_str("<w:pPr>");

            if let Some(style) = self.style {
                write!(xml, "<w:pStyle w:val=\"{}\"/>", escape_xml(style))?;
            }

            if self.properties.space_after.is_some() || self.properties.line_spacing.is_some() {
                xml.push_str("<w:spacing");
                if let Some(after) = self.properties.space_after {
                    write!(xml, " w:after=\"{after}\"")?;
                }
                if let Some(factor) = self.properties.line_spacing {
                    let line = (factor * 240.0).round() as u32;
                    write!(xml, " w:line=\"{line}\" w:lineRule=\"auto\"")?;
                }
                xml.push_str("/>");
            }

            if self.properties.centered {
                xml.push_str("<w:jc w:val=\"center\"/>");
            }

            xml.push_str("</w:pPr>");
        }

        for run in &self.runs {
            run.to_xml(xml)?;
        }

        xml.push_str("</w:p>");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_paragraph() {
        let mut xml = String::new();
        Paragraph::new().to_xml(&mut xml).unwrap();
        assert_eq!(xml, "<w:p></w:p>");
    }

    #[test]
    fn test_spacing_and_alignment() {
        let mut xml = String::new();
        Paragraph::with_style("Heading1")
            .centered()
            .space_after_pt(6.0)
            .line_spacing(1.15)
            .with_run(Run::text("x"))
            .to_xml(&mut xml)
            .unwrap();
        assert!(xml.starts_with("<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/>"));
        assert!(xml.contains("<w:spacing w:after=\"120\" w:line=\"276\" w:lineRule=\"auto\"/>"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
        assert!(xml.ends_with("</w:r></w:p>"));
    }
}
