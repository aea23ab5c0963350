/// Page setup of the single section of a generated document.
use crate::common::error::Result;
use crate::common::xml::escape_xml;
use std::fmt::Write as FmtWrite;

/// Twips per inch.
pub(crate) const TWIPS_PER_INCH: f64 = 1440.0;

/// Section properties including page size, margins and the footer reference.
#[derive(Debug, Clone)]
pub(crate) struct SectionProperties {
    /// Page width in twips (twentieth of a point, 1440 = 1 inch)
    pub(crate) page_width: u32,
    /// Page height in twips
    pub(crate) page_height: u32,
    pub(crate) margin_top: u32,
    pub(crate) margin_bottom: u32,
    pub(crate) margin_left: u32,
    pub(crate) margin_right: u32,
    /// Header distance from top in twips
    pub(crate) header_distance: u32,
    /// Footer distance from bottom in twips
    pub(crate) footer_distance: u32,
    /// Relationship id of the default footer
    pub(crate) footer_rel: Option<String>,
}

impl Default for SectionProperties {
    fn default() -> Self {
        // US Letter size: 8.5" x 11" = 12240 x 15840 twips
        Self {
            page_width: 12240,
            page_height: 15840,
            margin_top: 1440,
            margin_bottom: 1440,
            margin_left: 1440,
            margin_right: 1440,
            header_distance: 720,
            footer_distance: 720,
            footer_rel: None,
        }
    }
}

impl SectionProperties {
    /// Apply the same margin, in inches, to all four sides.
    pub(crate) fn set_uniform_margins(&mut self, inches: f64) {
        let twips = inches_to_twips(inches);
        self.margin_top = twips;
        self.margin_bottom = twips;
        self.margin_left = twips;
        self.margin_right = twips;
    }

    pub(crate) fn to_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<w:sectPr>");
        if let Some(ref r_id) = self.footer_rel {
            write!(
                xml,
                "<w:footerReference w:type=\"default\" r:id=\"{}\"/>",
                escape_xml(r_id)
            )?;
        }
        write!(
            xml,
            "<w:pgSz w:w=\"{}\" w:h=\"{}\"/>",
            self.page_width, self.page_height
        )?;
        write!(
            xml,
            "<w:pgMar w:top=\"{}\" w:right=\"{}\" w:bottom=\"{}\" w:left=\"{}\" w:header=\"{}\" w:footer=\"{}\" w:gutter=\"0\"/>",
            self.margin_top,
            self.margin_right,
            self.margin_bottom,
            self.margin_left,
            self.header_distance,
            self.footer_distance
        )?;
        xml.push_str("</w:sectPr>");
        Ok(())
    }
}

pub(crate) fn inches_to_twips(inches: f64) -> u32 {
    (inches * TWIPS_PER_INCH).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_margins() {
        let mut section = SectionProperties::default();
        section.set_uniform_margins(0.5);
        assert_eq!(section.margin_top, 720);
        assert_eq!(section.margin_right, 720);

        let mut xml = String::new();
        section.to_xml(&mut xml).unwrap();
        assert!(xml.contains("w:top=\"720\""));
        assert!(!xml.contains("footerReference"));
    }

    #[test]
    fn test_footer_reference() {
        let section = SectionProperties {
            footer_rel: Some("rId3".to_string()),
            ..SectionProperties::default()
        };
        let mut xml = String::new();
        section.to_xml(&mut xml).unwrap();
        assert!(xml.starts_with("<w:sectPr><w:footerReference w:type=\"default\" r:id=\"rId3\"/>"));
    }
}
