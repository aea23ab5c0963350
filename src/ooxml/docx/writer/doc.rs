/// Document builder for generated DOCX files.
use crate::common::error::Result;
use crate::common::xml::escape_xml;
use crate::ooxml::opc::{OpcPackage, Relationships};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use chrono::{SecondsFormat, Utc};
use std::fmt::Write as FmtWrite;
use std::path::Path;

use super::paragraph::Paragraph;
use super::run::Run;
use super::section::SectionProperties;
use super::style::{generate_numbering_xml, generate_styles_xml, heading_style};

const DOCUMENT_MEMBER: &str = "word/document.xml";
const STYLES_MEMBER: &str = "word/styles.xml";
const NUMBERING_MEMBER: &str = "word/numbering.xml";
const FOOTER_MEMBER: &str = "word/footer1.xml";
const CORE_MEMBER: &str = "docProps/core.xml";

/// A Word document under construction.
///
/// Holds the body paragraphs, the page setup of its single section and an
/// optional footer; [`save`](Self::save) turns it into a package.
#[derive(Debug)]
pub(crate) struct DocumentBuilder {
    body: Vec<Paragraph>,
    section: SectionProperties,
    footer: Option<Paragraph>,
    default_font: String,
    title: Option<String>,
}

impl DocumentBuilder {
    pub(crate) fn new() -> Self {
        Self {
            body: Vec::new(),
            section: SectionProperties::default(),
            footer: None,
            default_font: "Calibri".to_string(),
            title: None,
        }
    }

    pub(crate) fn section_mut(&mut self) -> &mut SectionProperties {
        &mut self.section
    }

    /// Font written into the document defaults of the style sheet.
    pub(crate) fn set_default_font(&mut self, font_name: &str) {
        self.default_font = font_name.to_string();
    }

    /// Title recorded in the core properties.
    pub(crate) fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    pub(crate) fn add(&mut self, paragraph: Paragraph) -> &mut Paragraph {
        self.body.push(paragraph);
        let last = self.body.len() - 1;
        &mut self.body[last]
    }

    /// Add a heading paragraph with a single run.
    pub(crate) fn add_heading(&mut self, text: &str, level: u8) -> &mut Paragraph {
        self.add(Paragraph::with_style(heading_style(level)).with_run(Run::text(text)))
    }

    /// Add a paragraph holding `text` in one run, optionally styled.
    pub(crate) fn add_paragraph(&mut self, text: &str, style: Option<&'static str>) -> &mut Paragraph {
        let mut paragraph = Paragraph::new();
        paragraph.style = style;
        self.add(paragraph.with_run(Run::text(text)))
    }

    /// Put a footer holding a centered page-number field on every page.
    pub(crate) fn add_page_numbers(&mut self) {
        self.footer = Some(Paragraph::new().centered().with_run(Run::page_field()));
    }

    #[cfg(test)]
    pub(crate) fn paragraphs(&self) -> &[Paragraph] {
        &self.body
    }

    fn document_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.body.len() * 256);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
        );
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        xml.push_str("<w:body>");
        for paragraph in &self.body {
            paragraph.to_xml(&mut xml)?;
        }
        self.section.to_xml(&mut xml)?;
        xml.push_str("</w:body></w:document>");
        Ok(xml)
    }

    fn footer_xml(paragraph: &Paragraph) -> Result<String> {
        let mut xml = String::with_capacity(512);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
        );
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        paragraph.to_xml(&mut xml)?;
        xml.push_str("</w:ftr>");
        Ok(xml)
    }

    fn core_properties_xml(&self) -> Result<String> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut xml = String::with_capacity(768);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
        if let Some(ref title) = self.title {
            write!(xml, "<dc:title>{}</dc:title>", escape_xml(title))?;
        }
        write!(
            xml,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#
        )?;
        xml.push_str("</cp:coreProperties>");
        Ok(xml)
    }

    /// Assemble the OPC package.
    pub(crate) fn to_package(mut self) -> Result<OpcPackage> {
        let mut package = OpcPackage::new();
        package.rels_mut().add(rt::OFFICE_DOCUMENT, DOCUMENT_MEMBER);
        package.rels_mut().add(rt::CORE_PROPERTIES, CORE_MEMBER);

        let styles = generate_styles_xml(&self.default_font)?;
        let numbering = generate_numbering_xml()?;
        let footer = self.footer.as_ref().map(Self::footer_xml).transpose()?;
        let core = self.core_properties_xml()?;

        let mut document_rels = Relationships::new();
        document_rels.add(rt::STYLES, "styles.xml");
        document_rels.add(rt::NUMBERING, "numbering.xml");
        if footer.is_some() {
            self.section.footer_rel = Some(document_rels.add(rt::FOOTER, "footer1.xml"));
        }

        let document = self.document_xml()?;
        package
            .add_part(DOCUMENT_MEMBER, ct::WML_DOCUMENT_MAIN, document.into_bytes())
            .rels = document_rels;
        package.add_part(STYLES_MEMBER, ct::WML_STYLES, styles.into_bytes());
        package.add_part(NUMBERING_MEMBER, ct::WML_NUMBERING, numbering.into_bytes());
        if let Some(footer) = footer {
            package.add_part(FOOTER_MEMBER, ct::WML_FOOTER, footer.into_bytes());
        }
        package.add_part(CORE_MEMBER, ct::OPC_CORE_PROPERTIES, core.into_bytes());

        Ok(package)
    }

    /// Serialize and write the document, creating parent directories.
    pub(crate) fn save<P: AsRef<Path>>(self, path: P) -> Result<()> {
        self.to_package()?.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::PhysPkgReader;
    use crate::ooxml::opc::pkgwriter::PackageWriter;

    #[test]
    fn test_package_layout() {
        let mut doc = DocumentBuilder::new();
        doc.add_heading("Intro", 2);
        doc.add_paragraph("Body", None);
        doc.add_page_numbers();

        let bytes = PackageWriter::to_bytes(&doc.to_package().unwrap()).unwrap();
        let mut reader = PhysPkgReader::from_bytes(bytes).unwrap();
        for member in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/numbering.xml",
            "word/footer1.xml",
            "docProps/core.xml",
        ] {
            assert!(reader.contains(member), "missing {member}");
        }

        let document = String::from_utf8(reader.blob_for("word/document.xml").unwrap()).unwrap();
        assert!(document.contains("<w:pStyle w:val=\"Heading2\"/>"));
        assert!(document.contains("<w:footerReference w:type=\"default\" r:id=\"rId3\"/>"));

        let footer = String::from_utf8(reader.blob_for("word/footer1.xml").unwrap()).unwrap();
        assert!(footer.contains(">PAGE<"));
    }

    #[test]
    fn test_no_footer_without_page_numbers() {
        let mut doc = DocumentBuilder::new();
        doc.add_paragraph("Body", None);
        let package = doc.to_package().unwrap();
        assert!(package.part("word/footer1.xml").is_none());
        let document = String::from_utf8(package.part("word/document.xml").unwrap().blob.clone())
            .unwrap();
        assert!(!document.contains("footerReference"));
    }
}
