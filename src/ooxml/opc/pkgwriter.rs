//! Package writer for OPC packages.
//!
//! Serializes an [`OpcPackage`] to ZIP bytes: `[Content_Types].xml`, the
//! package relationships, then every part followed by its own relationships.

use crate::common::error::Result;
use crate::common::xml::{attr_value, escape_xml};
use crate::ooxml::opc::constants::{content_type as ct, namespace};
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::phys_pkg::{PhysPkgWriter, rels_membername};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

/// Member name of the content types part.
pub const CONTENT_TYPES_MEMBER: &str = "[Content_Types].xml";

/// Package writer that serializes an OPC package to a ZIP buffer.
pub struct PackageWriter;

impl PackageWriter {
    /// Serialize an OPC package to bytes.
    pub fn to_bytes(package: &OpcPackage) -> Result<Vec<u8>> {
        let mut phys_writer = PhysPkgWriter::new();

        let cti = ContentTypes::from_package(package);
        phys_writer.write(CONTENT_TYPES_MEMBER, cti.to_xml()?.as_bytes())?;

        phys_writer.write(&rels_membername(""), package.rels().to_xml()?.as_bytes())?;

        for part in package.iter_parts() {
            phys_writer.write(&part.membername, &part.blob)?;
            if !part.rels.is_empty() {
                phys_writer.write(
                    &rels_membername(&part.membername),
                    part.rels.to_xml()?.as_bytes(),
                )?;
            }
        }

        phys_writer.finish()
    }
}

/// `[Content_Types].xml` model: extension defaults plus per-part overrides.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }
}

impl ContentTypes {
    fn from_package(package: &OpcPackage) -> Self {
        let mut cti = Self::default();
        for part in package.iter_parts() {
            cti.add_content_type(&part.membername, &part.content_type);
        }
        cti
    }

    /// Parse an existing `[Content_Types].xml`.
    pub fn from_xml(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut cti = Self {
            defaults: BTreeMap::new(),
            overrides: BTreeMap::new(),
        };
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"Default" => {
                        if let Some(ext) = attr_value(&e, b"Extension")?
                            && let Some(content_type) = attr_value(&e, b"ContentType")?
                        {
                            cti.defaults.insert(ext.to_ascii_lowercase(), content_type);
                        }
                    },
                    b"Override" => {
                        if let Some(partname) = attr_value(&e, b"PartName")?
                            && let Some(content_type) = attr_value(&e, b"ContentType")?
                        {
                            cti.overrides.insert(partname, content_type);
                        }
                    },
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }
        Ok(cti)
    }

    /// Register a part; well-known extensions become defaults, others overrides.
    pub fn add_content_type(&mut self, membername: &str, content_type: &str) {
        let ext = membername.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
        if matches!(
            (ext, content_type),
            ("rels", ct::OPC_RELATIONSHIPS) | ("xml", ct::XML)
        ) {
            self.defaults
                .insert(ext.to_string(), content_type.to_string());
        } else {
            self.overrides
                .insert(format!("/{membername}"), content_type.to_string());
        }
    }

    /// Content type declared for a member, override first.
    pub fn content_type_for(&self, membername: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(&format!("/{membername}")) {
            return Some(ct);
        }
        let ext = membername.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }

    /// Generate the XML for `[Content_Types].xml`.
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES)?;

        for (ext, content_type) in &self.defaults {
            write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            )?;
        }
        for (partname, content_type) in &self.overrides {
            write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            )?;
        }

        xml.push_str("</Types>");
        Ok(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types_xml() {
        let mut cti = ContentTypes::default();
        cti.add_content_type("xl/workbook.xml", ct::SML_SHEET_MAIN);
        cti.add_content_type("xl/worksheets/sheet1.xml", ct::SML_WORKSHEET);

        let xml = cti.to_xml().unwrap();
        assert!(xml.contains(r#"<Default Extension="rels""#));
        assert!(xml.contains(r#"<Override PartName="/xl/workbook.xml""#));

        let parsed = ContentTypes::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(
            parsed.content_type_for("xl/worksheets/sheet1.xml"),
            Some(ct::SML_WORKSHEET)
        );
        assert_eq!(parsed.content_type_for("_rels/.rels"), Some(ct::OPC_RELATIONSHIPS));
        assert_eq!(parsed.content_type_for("xl/missing.bin"), None);
    }
}
