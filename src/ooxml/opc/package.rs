/// In-memory OPC packages.
///
/// [`OpcPackage`] is the builder used when generating a container from
/// scratch: parts are added with their content type and relationships, and
/// [`PackageWriter`](crate::ooxml::opc::pkgwriter::PackageWriter) serializes it.
/// [`RawPackage`] holds the members of an existing container verbatim so a few
/// of them can be edited and the rest written back untouched.
use crate::common::error::{Error, Result};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::path::Path;

/// A part of a package under construction.
#[derive(Debug, Clone)]
pub struct Part {
    /// Member name without the leading slash (`word/document.xml`)
    pub membername: String,
    pub content_type: String,
    pub blob: Vec<u8>,
    pub rels: Relationships,
}

/// Package under construction.
#[derive(Debug, Default)]
pub struct OpcPackage {
    rels: Relationships,
    parts: Vec<Part>,
}

impl OpcPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package-level relationships (`_rels/.rels`).
    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Add a part, returning a mutable handle for wiring its relationships.
    pub fn add_part(
        &mut self,
        membername: impl Into<String>,
        content_type: &str,
        blob: Vec<u8>,
    ) -> &mut Part {
        self.parts.push(Part {
            membername: membername.into(),
            content_type: content_type.to_string(),
            blob,
            rels: Relationships::new(),
        });
        let last = self.parts.len() - 1;
        &mut self.parts[last]
    }

    pub fn iter_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    pub fn part(&self, membername: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.membername == membername)
    }

    /// Serialize and write the package, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = PackageWriter::to_bytes(self)?;
        write_file(path.as_ref(), &bytes)
    }
}

/// Members of an existing package, kept verbatim.
pub struct RawPackage {
    entries: Vec<(String, Vec<u8>)>,
}

impl RawPackage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = PhysPkgReader::open(path)?;
        Ok(Self {
            entries: reader.entries()?,
        })
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut reader = PhysPkgReader::from_bytes(data)?;
        Ok(Self {
            entries: reader.entries()?,
        })
    }

    pub fn get(&self, membername: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(name, _)| name == membername)
            .map(|(_, blob)| blob.as_slice())
    }

    /// Like [`get`](Self::get), failing when the member is missing.
    pub fn require(&self, membername: &str) -> Result<&[u8]> {
        self.get(membername)
            .ok_or_else(|| Error::Zip(format!("part not found: {membername}")))
    }

    /// Replace a member's content, appending it when absent.
    pub fn set(&mut self, membername: &str, blob: Vec<u8>) {
        match self.entries.iter_mut().find(|(name, _)| name == membername) {
            Some(entry) => entry.1 = blob,
            None => self.entries.push((membername.to_string(), blob)),
        }
    }

    pub fn contains(&self, membername: &str) -> bool {
        self.get(membername).is_some()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();
        for (name, blob) in &self.entries {
            writer.write(name, blob)?;
        }
        writer.finish()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_file(path.as_ref(), &bytes)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};

    #[test]
    fn test_raw_package_edit_keeps_other_members() {
        let mut pkg = OpcPackage::new();
        pkg.rels_mut().add(rt::OFFICE_DOCUMENT, "word/document.xml");
        pkg.add_part("word/document.xml", ct::WML_DOCUMENT_MAIN, b"<w:document/>".to_vec());
        let bytes = PackageWriter::to_bytes(&pkg).unwrap();

        let mut raw = RawPackage::from_bytes(bytes).unwrap();
        assert!(raw.contains("[Content_Types].xml"));
        assert!(raw.contains("_rels/.rels"));
        raw.set("word/document.xml", b"<w:document>edited</w:document>".to_vec());
        raw.set("docProps/custom.xml", b"<x/>".to_vec());

        let reread = RawPackage::from_bytes(raw.to_bytes().unwrap()).unwrap();
        assert_eq!(
            reread.require("word/document.xml").unwrap(),
            b"<w:document>edited</w:document>"
        );
        assert_eq!(reread.get("docProps/custom.xml").unwrap(), b"<x/>");
        assert!(reread.require("word/missing.xml").is_err());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("deeper").join("out.zip");
        let mut pkg = OpcPackage::new();
        pkg.add_part("a.xml", ct::XML, b"<a/>".to_vec());
        pkg.save(&dest).unwrap();
        assert!(dest.is_file());
    }
}
