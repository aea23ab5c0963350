//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! Reading keeps the whole archive in memory and decompresses members on
//! demand. Writing accumulates deflated members into an in-memory buffer that
//! is flushed to disk in one go.

use crate::common::error::{Error, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Physical package reader over an owned ZIP buffer.
pub struct PhysPkgReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl PhysPkgReader {
    /// Open an OPC package from a file path.
    ///
    /// # Errors
    /// Returns `FileNotFound` if the path does not exist, or a ZIP error if the
    /// file is not a valid archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Create a reader from owned bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Decompressed content of a member.
    ///
    /// Member names carry no leading slash (`word/document.xml`).
    pub fn blob_for(&mut self, membername: &str) -> Result<Vec<u8>> {
        let mut file = match self.archive.by_name(membername) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(Error::Zip(format!("part not found: {membername}")));
            },
            Err(e) => return Err(e.into()),
        };
        let mut blob = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut blob)?;
        Ok(blob)
    }

    /// Like [`blob_for`](Self::blob_for) but `None` when the member is absent.
    pub fn try_blob_for(&mut self, membername: &str) -> Result<Option<Vec<u8>>> {
        if !self.contains(membername) {
            return Ok(None);
        }
        self.blob_for(membername).map(Some)
    }

    /// Relationships XML for a part (`word/document.xml` -> `word/_rels/document.xml.rels`).
    pub fn rels_xml_for(&mut self, membername: &str) -> Result<Option<Vec<u8>>> {
        self.try_blob_for(&rels_membername(membername))
    }

    /// List all member names in the package, in archive order.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(String::from).collect()
    }

    pub fn contains(&self, membername: &str) -> bool {
        self.archive.index_for_name(membername).is_some()
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Read every file member as `(name, bytes)`, in archive order.
    pub fn entries(&mut self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut out = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            out.push((name, blob));
        }
        Ok(out)
    }
}

/// Member name of the relationships part belonging to `membername`.
///
/// The package itself is addressed by the empty string.
pub fn rels_membername(membername: &str) -> String {
    match membername.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None if membername.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{membername}.rels"),
    }
}

/// Physical package writer with Deflate compression.
pub struct PhysPkgWriter {
    archive: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    /// Create a new package writer that writes to memory.
    pub fn new() -> Self {
        Self {
            archive: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write a member to the package.
    pub fn write(&mut self, membername: &str, blob: &[u8]) -> Result<()> {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.archive.start_file(membername, options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Finish writing and return the package bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.archive.finish()?;
        Ok(cursor.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut writer = PhysPkgWriter::new();
        writer.write("test.txt", b"Hello, World!").unwrap();
        let zip_data = writer.finish().unwrap();

        let mut reader = PhysPkgReader::from_bytes(zip_data).unwrap();
        assert_eq!(reader.blob_for("test.txt").unwrap(), b"Hello, World!");
        assert!(reader.try_blob_for("missing.xml").unwrap().is_none());
    }

    #[test]
    fn test_entries_keep_order() {
        let mut writer = PhysPkgWriter::new();
        writer.write("[Content_Types].xml", b"<Types/>").unwrap();
        writer.write("_rels/.rels", b"<Relationships/>").unwrap();
        writer.write("word/document.xml", b"<document/>").unwrap();

        let mut reader = PhysPkgReader::from_bytes(writer.finish().unwrap()).unwrap();
        let names: Vec<String> = reader.entries().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["[Content_Types].xml", "_rels/.rels", "word/document.xml"]);
    }

    #[test]
    fn test_rels_membername() {
        assert_eq!(rels_membername(""), "_rels/.rels");
        assert_eq!(rels_membername("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_membername("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_open_missing() {
        let err = PhysPkgReader::open("/definitely/not/here.docx").err().unwrap();
        assert_eq!(err.kind(), crate::common::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_not_a_zip() {
        assert!(PhysPkgReader::from_bytes(b"plain text".to_vec()).is_err());
    }
}
