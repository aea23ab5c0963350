//! Directory listing and batch extraction.

use crate::common::error::{Error, Result};
use crate::common::format::{Format, FormatRegistry};
use crate::extract::Extractor;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Snapshot of one supported file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub path: PathBuf,
    /// Format label, e.g. `Word Document`
    #[serde(rename = "type")]
    pub label: String,
    /// Lowercase, dot-prefixed
    pub extension: String,
    pub size_bytes: u64,
    /// Size in MiB rounded to two decimals
    pub size_mb: f64,
    /// Local time
    pub modified: NaiveDateTime,
    /// Local time: the inode change time (`st_ctime`) on Unix, the creation
    /// time elsewhere, the modification time when neither is available
    pub created: NaiveDateTime,
}

/// Metadata of any file, supported or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub extension: String,
    /// Format label, `Unsupported` outside the registry
    #[serde(rename = "type")]
    pub label: String,
    pub supported: bool,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub modified: NaiveDateTime,
    /// As [`FileRecord::created`]
    pub created: NaiveDateTime,
}

/// Lists and extracts the supported files under a directory.
#[derive(Debug, Clone, Default)]
pub struct DirectoryWalker {
    extractor: Extractor,
}

impl DirectoryWalker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk with `extractor`, and its registry for filtering.
    pub fn with_extractor(extractor: Extractor) -> Self {
        Self { extractor }
    }

    fn registry(&self) -> &FormatRegistry {
        self.extractor.registry()
    }

    /// Supported files under `root`, sorted by path.
    ///
    /// Without `recursive` only the immediate entries of `root` are listed.
    ///
    /// # Errors
    /// `DirectoryNotFound` / `NotADirectory` for a bad root, `Io` when the
    /// root cannot be read. Unreadable subdirectories are skipped.
    pub fn list_files<P: AsRef<Path>>(&self, root: P, recursive: bool) -> Result<Vec<FileRecord>> {
        let root = root.as_ref();
        self.supported_files(root, recursive)?
            .into_iter()
            .map(|path| {
                let meta = fs::metadata(&path)?;
                let format = Format::from_path(&path);
                Ok(FileRecord {
                    name: file_name(&path),
                    label: format.map(Format::label).unwrap_or("Unknown").to_string(),
                    extension: lowercase_extension(&path),
                    size_bytes: meta.len(),
                    size_mb: size_in_mb(meta.len()),
                    modified: local_time(meta.modified().ok()),
                    created: created_time(&meta),
                    path,
                })
            })
            .collect()
    }

    /// Extract every supported file under `root` into one text.
    ///
    /// Each file gets a banner (`=== name ===`, path, type, `Content:`), its
    /// text and a separator line. A file that fails contributes its error text
    /// in place of content and the walk goes on.
    ///
    /// # Errors
    /// As [`list_files`](Self::list_files).
    pub fn extract_all<P: AsRef<Path>>(&self, root: P, recursive: bool) -> Result<String> {
        let root = root.as_ref();
        let files = self.supported_files(root, recursive)?;
        if files.is_empty() {
            return Ok(format!("No supported files found in {}", root.display()));
        }

        let mut parts: Vec<String> = Vec::with_capacity(files.len() * 7);
        for path in &files {
            info!(path = %path.display(), "processing");
            let text = match self.extractor.extract(path) {
                Ok(doc) => doc.text,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "extraction failed, continuing");
                    err.to_string()
                },
            };
            let label = Format::from_path(path).map(Format::label).unwrap_or("Unknown");

            parts.push(format!("=== {} ===", file_name(path)));
            parts.push(format!("Path: {}", path.display()));
            parts.push(format!("Type: {label}"));
            parts.push("Content:".to_string());
            parts.push(text);
            parts.push("=".repeat(50));
            parts.push(String::new());
        }
        Ok(parts.join("\n"))
    }

    /// Metadata of a single file.
    ///
    /// # Errors
    /// `FileNotFound` / `NotAFile` for a bad path.
    pub fn file_info<P: AsRef<Path>>(&self, path: P) -> Result<FileInfo> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }
        let meta = fs::metadata(path)?;
        let extension = lowercase_extension(path);
        let descriptor = self.registry().describe(&extension);

        Ok(FileInfo {
            name: file_name(path),
            path: path.to_path_buf(),
            label: descriptor.map(|d| d.label).unwrap_or("Unsupported").to_string(),
            supported: descriptor.is_some(),
            extension,
            size_bytes: meta.len(),
            size_mb: size_in_mb(meta.len()),
            modified: local_time(meta.modified().ok()),
            created: created_time(&meta),
        })
    }

    fn supported_files(&self, root: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(Error::DirectoryNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        self.visit_dir(root, recursive, &mut files, true)?;
        files.sort();
        debug!(root = %root.display(), recursive, files = files.len(), "collected supported files");
        Ok(files)
    }

    fn visit_dir(&self, dir: &Path, recursive: bool, files: &mut Vec<PathBuf>, is_root: bool) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if !is_root => {
                warn!(dir = %dir.display(), error = %err, "cannot read directory");
                return Ok(());
            },
            Err(err) => return Err(err.into()),
        };

        for entry in entries.flatten() {
            let path = entry.path();
            // symlinked directories are not followed
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if is_dir {
                if recursive {
                    self.visit_dir(&path, recursive, files, false)?;
                }
            } else if path.is_file() && self.registry().is_supported(&lowercase_extension(&path)) {
                files.push(path);
            }
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `.ext` in lowercase, empty when the path has none.
fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn size_in_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

fn local_time(time: Option<SystemTime>) -> NaiveDateTime {
    time.map(|t| DateTime::<Local>::from(t).naive_local())
        .unwrap_or_default()
}

#[cfg(unix)]
fn created_time(meta: &Metadata) -> NaiveDateTime {
    use chrono::Utc;
    use std::os::unix::fs::MetadataExt;
    u32::try_from(meta.ctime_nsec())
        .ok()
        .and_then(|nanos| DateTime::<Utc>::from_timestamp(meta.ctime(), nanos))
        .map(|t| t.with_timezone(&Local).naive_local())
        .unwrap_or_else(|| local_time(meta.modified().ok()))
}

#[cfg(not(unix))]
fn created_time(meta: &Metadata) -> NaiveDateTime {
    local_time(meta.created().or_else(|_| meta.modified()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;

    fn touch(path: &Path, bytes: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_listing_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.XLSX"), b"x");
        touch(&dir.path().join("a.pdf"), b"x");
        touch(&dir.path().join("notes.txt"), b"x");
        touch(&dir.path().join("sub").join("c.docx"), b"x");

        let walker = DirectoryWalker::new();
        let flat: Vec<String> = walker
            .list_files(dir.path(), false)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(flat, vec!["a.pdf", "b.XLSX"]);

        let deep = walker.list_files(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 3);
        assert_eq!(deep[1].extension, ".xlsx");
        assert_eq!(deep[1].label, "Excel Spreadsheet");
        assert_eq!(deep[2].name, "c.docx");
    }

    #[test]
    fn test_record_serialization() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.pptx"), &[0u8; 2048]);
        let record = DirectoryWalker::new().list_files(dir.path(), false).unwrap().remove(0);
        assert_eq!(record.size_bytes, 2048);
        assert_eq!(record.size_mb, 0.0);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "PowerPoint Presentation");
        assert_eq!(json["extension"], ".pptx");
        assert!(json["modified"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_bad_roots() {
        let dir = tempfile::tempdir().unwrap();
        let walker = DirectoryWalker::new();
        assert_eq!(
            walker.list_files(dir.path().join("missing"), false).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        let file = dir.path().join("a.docx");
        touch(&file, b"x");
        let err = walker.extract_all(&file, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotADirectory);
        assert!(err.to_string().starts_with("Error: Path is not a directory - "));
    }

    #[test]
    fn test_extract_all_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("broken.docx"), b"not a zip");
        let text = DirectoryWalker::new().extract_all(dir.path(), false).unwrap();
        assert!(text.starts_with("=== broken.docx ===\nPath: "));
        assert!(text.contains("Type: Word Document\nContent:\nError reading DOCX: "));
        assert!(text.ends_with(&format!("{}\n", "=".repeat(50))));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let text = DirectoryWalker::new().extract_all(dir.path(), true).unwrap();
        assert_eq!(text, format!("No supported files found in {}", dir.path().display()));
    }

    #[cfg(unix)]
    #[test]
    fn test_created_is_status_change_time() {
        use chrono::Utc;
        use std::os::unix::fs::MetadataExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.docx");
        touch(&path, b"x");
        let meta = fs::metadata(&path).unwrap();
        let record = DirectoryWalker::new().list_files(dir.path(), false).unwrap().remove(0);
        let expected = DateTime::<Utc>::from_timestamp(meta.ctime(), meta.ctime_nsec() as u32)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(record.created, expected);
    }

    #[test]
    fn test_file_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.md");
        touch(&path, b"# hi");
        let info = DirectoryWalker::new().file_info(&path).unwrap();
        assert!(!info.supported);
        assert_eq!(info.label, "Unsupported");
        assert_eq!(info.extension, ".md");
        assert_eq!(info.size_bytes, 4);
        assert_ne!(info.created, NaiveDateTime::default());

        assert_eq!(
            DirectoryWalker::new().file_info(dir.path()).unwrap_err().kind(),
            ErrorKind::NotAFile
        );
    }
}
