//! Closed set of container formats and the capability registry.
//!
//! Every reader and writer consults a [`FormatRegistry`] before touching the
//! filesystem, so a missing decoder is reported up front instead of failing
//! halfway through a parse.

use crate::common::error::{Error, Result};
use std::path::Path;

/// Container formats handled by docweave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Page-based document (.pdf), read-only
    Pdf,
    /// Word-processing document (.docx)
    Docx,
    /// Presentation deck (.pptx), read-only
    Pptx,
    /// Spreadsheet workbook (.xlsx)
    Xlsx,
}

impl Format {
    /// All formats, in the order they are listed to users.
    pub const ALL: [Format; 4] = [Format::Pdf, Format::Docx, Format::Pptx, Format::Xlsx];

    /// Lowercase, dot-prefixed extension.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Pdf => ".pdf",
            Format::Docx => ".docx",
            Format::Pptx => ".pptx",
            Format::Xlsx => ".xlsx",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Format::Pdf => "PDF Document",
            Format::Docx => "Word Document",
            Format::Pptx => "PowerPoint Presentation",
            Format::Xlsx => "Excel Spreadsheet",
        }
    }

    /// Short name used in decode error messages.
    pub fn short_name(self) -> &'static str {
        match self {
            Format::Pdf => "PDF",
            Format::Docx => "DOCX",
            Format::Pptx => "PPTX",
            Format::Xlsx => "XLSX",
        }
    }

    /// Resolve an extension, with or without the leading dot, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Format::ALL
            .into_iter()
            .find(|f| f.extension()[1..].eq_ignore_ascii_case(ext))
    }

    /// Resolve the format of a path from its extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension)
    }
}

/// Capability descriptor for one supported extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub format: Format,
    pub extension: &'static str,
    pub label: &'static str,
    pub decoder_available: bool,
}

/// Capability registry, built once and handed to every component.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    descriptors: [FormatDescriptor; 4],
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Registry reflecting the decoders compiled into this build.
    pub fn new() -> Self {
        let descriptors = Format::ALL.map(|format| FormatDescriptor {
            format,
            extension: format.extension(),
            label: format.label(),
            decoder_available: match format {
                Format::Pdf => cfg!(feature = "pdf"),
                Format::Docx | Format::Pptx | Format::Xlsx => true,
            },
        });
        Self { descriptors }
    }

    /// Copy of this registry with `format` marked unavailable.
    pub fn with_disabled(mut self, format: Format) -> Self {
        for d in self.descriptors.iter_mut() {
            if d.format == format {
                d.decoder_available = false;
            }
        }
        self
    }

    /// Descriptor for `extension`, if it belongs to the supported set.
    pub fn describe(&self, extension: &str) -> Option<&FormatDescriptor> {
        let format = Format::from_extension(extension)?;
        self.descriptor(format)
    }

    pub fn descriptor(&self, format: Format) -> Option<&FormatDescriptor> {
        self.descriptors.iter().find(|d| d.format == format)
    }

    pub fn is_supported(&self, extension: &str) -> bool {
        self.describe(extension).is_some()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FormatDescriptor> {
        self.descriptors.iter()
    }

    /// Comma-separated list of supported extensions.
    pub fn supported_list(&self) -> String {
        self.descriptors
            .iter()
            .map(|d| d.extension)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Resolve the format of `path`, failing with `Unsupported` otherwise.
    pub fn resolve(&self, path: &Path) -> Result<Format> {
        Format::from_path(path).ok_or_else(|| Error::Unsupported {
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default(),
            supported: self.supported_list(),
        })
    }

    /// Fail with `DependencyMissing` when the decoder for `format` is absent.
    pub fn require(&self, format: Format) -> Result<()> {
        let available = self
            .descriptor(format)
            .is_some_and(|d| d.decoder_available);
        if available {
            return Ok(());
        }
        Err(missing_capability(format))
    }
}

/// `DependencyMissing` error naming the absent codec of `format`.
pub(crate) fn missing_capability(format: Format) -> Error {
    match format {
        Format::Pdf => Error::DependencyMissing {
            capability: "PDF library",
            hint: "Rebuild docweave with the `pdf` feature enabled.",
        },
        Format::Docx => Error::DependencyMissing {
            capability: "DOCX support",
            hint: "The word-processing codec is disabled in this registry.",
        },
        Format::Pptx => Error::DependencyMissing {
            capability: "PPTX support",
            hint: "The presentation codec is disabled in this registry.",
        },
        Format::Xlsx => Error::DependencyMissing {
            capability: "XLSX support",
            hint: "The spreadsheet codec is disabled in this registry.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorKind;

    #[test]
    fn test_supported_extensions() {
        let registry = FormatRegistry::new();
        for ext in [".pdf", ".docx", ".pptx", ".xlsx", "DOCX", "xlsx"] {
            assert!(registry.is_supported(ext), "{ext}");
            assert!(!registry.describe(ext).map(|d| d.label).unwrap_or("").is_empty());
        }
        for ext in [".txt", ".doc", "", ".xlsm"] {
            assert!(!registry.is_supported(ext), "{ext}");
            assert!(registry.describe(ext).is_none());
        }
    }

    #[test]
    fn test_resolve_unsupported() {
        let registry = FormatRegistry::new();
        let err = registry.resolve(Path::new("notes.TXT")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Unsupported file type - .txt. Supported: .pdf, .docx, .pptx, .xlsx"
        );
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_require_disabled() {
        let registry = FormatRegistry::new().with_disabled(Format::Xlsx);
        assert!(registry.require(Format::Docx).is_ok());
        let err = registry.require(Format::Xlsx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyMissing);
        assert!(err.to_string().starts_with("Error: XLSX support not available."));
    }
}
