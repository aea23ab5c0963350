//! Unified error type for docweave operations.
//!
//! Every public operation returns [`Result`]. The `Display` text of each variant
//! reproduces the human-readable status line that text-only callers match on,
//! while [`Error::kind`] makes the failure class observable without parsing.
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for docweave operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File path does not exist
    #[error("Error: File not found - {}", .0.display())]
    FileNotFound(PathBuf),

    /// Directory path does not exist
    #[error("Error: Directory not found - {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Path exists but is not a regular file
    #[error("Error: Path is not a file - {}", .0.display())]
    NotAFile(PathBuf),

    /// Path exists but is not a directory
    #[error("Error: Path is not a directory - {}", .0.display())]
    NotADirectory(PathBuf),

    /// Extension outside the closed format set
    #[error("Error: Unsupported file type - {extension}. Supported: {supported}")]
    Unsupported { extension: String, supported: String },

    /// A decoder or encoder capability is not compiled in
    #[error("Error: {capability} not available. {hint}")]
    DependencyMissing {
        capability: &'static str,
        hint: &'static str,
    },

    /// Format-specific parse failure (corrupt container, missing part, ...)
    #[error("Error reading {format}: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },

    /// XML parsing or serialization error
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Option struct failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Caller supplied data that cannot be written
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A failure wrapped with the operation it interrupted
    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Failure classes, mirroring the error taxonomy of the pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NotAFile,
    NotADirectory,
    Unsupported,
    DependencyMissing,
    DecodeFailure,
    InvalidInput,
    Io,
}

impl Error {
    /// Classify this error. Wrapped errors report the kind of their source.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound(_) | Error::DirectoryNotFound(_) => ErrorKind::NotFound,
            Error::NotAFile(_) => ErrorKind::NotAFile,
            Error::NotADirectory(_) => ErrorKind::NotADirectory,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::DependencyMissing { .. } => ErrorKind::DependencyMissing,
            Error::Decode { .. } | Error::Xml(_) | Error::Zip(_) => ErrorKind::DecodeFailure,
            Error::InvalidConfig(_) | Error::InvalidData(_) => ErrorKind::InvalidInput,
            Error::Io(_) => ErrorKind::Io,
            Error::Operation { source, .. } => source.kind(),
        }
    }

    /// Wrap this error with the operation that failed.
    ///
    /// The display string becomes `"<context>: <inner display>"`.
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Operation {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Re-label a low-level failure as a decode failure for `format`.
    ///
    /// Path validation, capability and already-labelled errors pass through.
    pub(crate) fn decoding(self, format: &'static str) -> Self {
        match self {
            Error::Decode { .. }
            | Error::FileNotFound(_)
            | Error::NotAFile(_)
            | Error::Unsupported { .. }
            | Error::DependencyMissing { .. } => self,
            other => Error::Decode {
                format,
                message: other.to_string(),
            },
        }
    }
}

/// Result type for docweave operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Collapse an operation result into the single-text status convention.
///
/// Success yields the payload, failure yields the error's display string, so
/// callers that still pattern-match on `Error` prefixes keep working.
pub fn status_text(result: Result<String>) -> String {
    match result {
        Ok(text) => text,
        Err(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::FileNotFound(PathBuf::from("/tmp/missing.docx"));
        assert_eq!(err.to_string(), "Error: File not found - /tmp/missing.docx");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_context_keeps_kind() {
        let err = Error::Zip("bad central directory".to_string())
            .context("Error creating XLSX workbook");
        assert_eq!(
            err.to_string(),
            "Error creating XLSX workbook: ZIP error: bad central directory"
        );
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn test_decoding_relabels_plumbing_errors() {
        let err = Error::Xml("unexpected end".to_string()).decoding("DOCX");
        assert_eq!(err.to_string(), "Error reading DOCX: XML error: unexpected end");

        let passthrough = Error::NotAFile(PathBuf::from("dir")).decoding("DOCX");
        assert_eq!(passthrough.kind(), ErrorKind::NotAFile);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(Ok("done".to_string())), "done");
        let failed = status_text(Err(Error::InvalidData("empty".to_string())));
        assert_eq!(failed, "Invalid data: empty");
    }
}
