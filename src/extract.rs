//! Text extraction from any supported container.
//!
//! [`Extractor`] validates the path, resolves the format through the
//! [`FormatRegistry`] and dispatches to the matching reader. Every reader
//! reduces its container to ordered text with structural markers:
//!
//! - Word: non-blank paragraphs, then one `a | b` line per table row
//! - PowerPoint: `--- Slide N ---` blocks
//! - Excel: a workbook header, then per sheet its shape, columns, first rows,
//!   numeric summary and column types
//! - PDF: `--- Page N ---` blocks
//!
//! # Example
//!
//! ```rust,no_run
//! use docweave::Extractor;
//!
//! let doc = Extractor::new().extract("quarterly.xlsx")?;
//! println!("{}", doc.text);
//! for warning in &doc.warnings {
//!     eprintln!("skipped: {warning}");
//! }
//! # Ok::<(), docweave::Error>(())
//! ```
use crate::common::error::{Error, Result};
use crate::common::format::{Format, FormatRegistry, missing_capability};
use crate::ooxml::docx::DocumentText;
use crate::ooxml::pptx::{read_slides, render_slides};
use crate::ooxml::xlsx::XlsxReader;
use crate::pdf::{PageTextSource, render_pages};
use crate::sheet::Frame;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

const SECTION_RULE_WIDTH: usize = 50;

/// Options of [`Extractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Data rows shown per sheet
    pub sample_rows: usize,
    /// Leave whitespace-only PDF pages out of the output
    pub skip_empty_pages: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            sample_rows: 10,
            skip_empty_pages: true,
        }
    }
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rows == 0 {
            return Err(Error::InvalidConfig("sample_rows must be at least 1".into()));
        }
        Ok(())
    }
}

/// Text extracted from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub format: Format,
    /// Extracted text, or the "no content" notice of the format
    pub text: String,
    /// Sheets that failed to read; their errors are also inline in `text`
    pub warnings: Vec<String>,
}

impl fmt::Display for ExtractedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Extracts text from files of any registered format.
#[derive(Clone)]
pub struct Extractor {
    registry: FormatRegistry,
    options: ExtractOptions,
    page_source: Option<Arc<dyn PageTextSource>>,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .field("page_source", &self.page_source.is_some())
            .finish()
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::with_registry(FormatRegistry::new())
    }

    pub fn with_registry(registry: FormatRegistry) -> Self {
        Self {
            registry,
            options: ExtractOptions::default(),
            page_source: default_page_source(),
        }
    }

    /// Replace the options.
    ///
    /// # Errors
    /// `InvalidConfig` when the options fail validation.
    pub fn with_options(mut self, options: ExtractOptions) -> Result<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Use `source` to split PDFs into pages.
    pub fn with_page_source(mut self, source: impl PageTextSource + 'static) -> Self {
        self.page_source = Some(Arc::new(source));
        self
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Extract the text of one file.
    ///
    /// # Errors
    /// - `FileNotFound` / `NotAFile` for a bad path
    /// - `Unsupported` for an extension outside the registry
    /// - `DependencyMissing` when the format's codec is disabled
    /// - `Decode` (`Error reading <FORMAT>: ...`) when the container is broken
    pub fn extract<P: AsRef<Path>>(&self, path: P) -> Result<ExtractedDocument> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }
        let format = self.registry.resolve(path)?;
        self.registry.require(format)?;
        debug!(path = %path.display(), format = format.short_name(), "extracting");

        let mut warnings = Vec::new();
        let result = match format {
            Format::Docx => self.extract_docx(path),
            Format::Pptx => self.extract_pptx(path),
            Format::Xlsx => self.extract_xlsx(path, &mut warnings),
            Format::Pdf => self.extract_pdf(path),
        };

        match result {
            Ok(text) => Ok(ExtractedDocument {
                format,
                text,
                warnings,
            }),
            Err(err) => {
                error!(path = %path.display(), error = %err, "extraction failed");
                Err(label_failure(err, path, format))
            },
        }
    }

    fn extract_docx(&self, path: &Path) -> Result<String> {
        let doc = DocumentText::open(path)?;
        Ok(doc
            .render()
            .unwrap_or_else(|| "No text content found in DOCX".to_string()))
    }

    fn extract_pptx(&self, path: &Path) -> Result<String> {
        let slides = read_slides(path)?;
        Ok(render_slides(&slides).unwrap_or_else(|| "No text content found in PPTX".to_string()))
    }

    fn extract_pdf(&self, path: &Path) -> Result<String> {
        let source = self
            .page_source
            .as_ref()
            .ok_or_else(|| missing_capability(Format::Pdf))?;
        let pages = source.page_texts(path)?;
        Ok(render_pages(&pages, self.options.skip_empty_pages)
            .unwrap_or_else(|| "No text content found in PDF".to_string()))
    }

    fn extract_xlsx(&self, path: &Path, warnings: &mut Vec<String>) -> Result<String> {
        let mut reader = XlsxReader::open(path)?;
        let names: Vec<String> = reader.sheets().iter().map(|s| s.name.clone()).collect();
        let rule = "=".repeat(SECTION_RULE_WIDTH);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut parts: Vec<String> = vec![
            format!("Excel Workbook: {file_name}"),
            format!("Number of sheets: {}", names.len()),
            rule.clone(),
            String::new(),
        ];
        let header_len = parts.len();

        for (index, name) in names.iter().enumerate() {
            match reader.read_grid(index) {
                Ok(grid) => {
                    let frame = Frame::from_grid(grid);
                    render_sheet(&mut parts, name, &frame, self.options.sample_rows);
                    parts.push(format!("\n{rule}"));
                    parts.push(String::new());
                },
                Err(err) => {
                    warn!(sheet = %name, error = %err, "skipping unreadable sheet");
                    let line = format!("Error reading sheet '{name}': {err}");
                    parts.push(line.clone());
                    parts.push(String::new());
                    warnings.push(line);
                },
            }
        }

        if parts.len() <= header_len {
            return Ok("No readable content found in XLSX file".to_string());
        }
        Ok(parts.join("\n"))
    }
}

fn render_sheet(parts: &mut Vec<String>, name: &str, frame: &Frame, sample_rows: usize) {
    let (rows, cols) = frame.shape();
    parts.push(format!("=== Sheet: {name} ==="));
    parts.push(format!("Dimensions: {rows} rows x {cols} columns"));

    if frame.is_empty() {
        parts.push("Sheet is empty".to_string());
        return;
    }

    parts.push("\nColumns:".to_string());
    parts.push(frame.columns().join(", "));

    parts.push(format!("\nSample Data (first {sample_rows} rows):"));
    parts.push(frame.render_head(sample_rows));

    if let Some(summary) = frame.describe() {
        parts.push("\nNumeric Summary:".to_string());
        parts.push(summary);
    }

    parts.push("\nData Types:".to_string());
    for (col, (column, dtype)) in frame.columns().iter().zip(frame.dtypes()).enumerate() {
        parts.push(format!(
            "{column}: {dtype} ({}/{rows} non-null)",
            frame.non_null(col)
        ));
    }
}

/// I/O failures are reported against the file, everything else as a
/// decode failure of the format.
fn label_failure(err: Error, path: &Path, format: Format) -> Error {
    match err {
        Error::Io(_) => err.context(format!("Error processing {}", path.display())),
        other => other.decoding(format.short_name()),
    }
}

#[cfg(feature = "pdf")]
fn default_page_source() -> Option<Arc<dyn PageTextSource>> {
    Some(Arc::new(crate::pdf::LopdfPageSource))
}

#[cfg(not(feature = "pdf"))]
fn default_page_source() -> Option<Arc<dyn PageTextSource>> {
    None
}
