//! Docweave - text extraction and report generation for Office containers
//!
//! This library maps documents (.docx, .pptx, .xlsx, .pdf) to plain text and
//! generates Word documents and Excel workbooks from a small line-oriented
//! markup and JSON-shaped payloads.
//!
//! # Features
//!
//! - **Extraction**: Body text of Word documents, slide text of presentations,
//!   per-sheet summaries of workbooks and page text of PDF files
//! - **Directory walking**: Listing and batch extraction of every supported file
//! - **DOCX writing**: Markup to styled paragraphs, headings and lists
//! - **XLSX writing**: Typed workbooks from sheet payloads, tables and reports
//! - **Appending**: Rows added below the last used row of an existing sheet
//!
//! # Example - Extracting text
//!
//! ```no_run
//! use docweave::Extractor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = Extractor::new().extract("quarterly.docx")?;
//! println!("{}", doc.text);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Writing a document
//!
//! ```no_run
//! use docweave::{DocxWriter, StyleConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let content = "=== Summary ===\n- revenue up\n- costs flat\n**Outlook** stable";
//! let message = DocxWriter::new().create_document(
//!     content,
//!     "out/summary.docx",
//!     Some("Quarterly Summary"),
//!     &StyleConfig::default(),
//! )?;
//! println!("{message}");
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Appending rows
//!
//! ```no_run
//! use docweave::{AppendData, AppendOptions, XlsxWriter};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = AppendData::from_json(&json!([["2024-01-01", 12.5], ["2024-01-02", 13.0]]))?;
//! XlsxWriter::new().append_to_workbook("log.xlsx", "Readings", &rows, &AppendOptions::default())?;
//! # Ok(())
//! # }
//! ```

/// Errors, format registry and XML helpers shared by every format
pub mod common;

/// Single-file text extraction with per-format dispatch
pub mod extract;

/// Line-oriented markup parsed into content blocks
pub mod markup;

/// OOXML (Office Open XML) packages
///
/// This module provides the OPC layer and the .docx, .pptx and .xlsx
/// readers and writers.
pub mod ooxml;

/// Page-segmented PDF text
pub mod pdf;

/// Spreadsheet data model: cells, frames and writer payloads
pub mod sheet;

/// Directory listing and batch extraction
pub mod walk;

// Re-export commonly used types for convenience
pub use common::{Error, ErrorKind, Format, FormatDescriptor, FormatRegistry, Result, status_text};
pub use extract::{ExtractOptions, ExtractedDocument, Extractor};
pub use markup::{ContentBlock, Span};
pub use ooxml::docx::{DocxWriter, StructuredReport, StyleConfig};
pub use ooxml::xlsx::{AppendOptions, FrameWorkbookOptions, WorkbookOptions, XlsxWriter};
pub use pdf::PageTextSource;
pub use sheet::{AppendData, CellValue, ReportWorkbook, RowItem, SheetPayload, Table};
pub use walk::{DirectoryWalker, FileInfo, FileRecord};
