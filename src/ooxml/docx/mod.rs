//! Word (.docx) support: body text extraction and document generation.

pub mod reader;
pub mod writer;

pub use reader::DocumentText;
pub use writer::{DocxWriter, ReportContent, ReportSection, ReportSubsection, StructuredReport, StyleConfig};
