//! Excel (.xlsx) support: workbook reading, generation and in-place append.
//!
//! - [`XlsxReader`]: sheet list and typed cell grids of an existing workbook
//! - [`XlsxWriter`]: new workbooks from sheet payloads or tables, report
//!   workbooks, and appends below the last row of a sheet

pub mod numfmt;
pub mod reader;
pub mod writer;

pub use reader::{SheetRef, XlsxReader};
pub use writer::{AppendOptions, FrameWorkbookOptions, WorkbookOptions, XlsxWriter};
