//! Spreadsheet data model shared by the xlsx reader and writers.
//!
//! - [`CellValue`]: a single typed cell
//! - [`Frame`]: header plus typed columns, rendered into text summaries
//! - [`SheetPayload`], [`AppendData`], [`Table`]: writer inputs

pub mod frame;
pub mod payload;
pub mod types;

pub use frame::{Dtype, Frame};
pub use payload::{AppendData, ReportSection, ReportWorkbook, RowItem, SheetPayload, Table};
pub use types::{CellValue, column_to_letters, reference_to_coords};
