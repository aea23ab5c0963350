//! Excel workbook generation.
//!
//! [`XlsxWriter`] exposes the four spreadsheet operations: whole workbooks
//! from sheet payloads, workbooks from tables, appends to an existing sheet
//! and a summary-plus-data report workbook. Payload shapes are already
//! classified by [`crate::sheet::payload`]; this module only lays values out
//! on the grid.

pub(crate) mod append;
pub(crate) mod sheet;
pub(crate) mod strings;
pub(crate) mod styles;
pub(crate) mod workbook;

use crate::common::error::Result;
use crate::common::format::{Format, FormatRegistry};
use crate::sheet::payload::{AppendData, ReportSection, ReportWorkbook, RowItem, SheetPayload, Table};
use crate::sheet::types::CellValue;
use chrono::Local;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error, info};

use sheet::Worksheet;
use workbook::WorkbookBuilder;

const SUMMARY_SHEET: &str = "Summary";

/// Options of [`XlsxWriter::create_workbook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkbookOptions {
    /// Header look, column widths and borders on every sheet
    pub apply_formatting: bool,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self {
            apply_formatting: true,
        }
    }
}

/// Options of [`XlsxWriter::create_dataframe_workbook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrameWorkbookOptions {
    /// Write each table's index as the first column
    pub include_index: bool,
    pub apply_formatting: bool,
}

impl Default for FrameWorkbookOptions {
    fn default() -> Self {
        Self {
            include_index: true,
            apply_formatting: true,
        }
    }
}

/// Options of [`XlsxWriter::append_to_workbook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppendOptions {
    /// Prefix appended table rows with their index label
    pub include_index: bool,
}

impl Default for AppendOptions {
    fn default() -> Self {
        Self {
            include_index: true,
        }
    }
}

/// Excel workbook writer.
#[derive(Debug, Clone, Default)]
pub struct XlsxWriter {
    registry: FormatRegistry,
}

impl XlsxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: FormatRegistry) -> Self {
        Self { registry }
    }

    /// Create a workbook with one sheet per entry, in order.
    ///
    /// # Errors
    /// `DependencyMissing` when spreadsheet output is disabled; anything else
    /// is wrapped as `Error creating XLSX workbook: <cause>`.
    pub fn create_workbook<P: AsRef<Path>>(
        &self,
        sheets: &[(String, SheetPayload)],
        dest: P,
        options: &WorkbookOptions,
    ) -> Result<String> {
        let dest = dest.as_ref();
        self.registry.require(Format::Xlsx)?;
        debug!(path = %dest.display(), sheets = sheets.len(), "creating workbook");

        let result = (|| {
            let mut workbook = WorkbookBuilder::new();
            for (name, payload) in sheets {
                let ws = workbook.add_worksheet(name)?;
                write_payload(ws, payload);
                if options.apply_formatting {
                    ws.apply_default_formatting();
                }
            }
            workbook.save(dest)
        })();

        finish(
            result,
            dest,
            "XLSX workbook created successfully",
            "Error creating XLSX workbook",
        )
    }

    /// Create a workbook from tables, one sheet each.
    ///
    /// # Errors
    /// As [`create_workbook`](Self::create_workbook), wrapped as
    /// `Error creating DataFrame workbook: <cause>`.
    pub fn create_dataframe_workbook<P: AsRef<Path>>(
        &self,
        tables: &[(String, Table)],
        dest: P,
        options: &FrameWorkbookOptions,
    ) -> Result<String> {
        let dest = dest.as_ref();
        self.registry.require(Format::Xlsx)?;
        debug!(path = %dest.display(), sheets = tables.len(), "creating table workbook");

        let result = (|| {
            let mut workbook = WorkbookBuilder::new();
            for (name, table) in tables {
                let ws = workbook.add_worksheet(name)?;
                write_table(ws, table, options.include_index);
                if options.apply_formatting {
                    ws.apply_default_formatting();
                }
            }
            workbook.save(dest)
        })();

        finish(
            result,
            dest,
            "DataFrame workbook created successfully",
            "Error creating DataFrame workbook",
        )
    }

    /// Append `data` below the last row of `sheet`.
    ///
    /// A missing workbook or sheet is created, and the data then starts at
    /// row 1. Rows already in the sheet are never rewritten. Appends to the
    /// same file are not synchronized; callers must serialize them.
    ///
    /// # Errors
    /// Wrapped as `Error appending to workbook: <cause>`.
    pub fn append_to_workbook<P: AsRef<Path>>(
        &self,
        dest: P,
        sheet: &str,
        data: &AppendData,
        options: &AppendOptions,
    ) -> Result<String> {
        let dest = dest.as_ref();
        self.registry.require(Format::Xlsx)?;
        debug!(path = %dest.display(), sheet, "appending to workbook");

        let rows = append_rows_for(data, options.include_index);
        let result = append::append_rows(dest, sheet, &rows).map(|cursor| {
            debug!(
                next_row = cursor.next_row,
                created_sheet = cursor.created_sheet,
                "append cursor"
            );
        });

        match result {
            Ok(()) => {
                info!(path = %dest.display(), sheet, rows = rows.len(), "data appended");
                Ok(format!("Data appended to {}, sheet '{sheet}'", dest.display()))
            },
            Err(err) => {
                error!(path = %dest.display(), error = %err, "append failed");
                Err(err.context("Error appending to workbook"))
            },
        }
    }

    /// Create a report workbook: a `Summary` sheet followed by one formatted
    /// sheet per data section.
    ///
    /// # Errors
    /// Wrapped as `Error creating report workbook: <cause>`.
    pub fn create_report_workbook<P: AsRef<Path>>(&self, report: &ReportWorkbook, dest: P) -> Result<String> {
        let dest = dest.as_ref();
        self.registry.require(Format::Xlsx)?;
        debug!(path = %dest.display(), sections = report.data.len(), "creating report workbook");

        let result = (|| {
            let mut workbook = WorkbookBuilder::new();

            let summary = workbook.add_worksheet(SUMMARY_SHEET)?;
            summary.set_value(1, 1, CellValue::from(report.title.as_str()));
            summary.set_title_style(1, 1);
            summary.set_value(
                2,
                1,
                CellValue::String(format!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))),
            );
            summary.set_value(3, 1, CellValue::from(report.description.as_str()));

            for (name, section) in &report.data {
                let ws = workbook.add_worksheet(name)?;
                match section {
                    ReportSection::Table(table) => write_table(ws, table, true),
                    ReportSection::Rows(items) => write_row_items(ws, items),
                    ReportSection::Map(pairs) => write_pairs(ws, pairs),
                }
                ws.apply_default_formatting();
            }
            workbook.save(dest)
        })();

        finish(
            result,
            dest,
            "Report workbook created successfully",
            "Error creating report workbook",
        )
    }
}

fn finish(result: Result<()>, dest: &Path, success: &str, failure: &str) -> Result<String> {
    match result {
        Ok(()) => {
            info!(path = %dest.display(), "{success}");
            Ok(format!("{success}: {}", dest.display()))
        },
        Err(err) => {
            error!(path = %dest.display(), error = %err, "{failure}");
            Err(err.context(failure))
        },
    }
}

fn write_payload(ws: &mut Worksheet, payload: &SheetPayload) {
    match payload {
        SheetPayload::ScalarMap(pairs) => write_pairs(ws, pairs),
        SheetPayload::RowList(items) => write_row_items(ws, items),
        SheetPayload::Table(table) => write_table(ws, table, true),
        SheetPayload::Scalar(value) => ws.set_value(1, 1, value.clone()),
    }
}

/// One `key | value` row per pair.
fn write_pairs(ws: &mut Worksheet, pairs: &[(String, CellValue)]) {
    for (row, (key, value)) in (1..).zip(pairs) {
        ws.set_value(row, 1, CellValue::from(key.as_str()));
        ws.set_value(row, 2, value.clone());
    }
}

/// One row per item; the first record also writes its keys as a header row,
/// pushing everything after it down by one.
fn write_row_items(ws: &mut Worksheet, items: &[RowItem]) {
    let mut row = 1;
    let mut header_written = false;
    for item in items {
        if let RowItem::Record(pairs) = item
            && !header_written
        {
            ws.write_row(row, pairs.iter().map(|(key, _)| CellValue::from(key.as_str())));
            header_written = true;
            row += 1;
        }
        ws.write_row(row, item.values());
        row += 1;
    }
}

/// Header row, then one row per table row.
fn write_table(ws: &mut Worksheet, table: &Table, include_index: bool) {
    ws.write_row(1, table.header_row(include_index));
    for (row, values) in (2..).zip(table.output_rows(include_index)) {
        ws.write_row(row, values);
    }
}

fn append_rows_for(data: &AppendData, include_index: bool) -> Vec<Vec<CellValue>> {
    match data {
        AppendData::Rows(items) => items.iter().map(RowItem::values).collect(),
        AppendData::Map(pairs) => pairs
            .iter()
            .map(|(key, value)| vec![CellValue::from(key.as_str()), value.clone()])
            .collect(),
        AppendData::Table(table) => table.output_rows(include_index),
        AppendData::Scalar(value) => vec![vec![value.clone()]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use crate::ooxml::xlsx::reader::XlsxReader;
    use serde_json::json;

    fn cells(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    fn read_all(path: &Path) -> Vec<(String, Vec<Vec<CellValue>>)> {
        let mut reader = XlsxReader::open(path).unwrap();
        let names: Vec<String> = reader.sheets().iter().map(|s| s.name.clone()).collect();
        names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, reader.read_grid(i).unwrap()))
            .collect()
    }

    #[test]
    fn test_row_list_with_records() {
        let mut ws = Worksheet::new("Rows");
        let items = match SheetPayload::from_json(&json!([
            {"name": "ann", "age": 31},
            {"name": "bob", "age": 40},
            ["x", "y"],
            "tail"
        ])) {
            SheetPayload::RowList(items) => items,
            other => panic!("unexpected payload {other:?}"),
        };
        write_row_items(&mut ws, &items);
        assert_eq!(ws.max_row(), 5);
        assert_eq!(ws.cell(1, 1).unwrap().value, CellValue::from("name"));
        assert_eq!(ws.cell(2, 2).unwrap().value, CellValue::Int(31));
        assert_eq!(ws.cell(3, 1).unwrap().value, CellValue::from("bob"));
        assert_eq!(ws.cell(4, 2).unwrap().value, CellValue::from("y"));
        assert_eq!(ws.cell(5, 1).unwrap().value, CellValue::from("tail"));
    }

    #[test]
    fn test_table_with_index() {
        let mut ws = Worksheet::new("T");
        let table = Table::from_json(&json!({"a": [1, 2], "b": ["x", "y"]})).unwrap();
        write_table(&mut ws, &table, true);
        assert!(ws.cell(1, 1).is_none());
        assert_eq!(ws.cell(1, 2).unwrap().value, CellValue::from("a"));
        assert_eq!(ws.cell(3, 1).unwrap().value, CellValue::Int(1));
        assert_eq!(ws.cell(3, 3).unwrap().value, CellValue::from("y"));
    }

    #[test]
    fn test_create_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("out.xlsx");
        let sheets = SheetPayload::sheets_from_json(&json!({
            "Info": {"owner": "ops", "count": 3},
            "Note": "hello"
        }))
        .unwrap();

        let message = XlsxWriter::new()
            .create_workbook(&sheets, &dest, &WorkbookOptions::default())
            .unwrap();
        assert!(message.starts_with("XLSX workbook created successfully: "));

        let read = read_all(&dest);
        assert_eq!(read[0].0, "Info");
        assert_eq!(read[0].1[0], cells(&["owner", "ops"]));
        assert_eq!(read[0].1[1], vec![CellValue::from("count"), CellValue::Int(3)]);
        assert_eq!(read[1].1, vec![cells(&["hello"])]);
    }

    #[test]
    fn test_create_workbook_errors() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("bad.xlsx");
        let sheets = vec![("a:b".to_string(), SheetPayload::Scalar(CellValue::Int(1)))];
        let err = XlsxWriter::new()
            .create_workbook(&sheets, &dest, &WorkbookOptions::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("Error creating XLSX workbook: "));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!dest.exists());

        let disabled = XlsxWriter::with_registry(FormatRegistry::new().with_disabled(Format::Xlsx));
        let err = disabled
            .create_workbook(&[], &dest, &WorkbookOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyMissing);
    }

    #[test]
    fn test_dataframe_workbook_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("frames.xlsx");
        let table = Table::from_json(&json!({"columns": ["k", "v"], "data": [["a", 1]]})).unwrap();
        let options = FrameWorkbookOptions {
            include_index: false,
            ..FrameWorkbookOptions::default()
        };
        let message = XlsxWriter::new()
            .create_dataframe_workbook(&[("Frame".to_string(), table)], &dest, &options)
            .unwrap();
        assert!(message.starts_with("DataFrame workbook created successfully"));
        assert_eq!(
            read_all(&dest)[0].1,
            vec![cells(&["k", "v"]), vec![CellValue::from("a"), CellValue::Int(1)]]
        );
    }

    #[test]
    fn test_append_twice() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("log.xlsx");
        let writer = XlsxWriter::new();
        let first = AppendData::from_json(&json!([["a", 1], ["b", 2]])).unwrap();
        let second = AppendData::from_json(&json!({"c": 3})).unwrap();

        let message = writer
            .append_to_workbook(&dest, "Log", &first, &AppendOptions::default())
            .unwrap();
        assert_eq!(message, format!("Data appended to {}, sheet 'Log'", dest.display()));
        writer
            .append_to_workbook(&dest, "Log", &second, &AppendOptions::default())
            .unwrap();

        let grid = &read_all(&dest)[0].1;
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1], vec![CellValue::from("b"), CellValue::Int(2)]);
        assert_eq!(grid[2], vec![CellValue::from("c"), CellValue::Int(3)]);
    }

    #[test]
    fn test_append_past_last_row_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("full.xlsx");
        let writer = XlsxWriter::new();
        let rows = AppendData::from_json(&json!([["z"]])).unwrap();
        writer
            .append_to_workbook(&dest, "A", &rows, &AppendOptions::default())
            .unwrap();

        let mut package = crate::ooxml::opc::RawPackage::open(&dest).unwrap();
        let member = "xl/worksheets/sheet1.xml";
        let xml = std::str::from_utf8(package.get(member).unwrap())
            .unwrap()
            .replace("</sheetData>", r#"<row r="4294967295"/></sheetData>"#);
        package.set(member, xml.into_bytes());
        package.save(&dest).unwrap();

        let err = writer
            .append_to_workbook(&dest, "A", &rows, &AppendOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().starts_with("Error appending to workbook: "));
    }

    #[test]
    fn test_report_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("report.xlsx");
        let report = ReportWorkbook::from_json(&json!({
            "title": "Quarterly",
            "description": "numbers",
            "data": {
                "Sales": [{"region": "north", "total": 10}],
                "Meta": {"owner": "ops"}
            }
        }))
        .unwrap();
        XlsxWriter::new().create_report_workbook(&report, &dest).unwrap();

        let read = read_all(&dest);
        let names: Vec<&str> = read.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Summary", "Sales", "Meta"]);

        let summary = &read[0].1;
        assert_eq!(summary[0], cells(&["Quarterly"]));
        let generated = summary[1][0].to_string();
        assert!(generated.starts_with("Generated: "));
        assert_eq!(summary[2], cells(&["numbers"]));
        assert_eq!(read[1].1[0], cells(&["region", "total"]));
    }

    #[test]
    fn test_report_section_named_summary_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let report = ReportWorkbook::from_json(&json!({"data": {"summary": {"a": 1}}})).unwrap();
        let err = XlsxWriter::new()
            .create_report_workbook(&report, dir.path().join("r.xlsx"))
            .unwrap_err();
        assert!(err.to_string().starts_with("Error creating report workbook: "));
    }
}
