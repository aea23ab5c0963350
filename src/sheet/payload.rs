//! Sheet payloads accepted by the spreadsheet writers.
//!
//! JSON arguments are classified exactly once, in the `from_json`
//! constructors here; the writers only ever see the typed variants.

use crate::common::error::{Error, Result};
use crate::sheet::types::CellValue;
use serde_json::{Map, Value};

/// One entry of a row list.
#[derive(Debug, Clone, PartialEq)]
pub enum RowItem {
    /// Ordered field values written left to right
    Fields(Vec<CellValue>),
    /// Field-name to value pairs; the first record of a sheet sets the header
    Record(Vec<(String, CellValue)>),
    /// A lone value written into column A
    Scalar(CellValue),
}

impl RowItem {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => RowItem::Fields(items.iter().map(CellValue::from_json).collect()),
            Value::Object(map) => RowItem::Record(record_from_map(map)),
            other => RowItem::Scalar(CellValue::from_json(other)),
        }
    }

    /// Values of this row, in column order, without any header.
    pub fn values(&self) -> Vec<CellValue> {
        match self {
            RowItem::Fields(values) => values.clone(),
            RowItem::Record(pairs) => pairs.iter().map(|(_, v)| v.clone()).collect(),
            RowItem::Scalar(value) => vec![value.clone()],
        }
    }
}

/// Tabular frame: named columns, an optional index and ordered rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    /// Row labels; `None` means the default `0..n` range
    pub index: Option<Vec<CellValue>>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells.
    ///
    /// # Errors
    /// `InvalidData` when a row is wider than the header or an explicit index
    /// does not match the row count.
    pub fn new(
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
        index: Option<Vec<CellValue>>,
    ) -> Result<Self> {
        let width = columns.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(Error::InvalidData(format!(
                    "row {i} has {} values but the table has {width} columns",
                    row.len()
                )));
            }
            row.resize(width, CellValue::Empty);
            padded.push(row);
        }
        if let Some(index) = &index
            && index.len() != padded.len()
        {
            return Err(Error::InvalidData(format!(
                "index has {} labels for {} rows",
                index.len(),
                padded.len()
            )));
        }
        Ok(Self {
            columns,
            index,
            rows: padded,
        })
    }

    /// Parse a table from JSON.
    ///
    /// Accepted shapes:
    /// - split: `{"columns": [...], "data": [[...]], "index": [...]}`
    /// - records: `[{"a": 1, "b": 2}, ...]`
    /// - columns: `{"a": [1, 2], "b": [3, 4]}`
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) if map.contains_key("columns") && map.contains_key("data") => {
                let columns = map
                    .get("columns")
                    .and_then(Value::as_array)
                    .ok_or_else(|| Error::InvalidData("\"columns\" must be an array".into()))?
                    .iter()
                    .map(column_name)
                    .collect();
                let rows = map
                    .get("data")
                    .and_then(Value::as_array)
                    .ok_or_else(|| Error::InvalidData("\"data\" must be an array".into()))?
                    .iter()
                    .map(|row| match row {
                        Value::Array(cells) => Ok(cells.iter().map(CellValue::from_json).collect()),
                        _ => Err(Error::InvalidData("\"data\" rows must be arrays".into())),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let index = match map.get("index") {
                    Some(Value::Array(labels)) => {
                        Some(labels.iter().map(CellValue::from_json).collect())
                    },
                    Some(Value::Null) | None => None,
                    Some(_) => return Err(Error::InvalidData("\"index\" must be an array".into())),
                };
                Self::new(columns, rows, index)
            },
            Value::Array(records) => {
                let mut columns: Vec<String> = Vec::new();
                for record in records {
                    let Value::Object(map) = record else {
                        return Err(Error::InvalidData(
                            "record-oriented tables must be a list of objects".into(),
                        ));
                    };
                    for key in map.keys() {
                        if !columns.iter().any(|c| c == key) {
                            columns.push(key.clone());
                        }
                    }
                }
                let rows = records
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|map| {
                        columns
                            .iter()
                            .map(|c| map.get(c).map(CellValue::from_json).unwrap_or(CellValue::Empty))
                            .collect()
                    })
                    .collect();
                Self::new(columns, rows, None)
            },
            Value::Object(map) => {
                let mut columns = Vec::with_capacity(map.len());
                let mut data: Vec<&Vec<Value>> = Vec::with_capacity(map.len());
                for (name, values) in map {
                    let Value::Array(values) = values else {
                        return Err(Error::InvalidData(format!(
                            "column \"{name}\" must be an array"
                        )));
                    };
                    columns.push(name.clone());
                    data.push(values);
                }
                let height = data.iter().map(|c| c.len()).max().unwrap_or(0);
                if data.iter().any(|c| c.len() != height) {
                    return Err(Error::InvalidData("all columns must have the same length".into()));
                }
                let rows = (0..height)
                    .map(|r| data.iter().map(|c| CellValue::from_json(&c[r])).collect())
                    .collect();
                Self::new(columns, rows, None)
            },
            _ => Err(Error::InvalidData("a table must be a JSON object or array".into())),
        }
    }

    /// Index labels, defaulting to `0..n`.
    pub fn index_labels(&self) -> Vec<CellValue> {
        match &self.index {
            Some(labels) => labels.clone(),
            None => (0..self.rows.len() as i64).map(CellValue::Int).collect(),
        }
    }

    /// Rows as they are written into a sheet, optionally prefixed by the index.
    pub fn output_rows(&self, include_index: bool) -> Vec<Vec<CellValue>> {
        let labels = self.index_labels();
        self.rows
            .iter()
            .zip(labels)
            .map(|(row, label)| {
                let mut out = Vec::with_capacity(row.len() + 1);
                if include_index {
                    out.push(label);
                }
                out.extend(row.iter().cloned());
                out
            })
            .collect()
    }

    /// Header row as written into a sheet; the index column header is blank.
    pub fn header_row(&self, include_index: bool) -> Vec<CellValue> {
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        if include_index {
            header.push(CellValue::Empty);
        }
        header.extend(self.columns.iter().map(|c| CellValue::String(c.clone())));
        header
    }
}

/// Content of one sheet in a new workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetPayload {
    /// Key/value pairs written as two columns
    ScalarMap(Vec<(String, CellValue)>),
    /// One output row per item
    RowList(Vec<RowItem>),
    /// Header row followed by data rows
    Table(Table),
    /// A single value written into `A1`
    Scalar(CellValue),
}

impl SheetPayload {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => SheetPayload::ScalarMap(record_from_map(map)),
            Value::Array(items) => SheetPayload::RowList(items.iter().map(RowItem::from_json).collect()),
            other => SheetPayload::Scalar(CellValue::from_json(other)),
        }
    }

    /// Parse a `{sheet name: payload}` object, keeping key order.
    pub fn sheets_from_json(value: &Value) -> Result<Vec<(String, SheetPayload)>> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::InvalidData("sheet data must be a JSON object".into()))?;
        Ok(map
            .iter()
            .map(|(name, payload)| (name.clone(), SheetPayload::from_json(payload)))
            .collect())
    }
}

/// Data appended below the existing rows of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendData {
    /// One row per item; records contribute their values only
    Rows(Vec<RowItem>),
    /// Key/value pairs, one per row
    Map(Vec<(String, CellValue)>),
    /// Data rows without header
    Table(Table),
    /// A single value in column A
    Scalar(CellValue),
}

impl AppendData {
    /// Classify a JSON value; `{"dataframe": ...}` is read as a table.
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Object(map) if map.len() == 1 && map.contains_key("dataframe") => {
                AppendData::Table(Table::from_json(&map["dataframe"])?)
            },
            Value::Object(map) => AppendData::Map(record_from_map(map)),
            Value::Array(items) => AppendData::Rows(items.iter().map(RowItem::from_json).collect()),
            other => AppendData::Scalar(CellValue::from_json(other)),
        })
    }
}

/// One data sheet of a report workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportSection {
    Table(Table),
    Rows(Vec<RowItem>),
    Map(Vec<(String, CellValue)>),
}

/// Input of the report workbook writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportWorkbook {
    pub title: String,
    pub description: String,
    pub data: Vec<(String, ReportSection)>,
}

impl Default for ReportWorkbook {
    fn default() -> Self {
        Self {
            title: "Report".to_string(),
            description: String::new(),
            data: Vec::new(),
        }
    }
}

impl ReportWorkbook {
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| Error::InvalidData("report data must be a JSON object".into()))?;
        let mut report = ReportWorkbook::default();
        if let Some(title) = map.get("title") {
            report.title = scalar_text(title);
        }
        if let Some(description) = map.get("description") {
            report.description = scalar_text(description);
        }
        if let Some(data) = map.get("data") {
            let sections = data
                .as_object()
                .ok_or_else(|| Error::InvalidData("report \"data\" must be a JSON object".into()))?;
            for (name, section) in sections {
                let section = match section {
                    Value::Object(inner) if inner.contains_key("dataframe") => {
                        ReportSection::Table(Table::from_json(&inner["dataframe"])?)
                    },
                    Value::Array(items) => {
                        ReportSection::Rows(items.iter().map(RowItem::from_json).collect())
                    },
                    Value::Object(inner) => ReportSection::Map(record_from_map(inner)),
                    _ => {
                        return Err(Error::InvalidData(format!(
                            "report section \"{name}\" must be an object or a list"
                        )));
                    },
                };
                report.data.push((name.clone(), section));
            }
        }
        Ok(report)
    }
}

fn record_from_map(map: &Map<String, Value>) -> Vec<(String, CellValue)> {
    map.iter()
        .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
        .collect()
}

fn column_name(value: &Value) -> String {
    scalar_text(value)
}

/// Text of a JSON scalar without the quotes a string would get from `to_string`.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sheet_payload_kinds() {
        let sheets = SheetPayload::sheets_from_json(&json!({
            "Info": {"name": "docweave", "version": 1},
            "Rows": [[1, 2], {"a": 1}, "solo"],
            "Note": "hello"
        }))
        .unwrap();
        let names: Vec<&str> = sheets.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Info", "Rows", "Note"]);
        assert!(matches!(&sheets[0].1, SheetPayload::ScalarMap(pairs) if pairs[0].0 == "name"));
        match &sheets[1].1 {
            SheetPayload::RowList(items) => {
                assert!(matches!(items[0], RowItem::Fields(_)));
                assert!(matches!(items[1], RowItem::Record(_)));
                assert_eq!(items[2], RowItem::Scalar(CellValue::String("solo".into())));
            },
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(sheets[2].1, SheetPayload::Scalar(CellValue::String("hello".into())));
    }

    #[test]
    fn test_table_orientations_agree() {
        let split = Table::from_json(&json!({"columns": ["a", "b"], "data": [[1, "x"], [2, "y"]]}))
            .unwrap();
        let records = Table::from_json(&json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}])).unwrap();
        let columns = Table::from_json(&json!({"a": [1, 2], "b": ["x", "y"]})).unwrap();
        assert_eq!(split, records);
        assert_eq!(split, columns);
        assert_eq!(
            split.output_rows(true)[1],
            vec![CellValue::Int(1), CellValue::Int(2), CellValue::String("y".into())]
        );
        assert_eq!(split.header_row(true)[0], CellValue::Empty);
    }

    #[test]
    fn test_table_rejects_ragged_input() {
        assert!(Table::from_json(&json!({"a": [1, 2], "b": [1]})).is_err());
        assert!(Table::from_json(&json!({"columns": ["a"], "data": [[1, 2]]})).is_err());
        assert!(
            Table::from_json(&json!({"columns": ["a"], "data": [[1]], "index": ["x", "y"]}))
                .is_err()
        );
    }

    #[test]
    fn test_append_data_dataframe_wrapper() {
        let data = AppendData::from_json(&json!({"dataframe": [{"a": 1}]})).unwrap();
        assert!(matches!(data, AppendData::Table(t) if t.columns == ["a"]));
        let data = AppendData::from_json(&json!({"k": "v"})).unwrap();
        assert!(matches!(data, AppendData::Map(_)));
    }

    #[test]
    fn test_report_workbook_from_json() {
        let report = ReportWorkbook::from_json(&json!({
            "description": "Quarterly",
            "data": {
                "Sales": {"dataframe": {"q": [1, 2]}},
                "Notes": ["one", "two"],
                "Meta": {"owner": "ops"}
            }
        }))
        .unwrap();
        assert_eq!(report.title, "Report");
        assert_eq!(report.description, "Quarterly");
        assert!(matches!(report.data[0].1, ReportSection::Table(_)));
        assert!(matches!(report.data[1].1, ReportSection::Rows(_)));
        assert!(matches!(report.data[2].1, ReportSection::Map(_)));
    }
}
