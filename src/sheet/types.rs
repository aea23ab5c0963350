//! Cell values shared by the spreadsheet reader and writers.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::fmt;

/// Types of data that can be stored in a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// String value
    String(String),
    /// Date/time value
    DateTime(NaiveDateTime),
    /// Error value (`#DIV/0!`, `#N/A`, ...)
    Error(String),
}

impl CellValue {
    /// True for cells that count as missing in a table (empty, error, NaN).
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Empty | CellValue::Error(_) => true,
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Build a cell from a JSON scalar.
    ///
    /// Integral numbers stay integers; nested arrays and objects are stored
    /// as their compact JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CellValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => CellValue::String(value.to_string()),
        }
    }

    /// Numeric view used by summaries.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.is_nan() => f.write_str("nan"),
            CellValue::Float(v) => f.write_str(ryu::Buffer::new().format(*v)),
            CellValue::String(s) => f.write_str(s),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert an Excel serial date (1900 date system) to a timestamp.
///
/// Serials below 61 are shifted by one day to undo the phantom 1900-02-29.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let serial = if serial < 61.0 { serial + 1.0 } else { serial };
    let millis = (serial * 86_400_000.0).round() as i64;
    excel_epoch().checked_add_signed(Duration::milliseconds(millis))
}

/// Convert a timestamp to an Excel serial date.
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    let delta = dt - excel_epoch();
    let serial = delta.num_milliseconds() as f64 / 86_400_000.0;
    if serial < 61.0 { serial - 1.0 } else { serial }
}

/// Last row of an Excel worksheet.
pub const MAX_ROWS: u32 = 1_048_576;

/// Last column of an Excel worksheet (`XFD`).
pub const MAX_COLUMNS: u32 = 16_384;

/// True when `(col, row)` lies inside the worksheet grid.
pub fn in_sheet_bounds(col: u32, row: u32) -> bool {
    (1..=MAX_COLUMNS).contains(&col) && (1..=MAX_ROWS).contains(&row)
}

/// Convert a 1-based column index to Excel letters (1 -> A, 27 -> AA).
pub fn column_to_letters(mut col: u32) -> String {
    let mut letters = Vec::with_capacity(3);
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Split a cell reference such as `BC12` into 1-based `(column, row)`.
pub fn reference_to_coords(reference: &str) -> Option<(u32, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col = 0u32;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(u32::from(b.to_ascii_uppercase() - b'A' + 1))?;
    }
    let row = digits.parse().ok()?;
    Some((col, row))
}
