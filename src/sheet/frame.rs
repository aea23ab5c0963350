//! Column-typed view of a worksheet used for text summaries.
//!
//! The first non-blank row becomes the header and the remaining non-blank rows
//! the data. Each column gets a dtype, and the frame renders a fixed-width
//! sample table and a describe-style numeric summary.

use crate::sheet::types::CellValue;
use std::fmt;

/// Inferred column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Int64,
    Float64,
    Bool,
    Datetime,
    Object,
}

impl Dtype {
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, Dtype::Int64 | Dtype::Float64)
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dtype::Int64 => "int64",
            Dtype::Float64 => "float64",
            Dtype::Bool => "bool",
            Dtype::Datetime => "datetime64[ns]",
            Dtype::Object => "object",
        })
    }
}

/// Header plus data rows of one sheet, padded to a rectangle.
#[derive(Debug, Clone)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    dtypes: Vec<Dtype>,
}

impl Frame {
    /// Build a frame from a row-major cell grid anchored at `A1`.
    ///
    /// Trailing empty cells and blank rows are dropped, blank header cells
    /// become `Unnamed: <i>` and duplicate names get `.1`, `.2` suffixes.
    pub fn from_grid(grid: Vec<Vec<CellValue>>) -> Self {
        let mut lines: Vec<Vec<CellValue>> = grid
            .into_iter()
            .map(|mut row| {
                while row.last().is_some_and(CellValue::is_empty) {
                    row.pop();
                }
                row
            })
            .filter(|row| !row.is_empty())
            .collect();

        let width = lines.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut lines {
            row.resize(width, CellValue::Empty);
        }

        let mut lines = lines.into_iter();
        let columns = match lines.next() {
            Some(header) => header_names(header),
            None => Vec::new(),
        };
        let rows: Vec<Vec<CellValue>> = lines.collect();
        let dtypes = (0..columns.len())
            .map(|c| infer_dtype(rows.iter().map(|r| &r[c]), rows.len()))
            .collect();

        Self {
            columns,
            rows,
            dtypes,
        }
    }

    /// `(data rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// True when the frame has no data rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn dtypes(&self) -> &[Dtype] {
        &self.dtypes
    }

    /// Number of non-missing values in column `col`.
    pub fn non_null(&self, col: usize) -> usize {
        self.rows.iter().filter(|r| !r[col].is_null()).count()
    }

    /// Render the first `n` rows as a fixed-width table with a row index.
    pub fn render_head(&self, n: usize) -> String {
        let shown = &self.rows[..n.min(self.rows.len())];
        let index: Vec<String> = (0..shown.len()).map(|i| i.to_string()).collect();
        let cells: Vec<Vec<String>> = (0..self.columns.len())
            .map(|c| format_column(self.dtypes[c], shown.iter().map(|r| &r[c])))
            .collect();
        render_table(&index, &self.columns, &cells)
    }

    /// Describe-style summary of the numeric columns, or `None` if there are none.
    pub fn describe(&self) -> Option<String> {
        let numeric: Vec<usize> = (0..self.columns.len())
            .filter(|&c| self.dtypes[c].is_numeric())
            .collect();
        if numeric.is_empty() {
            return None;
        }

        let labels: Vec<String> = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let names: Vec<String> = numeric.iter().map(|&c| self.columns[c].clone()).collect();
        let cells: Vec<Vec<String>> = numeric
            .iter()
            .map(|&c| {
                let values: Vec<f64> = self.rows.iter().filter_map(|r| r[c].as_f64()).collect();
                format_floats(&summary_stats(values))
            })
            .collect();
        Some(render_table(&labels, &names, &cells))
    }
}

fn header_names(header: Vec<CellValue>) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (i, cell) in header.into_iter().enumerate() {
        let base = if cell.is_null() {
            format!("Unnamed: {i}")
        } else {
            cell.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        names.push(name);
    }
    names
}

fn infer_dtype<'a>(values: impl Iterator<Item = &'a CellValue>, len: usize) -> Dtype {
    if len == 0 {
        return Dtype::Object;
    }
    let (mut ints, mut floats, mut bools, mut dates, mut nulls, mut other) = (0, 0, 0, 0, 0, 0);
    for v in values {
        match v {
            v if v.is_null() => nulls += 1,
            CellValue::Int(_) => ints += 1,
            CellValue::Float(_) => floats += 1,
            CellValue::Bool(_) => bools += 1,
            CellValue::DateTime(_) => dates += 1,
            _ => other += 1,
        }
    }
    let present = len - nulls;
    if present == 0 {
        Dtype::Float64
    } else if other > 0 {
        Dtype::Object
    } else if bools == present {
        if nulls == 0 { Dtype::Bool } else { Dtype::Object }
    } else if dates == present {
        Dtype::Datetime
    } else if ints == present && nulls == 0 {
        Dtype::Int64
    } else if ints + floats == present {
        Dtype::Float64
    } else {
        Dtype::Object
    }
}

fn format_column<'a>(dtype: Dtype, values: impl Iterator<Item = &'a CellValue>) -> Vec<String> {
    let values: Vec<&CellValue> = values.collect();
    match dtype {
        Dtype::Float64 => {
            let floats: Vec<f64> = values
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect();
            format_floats(&floats)
        },
        Dtype::Datetime => {
            let date_only = values.iter().all(|v| match v {
                CellValue::DateTime(dt) => dt.time() == chrono::NaiveTime::MIN,
                _ => true,
            });
            let pattern = if date_only { "%Y-%m-%d" } else { "%Y-%m-%d %H:%M:%S" };
            values
                .iter()
                .map(|v| match v {
                    CellValue::DateTime(dt) => dt.format(pattern).to_string(),
                    _ => "NaT".to_string(),
                })
                .collect()
        },
        Dtype::Int64 | Dtype::Bool | Dtype::Object => values
            .iter()
            .map(|v| {
                if v.is_null() {
                    "NaN".to_string()
                } else {
                    escape_cell(&v.to_string())
                }
            })
            .collect(),
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('\t', "\\t").replace('\r', "\\r").replace('\n', "\\n")
}

/// Format floats with a shared number of decimals (1 to 6), `NaN` for gaps.
fn format_floats(values: &[f64]) -> Vec<String> {
    let decimals = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| {
            let s = format!("{v:.6}");
            let trimmed = s.trim_end_matches('0');
            trimmed.len() - trimmed.find('.').map_or(trimmed.len(), |p| p + 1)
        })
        .max()
        .unwrap_or(1)
        .max(1);
    values
        .iter()
        .map(|v| {
            if v.is_nan() {
                "NaN".to_string()
            } else if v.is_infinite() {
                if *v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
            } else {
                format!("{v:.decimals$}")
            }
        })
        .collect()
}

/// count, mean, std (sample), min, quartiles (linear), max
fn summary_stats(mut values: Vec<f64>) -> [f64; 8] {
    let n = values.len();
    if n == 0 {
        return [0.0, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN];
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };
    let quantile = |q: f64| {
        let pos = q * (n - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
    };
    [
        n as f64,
        mean,
        std,
        values[0],
        quantile(0.25),
        quantile(0.5),
        quantile(0.75),
        values[n - 1],
    ]
}

/// Lay out a left-aligned index column and right-aligned value columns.
fn render_table(index: &[String], names: &[String], cells: &[Vec<String>]) -> String {
    let index_width = index.iter().map(|s| s.chars().count()).max().unwrap_or(0);
    let widths: Vec<usize> = names
        .iter()
        .zip(cells)
        .map(|(name, col)| {
            col.iter()
                .map(|s| s.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(index.len() + 1);
    let mut header = " ".repeat(index_width);
    for (name, width) in names.iter().zip(&widths) {
        header.push_str(&format!("  {name:>width$}"));
    }
    lines.push(header);

    for (r, label) in index.iter().enumerate() {
        let mut line = format!("{label:<index_width$}");
        for (col, width) in cells.iter().zip(&widths) {
            line.push_str(&format!("  {:>width$}", col[r]));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn sample() -> Frame {
        Frame::from_grid(vec![
            vec![s("Name"), s("Qty"), s("Price"), CellValue::Empty],
            vec![s("apple"), CellValue::Int(3), CellValue::Float(1.5)],
            vec![],
            vec![s("pear"), CellValue::Int(5), CellValue::Empty],
            vec![s("fig"), CellValue::Int(1), CellValue::Float(2.25)],
        ])
    }

    #[test]
    fn test_shape_and_dtypes() {
        let frame = sample();
        assert_eq!(frame.shape(), (3, 3));
        assert_eq!(frame.columns(), ["Name", "Qty", "Price"]);
        let dtypes: Vec<String> = frame.dtypes().iter().map(|d| d.to_string()).collect();
        assert_eq!(dtypes, ["object", "int64", "float64"]);
        assert_eq!(frame.non_null(2), 2);
    }

    #[test]
    fn test_render_head() {
        let expected = "\
    Name  Qty  Price
0  apple    3   1.50
1   pear    5    NaN
2    fig    1   2.25";
        assert_eq!(sample().render_head(10), expected);
        assert_eq!(sample().render_head(1).lines().count(), 2);
    }

    #[test]
    fn test_describe() {
        let frame = Frame::from_grid(vec![
            vec![s("x")],
            vec![CellValue::Int(1)],
            vec![CellValue::Int(2)],
            vec![CellValue::Int(3)],
        ]);
        let expected = "\
         x
count  3.0
mean   2.0
std    1.0
min    1.0
25%    1.5
50%    2.0
75%    2.5
max    3.0";
        assert_eq!(frame.describe().unwrap(), expected);
    }

    #[test]
    fn test_empty_and_header_only() {
        let empty = Frame::from_grid(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.shape(), (0, 0));

        let header_only = Frame::from_grid(vec![vec![s("a"), CellValue::Empty, s("a")]]);
        assert!(header_only.is_empty());
        assert_eq!(header_only.columns(), ["a", "Unnamed: 1", "a.1"]);
    }

    #[test]
    fn test_bool_and_date_dtypes() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let frame = Frame::from_grid(vec![
            vec![s("flag"), s("when"), s("maybe")],
            vec![CellValue::Bool(true), CellValue::DateTime(day), CellValue::Bool(false)],
            vec![CellValue::Bool(false), CellValue::DateTime(day), CellValue::Empty],
        ]);
        let dtypes: Vec<String> = frame.dtypes().iter().map(|d| d.to_string()).collect();
        assert_eq!(dtypes, ["bool", "datetime64[ns]", "object"]);
        assert!(frame.describe().is_none());
        assert!(frame.render_head(10).contains("2024-03-01"));
    }
}
