/// Worksheet model and serialization for generated workbooks.
use crate::common::error::{Error, Result};
use crate::common::xml::escape_xml;
use crate::sheet::types::{CellValue, column_to_letters, datetime_to_serial};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use super::strings::{SharedStrings, push_text_element};
use super::styles::CellStyle;

/// Widest auto-sized column, in characters.
const MAX_COLUMN_WIDTH: usize = 50;

/// Characters Excel rejects in sheet names.
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Check a sheet name against Excel's rules.
pub(crate) fn validate_sheet_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidData("sheet name must not be empty".into()));
    }
    if name.chars().count() > 31 {
        return Err(Error::InvalidData(format!(
            "sheet name '{name}' is longer than 31 characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_SHEET_CHARS.contains(c)) {
        return Err(Error::InvalidData(format!(
            "sheet name '{name}' contains the invalid character '{c}'"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cell {
    pub(crate) value: CellValue,
    pub(crate) style: CellStyle,
}

/// How string cells are stored.
pub(crate) enum StringStore<'a> {
    /// Index into the workbook's shared strings table
    Shared(&'a mut SharedStrings),
    /// `inlineStr` cells, for sheets spliced into foreign workbooks
    Inline,
}

/// A worksheet under construction. Rows and columns are 1-based.
#[derive(Debug, Clone)]
pub(crate) struct Worksheet {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u32, Cell>>,
    /// Column widths in characters
    widths: BTreeMap<u32, f64>,
}

impl Worksheet {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            widths: BTreeMap::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Set a cell value. Empty values are not stored.
    pub(crate) fn set_value(&mut self, row: u32, col: u32, value: CellValue) {
        if value.is_empty() {
            return;
        }
        let style = CellStyle {
            date: matches!(value, CellValue::DateTime(_)),
            ..CellStyle::default()
        };
        self.rows
            .entry(row)
            .or_default()
            .insert(col, Cell { value, style });
    }

    /// Write `values` left to right starting at column A of `row`.
    pub(crate) fn write_row(&mut self, row: u32, values: impl IntoIterator<Item = CellValue>) {
        for (col, value) in (1..).zip(values) {
            self.set_value(row, col, value);
        }
    }

    pub(crate) fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    pub(crate) fn set_title_style(&mut self, row: u32, col: u32) {
        if let Some(cell) = self.rows.get_mut(&row).and_then(|cells| cells.get_mut(&col)) {
            cell.style = CellStyle::TITLE;
        }
    }

    /// Highest populated row, 0 for an empty sheet.
    pub(crate) fn max_row(&self) -> u32 {
        self.rows.keys().next_back().copied().unwrap_or(0)
    }

    /// Highest populated column, 0 for an empty sheet.
    pub(crate) fn max_col(&self) -> u32 {
        self.rows
            .values()
            .filter_map(|cells| cells.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn column_width(&self, col: u32) -> Option<f64> {
        self.widths.get(&col).copied()
    }

    /// Header look on row 1, auto-sized columns and thin borders.
    ///
    /// Row 1 is styled from column A up to the widest row even where a header
    /// cell is blank. Column width is the longest rendered value plus two,
    /// capped at 50. Only populated cells get a border.
    pub(crate) fn apply_default_formatting(&mut self) {
        let max_col = self.max_col();
        if max_col == 0 {
            return;
        }

        let header = self.rows.entry(1).or_default();
        for col in 1..=max_col {
            let cell = header.entry(col).or_insert_with(|| Cell {
                value: CellValue::Empty,
                style: CellStyle::default(),
            });
            cell.style.header = true;
        }

        let mut lengths: BTreeMap<u32, usize> = BTreeMap::new();
        for cells in self.rows.values_mut() {
            for (&col, cell) in cells.iter_mut() {
                if cell.value.is_empty() {
                    continue;
                }
                cell.style.border = true;
                let len = cell.value.to_string().chars().count();
                let longest = lengths.entry(col).or_default();
                *longest = (*longest).max(len);
            }
        }

        for (col, len) in lengths {
            self.widths.insert(col, (len + 2).min(MAX_COLUMN_WIDTH) as f64);
        }
    }

    /// `A1:<last cell>` reference, or `A1` for an empty sheet.
    pub(crate) fn dimension(&self) -> String {
        match (self.max_row(), self.max_col()) {
            (0, _) | (_, 0) => "A1".to_string(),
            (row, col) => format!("A1:{}{}", column_to_letters(col), row),
        }
    }

    /// Serialize the worksheet part.
    pub(crate) fn to_xml(&self, strings: &mut StringStore<'_>) -> Result<String> {
        let mut xml = String::with_capacity(1024 + self.rows.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
        write!(xml, r#"<dimension ref="{}"/>"#, self.dimension())?;
        xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
        xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

        if !self.widths.is_empty() {
            xml.push_str("<cols>");
            for (col, width) in &self.widths {
                write!(
                    xml,
                    r#"<col min="{col}" max="{col}" width="{width}" customWidth="1"/>"#
                )?;
            }
            xml.push_str("</cols>");
        }

        if self.rows.is_empty() {
            xml.push_str("<sheetData/>");
        } else {
            xml.push_str("<sheetData>");
            self.write_rows(&mut xml, strings)?;
            xml.push_str("</sheetData>");
        }

        xml.push_str(r#"<pageMargins left="0.75" right="0.75" top="1" bottom="1" header="0.5" footer="0.5"/>"#);
        xml.push_str("</worksheet>");
        Ok(xml)
    }

    /// Serialize only the `<row>` elements.
    pub(crate) fn write_rows(&self, xml: &mut String, strings: &mut StringStore<'_>) -> Result<()> {
        for (row, cells) in &self.rows {
            write!(xml, r#"<row r="{row}">"#)?;
            for (col, cell) in cells {
                let reference = format!("{}{}", column_to_letters(*col), row);
                write_cell(xml, &reference, &cell.value, cell.style.xf_index(), strings)?;
            }
            xml.push_str("</row>");
        }
        Ok(())
    }
}

/// Serialize one `<c>` element.
pub(crate) fn write_cell(
    xml: &mut String,
    reference: &str,
    value: &CellValue,
    xf_index: u32,
    strings: &mut StringStore<'_>,
) -> Result<()> {
    let style_attr = if xf_index == 0 {
        String::new()
    } else {
        format!(r#" s="{xf_index}""#)
    };

    match value {
        CellValue::Empty => {
            write!(xml, r#"<c r="{reference}"{style_attr}/>"#)?;
        },
        CellValue::String(s) => match strings {
            StringStore::Shared(table) => {
                let index = table.add_string(s);
                write!(xml, r#"<c r="{reference}"{style_attr} t="s"><v>{index}</v></c>"#)?;
            },
            StringStore::Inline => {
                write!(xml, r#"<c r="{reference}"{style_attr} t="inlineStr"><is>"#)?;
                push_text_element(xml, s)?;
                xml.push_str("</is></c>");
            },
        },
        CellValue::Int(i) => {
            write!(xml, r#"<c r="{reference}"{style_attr}><v>{i}</v></c>"#)?;
        },
        CellValue::Float(f) if f.is_finite() => {
            let mut buffer = ryu::Buffer::new();
            write!(
                xml,
                r#"<c r="{reference}"{style_attr}><v>{}</v></c>"#,
                buffer.format_finite(*f)
            )?;
        },
        CellValue::Float(_) => {
            write!(xml, r#"<c r="{reference}"{style_attr} t="e"><v>#NUM!</v></c>"#)?;
        },
        CellValue::Bool(b) => {
            write!(
                xml,
                r#"<c r="{reference}"{style_attr} t="b"><v>{}</v></c>"#,
                u8::from(*b)
            )?;
        },
        CellValue::DateTime(dt) => {
            let mut buffer = ryu::Buffer::new();
            write!(
                xml,
                r#"<c r="{reference}"{style_attr}><v>{}</v></c>"#,
                buffer.format_finite(datetime_to_serial(*dt))
            )?;
        },
        CellValue::Error(e) => {
            write!(
                xml,
                r#"<c r="{reference}"{style_attr} t="e"><v>{}</v></c>"#,
                escape_xml(e)
            )?;
        },
    }
    Ok(())
}
