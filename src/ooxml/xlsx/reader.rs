//! Workbook reader: sheet list, shared strings, date styles and cell grids.

use crate::common::error::{Error, Result};
use crate::common::xml::{attr_value, attr_value_qualified, push_entity, push_text};
use crate::ooxml::office_document_member;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::{PhysPkgReader, Relationships, resolve_target};
use crate::ooxml::xlsx::numfmt::{is_builtin_date, is_date_format};
use crate::sheet::types::{CellValue, column_to_letters, in_sheet_bounds, reference_to_coords, serial_to_datetime};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A sheet declared in `workbook.xml`, resolved to its package member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRef {
    pub name: String,
    pub membername: String,
}

/// Read-only view of an xlsx package.
pub struct XlsxReader {
    pkg: PhysPkgReader,
    sheets: Vec<SheetRef>,
    shared_strings: Vec<String>,
    /// Per cell-format index: does the number format display a date?
    date_styles: Vec<bool>,
}

impl XlsxReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(PhysPkgReader::open(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_package(PhysPkgReader::from_bytes(data)?)
    }

    fn from_package(mut pkg: PhysPkgReader) -> Result<Self> {
        let workbook_member = office_document_member(&mut pkg, "xl/workbook.xml")?;
        let workbook_xml = pkg.blob_for(&workbook_member)?;
        let rels = match pkg.rels_xml_for(&workbook_member)? {
            Some(xml) => Relationships::from_xml(&xml)?,
            None => Relationships::new(),
        };

        let sheets = parse_workbook_sheets(&workbook_xml)?
            .into_iter()
            .map(|(name, r_id)| {
                let target = rels
                    .get(&r_id)
                    .map(|rel| rel.target.as_str())
                    .ok_or_else(|| Error::Xml(format!("sheet '{name}' has no relationship {r_id}")))?;
                Ok(SheetRef {
                    membername: resolve_target(&workbook_member, target),
                    name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let shared_strings = match rels.first_of_type(rt::SHARED_STRINGS) {
            Some(rel) => {
                let member = resolve_target(&workbook_member, &rel.target);
                match pkg.try_blob_for(&member)? {
                    Some(xml) => parse_shared_strings(&xml)?,
                    None => Vec::new(),
                }
            },
            None => Vec::new(),
        };

        let date_styles = match rels.first_of_type(rt::STYLES) {
            Some(rel) => {
                let member = resolve_target(&workbook_member, &rel.target);
                match pkg.try_blob_for(&member)? {
                    Some(xml) => parse_date_styles(&xml)?,
                    None => Vec::new(),
                }
            },
            None => Vec::new(),
        };

        debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            "opened workbook"
        );
        Ok(Self {
            pkg,
            sheets,
            shared_strings,
            date_styles,
        })
    }

    pub fn sheets(&self) -> &[SheetRef] {
        &self.sheets
    }

    /// Row-major cell grid of a sheet, anchored at `A1`.
    ///
    /// Missing cells are [`CellValue::Empty`]; each row is only as long as its
    /// last populated cell.
    pub fn read_grid(&mut self, index: usize) -> Result<Vec<Vec<CellValue>>> {
        let sheet = self
            .sheets
            .get(index)
            .ok_or_else(|| Error::InvalidData(format!("no sheet at index {index}")))?;
        let xml = self.pkg.blob_for(&sheet.membername)?;
        let cells = parse_sheet_cells(&xml, &self.shared_strings, &self.date_styles)?;

        let mut grid: Vec<Vec<CellValue>> = Vec::new();
        for (row, col, value) in cells {
            let (r, c) = (row as usize - 1, col as usize - 1);
            if grid.len() <= r {
                grid.resize_with(r + 1, Vec::new);
            }
            let line = &mut grid[r];
            if line.len() <= c {
                line.resize(c + 1, CellValue::Empty);
            }
            line[c] = value;
        }
        Ok(grid)
    }
}

/// `(name, r:id)` of every `<sheet>` in `workbook.xml`, in tab order.
pub(crate) fn parse_workbook_sheets(xml: &[u8]) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name")?.unwrap_or_default();
                let r_id = attr_value_qualified(&e, b"r:id")?
                    .or(attr_value(&e, b"id")?)
                    .unwrap_or_default();
                sheets.push((name, r_id));
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Plain text of every `<si>` entry; phonetic runs are skipped.
pub(crate) fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    let mut in_phonetic = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_t = true,
                b"rPh" => in_phonetic = true,
                _ => {},
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(e)) if in_t && !in_phonetic => push_text(&mut current, &e)?,
            Ok(Event::GeneralRef(e)) if in_t && !in_phonetic => push_entity(&mut current, &e)?,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_t = false,
                b"rPh" => in_phonetic = false,
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
    Ok(strings)
}

/// Date flag for each `<xf>` of `<cellXfs>` in `styles.xml`.
pub(crate) fn parse_date_styles(xml: &[u8]) -> Result<Vec<bool>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut custom: HashMap<u32, bool> = HashMap::new();
    let mut flags = Vec::new();
    let mut in_cell_xfs = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"numFmt" => {
                    if let Some(id) = attr_value(&e, b"numFmtId")?.and_then(|v| v.parse().ok())
                        && let Some(code) = attr_value(&e, b"formatCode")?
                    {
                        custom.insert(id, is_date_format(&code));
                    }
                },
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let id: u32 = attr_value(&e, b"numFmtId")?
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                    let is_date = custom.get(&id).copied().unwrap_or_else(|| is_builtin_date(id));
                    flags.push(is_date);
                },
                _ => {},
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
    Ok(flags)
}

#[derive(Default)]
struct PendingCell {
    col: u32,
    kind: Option<String>,
    style: usize,
    raw: String,
    has_value: bool,
}

/// `(row, column, value)` for every populated cell of a worksheet.
pub(crate) fn parse_sheet_cells(
    xml: &[u8],
    shared_strings: &[String],
    date_styles: &[bool],
) -> Result<Vec<(u32, u32, CellValue)>> {
    let mut reader = Reader::from_reader(xml);

    let mut cells = Vec::new();
    let mut row_num = 0u32;
    let mut col_num = 0u32;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_phonetic = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row_num = attr_value(&e, b"r")?
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(row_num.saturating_add(1));
                    col_num = 0;
                },
                b"c" => {
                    let (col, row) = match attr_value(&e, b"r")?.and_then(|r| reference_to_coords(&r)) {
                        Some(coords) => coords,
                        None => (col_num.saturating_add(1), row_num),
                    };
                    row_num = row.max(1);
                    col_num = col;
                    cell = Some(PendingCell {
                        col,
                        kind: attr_value(&e, b"t")?,
                        style: attr_value(&e, b"s")?.and_then(|v| v.parse().ok()).unwrap_or(0),
                        ..PendingCell::default()
                    });
                },
                b"v" | b"t" if cell.is_some() && !in_phonetic => {
                    in_value = true;
                    if let Some(c) = cell.as_mut() {
                        c.has_value = true;
                    }
                },
                b"rPh" => in_phonetic = true,
                _ => {},
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                col_num = attr_value(&e, b"r")?
                    .and_then(|r| reference_to_coords(&r))
                    .map_or(col_num.saturating_add(1), |(c, _)| c);
            },
            Ok(Event::Text(e)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    push_text(&mut c.raw, &e)?;
                }
            },
            Ok(Event::GeneralRef(e)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    push_entity(&mut c.raw, &e)?;
                }
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(pending) = cell.take()
                        && pending.has_value
                    {
                        let value = decode_cell(&pending, shared_strings, date_styles)?;
                        if !value.is_empty() {
                            let (row, col) = (row_num.max(1), pending.col.max(1));
                            // the grid is materialized from these coordinates
                            if !in_sheet_bounds(col, row) {
                                return Err(Error::Xml(format!(
                                    "cell {}{row} lies outside the worksheet grid",
                                    column_to_letters(col)
                                )));
                            }
                            cells.push((row, col, value));
                        }
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
    Ok(cells)
}

fn decode_cell(cell: &PendingCell, shared_strings: &[String], date_styles: &[bool]) -> Result<CellValue> {
    let raw = cell.raw.as_str();
    Ok(match cell.kind.as_deref() {
        Some("s") => {
            let idx: usize = raw
                .trim()
                .parse()
                .map_err(|_| Error::Xml(format!("invalid shared string index '{raw}'")))?;
            let text = shared_strings
                .get(idx)
                .ok_or_else(|| Error::Xml(format!("shared string index {idx} out of range")))?;
            CellValue::String(text.clone())
        },
        Some("str") | Some("inlineStr") => CellValue::String(raw.to_string()),
        Some("b") => CellValue::Bool(raw.trim() == "1"),
        Some("e") => CellValue::Error(raw.to_string()),
        Some("d") => chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map(|d| d.and_time(chrono::NaiveTime::MIN))
            })
            .map(CellValue::DateTime)
            .unwrap_or_else(|_| CellValue::String(raw.to_string())),
        _ => {
            if raw.is_empty() {
                return Ok(CellValue::Empty);
            }
            match raw.trim().parse::<f64>() {
                Ok(number) if date_styles.get(cell.style).copied().unwrap_or(false) => {
                    serial_to_datetime(number)
                        .map(CellValue::DateTime)
                        .unwrap_or(CellValue::Float(number))
                },
                Ok(number) if number.fract() == 0.0 && number.abs() < 9.0e15 => {
                    CellValue::Int(number as i64)
                },
                Ok(number) => CellValue::Float(number),
                Err(_) => CellValue::String(raw.to_string()),
            }
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shared_strings() {
        let xml = br#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<si><t>Plain</t></si>
<si><r><t>Rich </t></r><r><rPr><b/></rPr><t>text</t></r><rPh><t>ignored</t></rPh></si>
<si/>
<si><t>A &amp; B</t></si>
</sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, ["Plain", "Rich text", "", "A & B"]);
    }

    #[test]
    fn test_parse_date_styles() {
        let xml = br#"<styleSheet>
<numFmts count="2"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/><numFmt numFmtId="165" formatCode="0.000"/></numFmts>
<cellStyleXfs count="1"><xf numFmtId="14"/></cellStyleXfs>
<cellXfs count="4"><xf numFmtId="0"/><xf numFmtId="164"/><xf numFmtId="165"/><xf numFmtId="14"/></cellXfs>
</styleSheet>"#;
        assert_eq!(parse_date_styles(xml).unwrap(), [false, true, false, true]);
    }

    #[test]
    fn test_parse_sheet_cells() {
        let xml = br#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="inlineStr"><is><t>inline</t></is></c></row>
<row r="3"><c r="A3"><v>42</v></c><c r="B3" s="1"><v>45292</v></c><c r="C3" t="b"><v>1</v></c><c r="D3"><v>2.5</v></c></row>
<row r="4"><c r="A4" t="e"><v>#DIV/0!</v></c><c r="B4"><f>SUM(A1:A3)</f></c></row>
</sheetData></worksheet>"#;
        let cells = parse_sheet_cells(xml, &["head".to_string()], &[false, true]).unwrap();
        let day = serial_to_datetime(45292.0).unwrap();
        assert_eq!(
            cells,
            vec![
                (1, 1, CellValue::String("head".into())),
                (1, 3, CellValue::String("inline".into())),
                (3, 1, CellValue::Int(42)),
                (3, 2, CellValue::DateTime(day)),
                (3, 3, CellValue::Bool(true)),
                (3, 4, CellValue::Float(2.5)),
                (4, 1, CellValue::Error("#DIV/0!".into())),
            ]
        );
    }

    #[test]
    fn test_bad_shared_string_index() {
        let xml = br#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>9</v></c></row></sheetData></worksheet>"#;
        assert!(parse_sheet_cells(xml, &[], &[]).is_err());
    }

    #[test]
    fn test_reference_outside_grid() {
        let far_row = br#"<worksheet><sheetData><row r="4000000000"><c r="A4000000000"><v>1</v></c></row></sheetData></worksheet>"#;
        let err = parse_sheet_cells(far_row, &[], &[]).unwrap_err();
        assert!(matches!(err, Error::Xml(_)));
        assert!(err.to_string().contains("A4000000000"));

        let far_col = br#"<worksheet><sheetData><row r="1"><c r="XFE1"><v>1</v></c></row></sheetData></worksheet>"#;
        assert!(parse_sheet_cells(far_col, &[], &[]).is_err());

        let edge = br#"<worksheet><sheetData><row r="1048576"><c r="XFD1048576"><v>1</v></c></row></sheetData></worksheet>"#;
        assert_eq!(
            parse_sheet_cells(edge, &[], &[]).unwrap(),
            vec![(1_048_576, 16_384, CellValue::Int(1))]
        );
    }
}
