//! In-place append into an existing workbook.
//!
//! The package is edited at the part level: only the target worksheet (and,
//! for a new sheet, the workbook, its relationships and the content types)
//! is rewritten. Every other member is copied through byte for byte, so rows,
//! styles and features this crate knows nothing about survive the append.
//!
//! Appends are not coordinated: two callers appending to the same file at the
//! same time race at the filesystem and the last save wins. Callers must
//! serialize appends to one destination themselves.

use crate::common::error::{Error, Result};
use crate::common::xml::{attr_value, escape_xml};
use crate::ooxml::office_document_target;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::phys_pkg::rels_membername;
use crate::ooxml::opc::{ContentTypes, RawPackage, Relationships, resolve_target};
use crate::ooxml::xlsx::reader::parse_workbook_sheets;
use crate::sheet::types::{CellValue, MAX_COLUMNS, MAX_ROWS, column_to_letters, reference_to_coords};
use memchr::memmem;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt::Write as FmtWrite;
use std::path::Path;
use tracing::debug;

use super::sheet::{StringStore, validate_sheet_name, write_cell};
use super::styles::append_date_xf;
use super::workbook::WorkbookBuilder;

const CONTENT_TYPES_MEMBER: &str = "[Content_Types].xml";

/// Where the appended rows landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AppendCursor {
    /// First row written, 1-based
    pub(crate) next_row: u32,
    /// Whether the sheet had to be created
    pub(crate) created_sheet: bool,
}

/// Append `rows` below the last row of `sheet_name` in the workbook at `path`.
///
/// A missing file becomes a new workbook holding only `sheet_name`; a missing
/// sheet is added after the existing ones. Rows are written from column A.
pub(crate) fn append_rows(path: &Path, sheet_name: &str, rows: &[Vec<CellValue>]) -> Result<AppendCursor> {
    if !path.exists() {
        let next_row = append_cursor(0, rows)?;
        let mut workbook = WorkbookBuilder::new();
        let ws = workbook.add_worksheet(sheet_name)?;
        for (row, values) in (next_row..).zip(rows) {
            ws.write_row(row, values.iter().cloned());
        }
        workbook.save(path)?;
        return Ok(AppendCursor {
            next_row,
            created_sheet: true,
        });
    }
    if !path.is_file() {
        return Err(Error::NotAFile(path.to_path_buf()));
    }

    let mut package = RawPackage::open(path)?;
    let cursor = append_to_package(&mut package, sheet_name, rows)?;
    package.save(path)?;
    Ok(cursor)
}

/// Append into an opened package; see [`append_rows`].
pub(crate) fn append_to_package(
    package: &mut RawPackage,
    sheet_name: &str,
    rows: &[Vec<CellValue>],
) -> Result<AppendCursor> {
    let workbook_member = office_document_target(package.get("_rels/.rels"), "xl/workbook.xml")?;
    let workbook_rels_member = rels_membername(&workbook_member);
    let mut rels = match package.get(&workbook_rels_member) {
        Some(xml) => Relationships::from_xml(xml)?,
        None => Relationships::new(),
    };
    let sheets = parse_workbook_sheets(package.require(&workbook_member)?)?;

    let date_xf = if rows.iter().flatten().any(|v| matches!(v, CellValue::DateTime(_))) {
        date_format_index(package, &workbook_member, &rels)?
    } else {
        None
    };

    let lower = sheet_name.to_lowercase();
    let existing = sheets.iter().find(|(name, _)| name.to_lowercase() == lower);

    if let Some((name, r_id)) = existing {
        let target = rels
            .get(r_id)
            .map(|rel| rel.target.clone())
            .ok_or_else(|| Error::Xml(format!("sheet '{name}' has no relationship {r_id}")))?;
        let member = resolve_target(&workbook_member, &target);
        let xml = std::str::from_utf8(package.require(&member)?)?;

        let next_row = append_cursor(last_row(xml.as_bytes())?, rows)?;
        let mut fragment = String::new();
        let last_col = write_row_elements(&mut fragment, next_row, rows, date_xf)?;
        let mut patched = splice_rows(xml, &fragment)?;
        if let Some(extra) = rows.len().checked_sub(1) {
            // bounded by append_cursor
            patched = update_dimension(&patched, next_row + extra as u32, last_col);
        }
        package.set(&member, patched.into_bytes());

        debug!(sheet = %name, next_row, rows = rows.len(), "appended to existing sheet");
        return Ok(AppendCursor {
            next_row,
            created_sheet: false,
        });
    }

    validate_sheet_name(sheet_name)?;
    let next_row = append_cursor(0, rows)?;
    let member = unused_sheet_member(package);
    let r_id = rels.add(rt::WORKSHEET, &sheet_target(&workbook_member, &member));
    let sheet_id = next_sheet_id(package.require(&workbook_member)?)?;

    let workbook_xml = std::str::from_utf8(package.require(&workbook_member)?)?;
    let workbook_xml = insert_sheet_entry(workbook_xml, sheet_name, sheet_id, &r_id)?;
    package.set(&workbook_member, workbook_xml.into_bytes());
    package.set(&workbook_rels_member, rels.to_xml()?.into_bytes());

    let mut content_types = ContentTypes::from_xml(package.require(CONTENT_TYPES_MEMBER)?)?;
    content_types.add_content_type(&member, ct::SML_WORKSHEET);
    package.set(CONTENT_TYPES_MEMBER, content_types.to_xml()?.into_bytes());

    package.set(&member, new_sheet_xml(rows, date_xf)?.into_bytes());

    debug!(sheet = sheet_name, member = %member, rows = rows.len(), "appended to new sheet");
    Ok(AppendCursor {
        next_row,
        created_sheet: true,
    })
}

/// First row below `last_row`, provided `rows` still fit the worksheet grid.
///
/// # Errors
/// `InvalidData` when the rows would run past row 1,048,576 or a row is
/// wider than 16,384 columns.
fn append_cursor(last_row: u32, rows: &[Vec<CellValue>]) -> Result<u32> {
    if let Some(wide) = rows.iter().find(|r| r.len() > MAX_COLUMNS as usize) {
        return Err(Error::InvalidData(format!(
            "a row of {} values exceeds the {MAX_COLUMNS}-column sheet limit",
            wide.len()
        )));
    }
    let needed = u64::try_from(rows.len().max(1)).unwrap_or(u64::MAX);
    let end = u64::from(last_row).saturating_add(needed);
    if end > u64::from(MAX_ROWS) {
        return Err(Error::InvalidData(format!(
            "appending {} rows below row {last_row} exceeds the {MAX_ROWS}-row sheet limit",
            rows.len()
        )));
    }
    Ok(last_row + 1)
}

/// Index of a date-time cell format, patching the stylesheet when needed.
///
/// `None` when the workbook has no stylesheet to extend; dates are then
/// written as ISO text.
fn date_format_index(package: &mut RawPackage, workbook_member: &str, rels: &Relationships) -> Result<Option<u32>> {
    let Some(rel) = rels.first_of_type(rt::STYLES) else {
        return Ok(None);
    };
    let member = resolve_target(workbook_member, &rel.target);
    let Some(xml) = package.get(&member) else {
        return Ok(None);
    };
    let xml = std::str::from_utf8(xml)?;
    Ok(match append_date_xf(xml) {
        Some((patched, index)) => {
            package.set(&member, patched.into_bytes());
            Some(index)
        },
        None => None,
    })
}

/// Highest row number used by a `<row>` element or a cell reference.
pub(crate) fn last_row(xml: &[u8]) -> Result<u32> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current = 0u32;
    let mut max = 0u32;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current = attr_value(&e, b"r")?
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(current.saturating_add(1));
                    max = max.max(current);
                },
                b"c" => {
                    if let Some((_, row)) = attr_value(&e, b"r")?.and_then(|r| reference_to_coords(&r)) {
                        max = max.max(row);
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
    Ok(max)
}

/// Serialize `rows` as `<row>` elements starting at `first_row`.
///
/// Returns the widest column written.
fn write_row_elements(
    xml: &mut String,
    first_row: u32,
    rows: &[Vec<CellValue>],
    date_xf: Option<u32>,
) -> Result<u32> {
    let mut last_col = 0;
    for (row, values) in (first_row..).zip(rows) {
        write!(xml, r#"<row r="{row}">"#)?;
        for (col, value) in (1u32..).zip(values) {
            if value.is_empty() {
                continue;
            }
            last_col = last_col.max(col);
            let reference = format!("{}{}", column_to_letters(col), row);
            match (value, date_xf) {
                (CellValue::DateTime(_), Some(xf)) => {
                    write_cell(xml, &reference, value, xf, &mut StringStore::Inline)?
                },
                (CellValue::DateTime(dt), None) => write_cell(
                    xml,
                    &reference,
                    &CellValue::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                    0,
                    &mut StringStore::Inline,
                )?,
                _ => write_cell(xml, &reference, value, 0, &mut StringStore::Inline)?,
            }
        }
        xml.push_str("</row>");
    }
    Ok(last_col)
}

/// Insert `fragment` at the end of `<sheetData>`.
fn splice_rows(xml: &str, fragment: &str) -> Result<String> {
    if let Some(pos) = memmem::find(xml.as_bytes(), b"</sheetData>") {
        let mut out = String::with_capacity(xml.len() + fragment.len());
        out.push_str(&xml[..pos]);
        out.push_str(fragment);
        out.push_str(&xml[pos..]);
        return Ok(out);
    }
    if let Some(pos) = memmem::find(xml.as_bytes(), b"<sheetData/>") {
        let mut out = String::with_capacity(xml.len() + fragment.len() + 16);
        out.push_str(&xml[..pos]);
        out.push_str("<sheetData>");
        out.push_str(fragment);
        out.push_str("</sheetData>");
        out.push_str(&xml[pos + "<sheetData/>".len()..]);
        return Ok(out);
    }
    Err(Error::Xml("worksheet has no sheetData element".into()))
}

/// Widen `<dimension ref>` to cover `last_row` and `last_col`.
fn update_dimension(xml: &str, last_row: u32, last_col: u32) -> String {
    const NEEDLE: &str = r#"<dimension ref=""#;
    let Some(start) = xml.find(NEEDLE).map(|p| p + NEEDLE.len()) else {
        return xml.to_string();
    };
    let Some(len) = xml[start..].find('"') else {
        return xml.to_string();
    };
    let old = &xml[start..start + len];
    let (first, last) = old.split_once(':').unwrap_or((old, old));
    let (old_col, old_row) = reference_to_coords(last).unwrap_or((1, 1));
    let first = if reference_to_coords(first).is_some() { first } else { "A1" };
    let new_ref = format!(
        "{first}:{}{}",
        column_to_letters(old_col.max(last_col.max(1))),
        old_row.max(last_row)
    );

    let mut out = String::with_capacity(xml.len() + 8);
    out.push_str(&xml[..start]);
    out.push_str(&new_ref);
    out.push_str(&xml[start + len..]);
    out
}

/// Worksheet part for a sheet created by an append.
fn new_sheet_xml(rows: &[Vec<CellValue>], date_xf: Option<u32>) -> Result<String> {
    let mut body = String::new();
    let last_col = write_row_elements(&mut body, 1, rows, date_xf)?;

    let mut xml = String::with_capacity(512 + body.len());
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    if rows.is_empty() || last_col == 0 {
        xml.push_str(r#"<dimension ref="A1"/>"#);
    } else {
        write!(
            xml,
            r#"<dimension ref="A1:{}{}"/>"#,
            column_to_letters(last_col),
            rows.len()
        )?;
    }
    if body.is_empty() {
        xml.push_str("<sheetData/>");
    } else {
        xml.push_str("<sheetData>");
        xml.push_str(&body);
        xml.push_str("</sheetData>");
    }
    xml.push_str(r#"<pageMargins left="0.75" right="0.75" top="1" bottom="1" header="0.5" footer="0.5"/>"#);
    xml.push_str("</worksheet>");
    Ok(xml)
}

/// First `xl/worksheets/sheetN.xml` not present in the package.
fn unused_sheet_member(package: &RawPackage) -> String {
    (1..)
        .map(|n| format!("xl/worksheets/sheet{n}.xml"))
        .find(|member| !package.contains(member))
        .unwrap_or_else(|| "xl/worksheets/sheet1.xml".to_string())
}

/// Relationship target of `member` as seen from the workbook part.
fn sheet_target(workbook_member: &str, member: &str) -> String {
    match (workbook_member.rsplit_once('/'), member.strip_prefix("xl/")) {
        (Some(("xl", _)), Some(relative)) => relative.to_string(),
        _ => format!("/{member}"),
    }
}

fn next_sheet_id(workbook_xml: &[u8]) -> Result<u32> {
    let mut reader = Reader::from_reader(workbook_xml);
    let mut buf = Vec::new();
    let mut max = 0u32;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                if let Some(id) = attr_value(&e, b"sheetId")?.and_then(|v| v.parse::<u32>().ok()) {
                    max = max.max(id);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
        buf.clear();
    }
    Ok(max + 1)
}

/// Add a `<sheet>` entry as the last tab of `workbook.xml`.
fn insert_sheet_entry(workbook_xml: &str, name: &str, sheet_id: u32, r_id: &str) -> Result<String> {
    let mut entry = String::new();
    write!(
        entry,
        r#"<sheet name="{}" sheetId="{sheet_id}" r:id="{r_id}"/>"#,
        escape_xml(name)
    )?;

    let mut out = String::with_capacity(workbook_xml.len() + entry.len() + 16);
    if let Some(pos) = memmem::find(workbook_xml.as_bytes(), b"</sheets>") {
        out.push_str(&workbook_xml[..pos]);
        out.push_str(&entry);
        out.push_str(&workbook_xml[pos..]);
    } else if let Some(pos) = memmem::find(workbook_xml.as_bytes(), b"<sheets/>") {
        out.push_str(&workbook_xml[..pos]);
        out.push_str("<sheets>");
        out.push_str(&entry);
        out.push_str("</sheets>");
        out.push_str(&workbook_xml[pos + "<sheets/>".len()..]);
    } else {
        return Err(Error::Xml("workbook has no sheets element".into()));
    }
    Ok(out)
}
