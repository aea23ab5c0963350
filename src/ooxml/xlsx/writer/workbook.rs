/// Workbook assembly for generated XLSX files.
use crate::common::error::{Error, Result};
use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::{OpcPackage, Relationships};
use std::fmt::Write as FmtWrite;
use std::path::Path;
use tracing::debug;

use super::sheet::{StringStore, Worksheet, validate_sheet_name};
use super::strings::SharedStrings;
use super::styles::generate_styles_xml;

const WORKBOOK_MEMBER: &str = "xl/workbook.xml";

/// A workbook under construction; sheets keep their insertion order.
#[derive(Debug, Default)]
pub(crate) struct WorkbookBuilder {
    worksheets: Vec<Worksheet>,
}

impl WorkbookBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add an empty worksheet.
    ///
    /// # Errors
    /// `InvalidData` when the name breaks Excel's naming rules or is already
    /// taken (names compare case-insensitively).
    pub(crate) fn add_worksheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        validate_sheet_name(name)?;
        let lower = name.to_lowercase();
        if self.worksheets.iter().any(|ws| ws.name().to_lowercase() == lower) {
            return Err(Error::InvalidData(format!("duplicate sheet name '{name}'")));
        }
        self.worksheets.push(Worksheet::new(name));
        let last = self.worksheets.len() - 1;
        Ok(&mut self.worksheets[last])
    }

    pub(crate) fn worksheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Generate `workbook.xml` content with the given worksheet relationship ids.
    fn generate_workbook_xml(&self, worksheet_rel_ids: &[String]) -> Result<String> {
        let mut xml = String::with_capacity(512 + self.worksheets.len() * 96);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
        );
        xml.push_str(
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        xml.push_str(r#"<bookViews><workbookView activeTab="0"/></bookViews>"#);
        xml.push_str("<sheets>");
        for (index, (ws, rel_id)) in self.worksheets.iter().zip(worksheet_rel_ids).enumerate() {
            write!(
                xml,
                r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
                escape_xml(ws.name()),
                index + 1,
                rel_id
            )?;
        }
        xml.push_str("</sheets>");
        xml.push_str("</workbook>");
        Ok(xml)
    }

    /// Assemble the OPC package.
    ///
    /// # Errors
    /// `InvalidData` for a workbook without sheets.
    pub(crate) fn to_package(&self) -> Result<OpcPackage> {
        if self.worksheets.is_empty() {
            return Err(Error::InvalidData(
                "a workbook needs at least one sheet".into(),
            ));
        }

        let mut strings = SharedStrings::new();
        let mut sheet_parts = Vec::with_capacity(self.worksheets.len());
        for ws in &self.worksheets {
            sheet_parts.push(ws.to_xml(&mut StringStore::Shared(&mut strings))?);
        }

        let mut workbook_rels = Relationships::new();
        let rel_ids: Vec<String> = (1..=self.worksheets.len())
            .map(|i| workbook_rels.add(rt::WORKSHEET, &format!("worksheets/sheet{i}.xml")))
            .collect();
        workbook_rels.add(rt::STYLES, "styles.xml");
        workbook_rels.add(rt::SHARED_STRINGS, "sharedStrings.xml");

        let mut package = OpcPackage::new();
        package.rels_mut().add(rt::OFFICE_DOCUMENT, WORKBOOK_MEMBER);
        package
            .add_part(
                WORKBOOK_MEMBER,
                ct::SML_SHEET_MAIN,
                self.generate_workbook_xml(&rel_ids)?.into_bytes(),
            )
            .rels = workbook_rels;
        for (i, xml) in sheet_parts.into_iter().enumerate() {
            package.add_part(
                format!("xl/worksheets/sheet{}.xml", i + 1),
                ct::SML_WORKSHEET,
                xml.into_bytes(),
            );
        }
        package.add_part("xl/styles.xml", ct::SML_STYLES, generate_styles_xml()?.into_bytes());
        package.add_part(
            "xl/sharedStrings.xml",
            ct::SML_SHARED_STRINGS,
            strings.to_xml()?.into_bytes(),
        );

        debug!(
            sheets = self.worksheets.len(),
            shared_strings = strings.unique_count(),
            "assembled workbook"
        );
        Ok(package)
    }

    /// Serialize and write the workbook, creating parent directories.
    pub(crate) fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_package()?.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::reader::XlsxReader;
    use crate::ooxml::opc::pkgwriter::PackageWriter;
    use crate::sheet::types::CellValue;

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut wb = WorkbookBuilder::new();
        wb.add_worksheet("Data").unwrap();
        assert!(wb.add_worksheet("data").is_err());
        assert_eq!(wb.worksheet_count(), 1);
    }

    #[test]
    fn test_empty_workbook_is_rejected() {
        assert!(WorkbookBuilder::new().to_package().is_err());
    }

    #[test]
    fn test_sheet_order_survives_round_trip() {
        let mut wb = WorkbookBuilder::new();
        for name in ["Zeta", "Alpha", "Mid"] {
            wb.add_worksheet(name)
                .unwrap()
                .set_value(1, 1, CellValue::from(name));
        }
        let bytes = PackageWriter::to_bytes(&wb.to_package().unwrap()).unwrap();
        let mut reader = XlsxReader::from_bytes(bytes).unwrap();
        let names: Vec<&str> = reader.sheets().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(reader.read_grid(2).unwrap(), vec![vec![CellValue::from("Mid")]]);
    }
}
