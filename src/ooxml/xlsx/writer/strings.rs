/// Shared strings table for generated XLSX workbooks.
use crate::common::error::Result;
use crate::common::xml::{escape_xml, sanitize_xml_text};
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// Shared strings table.
///
/// Excel stores strings in one workbook-wide table and cells refer to them
/// by index. Identical strings share one entry.
#[derive(Debug, Default)]
pub(crate) struct SharedStrings {
    strings: Vec<String>,
    string_to_index: HashMap<String, usize>,
    /// Number of references, including repeats
    count: usize,
}

impl SharedStrings {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a string and return its index, reusing an existing entry.
    pub(crate) fn add_string(&mut self, s: &str) -> usize {
        self.count += 1;
        if let Some(&index) = self.string_to_index.get(s) {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(s.to_string());
        self.string_to_index.insert(s.to_string(), index);
        index
    }

    pub(crate) fn unique_count(&self) -> usize {
        self.strings.len()
    }

    pub(crate) fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(256 + self.strings.len() * 32);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.count,
            self.strings.len()
        )?;
        for s in &self.strings {
            xml.push_str("<si>");
            push_text_element(&mut xml, s)?;
            xml.push_str("</si>");
        }
        xml.push_str("</sst>");
        Ok(xml)
    }
}

/// Write `<t>` for `text`, preserving edge whitespace.
pub(crate) fn push_text_element(xml: &mut String, text: &str) -> Result<()> {
    let text = sanitize_xml_text(text);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        write!(xml, r#"<t xml:space="preserve">{}</t>"#, escape_xml(&text))?;
    } else {
        write!(xml, "<t>{}</t>", escape_xml(&text))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_strings() {
        let mut ss = SharedStrings::new();
        assert_eq!(ss.add_string("Hello"), 0);
        assert_eq!(ss.add_string("World"), 1);
        assert_eq!(ss.add_string("Hello"), 0);
        assert_eq!(ss.unique_count(), 2);

        let xml = ss.to_xml().unwrap();
        assert!(xml.contains(r#"count="3" uniqueCount="2""#));
        assert!(xml.contains("<si><t>Hello</t></si>"));
    }

    #[test]
    fn test_edge_whitespace_is_preserved() {
        let mut xml = String::new();
        push_text_element(&mut xml, " padded & ").unwrap();
        assert_eq!(xml, r#"<t xml:space="preserve"> padded &amp; </t>"#);
    }
}
