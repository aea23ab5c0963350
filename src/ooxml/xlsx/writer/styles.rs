/// Stylesheet of generated workbooks.
///
/// Generated sheets only need a handful of looks (header row, bordered body
/// cell, date cell, report title), so the stylesheet is a fixed table and a
/// [`CellStyle`] maps straight onto its `cellXfs` index.
use crate::common::error::Result;
use memchr::memmem;
use std::fmt::Write as FmtWrite;

/// Custom number format for timestamps; custom ids start at 164.
pub(crate) const DATE_NUM_FMT_ID: u32 = 164;
const DATE_FORMAT_CODE: &str = "yyyy-mm-dd hh:mm:ss";

/// Built-in `m/d/yy h:mm` format, used when patching foreign stylesheets.
const BUILTIN_DATETIME_FMT_ID: u32 = 22;

/// Header fill color.
pub(crate) const HEADER_FILL: &str = "366092";

/// Look of one generated cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct CellStyle {
    /// Bold white text on the header fill, centered
    pub(crate) header: bool,
    /// Thin border on all four sides
    pub(crate) border: bool,
    /// Timestamp number format
    pub(crate) date: bool,
    /// Bold 16pt report title
    pub(crate) title: bool,
}

/// Index of the title format; the eight header/border/date combinations
/// come first.
const TITLE_XF: u32 = 8;

impl CellStyle {
    pub(crate) const TITLE: CellStyle = CellStyle {
        header: false,
        border: false,
        date: false,
        title: true,
    };

    /// `cellXfs` index of this style in [`generate_styles_xml`].
    pub(crate) fn xf_index(self) -> u32 {
        if self.title {
            return TITLE_XF;
        }
        u32::from(self.date) | (u32::from(self.border) << 1) | (u32::from(self.header) << 2)
    }
}

/// Generate `xl/styles.xml`.
///
/// Fonts: 0 regular, 1 bold white, 2 bold 16pt. Fills: 0 none, 1 the
/// mandatory gray125, 2 solid header blue. Borders: 0 none, 1 thin.
pub(crate) fn generate_styles_xml() -> Result<String> {
    let mut xml = String::with_capacity(2048);

    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);

    write!(
        xml,
        r#"<numFmts count="1"><numFmt numFmtId="{DATE_NUM_FMT_ID}" formatCode="{DATE_FORMAT_CODE}"/></numFmts>"#
    )?;

    xml.push_str(r#"<fonts count="3">"#);
    xml.push_str(r#"<font><sz val="11"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str(r#"<font><b/><sz val="11"/><color rgb="FFFFFFFF"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str(r#"<font><b/><sz val="16"/><name val="Calibri"/><family val="2"/></font>"#);
    xml.push_str("</fonts>");

    xml.push_str(r#"<fills count="3">"#);
    xml.push_str(r#"<fill><patternFill patternType="none"/></fill>"#);
    xml.push_str(r#"<fill><patternFill patternType="gray125"/></fill>"#);
    write!(
        xml,
        r#"<fill><patternFill patternType="solid"><fgColor rgb="FF{HEADER_FILL}"/><bgColor rgb="FF{HEADER_FILL}"/></patternFill></fill>"#
    )?;
    xml.push_str("</fills>");

    xml.push_str(r#"<borders count="2">"#);
    xml.push_str("<border><left/><right/><top/><bottom/><diagonal/></border>");
    xml.push_str(concat!(
        r#"<border><left style="thin"><color auto="1"/></left><right style="thin"><color auto="1"/></right>"#,
        r#"<top style="thin"><color auto="1"/></top><bottom style="thin"><color auto="1"/></bottom><diagonal/></border>"#
    ));
    xml.push_str("</borders>");

    xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

    write!(xml, r#"<cellXfs count="{}">"#, TITLE_XF + 1)?;
    for index in 0..TITLE_XF {
        let style = CellStyle {
            date: index & 1 != 0,
            border: index & 2 != 0,
            header: index & 4 != 0,
            title: false,
        };
        write_xf(&mut xml, style)?;
    }
    write_xf(&mut xml, CellStyle::TITLE)?;
    xml.push_str("</cellXfs>");

    xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
    xml.push_str("</styleSheet>");
    Ok(xml)
}

fn write_xf(xml: &mut String, style: CellStyle) -> Result<()> {
    let num_fmt_id = if style.date { DATE_NUM_FMT_ID } else { 0 };
    let font_id = if style.title {
        2
    } else if style.header {
        1
    } else {
        0
    };
    let fill_id = if style.header { 2 } else { 0 };
    let border_id = u32::from(style.border);

    write!(
        xml,
        r#"<xf numFmtId="{num_fmt_id}" fontId="{font_id}" fillId="{fill_id}" borderId="{border_id}" xfId="0""#
    )?;
    if num_fmt_id != 0 {
        xml.push_str(r#" applyNumberFormat="1""#);
    }
    if font_id != 0 {
        xml.push_str(r#" applyFont="1""#);
    }
    if fill_id != 0 {
        xml.push_str(r#" applyFill="1""#);
    }
    if border_id != 0 {
        xml.push_str(r#" applyBorder="1""#);
    }
    if style.header {
        xml.push_str(r#" applyAlignment="1"><alignment horizontal="center"/></xf>"#);
    } else {
        xml.push_str("/>");
    }
    Ok(())
}

/// Append a date-time cell format to an existing stylesheet.
///
/// Returns the patched XML and the index of the new format, or `None` when
/// the stylesheet has no `cellXfs` list to extend.
pub(crate) fn append_date_xf(styles_xml: &str) -> Option<(String, u32)> {
    let open = memmem::find(styles_xml.as_bytes(), b"<cellXfs")?;
    let close = open + memmem::find(&styles_xml.as_bytes()[open..], b"</cellXfs>")?;
    let tag_end = open + styles_xml[open..].find('>')?;

    let existing = memmem::find_iter(&styles_xml.as_bytes()[tag_end..close], b"<xf").count() as u32;

    let mut patched = String::with_capacity(styles_xml.len() + 128);
    patched.push_str(&styles_xml[..open]);
    patched.push_str(&format!(r#"<cellXfs count="{}">"#, existing + 1));
    patched.push_str(&styles_xml[tag_end + 1..close]);
    patched.push_str(&format!(
        r#"<xf numFmtId="{BUILTIN_DATETIME_FMT_ID}" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#
    ));
    patched.push_str(&styles_xml[close..]);
    Some((patched, existing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::reader::parse_date_styles;

    #[test]
    fn test_xf_indices() {
        assert_eq!(CellStyle::default().xf_index(), 0);
        let header = CellStyle {
            header: true,
            border: true,
            ..CellStyle::default()
        };
        assert_eq!(header.xf_index(), 6);
        assert_eq!(CellStyle::TITLE.xf_index(), 8);
    }

    #[test]
    fn test_generated_stylesheet() {
        let xml = generate_styles_xml().unwrap();
        assert!(xml.contains(r#"<cellXfs count="9">"#));
        assert!(xml.contains(r#"rgb="FF366092""#));

        // odd indices carry the date format
        let dates = parse_date_styles(xml.as_bytes()).unwrap();
        assert_eq!(dates.len(), 9);
        assert!(!dates[0] && dates[1] && !dates[2] && dates[3]);
    }

    #[test]
    fn test_append_date_xf() {
        let xml = r#"<styleSheet><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="0"/></cellXfs></styleSheet>"#;
        let (patched, index) = append_date_xf(xml).unwrap();
        assert_eq!(index, 2);
        assert!(patched.contains(r#"<cellXfs count="3">"#));
        assert!(patched.contains(r#"numFmtId="22""#));
        assert!(patched.ends_with("</cellXfs></styleSheet>"));

        let dates = parse_date_styles(patched.as_bytes()).unwrap();
        assert_eq!(dates, vec![false, false, true]);

        assert!(append_date_xf("<styleSheet/>").is_none());
    }
}
