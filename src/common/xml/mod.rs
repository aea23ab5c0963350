//! XML helpers shared by the OOXML readers and writers.

mod escape;

pub use escape::{escape_xml, sanitize_xml_text, unescape_xml};

use crate::common::error::Result;
use quick_xml::events::{BytesRef, BytesStart, BytesText};

/// Look up an attribute by its local name (namespace prefix ignored).
///
/// Returns the unescaped value, or `None` when the attribute is absent.
pub(crate) fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == local {
            let raw = std::str::from_utf8(&attr.value)?;
            return Ok(Some(unescape_xml(raw)));
        }
    }
    Ok(None)
}

/// Look up an attribute by its fully qualified name (e.g. `r:id`).
pub(crate) fn attr_value_qualified(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            let raw = std::str::from_utf8(&attr.value)?;
            return Ok(Some(unescape_xml(raw)));
        }
    }
    Ok(None)
}

/// Append the content of a text event to `out`.
pub(crate) fn push_text(out: &mut String, e: &BytesText<'_>) -> Result<()> {
    let raw = std::str::from_utf8(e.as_ref())?;
    out.push_str(&unescape_xml(raw));
    Ok(())
}

/// Append the character an entity reference stands for to `out`.
///
/// Handles numeric character references and the predefined entities; anything
/// else is kept verbatim.
pub(crate) fn push_entity(out: &mut String, e: &BytesRef<'_>) -> Result<()> {
    if let Ok(Some(ch)) = e.resolve_char_ref() {
        out.push(ch);
        return Ok(());
    }
    let name = std::str::from_utf8(e.as_ref())?;
    match quick_xml::escape::resolve_predefined_entity(name) {
        Some(resolved) => out.push_str(resolved),
        None => {
            out.push('&');
            out.push_str(name);
            out.push(';');
        },
    }
    Ok(())
}
