//! Office Open XML (OOXML) containers.
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): ZIP packaging, relationships and content types
//! 2. **Format-Specific Modules**:
//!    - `docx`: Word documents (read + write)
//!    - `pptx`: PowerPoint presentations (read)
//!    - `xlsx`: Excel spreadsheets (read + write + append)
pub mod docx;
pub mod opc;
pub mod pptx;
pub mod xlsx;

use crate::common::error::Result;
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::phys_pkg::rels_membername;
use crate::ooxml::opc::{PhysPkgReader, Relationships, resolve_target};

/// Member name of the package's main part, found through `_rels/.rels`.
///
/// Falls back to `fallback` when the package relationships are missing or do
/// not declare an office document.
pub(crate) fn office_document_member(pkg: &mut PhysPkgReader, fallback: &str) -> Result<String> {
    let xml = pkg.try_blob_for(&rels_membername(""))?;
    office_document_target(xml.as_deref(), fallback)
}

/// Like [`office_document_member`], from the package relationships XML.
pub(crate) fn office_document_target(package_rels: Option<&[u8]>, fallback: &str) -> Result<String> {
    let Some(xml) = package_rels else {
        return Ok(fallback.to_string());
    };
    let rels = Relationships::from_xml(xml)?;
    Ok(rels
        .first_of_type(rt::OFFICE_DOCUMENT)
        .map(|rel| resolve_target("", &rel.target))
        .unwrap_or_else(|| fallback.to_string()))
}
