//! Open Packaging Conventions (OPC) plumbing.
//!
//! ZIP-based physical packaging, relationships and content types for the
//! containers docweave reads and writes.

pub mod constants;
pub mod package;
pub mod phys_pkg;
pub mod pkgwriter;
pub mod rel;

pub use package::{OpcPackage, Part, RawPackage};
pub use phys_pkg::{PhysPkgReader, PhysPkgWriter};
pub use pkgwriter::{ContentTypes, PackageWriter};
pub use rel::{Relationship, Relationships, resolve_target};
