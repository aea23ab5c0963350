//! Common types and utilities shared by every format.

pub mod error;
pub mod format;
pub mod xml;

pub use error::{Error, ErrorKind, Result, status_text};
pub use format::{Format, FormatDescriptor, FormatRegistry};
