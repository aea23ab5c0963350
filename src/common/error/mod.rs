//! Unified error types for docweave.
//!
//! This module provides the single error type shared by the extraction and
//! generation pipelines, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, ErrorKind, Result, status_text};
