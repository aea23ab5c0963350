//! PowerPoint (.pptx) text extraction.

pub mod reader;

pub use reader::{SlideText, read_slides, render_slides};
